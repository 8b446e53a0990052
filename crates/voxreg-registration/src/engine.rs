//! The registration engine: initializer, metric and optimizer wired into an
//! iteration loop with best-score tracking.

use burn::tensor::backend::AutodiffBackend;
use burn::tensor::ElementConversion;
use tracing::{debug, info, warn};

use voxreg_core::transform::{Affine, AffineModule};
use voxreg_core::volume::Volume;

use crate::error::{RegistrationError, Result};
use crate::initializer::centered_affine;
use crate::metric::mattes::{DEFAULT_BINS, DEFAULT_MIN_OVERLAP, DEFAULT_SAMPLES, DEFAULT_SEED};
use crate::metric::{MattesMutualInformation, Metric};
use crate::optimizer::{ScaledGradientDescent, TransformScales};

const LOG_INTERVAL: usize = 10;

/// Step length multiplier applied whenever an iteration worsens the metric.
const RELAXATION_FACTOR: f64 = 0.5;

/// Configuration of a registration run.
#[derive(Debug, Clone, Copy)]
pub struct RegistrationConfig {
    /// Histogram bins per intensity axis.
    pub num_bins: usize,
    /// Random positions sampled per metric evaluation.
    pub sample_count: usize,
    /// Seed for the sampling stream.
    pub seed: u64,
    /// Gradient descent step length.
    pub learning_rate: f64,
    /// Upper bound on iterations.
    pub max_iterations: usize,
    /// Improvement over the best metric below which an iteration counts as
    /// stalled.
    pub convergence_tolerance: f64,
    /// Consecutive stalled iterations before declaring convergence.
    pub patience: usize,
    /// Minimum fraction of samples that must land inside the moving volume.
    pub min_overlap_fraction: f64,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            num_bins: DEFAULT_BINS,
            sample_count: DEFAULT_SAMPLES,
            seed: DEFAULT_SEED,
            learning_rate: 1.0,
            max_iterations: 100,
            convergence_tolerance: 1e-4,
            patience: 10,
            min_overlap_fraction: DEFAULT_MIN_OVERLAP,
        }
    }
}

impl RegistrationConfig {
    /// The default configuration; tune with the `with_*` builders.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the histogram bin count.
    pub fn with_num_bins(mut self, num_bins: usize) -> Self {
        self.num_bins = num_bins;
        self
    }

    /// Set the number of sampled positions per evaluation.
    pub fn with_sample_count(mut self, sample_count: usize) -> Self {
        self.sample_count = sample_count;
        self
    }

    /// Set the sampling seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the gradient descent step length.
    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Set the iteration cap.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the stall tolerance.
    pub fn with_convergence_tolerance(mut self, tolerance: f64) -> Self {
        self.convergence_tolerance = tolerance;
        self
    }

    /// Set the number of stalled iterations that count as convergence.
    pub fn with_patience(mut self, patience: usize) -> Self {
        self.patience = patience;
        self
    }

    /// Set the minimum in-bounds sample fraction.
    pub fn with_min_overlap_fraction(mut self, fraction: f64) -> Self {
        self.min_overlap_fraction = fraction;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.num_bins < 2 {
            return Err(RegistrationError::InvalidConfiguration(format!(
                "num_bins must be at least 2, got {}",
                self.num_bins
            )));
        }
        if self.sample_count == 0 {
            return Err(RegistrationError::InvalidConfiguration(
                "sample_count must be positive".into(),
            ));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(RegistrationError::InvalidConfiguration(format!(
                "learning_rate must be positive and finite, got {}",
                self.learning_rate
            )));
        }
        if self.max_iterations == 0 {
            return Err(RegistrationError::InvalidConfiguration(
                "max_iterations must be positive".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.min_overlap_fraction) {
            return Err(RegistrationError::InvalidConfiguration(format!(
                "min_overlap_fraction must be in [0, 1], got {}",
                self.min_overlap_fraction
            )));
        }
        Ok(())
    }
}

/// Terminal state of a registration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationStatus {
    /// The metric stalled within tolerance for `patience` iterations.
    Converged,
    /// The iteration budget ran out before convergence.
    MaxIterationsReached,
    /// The metric failed or optimization diverged mid-run.
    Failed,
}

/// Result of a registration run.
///
/// The outcome always carries the best transform observed, even when the
/// run failed partway: a partial alignment is still the best available
/// answer, and `failure` records why the run stopped.
#[derive(Debug)]
pub struct RegistrationOutcome {
    /// The transform with the best (lowest) metric value seen.
    pub transform: Affine,
    /// How the run ended.
    pub status: RegistrationStatus,
    /// Metric value at the initial transform.
    pub initial_metric: f64,
    /// Best metric value observed.
    pub best_metric: f64,
    /// Iterations completed.
    pub iterations: usize,
    /// Why the run failed, when `status` is [`RegistrationStatus::Failed`].
    pub failure: Option<RegistrationError>,
}

/// Intensity-based affine registration driver.
pub struct RegistrationEngine {
    config: RegistrationConfig,
}

impl RegistrationEngine {
    /// Create an engine with the given configuration.
    pub fn new(config: RegistrationConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &RegistrationConfig {
        &self.config
    }

    /// Register `moving` onto `fixed`, returning the fixed-to-moving affine.
    ///
    /// Starts from the centered initializer and descends the negated mutual
    /// information. Metric failures and divergence after the first
    /// successful evaluation end the run with
    /// [`RegistrationStatus::Failed`] but still return the best transform;
    /// errors before any evaluation (bad configuration, degenerate inputs,
    /// no initial overlap) are returned as `Err`.
    pub fn register<B: AutodiffBackend>(
        &self,
        fixed: &Volume<B>,
        moving: &Volume<B>,
    ) -> Result<RegistrationOutcome> {
        self.config.validate()?;

        let device = fixed.data().device();
        let initial = centered_affine(fixed, moving)?;
        debug!(translation = ?initial.translation(), "centered initializer");

        let metric = MattesMutualInformation::new(
            self.config.num_bins,
            self.config.sample_count,
            self.config.seed,
        )
        .with_min_overlap_fraction(self.config.min_overlap_fraction);

        let scales = TransformScales::physical_shift(fixed, initial.center());
        let mut learning_rate = self.config.learning_rate;

        let mut module = AffineModule::<B>::from_affine(&initial, &device);

        // The first evaluation doubles as the initial metric; failure here
        // means the inputs cannot be registered at all.
        let first_loss = metric.forward(fixed, moving, &module)?;
        let initial_metric = first_loss.clone().into_scalar().elem::<f64>();
        if !initial_metric.is_finite() {
            return Err(RegistrationError::Divergence {
                iteration: 0,
                detail: format!("initial metric is {initial_metric}"),
            });
        }
        info!(metric = initial_metric, "starting registration");

        let mut best_metric = initial_metric;
        let mut best_transform = initial;
        let mut previous = initial_metric;
        let mut stalled = 0usize;
        let mut loss = first_loss;
        let mut iterations = 0usize;
        let mut status = RegistrationStatus::MaxIterationsReached;
        let mut failure = None;

        for iteration in 0..self.config.max_iterations {
            let grads = loss.backward();
            let optimizer = ScaledGradientDescent::new(learning_rate).with_scales(scales);
            module = optimizer.step(module, &grads);
            iterations = iteration + 1;

            let current_transform = match module.to_affine() {
                Ok(affine) => affine,
                Err(input) => {
                    warn!(iteration, error = %input, "transform became singular");
                    status = RegistrationStatus::Failed;
                    failure = Some(RegistrationError::Divergence {
                        iteration,
                        detail: input.to_string(),
                    });
                    break;
                }
            };

            loss = match metric.forward(fixed, moving, &module) {
                Ok(loss) => loss,
                Err(metric_error) => {
                    warn!(iteration, error = %metric_error, "metric evaluation failed");
                    status = RegistrationStatus::Failed;
                    failure = Some(metric_error.into());
                    break;
                }
            };

            let value = loss.clone().into_scalar().elem::<f64>();
            if !value.is_finite() {
                warn!(iteration, "metric went non-finite");
                status = RegistrationStatus::Failed;
                failure = Some(RegistrationError::Divergence {
                    iteration,
                    detail: format!("metric value is {value}"),
                });
                break;
            }

            if iteration % LOG_INTERVAL == 0 {
                info!(iteration, metric = value, best = best_metric, "iteration");
            } else {
                debug!(iteration, metric = value, best = best_metric, "iteration");
            }

            // Halve the step when an iteration overshoots; the metric is
            // deterministic in the parameters, so a shrinking step settles
            // the score and lets the stall counter fire.
            if value > previous {
                learning_rate *= RELAXATION_FACTOR;
                debug!(iteration, learning_rate, "step relaxed");
            }

            let improvement = best_metric - value;
            if value < best_metric {
                best_metric = value;
                best_transform = current_transform;
            }

            if improvement < self.config.convergence_tolerance {
                stalled += 1;
                if stalled >= self.config.patience {
                    info!(iteration, metric = value, "converged");
                    status = RegistrationStatus::Converged;
                    break;
                }
            } else {
                stalled = 0;
            }
            previous = value;
        }

        info!(
            iterations,
            initial = initial_metric,
            best = best_metric,
            ?status,
            "registration finished"
        );

        Ok(RegistrationOutcome {
            transform: best_transform,
            status,
            initial_metric,
            best_metric,
            iterations,
            failure,
        })
    }
}

impl Default for RegistrationEngine {
    fn default() -> Self {
        Self::new(RegistrationConfig::default())
    }
}
