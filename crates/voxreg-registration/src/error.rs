//! Error types for metric evaluation and registration runs.

use thiserror::Error;
use voxreg_core::InputError;

/// Errors raised while evaluating a similarity metric.
#[derive(Debug, Error)]
pub enum MetricError {
    /// No sampled point of the fixed volume maps inside the moving volume.
    #[error("transformed sample points have no overlap with the moving volume")]
    NoOverlap,

    /// Too few sampled points map inside the moving volume to trust the
    /// histogram.
    #[error(
        "only {fraction:.3} of sample points overlap the moving volume \
         (minimum {minimum:.3})"
    )]
    InsufficientOverlap {
        /// Fraction of samples inside the moving volume.
        fraction: f64,
        /// Configured minimum fraction.
        minimum: f64,
    },

    /// The joint histogram collapsed, typically because an input volume has
    /// (near-)constant intensity.
    #[error("degenerate intensity histogram: {reason}")]
    DegenerateHistogram {
        /// What collapsed.
        reason: String,
    },
}

/// Errors raised by the registration engine.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// The metric could not be evaluated.
    #[error(transparent)]
    Metric(#[from] MetricError),

    /// Optimization left the space of usable transforms.
    #[error("optimization diverged at iteration {iteration}: {detail}")]
    Divergence {
        /// Iteration at which divergence was detected.
        iteration: usize,
        /// What went non-finite or singular.
        detail: String,
    },

    /// An input volume or transform violates a structural invariant.
    #[error(transparent)]
    Input(#[from] InputError),

    /// The run configuration is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Result type for registration operations.
pub type Result<T> = std::result::Result<T, RegistrationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap_error_names_fractions() {
        let err = MetricError::InsufficientOverlap {
            fraction: 0.1,
            minimum: 0.25,
        };
        let msg = err.to_string();
        assert!(msg.contains("0.100"));
        assert!(msg.contains("0.250"));
    }

    #[test]
    fn test_metric_error_converts() {
        let err: RegistrationError = MetricError::NoOverlap.into();
        assert!(matches!(err, RegistrationError::Metric(_)));
    }
}
