//! The end-to-end registration pipeline behind the CLI.

use anyhow::{Context, Result};
use burn::backend::Autodiff;
use burn_ndarray::NdArray;
use tracing::{info, warn};

use voxreg_core::interpolation::{Interpolator, LinearInterpolator, NearestInterpolator};
use voxreg_core::resample::ResampleFilter;
use voxreg_core::transform::AffineModule;
use voxreg_core::volume::Volume;
use voxreg_registration::{RegistrationConfig, RegistrationEngine, RegistrationStatus};

use crate::{Cli, Interpolation};

type Backend = Autodiff<NdArray<f32>>;

/// Run the full pipeline: register, resample, write artifacts.
///
/// A run that ends in [`RegistrationStatus::Failed`] still produces outputs
/// from the best transform observed; the failure is logged, not fatal.
pub fn run(cli: &Cli) -> Result<()> {
    let device = Default::default();

    let fixed = voxreg_io::read_volume::<Backend, _>(&cli.fixed, &device)
        .with_context(|| format!("reading fixed volume {}", cli.fixed.display()))?;
    let moving = voxreg_io::read_volume::<Backend, _>(&cli.moving, &device)
        .with_context(|| format!("reading moving volume {}", cli.moving.display()))?;
    info!(
        fixed = ?fixed.extent(),
        moving = ?moving.extent(),
        "volumes loaded"
    );

    let config = RegistrationConfig::new()
        .with_num_bins(cli.bins)
        .with_sample_count(cli.samples)
        .with_seed(cli.seed)
        .with_learning_rate(cli.learning_rate)
        .with_max_iterations(cli.iterations);

    let engine = RegistrationEngine::new(config);
    let outcome = engine.register(&fixed, &moving).context("registration")?;

    match outcome.status {
        RegistrationStatus::Failed => {
            warn!(
                failure = %outcome
                    .failure
                    .as_ref()
                    .map(|e| e.to_string())
                    .unwrap_or_default(),
                best_metric = outcome.best_metric,
                "registration failed; continuing with the best transform seen"
            );
        }
        status => {
            info!(
                ?status,
                iterations = outcome.iterations,
                initial_metric = outcome.initial_metric,
                best_metric = outcome.best_metric,
                "registration finished"
            );
        }
    }

    let transform_module = AffineModule::<Backend>::from_affine(&outcome.transform, &device);
    let resampled = match cli.interpolation {
        Interpolation::Linear => resample(
            &fixed,
            &moving,
            transform_module,
            LinearInterpolator::new(),
            cli.default_value,
        ),
        Interpolation::Nearest => resample(
            &fixed,
            &moving,
            transform_module,
            NearestInterpolator::new(),
            cli.default_value,
        ),
    }
    .context("resampling moving volume")?;
    voxreg_io::write_volume(&cli.out_volume, &resampled)
        .with_context(|| format!("writing {}", cli.out_volume.display()))?;

    voxreg_io::write_transform(&cli.out_transform, &outcome.transform)
        .with_context(|| format!("writing {}", cli.out_transform.display()))?;

    let mesh = voxreg_io::read_mesh(&cli.mesh)
        .with_context(|| format!("reading mesh {}", cli.mesh.display()))?;
    // The registration maps fixed space into moving space; vertices
    // travel the other way.
    let inverse = outcome
        .transform
        .inverse()
        .context("inverting recovered transform")?;
    let transformed = mesh.transform_vertices(&inverse);
    voxreg_io::write_mesh(&cli.out_mesh, &transformed)
        .with_context(|| format!("writing {}", cli.out_mesh.display()))?;
    info!(vertices = transformed.vertices().len(), "mesh written");

    Ok(())
}

fn resample<I: Interpolator<Backend>>(
    fixed: &Volume<Backend>,
    moving: &Volume<Backend>,
    transform: AffineModule<Backend>,
    interpolator: I,
    default_value: f64,
) -> Result<Volume<Backend>, voxreg_core::InputError> {
    ResampleFilter::from_reference(fixed, transform, interpolator)
        .with_default_value(default_value)
        .apply(moving)
}
