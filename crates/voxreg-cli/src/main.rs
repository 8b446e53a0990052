//! voxreg: Command-line affine registration of scan volumes.
//!
//! Aligns a moving volume onto a fixed volume by mutual information and
//! writes the moving volume resampled onto the fixed grid, the recovered
//! transform, and a mesh carried from moving into fixed space.
//!
//! # Logging
//!
//! Set the `RUST_LOG` environment variable to control log output:
//! - `RUST_LOG=info` - Per-iteration metric values
//! - `RUST_LOG=debug` - Initializer and pipeline detail
//!
//! # Example
//!
//! ```bash
//! voxreg --fixed fixed.nii.gz --moving moving.nii.gz \
//!        --out-volume registered.nii.gz --out-transform transform.json \
//!        --mesh anatomy.obj --out-mesh anatomy_fixed.obj
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

mod pipeline;

/// How the moving volume is sampled during resampling.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum Interpolation {
    /// Trilinear interpolation
    Linear,
    /// Nearest-neighbour lookup, for label volumes
    Nearest,
}

/// Register a moving scan volume onto a fixed one.
#[derive(Parser, Debug)]
#[command(name = "voxreg")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Fixed (reference) volume, NIfTI
    #[arg(long)]
    fixed: PathBuf,

    /// Moving volume to align, NIfTI
    #[arg(long)]
    moving: PathBuf,

    /// Output path for the moving volume resampled onto the fixed grid
    #[arg(long)]
    out_volume: PathBuf,

    /// Output path for the recovered transform, JSON
    #[arg(long)]
    out_transform: PathBuf,

    /// OBJ mesh in moving space to carry into fixed space
    #[arg(long)]
    mesh: PathBuf,

    /// Output path for the transformed mesh
    #[arg(long)]
    out_mesh: PathBuf,

    /// Histogram bins per intensity axis
    #[arg(long, default_value_t = 50)]
    bins: usize,

    /// Random positions sampled per metric evaluation
    #[arg(long, default_value_t = 4096)]
    samples: usize,

    /// Sampling seed
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Gradient descent step length
    #[arg(long, default_value_t = 1.0)]
    learning_rate: f64,

    /// Maximum optimizer iterations
    #[arg(long, default_value_t = 100)]
    iterations: usize,

    /// Intensity written outside the moving volume's footprint
    #[arg(long, default_value_t = 0.0)]
    default_value: f64,

    /// Interpolation used when resampling the moving volume
    #[arg(long, value_enum, default_value_t = Interpolation::Linear)]
    interpolation: Interpolation,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    pipeline::run(&cli)
}
