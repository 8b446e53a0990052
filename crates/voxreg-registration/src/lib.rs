//! Intensity-based affine registration.
//!
//! Aligns a moving volume onto a fixed volume by descending the negated
//! Mattes mutual information with a scaled gradient descent optimizer,
//! starting from a geometry-centered initial transform. The recovered
//! [`voxreg_core::transform::Affine`] maps fixed-space physical points into
//! moving space and is what resampling and mesh transformation consume.

pub mod engine;
pub mod error;
pub mod initializer;
pub mod metric;
pub mod optimizer;
pub mod sampling;

pub use engine::{RegistrationConfig, RegistrationEngine, RegistrationOutcome, RegistrationStatus};
pub use error::{MetricError, RegistrationError, Result};
pub use initializer::centered_affine;
pub use metric::{MattesMutualInformation, Metric};
pub use optimizer::{ScaledGradientDescent, TransformScales};
pub use sampling::UniformSampler;
