//! Core types for intensity-based 3D volume registration.
//!
//! This crate holds the data model shared by the rest of the workspace:
//! volumes with physical metadata, invertible affine transforms (both the f64
//! artifact and the tensor module optimized during registration),
//! interpolators, the resampling filter and triangulated meshes.

pub mod error;
pub mod interpolation;
pub mod mesh;
pub mod resample;
pub mod spatial;
pub mod transform;
pub mod volume;

pub use error::InputError;
pub use mesh::Mesh;
pub use resample::ResampleFilter;
pub use spatial::{Direction3, Point3, Spacing3, Vector3};
pub use transform::{Affine, AffineModule, Transform};
pub use volume::Volume;
