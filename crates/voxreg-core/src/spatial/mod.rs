//! Spatial types for physical points, vectors, spacing and direction matrices.
//!
//! All types are thin newtypes over nalgebra structures, fixed to three
//! dimensions (voxreg only deals with 3D scan volumes).

pub mod direction;
pub mod point;
pub mod spacing;
pub mod vector;

pub use direction::Direction3;
pub use point::Point3;
pub use spacing::Spacing3;
pub use vector::Vector3;
