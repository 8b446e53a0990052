//! File I/O for registration pipelines: NIfTI volumes, JSON affine
//! transforms and Wavefront OBJ meshes.

pub mod error;
pub mod obj_io;
pub mod transform_io;
pub mod volume_io;

pub use error::{IoError, IoResult};
pub use obj_io::{read_mesh, write_mesh};
pub use transform_io::{read_transform, write_transform};
pub use volume_io::{read_volume, write_volume};
