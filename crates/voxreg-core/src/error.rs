//! Input validation errors for core data types.

use thiserror::Error;

/// Errors raised when input data violates a structural invariant.
///
/// These are fatal: a volume with zero extent or a mesh referencing a missing
/// vertex cannot be registered or transformed meaningfully.
#[derive(Debug, Error)]
pub enum InputError {
    /// A volume dimension has zero voxels.
    #[error("degenerate volume: extent {extent:?} has a zero-sized axis")]
    DegenerateVolume {
        /// The offending extent.
        extent: [usize; 3],
    },

    /// Volume spacing has a non-positive or non-finite component.
    #[error("invalid spacing {spacing:?}: all components must be positive")]
    InvalidSpacing {
        /// The offending spacing.
        spacing: [f64; 3],
    },

    /// Volume direction matrix is not orthonormal.
    #[error("direction matrix is not orthonormal (determinant {determinant})")]
    NonOrthonormalDirection {
        /// Determinant of the rejected matrix.
        determinant: f64,
    },

    /// Volume data length does not match the declared extent.
    #[error("volume data has {actual} samples but extent {extent:?} needs {expected}")]
    DataExtentMismatch {
        /// The declared extent.
        extent: [usize; 3],
        /// Samples implied by the extent.
        expected: usize,
        /// Samples actually provided.
        actual: usize,
    },

    /// An affine matrix cannot be inverted.
    #[error("transform matrix is singular (determinant {determinant})")]
    SingularTransform {
        /// Determinant of the rejected matrix.
        determinant: f64,
    },

    /// A mesh face references a vertex that does not exist.
    #[error("face {face} references vertex {index} but mesh has {vertex_count} vertices")]
    FaceIndexOutOfRange {
        /// Index of the offending face.
        face: usize,
        /// The out-of-range vertex index.
        index: usize,
        /// Number of vertices in the mesh.
        vertex_count: usize,
    },
}

/// Result alias for core operations.
pub type Result<T> = std::result::Result<T, InputError>;
