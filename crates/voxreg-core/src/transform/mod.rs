//! Spatial transforms between physical coordinate spaces.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

pub mod affine;
pub mod module;

pub use affine::Affine;
pub use module::AffineModule;

/// Batched point mapping between physical spaces.
///
/// Implementors map `[N, 3]` point tensors from one physical space to
/// another; this is the seam the metric and the resampler work through.
pub trait Transform<B: Backend> {
    /// Apply the transform to a batch of points.
    ///
    /// # Arguments
    /// * `points` - `[N, 3]` tensor of input points, `(x, y, z)` columns
    ///
    /// # Returns
    /// `[N, 3]` tensor of transformed points
    fn transform_points(&self, points: Tensor<B, 2>) -> Tensor<B, 2>;
}
