//! Interpolator trait for sampling values at continuous coordinates.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Samples a volume at continuous voxel indices.
///
/// Indices outside the volume are clamped to the border; callers that need
/// outside-domain semantics (the resampler's default value, the metric's
/// overlap mask) test bounds themselves before or after sampling.
pub trait Interpolator<B: Backend> {
    /// Interpolate values from a `[Z, Y, X]` volume tensor.
    ///
    /// # Arguments
    /// * `data` - The source volume tensor
    /// * `indices` - `[N, 3]` continuous indices, `(x, y, z)` columns
    ///
    /// # Returns
    /// `[N]` tensor of sampled values
    fn interpolate(&self, data: &Tensor<B, 3>, indices: Tensor<B, 2>) -> Tensor<B, 1>;
}
