//! Nearest-neighbour interpolation.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use super::trait_::Interpolator;

/// Nearest-neighbour interpolator.
///
/// Preserves the original sample values exactly; useful when resampling
/// label-like volumes where blending intensities is wrong.
#[derive(Debug, Clone, Copy, Default)]
pub struct NearestInterpolator;

impl NearestInterpolator {
    /// Create a new nearest-neighbour interpolator.
    pub fn new() -> Self {
        Self
    }
}

impl<B: Backend> Interpolator<B> for NearestInterpolator {
    fn interpolate(&self, data: &Tensor<B, 3>, indices: Tensor<B, 2>) -> Tensor<B, 1> {
        let [d0, d1, d2] = data.dims(); // [Z, Y, X]

        let x = indices.clone().narrow(1, 0, 1).squeeze::<1>(1);
        let y = indices.clone().narrow(1, 1, 1).squeeze::<1>(1);
        let z = indices.narrow(1, 2, 1).squeeze::<1>(1);

        let xi = (x + 0.5).floor().clamp(0.0, (d2 - 1) as f64).int();
        let yi = (y + 0.5).floor().clamp(0.0, (d1 - 1) as f64).int();
        let zi = (z + 0.5).floor().clamp(0.0, (d0 - 1) as f64).int();

        let stride_z = (d1 * d2) as i32;
        let stride_y = d2 as i32;

        let idx = zi * stride_z + yi * stride_y + xi;
        data.clone().reshape([d0 * d1 * d2]).gather(0, idx)
    }
}
