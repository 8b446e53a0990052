//! Metric trait for volume similarity measurement.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use voxreg_core::transform::Transform;
use voxreg_core::volume::Volume;

use crate::error::MetricError;

/// Measures dissimilarity between a fixed and a moving volume under a
/// transform.
///
/// Lower values indicate better alignment. The returned tensor is a scalar
/// loss that stays attached to the transform's autodiff graph, so callers
/// can backpropagate it into the transform parameters.
pub trait Metric<B: Backend> {
    /// Evaluate the loss for the given transform.
    ///
    /// # Arguments
    /// * `fixed` - The fixed (reference) volume
    /// * `moving` - The moving volume
    /// * `transform` - Maps fixed-space physical points into moving space
    fn forward(
        &self,
        fixed: &Volume<B>,
        moving: &Volume<B>,
        transform: &impl Transform<B>,
    ) -> Result<Tensor<B, 1>, MetricError>;

    /// Identifier used in logs.
    fn name(&self) -> &'static str;
}
