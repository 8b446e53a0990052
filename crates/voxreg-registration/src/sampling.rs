//! Random sampling of fixed-volume positions for metric evaluation.

use burn::tensor::backend::Backend;
use burn::tensor::{Shape, Tensor, TensorData};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Draws continuous voxel indices uniformly over a volume's index domain.
///
/// The sampler is seeded, so for a given `(count, seed, extent)` it yields
/// the same positions on every call. The metric relies on this: evaluating
/// the same positions at every iteration makes successive metric values
/// comparable.
#[derive(Debug, Clone, Copy)]
pub struct UniformSampler {
    count: usize,
    seed: u64,
}

impl UniformSampler {
    /// Create a sampler drawing `count` positions from a stream seeded with
    /// `seed`.
    pub fn new(count: usize, seed: u64) -> Self {
        Self { count, seed }
    }

    /// Number of positions drawn per call.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Draw continuous indices over `[0, dim-1]` per axis.
    ///
    /// # Arguments
    /// * `extent` - Volume extent as `[Z, Y, X]`
    ///
    /// # Returns
    /// `[count, 3]` tensor with `(x, y, z)` columns
    pub fn sample_indices<B: Backend>(
        &self,
        extent: [usize; 3],
        device: &B::Device,
    ) -> Tensor<B, 2> {
        let [nz, ny, nx] = extent;
        let mut rng = StdRng::seed_from_u64(self.seed);

        let mut data = Vec::with_capacity(self.count * 3);
        for _ in 0..self.count {
            data.push(rng.gen_range(0.0..=(nx.saturating_sub(1)) as f32));
            data.push(rng.gen_range(0.0..=(ny.saturating_sub(1)) as f32));
            data.push(rng.gen_range(0.0..=(nz.saturating_sub(1)) as f32));
        }

        Tensor::from_data(TensorData::new(data, Shape::new([self.count, 3])), device)
    }
}
