//! Mattes mutual information metric.

use burn::tensor::backend::Backend;
use burn::tensor::{ElementConversion, Int, Tensor};

use voxreg_core::interpolation::{Interpolator, LinearInterpolator};
use voxreg_core::resample::inside_mask;
use voxreg_core::transform::Transform;
use voxreg_core::volume::Volume;

use super::trait_::Metric;
use crate::error::MetricError;
use crate::sampling::UniformSampler;

/// Mattes mutual information between a fixed and a moving volume.
///
/// Loss = H(F, M) - H(F) - H(M), the negated mutual information, estimated
/// from a seeded random subset of fixed-volume positions. Intensities are
/// binned over each volume's global min/max range, and each sample spreads
/// its mass over neighbouring bins through a cubic B-spline Parzen window,
/// which keeps the histogram differentiable in the transform parameters.
///
/// Samples whose transformed position falls outside the moving volume are
/// excluded from the histogram; if too few remain the evaluation fails
/// rather than reporting a score computed from a sliver of overlap.
pub struct MattesMutualInformation {
    interpolator: LinearInterpolator,
    sampler: UniformSampler,
    num_bins: usize,
    min_overlap_fraction: f64,
}

/// Default histogram bin count.
pub const DEFAULT_BINS: usize = 50;
/// Default number of sampled positions per evaluation.
pub const DEFAULT_SAMPLES: usize = 4096;
/// Default sampling seed.
pub const DEFAULT_SEED: u64 = 42;
/// Default minimum fraction of samples that must land inside the moving
/// volume.
pub const DEFAULT_MIN_OVERLAP: f64 = 0.25;

impl MattesMutualInformation {
    /// Create a metric with the given histogram and sampling parameters.
    pub fn new(num_bins: usize, sample_count: usize, seed: u64) -> Self {
        Self {
            interpolator: LinearInterpolator::new(),
            sampler: UniformSampler::new(sample_count, seed),
            num_bins,
            min_overlap_fraction: DEFAULT_MIN_OVERLAP,
        }
    }

    /// Override the minimum in-bounds sample fraction.
    pub fn with_min_overlap_fraction(mut self, fraction: f64) -> Self {
        self.min_overlap_fraction = fraction;
        self
    }

    /// Cubic B-spline Parzen weights of `values` against each bin.
    ///
    /// # Arguments
    /// * `values` - `[N]` continuous bin coordinates in `[0, num_bins - 1]`
    ///
    /// # Returns
    /// `[N, num_bins]` weights; each row sums to ~1 away from the range ends
    fn parzen_weights<B: Backend>(&self, values: Tensor<B, 1>) -> Tensor<B, 2> {
        let n = values.dims()[0];
        let device = values.device();

        let bin_centers = Tensor::<B, 1, Int>::arange(0..self.num_bins as i64, &device)
            .float()
            .reshape([1, self.num_bins]);

        // u in bin units, |u| < 2 contributes
        let u = values.reshape([n, 1]) - bin_centers;
        let au = u.abs();

        // |u| < 1: 2/3 - u^2 + |u|^3 / 2
        let near = au.clone().powf_scalar(3.0) * 0.5 - au.clone().powf_scalar(2.0) + (2.0 / 3.0);
        // 1 <= |u| < 2: (2 - |u|)^3 / 6, zero beyond
        let far = (au.clone().neg() + 2.0).clamp_min(0.0).powf_scalar(3.0) / 6.0;

        far.mask_where(au.lower_elem(1.0), near)
    }
}

impl Default for MattesMutualInformation {
    fn default() -> Self {
        Self::new(DEFAULT_BINS, DEFAULT_SAMPLES, DEFAULT_SEED)
    }
}

impl<B: Backend> Metric<B> for MattesMutualInformation {
    fn forward(
        &self,
        fixed: &Volume<B>,
        moving: &Volume<B>,
        transform: &impl Transform<B>,
    ) -> Result<Tensor<B, 1>, MetricError> {
        let device = fixed.data().device();
        let n = self.sampler.count();

        // Sample fixed positions, push them through the transform and read
        // both volumes at the resulting continuous indices.
        let fixed_indices = self.sampler.sample_indices::<B>(fixed.extent(), &device);
        let fixed_values = self
            .interpolator
            .interpolate(fixed.data(), fixed_indices.clone());

        let fixed_points = fixed.index_to_physical_tensor(fixed_indices);
        let moving_points = transform.transform_points(fixed_points);
        let moving_indices = moving.physical_to_index_tensor(moving_points);

        let mask = inside_mask(&moving_indices, moving.extent());
        let inside = mask.clone().sum().into_scalar().elem::<f64>();
        if inside < 1.0 {
            return Err(MetricError::NoOverlap);
        }
        let fraction = inside / n as f64;
        if fraction < self.min_overlap_fraction {
            return Err(MetricError::InsufficientOverlap {
                fraction,
                minimum: self.min_overlap_fraction,
            });
        }

        let moving_values = self.interpolator.interpolate(moving.data(), moving_indices);

        // Bin coordinates over each volume's global intensity range. The
        // range is a property of the volumes, not of the current samples, so
        // bin placement stays constant across iterations.
        let fixed_coords = bin_coordinates(fixed.data(), fixed_values, self.num_bins, "fixed")?;
        let moving_coords = bin_coordinates(moving.data(), moving_values, self.num_bins, "moving")?;

        let mask_column = mask.reshape([n, 1]);
        let fixed_weights = self.parzen_weights(fixed_coords) * mask_column.clone();
        let moving_weights = self.parzen_weights(moving_coords) * mask_column;

        // joint[i, j] = sum_k w_f(k, i) * w_m(k, j)
        let joint = fixed_weights.transpose().matmul(moving_weights);
        let total = joint.clone().sum().into_scalar().elem::<f64>();
        if !total.is_finite() || total <= f64::EPSILON {
            return Err(MetricError::DegenerateHistogram {
                reason: "joint histogram has no mass".into(),
            });
        }
        let p_joint = joint / total;

        // Marginals from the joint keep the three distributions consistent
        // under the overlap mask.
        let p_fixed = p_joint.clone().sum_dim(1);
        let p_moving = p_joint.clone().sum_dim(0);

        let h_joint = entropy(p_joint);
        let h_fixed = entropy(p_fixed);
        let h_moving = entropy(p_moving);

        Ok(h_joint - h_fixed - h_moving)
    }

    fn name(&self) -> &'static str {
        "MattesMutualInformation"
    }
}

/// Map sampled intensities to continuous bin coordinates in
/// `[0, num_bins - 1]` using the volume's global min/max.
fn bin_coordinates<B: Backend>(
    volume_data: &Tensor<B, 3>,
    values: Tensor<B, 1>,
    num_bins: usize,
    label: &str,
) -> Result<Tensor<B, 1>, MetricError> {
    let min = volume_data.clone().min().into_scalar().elem::<f64>();
    let max = volume_data.clone().max().into_scalar().elem::<f64>();
    let range = max - min;
    if !range.is_finite() || range <= f64::EPSILON {
        return Err(MetricError::DegenerateHistogram {
            reason: format!("{label} volume has constant intensity"),
        });
    }

    let scale = (num_bins - 1) as f64 / range;
    Ok((values - min) * scale)
}

/// Shannon entropy of a (possibly unnormalized-by-epsilon) distribution.
fn entropy<B: Backend, const D: usize>(probs: Tensor<B, D>) -> Tensor<B, 1> {
    let log_probs = (probs.clone() + 1e-10).log();
    (probs * log_probs).sum().neg()
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::tensor::{Shape, TensorData};
    use burn_ndarray::NdArray;
    use nalgebra::Matrix3;
    use voxreg_core::spatial::{Direction3, Point3, Spacing3, Vector3};
    use voxreg_core::transform::{Affine, AffineModule};

    type TestBackend = NdArray<f32>;

    fn smooth_volume(size: usize) -> Volume<TestBackend> {
        let device = Default::default();
        let count = size * size * size;
        // Smooth ramp plus a bright off-center blob for structure
        let data: Vec<f32> = (0..count)
            .map(|i| {
                let z = i / (size * size);
                let y = (i / size) % size;
                let x = i % size;
                let ramp = (x + 2 * y + 3 * z) as f32 / (6 * size) as f32;
                let dx = x as f32 - size as f32 * 0.3;
                let dy = y as f32 - size as f32 * 0.4;
                let dz = z as f32 - size as f32 * 0.5;
                let blob = (-(dx * dx + dy * dy + dz * dz) / (size as f32)).exp();
                ramp + blob
            })
            .collect();
        let tensor = Tensor::from_data(
            TensorData::new(data, Shape::new([size, size, size])),
            &device,
        );
        Volume::new(
            tensor,
            Point3::new([0.0, 0.0, 0.0]),
            Spacing3::new([1.0, 1.0, 1.0]),
            Direction3::identity(),
        )
        .unwrap()
    }

    fn module_for(translation: [f64; 3]) -> AffineModule<TestBackend> {
        let device = Default::default();
        let affine = Affine::new(
            Matrix3::identity(),
            Vector3::new(translation),
            Point3::new([0.0, 0.0, 0.0]),
        )
        .unwrap();
        AffineModule::from_affine(&affine, &device)
    }

    #[test]
    fn test_aligned_beats_misaligned() {
        let volume = smooth_volume(12);
        let metric = MattesMutualInformation::new(32, 2048, 42);

        let aligned = metric
            .forward(&volume, &volume, &module_for([0.0, 0.0, 0.0]))
            .unwrap()
            .into_scalar();
        let shifted = metric
            .forward(&volume, &volume, &module_for([3.0, 0.0, 0.0]))
            .unwrap()
            .into_scalar();

        assert!(aligned.is_finite());
        assert!(shifted.is_finite());
        // Self-alignment has maximal MI, i.e. minimal loss
        assert!(aligned < shifted);
        // MI of a structured volume with itself is positive
        assert!(aligned < 0.0);
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let volume = smooth_volume(10);
        let metric = MattesMutualInformation::new(32, 1024, 7);
        let transform = module_for([1.0, 0.0, 0.0]);

        let a = metric.forward(&volume, &volume, &transform).unwrap().into_scalar();
        let b = metric.forward(&volume, &volume, &transform).unwrap().into_scalar();
        assert_eq!(a, b);
    }

    #[test]
    fn test_no_overlap_is_rejected() {
        let volume = smooth_volume(8);
        let metric = MattesMutualInformation::new(32, 512, 42);
        let result = metric.forward(&volume, &volume, &module_for([1000.0, 0.0, 0.0]));
        assert!(matches!(result, Err(MetricError::NoOverlap)));
    }

    #[test]
    fn test_partial_overlap_is_rejected() {
        let volume = smooth_volume(8);
        let metric =
            MattesMutualInformation::new(32, 512, 42).with_min_overlap_fraction(0.9);
        let result = metric.forward(&volume, &volume, &module_for([4.0, 4.0, 0.0]));
        assert!(matches!(
            result,
            Err(MetricError::InsufficientOverlap { .. })
        ));
    }

    #[test]
    fn test_constant_volume_is_degenerate() {
        let device = Default::default();
        let flat = Volume::<TestBackend>::from_samples(
            vec![1.0; 512],
            [8, 8, 8],
            Point3::new([0.0, 0.0, 0.0]),
            Spacing3::new([1.0, 1.0, 1.0]),
            Direction3::identity(),
            &device,
        )
        .unwrap();

        let metric = MattesMutualInformation::new(32, 512, 42);
        let result = metric.forward(&flat, &flat, &module_for([0.0, 0.0, 0.0]));
        assert!(matches!(
            result,
            Err(MetricError::DegenerateHistogram { .. })
        ));
    }

    #[test]
    fn test_parzen_rows_sum_to_one() {
        let device: <TestBackend as burn::tensor::backend::Backend>::Device = Default::default();
        let metric = MattesMutualInformation::new(16, 8, 42);

        // Interior coordinates, away from the range ends
        let coords = Tensor::<TestBackend, 1>::from_data(
            TensorData::new(vec![4.0f32, 5.5, 7.25, 9.9], Shape::new([4])),
            &device,
        );
        let weights = metric.parzen_weights(coords);
        let sums = weights.sum_dim(1).into_data().to_vec::<f32>().unwrap();
        for sum in sums {
            assert!((sum - 1.0).abs() < 1e-4);
        }
    }
}
