//! Resampling a volume through a transform onto a target grid.

use burn::tensor::backend::Backend;
use burn::tensor::{Tensor, TensorData};

use crate::error::InputError;
use crate::interpolation::Interpolator;
use crate::spatial::{Direction3, Point3, Spacing3};
use crate::transform::Transform;
use crate::volume::Volume;

/// Resamples a volume onto a target grid.
///
/// For every voxel of the target grid the filter computes the physical
/// coordinate, maps it through the transform (forward direction, target space
/// to input space) and interpolates the input volume there. Positions outside
/// the input volume's domain receive `default_value`.
///
/// The output volume inherits the target grid's metadata. The operation is
/// pure: it never mutates the input and allocates a fresh volume.
pub struct ResampleFilter<B, T, I>
where
    B: Backend,
    T: Transform<B>,
    I: Interpolator<B>,
{
    extent: [usize; 3],
    origin: Point3,
    spacing: Spacing3,
    direction: Direction3,
    transform: T,
    interpolator: I,
    default_value: f64,
    _phantom: std::marker::PhantomData<B>,
}

impl<B, T, I> ResampleFilter<B, T, I>
where
    B: Backend,
    T: Transform<B>,
    I: Interpolator<B>,
{
    /// Create a filter targeting an explicit grid.
    pub fn new(
        extent: [usize; 3],
        origin: Point3,
        spacing: Spacing3,
        direction: Direction3,
        transform: T,
        interpolator: I,
    ) -> Self {
        Self {
            extent,
            origin,
            spacing,
            direction,
            transform,
            interpolator,
            default_value: 0.0,
            _phantom: std::marker::PhantomData,
        }
    }

    /// Create a filter whose target grid is copied from a reference volume.
    ///
    /// This is the registration use case: resample the moving volume onto the
    /// fixed volume's grid.
    pub fn from_reference(reference: &Volume<B>, transform: T, interpolator: I) -> Self {
        Self::new(
            reference.extent(),
            *reference.origin(),
            *reference.spacing(),
            *reference.direction(),
            transform,
            interpolator,
        )
    }

    /// Value used for target voxels that map outside the input volume.
    pub fn with_default_value(mut self, value: f64) -> Self {
        self.default_value = value;
        self
    }

    /// Resample `input` onto the target grid.
    pub fn apply(&self, input: &Volume<B>) -> Result<Volume<B>, InputError> {
        let device = input.data().device();
        let [nz, ny, nx] = self.extent;
        let count = nz * ny * nx;

        // 1. Full index grid of the target volume
        let target_indices = generate_grid_indices::<B>(self.extent, &device);

        // 2. Target indices -> target physical points
        let target_points = self.indices_to_physical(target_indices, &device);

        // 3. Through the transform into input physical space
        let input_points = self.transform.transform_points(target_points);

        // 4. Input physical points -> input continuous indices
        let input_indices = input.physical_to_index_tensor(input_points);

        // 5. Interpolate, then overwrite out-of-domain samples
        let values = self
            .interpolator
            .interpolate(input.data(), input_indices.clone());
        let inside = inside_mask(&input_indices, input.extent());
        let default =
            Tensor::<B, 1>::full([count], self.default_value, &device);
        let values = values.mask_where(inside.lower_elem(0.5), default);

        let output_data = values.reshape(self.extent);
        Volume::new(output_data, self.origin, self.spacing, self.direction)
    }

    fn indices_to_physical(
        &self,
        indices: Tensor<B, 2>,
        device: &B::Device,
    ) -> Tensor<B, 2> {
        // point = origin + (index * spacing) @ direction^T
        let spacing_vec: Vec<f32> = (0..3).map(|i| self.spacing[i] as f32).collect();
        let spacing_tensor = Tensor::<B, 1>::from_data(
            TensorData::new(spacing_vec, burn::tensor::Shape::new([3])),
            device,
        )
        .reshape([1, 3]);

        let scaled = indices * spacing_tensor;

        let mut dir_data = Vec::with_capacity(9);
        for r in 0..3 {
            for c in 0..3 {
                dir_data.push(self.direction[(c, r)] as f32);
            }
        }
        let dir_t = Tensor::<B, 2>::from_data(
            TensorData::new(dir_data, burn::tensor::Shape::new([3, 3])),
            device,
        );

        let origin_vec: Vec<f32> = (0..3).map(|i| self.origin[i] as f32).collect();
        let origin_tensor = Tensor::<B, 1>::from_data(
            TensorData::new(origin_vec, burn::tensor::Shape::new([3])),
            device,
        )
        .reshape([1, 3]);

        scaled.matmul(dir_t) + origin_tensor
    }
}

/// Flat `[N, 3]` grid of `(x, y, z)` indices covering `extent` (`[Z, Y, X]`).
pub fn generate_grid_indices<B: Backend>(
    extent: [usize; 3],
    device: &B::Device,
) -> Tensor<B, 2> {
    let [d, h, w] = extent;

    let z_range = Tensor::<B, 1, burn::tensor::Int>::arange(0..d as i64, device);
    let y_range = Tensor::<B, 1, burn::tensor::Int>::arange(0..h as i64, device);
    let x_range = Tensor::<B, 1, burn::tensor::Int>::arange(0..w as i64, device);

    let z_grid = z_range.reshape([d, 1, 1]).repeat(&[1, h, w]).reshape([d * h * w]);
    let y_grid = y_range.reshape([1, h, 1]).repeat(&[d, 1, w]).reshape([d * h * w]);
    let x_grid = x_range.reshape([1, 1, w]).repeat(&[d, h, 1]).reshape([d * h * w]);

    Tensor::cat(
        vec![
            x_grid.float().unsqueeze_dim(1),
            y_grid.float().unsqueeze_dim(1),
            z_grid.float().unsqueeze_dim(1),
        ],
        1,
    )
}

/// Soft in-bounds mask: 1.0 where an `(x, y, z)` index lies inside `extent`
/// (`[Z, Y, X]`), 0.0 outside.
pub fn inside_mask<B: Backend>(indices: &Tensor<B, 2>, extent: [usize; 3]) -> Tensor<B, 1> {
    let [d0, d1, d2] = extent;
    let x = indices.clone().narrow(1, 0, 1).squeeze::<1>(1);
    let y = indices.clone().narrow(1, 1, 1).squeeze::<1>(1);
    let z = indices.clone().narrow(1, 2, 1).squeeze::<1>(1);

    let in_x = x.clone().greater_equal_elem(0.0).float()
        * x.lower_equal_elem((d2 - 1) as f64).float();
    let in_y = y.clone().greater_equal_elem(0.0).float()
        * y.lower_equal_elem((d1 - 1) as f64).float();
    let in_z = z.clone().greater_equal_elem(0.0).float()
        * z.lower_equal_elem((d0 - 1) as f64).float();

    in_x * in_y * in_z
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpolation::LinearInterpolator;
    use crate::transform::{Affine, AffineModule};
    use burn::tensor::TensorData;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    fn ramp_volume(extent: [usize; 3]) -> Volume<TestBackend> {
        let device = Default::default();
        let count = extent[0] * extent[1] * extent[2];
        let data: Vec<f32> = (0..count).map(|x| x as f32).collect();
        Volume::from_samples(
            data,
            extent,
            Point3::origin(),
            Spacing3::uniform(1.0),
            Direction3::identity(),
            &device,
        )
        .unwrap()
    }

    #[test]
    fn test_identity_resample_reproduces_samples() {
        let device = Default::default();
        let volume = ramp_volume([4, 4, 4]);
        let transform =
            AffineModule::<TestBackend>::from_affine(&Affine::identity(Point3::origin()), &device);

        let filter = ResampleFilter::from_reference(&volume, transform, LinearInterpolator::new());
        let result = filter.apply(&volume).unwrap();

        let expected = volume.data().clone().into_data();
        let actual = result.data().clone().into_data();
        let expected = expected.as_slice::<f32>().unwrap();
        let actual = actual.as_slice::<f32>().unwrap();
        assert_eq!(expected.len(), actual.len());
        for i in 0..expected.len() {
            assert!(
                (expected[i] - actual[i]).abs() < 1e-5,
                "voxel {i}: {} vs {}",
                expected[i],
                actual[i]
            );
        }
    }

    #[test]
    fn test_translation_shifts_content() {
        let device = Default::default();
        // Single bright voxel at (x=2, y=2, z=2) in a 5^3 volume
        let mut data = vec![0.0f32; 125];
        data[2 * 25 + 2 * 5 + 2] = 1.0;
        let volume = Volume::from_samples(
            data,
            [5, 5, 5],
            Point3::origin(),
            Spacing3::uniform(1.0),
            Direction3::identity(),
            &device,
        )
        .unwrap();

        // Forward transform shifts target points by -1 in x, so the bright
        // voxel appears at x=3 in the output.
        let affine = Affine::new(
            nalgebra::Matrix3::identity(),
            crate::spatial::Vector3::new([-1.0, 0.0, 0.0]),
            Point3::origin(),
        )
        .unwrap();
        let transform = AffineModule::<TestBackend>::from_affine(&affine, &device);

        let filter = ResampleFilter::from_reference(&volume, transform, LinearInterpolator::new());
        let result = filter.apply(&volume).unwrap();
        let result_data = result.data().clone().into_data();
        let slice = result_data.as_slice::<f32>().unwrap();

        assert!(slice[2 * 25 + 2 * 5 + 3] > 0.9);
        assert!(slice[2 * 25 + 2 * 5 + 2] < 0.1);
    }

    #[test]
    fn test_outside_domain_gets_default_value() {
        let device = Default::default();
        let volume = ramp_volume([3, 3, 3]);

        // Shift far outside the input domain.
        let affine = Affine::new(
            nalgebra::Matrix3::identity(),
            crate::spatial::Vector3::new([100.0, 0.0, 0.0]),
            Point3::origin(),
        )
        .unwrap();
        let transform = AffineModule::<TestBackend>::from_affine(&affine, &device);

        let filter = ResampleFilter::from_reference(&volume, transform, LinearInterpolator::new())
            .with_default_value(-7.0);
        let result = filter.apply(&volume).unwrap();
        let result_data = result.data().clone().into_data();
        let slice = result_data.as_slice::<f32>().unwrap();

        assert!(slice.iter().all(|&v| (v as f64 - -7.0).abs() < 1e-6));
    }

    #[test]
    fn test_grid_indices_cover_extent() {
        let device = Default::default();
        let grid = generate_grid_indices::<TestBackend>([2, 3, 4], &device);
        assert_eq!(grid.dims(), [24, 3]);
        let data = grid.into_data();
        let slice = data.as_slice::<f32>().unwrap();
        // First row is (0, 0, 0), second is (1, 0, 0): x varies fastest.
        assert_eq!(&slice[0..3], &[0.0, 0.0, 0.0]);
        assert_eq!(&slice[3..6], &[1.0, 0.0, 0.0]);
        // Last row is (3, 2, 1).
        assert_eq!(&slice[69..72], &[3.0, 2.0, 1.0]);
    }
}
