//! Volume type: a 3D scalar grid with physical placement metadata.

use burn::tensor::backend::Backend;
use burn::tensor::{Tensor, TensorData};

use crate::error::InputError;
use crate::spatial::{Direction3, Point3, Spacing3, Vector3};

const DIRECTION_TOLERANCE: f64 = 1e-6;

/// An immutable 3D scalar volume with physical metadata.
///
/// The tensor is stored in `[Z, Y, X]` layout. Physical metadata maps voxel
/// indices to physical coordinates:
///
/// `physical = origin + direction * (spacing ⊙ index)`
///
/// Point batches throughout the crate are `[N, 3]` tensors with `(x, y, z)`
/// columns.
///
/// # Coordinate Systems
/// * **Index space**: continuous voxel indices, `(0, 0, 0)` at the first voxel
/// * **Physical space**: continuous coordinates in the scanner's units
///
/// A `Volume` is never mutated after construction; resampling allocates a new
/// one.
#[derive(Debug, Clone)]
pub struct Volume<B: Backend> {
    data: Tensor<B, 3>,
    origin: Point3,
    spacing: Spacing3,
    direction: Direction3,
}

impl<B: Backend> Volume<B> {
    /// Create a new volume, validating the metadata invariants.
    ///
    /// # Errors
    /// * [`InputError::DegenerateVolume`] when any axis has zero voxels
    /// * [`InputError::InvalidSpacing`] when spacing is not strictly positive
    /// * [`InputError::NonOrthonormalDirection`] when the direction matrix is
    ///   not orthonormal
    pub fn new(
        data: Tensor<B, 3>,
        origin: Point3,
        spacing: Spacing3,
        direction: Direction3,
    ) -> Result<Self, InputError> {
        let dims: [usize; 3] = data.dims();
        if dims.iter().any(|&d| d == 0) {
            return Err(InputError::DegenerateVolume { extent: dims });
        }
        if !spacing.is_valid() {
            return Err(InputError::InvalidSpacing {
                spacing: spacing.to_array(),
            });
        }
        if !direction.is_orthonormal(DIRECTION_TOLERANCE) {
            return Err(InputError::NonOrthonormalDirection {
                determinant: direction.determinant(),
            });
        }
        Ok(Self {
            data,
            origin,
            spacing,
            direction,
        })
    }

    /// Build a volume from a flat `[Z, Y, X]`-ordered sample vector.
    pub fn from_samples(
        samples: Vec<f32>,
        extent: [usize; 3],
        origin: Point3,
        spacing: Spacing3,
        direction: Direction3,
        device: &B::Device,
    ) -> Result<Self, InputError> {
        let expected = extent[0] * extent[1] * extent[2];
        if samples.len() != expected {
            return Err(InputError::DataExtentMismatch {
                extent,
                expected,
                actual: samples.len(),
            });
        }
        let data = Tensor::<B, 3>::from_data(
            TensorData::new(samples, burn::tensor::Shape::new(extent)),
            device,
        );
        Self::new(data, origin, spacing, direction)
    }

    /// The sample tensor (`[Z, Y, X]`).
    pub fn data(&self) -> &Tensor<B, 3> {
        &self.data
    }

    /// Physical coordinate of voxel `(0, 0, 0)`.
    pub fn origin(&self) -> &Point3 {
        &self.origin
    }

    /// Physical distance between adjacent voxels.
    pub fn spacing(&self) -> &Spacing3 {
        &self.spacing
    }

    /// Orientation of the volume axes.
    pub fn direction(&self) -> &Direction3 {
        &self.direction
    }

    /// Extent as `[Z, Y, X]` voxel counts.
    pub fn extent(&self) -> [usize; 3] {
        self.data.dims()
    }

    /// Convert a continuous index `(x, y, z)` to a physical point.
    ///
    /// `point = origin + direction * (index * spacing)`
    pub fn index_to_physical(&self, index: &Point3) -> Point3 {
        let scaled = Vector3::new([
            index[0] * self.spacing[0],
            index[1] * self.spacing[1],
            index[2] * self.spacing[2],
        ]);
        *self.origin() + (self.direction * scaled)
    }

    /// Convert a physical point to a continuous index `(x, y, z)`.
    ///
    /// `index = (direction⁻¹ * (point - origin)) / spacing`
    ///
    /// The direction matrix is orthonormal by construction, so the inverse is
    /// its transpose.
    pub fn physical_to_index(&self, point: &Point3) -> Point3 {
        let diff = *point - self.origin;
        let rotated = Vector3(self.direction.inner().transpose() * diff.0);
        Point3::new([
            rotated[0] / self.spacing[0],
            rotated[1] / self.spacing[1],
            rotated[2] / self.spacing[2],
        ])
    }

    /// Physical midpoint of the volume's bounding box.
    ///
    /// This is the geometric center used by the centered transform
    /// initializer, derived from extents only, never intensity-weighted.
    pub fn geometric_center(&self) -> Point3 {
        let [nz, ny, nx] = self.extent();
        let mid = Point3::new([
            (nx as f64 - 1.0) / 2.0,
            (ny as f64 - 1.0) / 2.0,
            (nz as f64 - 1.0) / 2.0,
        ]);
        self.index_to_physical(&mid)
    }

    /// Batch convert continuous indices to physical points.
    ///
    /// # Arguments
    /// * `indices` - `[N, 3]` tensor with `(x, y, z)` columns
    pub fn index_to_physical_tensor(&self, indices: Tensor<B, 2>) -> Tensor<B, 2> {
        let device = indices.device();

        // point = origin + (index * spacing) @ direction^T
        let spacing_vec: Vec<f32> = (0..3).map(|i| self.spacing[i] as f32).collect();
        let spacing_tensor = Tensor::<B, 1>::from_data(
            TensorData::new(spacing_vec, burn::tensor::Shape::new([3])),
            &device,
        )
        .reshape([1, 3]);

        let scaled = indices * spacing_tensor;

        // Row-vector convention: M[r, c] = direction[c, r]
        let mut dir_data = Vec::with_capacity(9);
        for r in 0..3 {
            for c in 0..3 {
                dir_data.push(self.direction[(c, r)] as f32);
            }
        }
        let dir_t = Tensor::<B, 2>::from_data(
            TensorData::new(dir_data, burn::tensor::Shape::new([3, 3])),
            &device,
        );

        let origin_vec: Vec<f32> = (0..3).map(|i| self.origin[i] as f32).collect();
        let origin_tensor = Tensor::<B, 1>::from_data(
            TensorData::new(origin_vec, burn::tensor::Shape::new([3])),
            &device,
        )
        .reshape([1, 3]);

        scaled.matmul(dir_t) + origin_tensor
    }

    /// Batch convert physical points to continuous indices.
    ///
    /// # Arguments
    /// * `points` - `[N, 3]` tensor with `(x, y, z)` columns
    pub fn physical_to_index_tensor(&self, points: Tensor<B, 2>) -> Tensor<B, 2> {
        let device = points.device();

        // index = (point - origin) @ T with T[r, c] = direction^T[c, r] / spacing[c]
        let inv_dir = self.direction.inner().transpose();
        let mut t_data = Vec::with_capacity(9);
        for r in 0..3 {
            for c in 0..3 {
                t_data.push((inv_dir[(c, r)] / self.spacing[c]) as f32);
            }
        }
        let t_tensor = Tensor::<B, 2>::from_data(
            TensorData::new(t_data, burn::tensor::Shape::new([3, 3])),
            &device,
        );

        let origin_vec: Vec<f32> = (0..3).map(|i| self.origin[i] as f32).collect();
        let origin_tensor = Tensor::<B, 1>::from_data(
            TensorData::new(origin_vec, burn::tensor::Shape::new([3])),
            &device,
        )
        .reshape([1, 3]);

        (points - origin_tensor).matmul(t_tensor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    fn unit_volume(extent: [usize; 3]) -> Volume<TestBackend> {
        let device = Default::default();
        let data = Tensor::<TestBackend, 3>::zeros(extent, &device);
        Volume::new(
            data,
            Point3::origin(),
            Spacing3::uniform(1.0),
            Direction3::identity(),
        )
        .unwrap()
    }

    #[test]
    fn test_volume_creation() {
        let volume = unit_volume([10, 10, 10]);
        assert_eq!(volume.extent(), [10, 10, 10]);
        assert_eq!(volume.origin(), &Point3::origin());
    }

    #[test]
    fn test_zero_extent_rejected() {
        let device = Default::default();
        let data = Tensor::<TestBackend, 3>::zeros([0, 4, 4], &device);
        let result = Volume::new(
            data,
            Point3::origin(),
            Spacing3::uniform(1.0),
            Direction3::identity(),
        );
        assert!(matches!(result, Err(InputError::DegenerateVolume { .. })));
    }

    #[test]
    fn test_invalid_spacing_rejected() {
        let device = Default::default();
        let data = Tensor::<TestBackend, 3>::zeros([4, 4, 4], &device);
        let result = Volume::new(
            data,
            Point3::origin(),
            Spacing3::new([1.0, -1.0, 1.0]),
            Direction3::identity(),
        );
        assert!(matches!(result, Err(InputError::InvalidSpacing { .. })));
    }

    #[test]
    fn test_index_physical_roundtrip() {
        let device = Default::default();
        let data = Tensor::<TestBackend, 3>::zeros([10, 10, 10], &device);
        let volume = Volume::new(
            data,
            Point3::new([10.0, 20.0, 30.0]),
            Spacing3::new([2.0, 2.0, 2.0]),
            Direction3::identity(),
        )
        .unwrap();

        let index = Point3::new([3.5, 4.5, 5.5]);
        let point = volume.index_to_physical(&index);
        let back = volume.physical_to_index(&point);
        for i in 0..3 {
            assert!((index[i] - back[i]).abs() < 1e-9);
        }
        assert!((point[0] - 17.0).abs() < 1e-9);
        assert!((point[1] - 29.0).abs() < 1e-9);
        assert!((point[2] - 41.0).abs() < 1e-9);
    }

    #[test]
    fn test_geometric_center() {
        let volume = unit_volume([9, 9, 9]);
        let center = volume.geometric_center();
        for i in 0..3 {
            assert!((center[i] - 4.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_tensor_maps_match_scalar_maps() {
        let device = Default::default();
        let data = Tensor::<TestBackend, 3>::zeros([8, 8, 8], &device);
        let volume = Volume::new(
            data,
            Point3::new([1.0, 2.0, 3.0]),
            Spacing3::new([0.5, 1.0, 2.0]),
            Direction3::identity(),
        )
        .unwrap();

        let index = Point3::new([2.0, 3.0, 4.0]);
        let expected = volume.index_to_physical(&index);

        let indices =
            Tensor::<TestBackend, 2>::from_floats([[2.0, 3.0, 4.0]], &device);
        let points = volume.index_to_physical_tensor(indices);
        let data = points.into_data();
        let slice = data.as_slice::<f32>().unwrap();
        for i in 0..3 {
            assert!((slice[i] as f64 - expected[i]).abs() < 1e-5);
        }
    }
}
