//! Cross-type coordinate mapping properties: volume geometry, affine
//! transforms and their tensor counterparts must agree with each other.

use burn::tensor::Tensor;
use burn_ndarray::NdArray;
use nalgebra::Matrix3;
use voxreg_core::spatial::{Direction3, Point3, Spacing3, Vector3};
use voxreg_core::transform::{Affine, AffineModule, Transform};
use voxreg_core::volume::Volume;

type TestBackend = NdArray<f32>;

#[test]
fn affine_roundtrip_through_volume_frames() {
    let device = Default::default();
    let data = Tensor::<TestBackend, 3>::zeros([6, 6, 6], &device);
    let volume = Volume::new(
        data,
        Point3::new([-10.0, 5.0, 2.0]),
        Spacing3::new([2.0, 1.5, 1.0]),
        Direction3::identity(),
    )
    .unwrap();

    let affine = Affine::new(
        Matrix3::new(0.95, 0.1, 0.0, -0.1, 1.05, 0.0, 0.0, 0.0, 1.0),
        Vector3::new([4.0, -3.0, 2.0]),
        volume.geometric_center(),
    )
    .unwrap();
    let inverse = affine.inverse().unwrap();

    // index -> physical -> forward -> inverse -> physical -> index
    for index in [
        Point3::new([0.0, 0.0, 0.0]),
        Point3::new([2.5, 3.0, 1.0]),
        Point3::new([5.0, 5.0, 5.0]),
    ] {
        let physical = volume.index_to_physical(&index);
        let mapped = affine.map_forward(&physical);
        let unmapped = inverse.map_forward(&mapped);
        let back = volume.physical_to_index(&unmapped);
        for i in 0..3 {
            assert!((back[i] - index[i]).abs() < 1e-9, "axis {i}");
        }
    }
}

#[test]
fn tensor_transform_agrees_with_scalar_transform() {
    let device = Default::default();
    let affine = Affine::new(
        Matrix3::new(1.1, -0.2, 0.05, 0.2, 0.9, 0.0, 0.0, 0.1, 1.0),
        Vector3::new([7.0, 0.5, -2.0]),
        Point3::new([3.0, 3.0, 3.0]),
    )
    .unwrap();
    let module = AffineModule::<TestBackend>::from_affine(&affine, &device);

    let points = [
        Point3::new([0.0, 0.0, 0.0]),
        Point3::new([1.0, -5.0, 8.0]),
        Point3::new([3.0, 3.0, 3.0]),
    ];
    let batch = Tensor::<TestBackend, 2>::from_floats(
        [
            [0.0, 0.0, 0.0],
            [1.0, -5.0, 8.0],
            [3.0, 3.0, 3.0],
        ],
        &device,
    );
    let mapped = module.transform_points(batch);
    let data = mapped.into_data();
    let slice = data.as_slice::<f32>().unwrap();

    for (row, point) in points.iter().enumerate() {
        let expected = affine.map_forward(point);
        for i in 0..3 {
            assert!(
                (slice[row * 3 + i] as f64 - expected[i]).abs() < 1e-3,
                "row {row} axis {i}"
            );
        }
    }
}
