//! NIfTI volume reading and writing.
//!
//! Files are `[X, Y, Z]` on disk and `[Z, Y, X]` as tensors in memory;
//! spacing, origin and direction are decoded from the sform (preferred) or
//! qform header, falling back to pixdim scaling.

use std::path::Path;

use burn::tensor::backend::Backend;
use burn::tensor::{Shape, Tensor, TensorData};
use nalgebra::Matrix3;
use ndarray::Array3;
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};

use voxreg_core::spatial::{Direction3, Point3, Spacing3};
use voxreg_core::volume::Volume;

use crate::error::{IoError, IoResult};

/// Read a 3D volume from a NIfTI file (`.nii` / `.nii.gz`).
///
/// Samples are loaded as f32 regardless of the on-disk type.
pub fn read_volume<B: Backend, P: AsRef<Path>>(path: P, device: &B::Device) -> IoResult<Volume<B>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(IoError::file(
            path,
            std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        ));
    }

    let obj = ReaderOptions::new()
        .read_file(path)
        .map_err(|e| IoError::invalid_volume(path, e.to_string()))?;
    let header = obj.header();
    let affine = header_affine(header);

    let origin = Point3::new([affine[0][3], affine[1][3], affine[2][3]]);

    // Columns of the rotation matrix, scaled by spacing
    let col0 = nalgebra::Vector3::new(affine[0][0], affine[1][0], affine[2][0]);
    let col1 = nalgebra::Vector3::new(affine[0][1], affine[1][1], affine[2][1]);
    let col2 = nalgebra::Vector3::new(affine[0][2], affine[1][2], affine[2][2]);

    let sp = [col0.norm(), col1.norm(), col2.norm()];
    let spacing = Spacing3::new(sp);

    let d0 = if sp[0] > 1e-9 { col0 / sp[0] } else { *nalgebra::Vector3::x_axis() };
    let d1 = if sp[1] > 1e-9 { col1 / sp[1] } else { *nalgebra::Vector3::y_axis() };
    let d2 = if sp[2] > 1e-9 { col2 / sp[2] } else { *nalgebra::Vector3::z_axis() };
    let direction = Direction3(Matrix3::from_columns(&[d0, d1, d2]));

    let volume = obj.into_volume();
    let array = volume
        .into_ndarray::<f32>()
        .map_err(|e| IoError::invalid_volume(path, e.to_string()))?;

    let shape = array.shape().to_vec();
    if shape.len() != 3 {
        return Err(IoError::invalid_volume(
            path,
            format!("expected a 3D volume, found {} dimensions", shape.len()),
        ));
    }
    let (nx, ny, nz) = (shape[0], shape[1], shape[2]);

    // Force row-major memory before flattening; the decoded array may be in
    // Fortran order.
    let data_vec = array.as_standard_layout().into_owned().into_raw_vec();

    let tensor = Tensor::<B, 3>::from_data(
        TensorData::new(data_vec, Shape::new([nx, ny, nz])),
        device,
    )
    .permute([2, 1, 0]);

    Volume::new(tensor, origin, spacing, direction).map_err(IoError::from)
}

/// Write a volume to a NIfTI file, preserving spacing/origin/direction via
/// the sform header.
pub fn write_volume<B: Backend, P: AsRef<Path>>(path: P, volume: &Volume<B>) -> IoResult<()> {
    use nifti::writer::WriterOptions;

    let path = path.as_ref();

    // [Z, Y, X] tensor back to NIfTI's [X, Y, Z]
    let tensor = volume.data().clone().permute([2, 1, 0]);
    let data = tensor.into_data().convert::<f32>();
    let slice = data
        .to_vec::<f32>()
        .map_err(|e| IoError::invalid_volume(path, format!("tensor data: {e:?}")))?;

    let [nz, ny, nx] = volume.extent();
    let array = Array3::from_shape_vec((nx, ny, nz), slice)
        .map_err(|e| IoError::invalid_volume(path, e.to_string()))?;

    let header = build_header(volume);
    WriterOptions::new(path)
        .reference_header(&header)
        .write_nifti(&array)
        .map_err(|e| IoError::invalid_volume(path, e.to_string()))?;

    Ok(())
}

/// Decode the index-to-physical affine from a NIfTI header.
///
/// Preference order per the NIfTI standard: sform, then qform (quaternion
/// decoding), then plain pixdim scaling.
fn header_affine(header: &NiftiHeader) -> [[f64; 4]; 4] {
    if header.sform_code > 0 {
        let r0 = header.srow_x;
        let r1 = header.srow_y;
        let r2 = header.srow_z;
        return [
            [r0[0] as f64, r0[1] as f64, r0[2] as f64, r0[3] as f64],
            [r1[0] as f64, r1[1] as f64, r1[2] as f64, r1[3] as f64],
            [r2[0] as f64, r2[1] as f64, r2[2] as f64, r2[3] as f64],
            [0.0, 0.0, 0.0, 1.0],
        ];
    }

    if header.qform_code > 0 {
        let b = header.quatern_b as f64;
        let c = header.quatern_c as f64;
        let d = header.quatern_d as f64;
        let a = (1.0 - (b * b + c * c + d * d).min(1.0)).sqrt();

        let qfac = if header.pixdim[0] == 0.0 { 1.0 } else { header.pixdim[0] as f64 };

        let r11 = a * a + b * b - c * c - d * d;
        let r12 = 2.0 * b * c - 2.0 * a * d;
        let r13 = 2.0 * b * d + 2.0 * a * c;
        let r21 = 2.0 * b * c + 2.0 * a * d;
        let r22 = a * a + c * c - b * b - d * d;
        let r23 = 2.0 * c * d - 2.0 * a * b;
        let r31 = 2.0 * b * d - 2.0 * a * c;
        let r32 = 2.0 * c * d + 2.0 * a * b;
        let r33 = a * a + d * d - c * c - b * b;

        let dx = header.pixdim[1] as f64;
        let dy = header.pixdim[2] as f64;
        let dz = header.pixdim[3] as f64 * qfac;

        return [
            [r11 * dx, r12 * dy, r13 * dz, header.quatern_x as f64],
            [r21 * dx, r22 * dy, r23 * dz, header.quatern_y as f64],
            [r31 * dx, r32 * dy, r33 * dz, header.quatern_z as f64],
            [0.0, 0.0, 0.0, 1.0],
        ];
    }

    let dx = header.pixdim[1] as f64;
    let dy = header.pixdim[2] as f64;
    let dz = header.pixdim[3] as f64;
    [
        [dx, 0.0, 0.0, 0.0],
        [0.0, dy, 0.0, 0.0],
        [0.0, 0.0, dz, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]
}

fn build_header<B: Backend>(volume: &Volume<B>) -> NiftiHeader {
    let spacing = volume.spacing();
    let origin = volume.origin();
    let direction = volume.direction();

    let mut header = NiftiHeader::default();
    header.pixdim = [
        1.0,
        spacing[0] as f32,
        spacing[1] as f32,
        spacing[2] as f32,
        0.0,
        0.0,
        0.0,
        0.0,
    ];
    header.sform_code = 1;
    header.srow_x = [
        (direction[(0, 0)] * spacing[0]) as f32,
        (direction[(0, 1)] * spacing[1]) as f32,
        (direction[(0, 2)] * spacing[2]) as f32,
        origin[0] as f32,
    ];
    header.srow_y = [
        (direction[(1, 0)] * spacing[0]) as f32,
        (direction[(1, 1)] * spacing[1]) as f32,
        (direction[(1, 2)] * spacing[2]) as f32,
        origin[1] as f32,
    ];
    header.srow_z = [
        (direction[(2, 0)] * spacing[0]) as f32,
        (direction[(2, 1)] * spacing[1]) as f32,
        (direction[(2, 2)] * spacing[2]) as f32,
        origin[2] as f32,
    ];
    header
}
