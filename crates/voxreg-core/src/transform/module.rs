//! Tensor-backed affine transform used during optimization and resampling.

use burn::module::{Module, Param};
use burn::tensor::backend::Backend;
use burn::tensor::{Tensor, TensorData};
use nalgebra::Matrix3;

use super::affine::Affine;
use super::Transform;
use crate::spatial::{Point3, Vector3};

/// Affine transform as a burn [`Module`].
///
/// The matrix and translation are trainable parameters; the center is a
/// constant tensor. This is the representation the registration engine
/// optimizes; it converts to and from the f64 [`Affine`] artifact at the run
/// boundaries.
#[derive(Module, Debug)]
pub struct AffineModule<B: Backend> {
    /// `[3, 3]` linear part.
    matrix: Param<Tensor<B, 2>>,
    /// `[3]` translation.
    translation: Param<Tensor<B, 1>>,
    /// `[3]` fixed center of the linear part.
    center: Tensor<B, 1>,
}

impl<B: Backend> AffineModule<B> {
    /// Create a new module from raw tensors.
    pub fn new(matrix: Tensor<B, 2>, translation: Tensor<B, 1>, center: Tensor<B, 1>) -> Self {
        Self {
            matrix: Param::from_tensor(matrix),
            translation: Param::from_tensor(translation),
            center,
        }
    }

    /// Build the tensor representation of an [`Affine`].
    pub fn from_affine(affine: &Affine, device: &B::Device) -> Self {
        let mut matrix_data = Vec::with_capacity(9);
        for r in 0..3 {
            for c in 0..3 {
                matrix_data.push(affine.matrix()[(r, c)] as f32);
            }
        }
        let matrix = Tensor::<B, 1>::from_data(
            TensorData::new(matrix_data, burn::tensor::Shape::new([9])),
            device,
        )
        .reshape([3, 3]);

        let translation_data: Vec<f32> =
            (0..3).map(|i| affine.translation()[i] as f32).collect();
        let translation = Tensor::<B, 1>::from_data(
            TensorData::new(translation_data, burn::tensor::Shape::new([3])),
            device,
        );

        let center_data: Vec<f32> = (0..3).map(|i| affine.center()[i] as f32).collect();
        let center = Tensor::<B, 1>::from_data(
            TensorData::new(center_data, burn::tensor::Shape::new([3])),
            device,
        );

        Self::new(matrix, translation, center)
    }

    /// Read the current parameters back into an f64 [`Affine`].
    ///
    /// The matrix may have drifted during optimization; a singular matrix is
    /// surfaced as the [`crate::error::InputError::SingularTransform`] it is.
    pub fn to_affine(&self) -> crate::error::Result<Affine> {
        let matrix_vec = tensor_to_f64(self.matrix.val().reshape([9]));
        let translation_vec = tensor_to_f64(self.translation.val());
        let center_vec = tensor_to_f64(self.center.clone());

        let matrix = Matrix3::from_row_slice(&matrix_vec);
        let translation =
            Vector3::new([translation_vec[0], translation_vec[1], translation_vec[2]]);
        let center = Point3::new([center_vec[0], center_vec[1], center_vec[2]]);
        Affine::new(matrix, translation, center)
    }

    /// The `[3, 3]` linear part.
    pub fn matrix(&self) -> Tensor<B, 2> {
        self.matrix.val()
    }

    /// The `[3]` translation.
    pub fn translation(&self) -> Tensor<B, 1> {
        self.translation.val()
    }

    /// The `[3]` center.
    pub fn center(&self) -> Tensor<B, 1> {
        self.center.clone()
    }
}

fn tensor_to_f64<B: Backend, const D: usize>(tensor: Tensor<B, D>) -> Vec<f64> {
    tensor
        .into_data()
        .convert::<f64>()
        .to_vec::<f64>()
        .expect("tensor data converts to f64")
}

impl<B: Backend> Transform<B> for AffineModule<B> {
    fn transform_points(&self, points: Tensor<B, 2>) -> Tensor<B, 2> {
        // T(x) = A(x - c) + c + t, in row-vector form: (x - c) @ A^T + c + t
        let c = self.center.clone().reshape([1, 3]);
        let t = self.translation.val().reshape([1, 3]);
        let a = self.matrix.val();

        let centered = points - c.clone();
        let rotated = centered.matmul(a.transpose());

        rotated + c + t
    }
}
