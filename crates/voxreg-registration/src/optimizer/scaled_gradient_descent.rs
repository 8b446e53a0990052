//! Scaled gradient descent over affine transform parameters.

use burn::tensor::backend::AutodiffBackend;
use burn::tensor::{Shape, Tensor, TensorData};

use voxreg_core::transform::AffineModule;

use super::scales::TransformScales;

/// Plain gradient descent with per-parameter scaling.
///
/// Each step applies `p <- p - lr * g / scale` to the matrix and translation
/// parameters. With [`TransformScales::physical_shift`] scales this damps
/// the matrix entries, whose gradients are amplified by the physical size of
/// the fixed volume, relative to the translation.
pub struct ScaledGradientDescent {
    learning_rate: f64,
    scales: TransformScales,
}

impl ScaledGradientDescent {
    /// Create an optimizer with unit scales.
    pub fn new(learning_rate: f64) -> Self {
        Self {
            learning_rate,
            scales: TransformScales::identity(),
        }
    }

    /// Replace the parameter scales.
    pub fn with_scales(mut self, scales: TransformScales) -> Self {
        self.scales = scales;
        self
    }

    /// The configured step length.
    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    /// Take one descent step, consuming the module and returning its
    /// updated successor.
    ///
    /// Parameters without a gradient in `grads` are left unchanged.
    pub fn step<B: AutodiffBackend>(
        &self,
        module: AffineModule<B>,
        grads: &B::Gradients,
    ) -> AffineModule<B> {
        let device = module.matrix().device();

        let matrix = module.matrix();
        let new_matrix_inner = match matrix.grad(grads) {
            Some(grad) => {
                let mut scale_data = Vec::with_capacity(9);
                for row in self.scales.matrix {
                    for scale in row {
                        scale_data.push((self.learning_rate / scale) as f32);
                    }
                }
                let step = Tensor::<B::InnerBackend, 1>::from_data(
                    TensorData::new(scale_data, Shape::new([9])),
                    &device,
                )
                .reshape([3, 3]);
                matrix.inner() - grad * step
            }
            None => matrix.inner(),
        };

        let translation = module.translation();
        let new_translation_inner = match translation.grad(grads) {
            Some(grad) => {
                let scale_data: Vec<f32> = self
                    .scales
                    .translation
                    .iter()
                    .map(|scale| (self.learning_rate / scale) as f32)
                    .collect();
                let step = Tensor::<B::InnerBackend, 1>::from_data(
                    TensorData::new(scale_data, Shape::new([3])),
                    &device,
                );
                translation.inner() - grad * step
            }
            None => translation.inner(),
        };

        AffineModule::new(
            Tensor::from_inner(new_matrix_inner),
            Tensor::from_inner(new_translation_inner),
            module.center(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::Autodiff;
    use burn_ndarray::NdArray;
    use nalgebra::Matrix3;
    use voxreg_core::spatial::{Point3, Vector3};
    use voxreg_core::transform::{Affine, Transform};

    type TestBackend = Autodiff<NdArray<f32>>;

    fn identity_module() -> AffineModule<TestBackend> {
        let device = Default::default();
        let affine = Affine::new(
            Matrix3::identity(),
            Vector3::new([0.0, 0.0, 0.0]),
            Point3::new([0.0, 0.0, 0.0]),
        )
        .unwrap();
        AffineModule::from_affine(&affine, &device)
    }

    #[test]
    fn test_step_descends_translation() {
        let device = Default::default();
        let module = identity_module();

        // loss = sum(T(p)) over a single point; d(loss)/d(t_i) = 1
        let point = Tensor::<TestBackend, 2>::from_data(
            TensorData::new(vec![1.0f32, 2.0, 3.0], Shape::new([1, 3])),
            &device,
        );
        let loss = module.transform_points(point).sum();
        let grads = loss.backward();

        let optimizer = ScaledGradientDescent::new(0.5);
        let updated = optimizer.step(module, &grads);
        let affine = updated.to_affine().unwrap();

        for i in 0..3 {
            assert!((affine.translation()[i] + 0.5).abs() < 1e-5);
        }
    }

    #[test]
    fn test_scales_damp_matrix_step() {
        let device = Default::default();
        let module = identity_module();

        let point = Tensor::<TestBackend, 2>::from_data(
            TensorData::new(vec![2.0f32, 2.0, 2.0], Shape::new([1, 3])),
            &device,
        );
        let loss = module.transform_points(point).sum();
        let grads = loss.backward();

        let scales = TransformScales {
            matrix: [[100.0; 3]; 3],
            translation: [1.0; 3],
        };
        let optimizer = ScaledGradientDescent::new(1.0).with_scales(scales);
        let updated = optimizer.step(module, &grads);
        let affine = updated.to_affine().unwrap();

        // Matrix gradient is 2.0 per entry, damped by 100
        assert!((affine.matrix()[(0, 0)] - (1.0 - 0.02)).abs() < 1e-5);
        // Translation steps at full length
        assert!((affine.translation()[0] + 1.0).abs() < 1e-5);
    }
}
