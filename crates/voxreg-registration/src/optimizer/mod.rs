//! Optimizers for transform parameters.

pub mod scaled_gradient_descent;
pub mod scales;

pub use scaled_gradient_descent::ScaledGradientDescent;
pub use scales::TransformScales;
