//! Affine transform on physical coordinates.

use nalgebra::Matrix3;
use serde::{Deserialize, Serialize};

use crate::error::InputError;
use crate::spatial::{Point3, Vector3};

const SINGULARITY_TOLERANCE: f64 = 1e-12;

/// An invertible affine transform anchored at a center point.
///
/// Forward mapping:
///
/// `y = A(x - c) + c + t`
///
/// where `A` is the linear part, `t` the translation and `c` the fixed center
/// of the linear part. The fitted transform of a registration run maps
/// fixed-space points into moving-space points; mesh vertices defined in
/// moving space therefore go through [`Affine::map_inverse`], never the
/// forward map.
///
/// All arithmetic is f64 so that serialized transforms round-trip without
/// precision loss beyond floating-point representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Affine {
    matrix: Matrix3<f64>,
    translation: Vector3,
    center: Point3,
}

impl Affine {
    /// Create a new affine transform.
    ///
    /// # Errors
    /// [`InputError::SingularTransform`] when the linear part is not
    /// invertible.
    pub fn new(
        matrix: Matrix3<f64>,
        translation: Vector3,
        center: Point3,
    ) -> Result<Self, InputError> {
        let determinant = matrix.determinant();
        if !determinant.is_finite() || determinant.abs() < SINGULARITY_TOLERANCE {
            return Err(InputError::SingularTransform { determinant });
        }
        Ok(Self {
            matrix,
            translation,
            center,
        })
    }

    /// The identity transform anchored at `center`.
    pub fn identity(center: Point3) -> Self {
        Self {
            matrix: Matrix3::identity(),
            translation: Vector3::zeros(),
            center,
        }
    }

    /// The linear part.
    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.matrix
    }

    /// The translation.
    pub fn translation(&self) -> &Vector3 {
        &self.translation
    }

    /// The fixed center of the linear part.
    pub fn center(&self) -> &Point3 {
        &self.center
    }

    /// Determinant of the linear part.
    pub fn determinant(&self) -> f64 {
        self.matrix.determinant()
    }

    /// Map a point through the forward transform: `A(p - c) + c + t`.
    pub fn map_forward(&self, point: &Point3) -> Point3 {
        let centered = *point - self.center;
        let rotated = Vector3(self.matrix * centered.0);
        self.center + rotated + self.translation
    }

    /// Map a point through the inverse transform.
    ///
    /// # Errors
    /// [`InputError::SingularTransform`] when the linear part cannot be
    /// inverted. Callers mapping many points should invert once via
    /// [`Affine::inverse`] instead.
    pub fn map_inverse(&self, point: &Point3) -> Result<Point3, InputError> {
        Ok(self.inverse()?.map_forward(point))
    }

    /// The inverse transform.
    ///
    /// Matrix, translation and center are recomputed so that
    /// `inverse ∘ forward` is the identity within floating tolerance:
    ///
    /// `inv = (A⁻¹, -t, c + t)`
    pub fn inverse(&self) -> Result<Self, InputError> {
        let inverted = self
            .matrix
            .try_inverse()
            .ok_or(InputError::SingularTransform {
                determinant: self.determinant(),
            })?;
        Self::new(inverted, -self.translation, self.center + self.translation)
    }
}
