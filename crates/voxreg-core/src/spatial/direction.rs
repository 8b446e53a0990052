//! Direction cosine matrix describing the orientation of a volume's axes.

use nalgebra::Matrix3;
use serde::{Deserialize, Serialize};

use super::Vector3;

/// Orientation of a volume's axes in physical space.
///
/// Columns are the physical directions of the index axes. A valid direction
/// matrix is orthonormal (determinant ±1 up to floating tolerance).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Direction3(pub Matrix3<f64>);

impl Direction3 {
    /// The identity orientation (index axes aligned with physical axes).
    pub fn identity() -> Self {
        Self(Matrix3::identity())
    }

    /// Build from normalized column vectors.
    pub fn from_columns(columns: [nalgebra::Vector3<f64>; 3]) -> Self {
        Self(Matrix3::from_columns(&columns))
    }

    /// Determinant of the orientation matrix.
    pub fn determinant(&self) -> f64 {
        self.0.determinant()
    }

    /// True when the matrix is orthonormal within `tolerance`.
    pub fn is_orthonormal(&self, tolerance: f64) -> bool {
        let product = self.0 * self.0.transpose();
        let identity = Matrix3::identity();
        (product - identity).iter().all(|x| x.abs() <= tolerance)
    }

    /// Inverse orientation, if the matrix is invertible.
    pub fn try_inverse(&self) -> Option<Self> {
        self.0.try_inverse().map(Self)
    }

    /// The inner nalgebra matrix.
    pub fn inner(&self) -> &Matrix3<f64> {
        &self.0
    }
}

impl std::ops::Index<(usize, usize)> for Direction3 {
    type Output = f64;

    fn index(&self, index: (usize, usize)) -> &Self::Output {
        &self.0[index]
    }
}

impl std::ops::Mul<Vector3> for Direction3 {
    type Output = Vector3;

    fn mul(self, vector: Vector3) -> Self::Output {
        Vector3(self.0 * vector.0)
    }
}
