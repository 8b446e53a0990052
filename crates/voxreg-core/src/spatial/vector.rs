//! Vector type for displacements in physical space.

use serde::{Deserialize, Serialize};

/// A displacement in 3D physical space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vector3(pub nalgebra::Vector3<f64>);

impl Vector3 {
    /// Create a new vector from components.
    pub fn new(components: [f64; 3]) -> Self {
        Self(nalgebra::Vector3::from(components))
    }

    /// The zero vector.
    pub fn zeros() -> Self {
        Self(nalgebra::Vector3::zeros())
    }

    /// Euclidean length.
    pub fn norm(&self) -> f64 {
        self.0.norm()
    }

    /// Components as a plain array.
    pub fn to_array(&self) -> [f64; 3] {
        [self.0.x, self.0.y, self.0.z]
    }

    /// The inner nalgebra vector.
    pub fn inner(&self) -> &nalgebra::Vector3<f64> {
        &self.0
    }
}

impl std::ops::Index<usize> for Vector3 {
    type Output = f64;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl std::ops::IndexMut<usize> for Vector3 {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.0[index]
    }
}

impl std::ops::Add for Vector3 {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Self(self.0 + other.0)
    }
}

impl std::ops::Sub for Vector3 {
    type Output = Self;

    fn sub(self, other: Self) -> Self::Output {
        Self(self.0 - other.0)
    }
}

impl std::ops::Mul<f64> for Vector3 {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self::Output {
        Self(self.0 * scalar)
    }
}

impl std::ops::Neg for Vector3 {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_arithmetic() {
        let a = Vector3::new([1.0, 2.0, 3.0]);
        let b = Vector3::new([4.0, 5.0, 6.0]);
        assert_eq!(a + b, Vector3::new([5.0, 7.0, 9.0]));
        assert_eq!(b - a, Vector3::new([3.0, 3.0, 3.0]));
        assert_eq!(a * 2.0, Vector3::new([2.0, 4.0, 6.0]));
        assert_eq!(-a, Vector3::new([-1.0, -2.0, -3.0]));
    }

    #[test]
    fn test_vector_norm() {
        let v = Vector3::new([3.0, 4.0, 0.0]);
        assert!((v.norm() - 5.0).abs() < 1e-12);
    }
}
