//! Point type for positions in physical space.

use serde::{Deserialize, Serialize};

use super::Vector3;

/// A point in 3D physical space (millimetres or whatever unit the scan uses).
///
/// Thin wrapper around nalgebra's `Point3<f64>` providing the operations the
/// rest of the crate needs while keeping nalgebra reachable through
/// [`Point3::inner`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point3(pub nalgebra::Point3<f64>);

impl Point3 {
    /// Create a new point from coordinates.
    pub fn new(coords: [f64; 3]) -> Self {
        Self(nalgebra::Point3::from(coords))
    }

    /// The origin (all coordinates zero).
    pub fn origin() -> Self {
        Self(nalgebra::Point3::origin())
    }

    /// Coordinates as a plain array.
    pub fn to_array(&self) -> [f64; 3] {
        [self.0.x, self.0.y, self.0.z]
    }

    /// The inner nalgebra point.
    pub fn inner(&self) -> &nalgebra::Point3<f64> {
        &self.0
    }
}

impl std::ops::Index<usize> for Point3 {
    type Output = f64;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0.coords[index]
    }
}

impl std::ops::IndexMut<usize> for Point3 {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.0.coords[index]
    }
}

impl std::ops::Sub for Point3 {
    type Output = Vector3;

    fn sub(self, other: Self) -> Self::Output {
        Vector3(self.0.coords - other.0.coords)
    }
}

impl std::ops::Add<Vector3> for Point3 {
    type Output = Self;

    fn add(self, vector: Vector3) -> Self::Output {
        Self(self.0 + vector.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_creation() {
        let p = Point3::new([1.0, 2.0, 3.0]);
        assert_eq!(p[0], 1.0);
        assert_eq!(p[1], 2.0);
        assert_eq!(p[2], 3.0);
    }

    #[test]
    fn test_point_subtraction() {
        let p1 = Point3::new([5.0, 5.0, 5.0]);
        let p2 = Point3::new([2.0, 3.0, 4.0]);
        assert_eq!(p1 - p2, Vector3::new([3.0, 2.0, 1.0]));
    }

    #[test]
    fn test_point_vector_addition() {
        let p = Point3::new([1.0, 2.0, 3.0]);
        let v = Vector3::new([4.0, 5.0, 6.0]);
        assert_eq!(p + v, Point3::new([5.0, 7.0, 9.0]));
    }
}
