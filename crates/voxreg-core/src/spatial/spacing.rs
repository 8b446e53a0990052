//! Spacing type for physical distances between adjacent voxels.

use serde::{Deserialize, Serialize};

/// Physical distance between adjacent voxels along each axis.
///
/// All components must be strictly positive for a spacing to describe a real
/// grid; [`Spacing3::is_valid`] checks that, and `Volume` enforces it at
/// construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spacing3(pub nalgebra::Vector3<f64>);

impl Spacing3 {
    /// Create a new spacing from per-axis distances.
    pub fn new(components: [f64; 3]) -> Self {
        Self(nalgebra::Vector3::from(components))
    }

    /// Uniform spacing (same distance along every axis).
    pub fn uniform(value: f64) -> Self {
        Self::new([value, value, value])
    }

    /// True when every component is strictly positive and finite.
    pub fn is_valid(&self) -> bool {
        (0..3).all(|i| self.0[i].is_finite() && self.0[i] > 0.0)
    }

    /// Components as a plain array.
    pub fn to_array(&self) -> [f64; 3] {
        [self.0.x, self.0.y, self.0.z]
    }
}

impl std::ops::Index<usize> for Spacing3 {
    type Output = f64;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spacing_uniform() {
        assert_eq!(Spacing3::uniform(2.0), Spacing3::new([2.0, 2.0, 2.0]));
    }

    #[test]
    fn test_spacing_validity() {
        assert!(Spacing3::new([1.0, 0.5, 2.0]).is_valid());
        assert!(!Spacing3::new([1.0, 0.0, 2.0]).is_valid());
        assert!(!Spacing3::new([1.0, -0.5, 2.0]).is_valid());
        assert!(!Spacing3::new([1.0, f64::NAN, 2.0]).is_valid());
    }
}
