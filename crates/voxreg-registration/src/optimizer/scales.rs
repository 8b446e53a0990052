//! Parameter scales for gradient descent over affine parameters.

use burn::tensor::backend::Backend;

use voxreg_core::spatial::Point3;
use voxreg_core::volume::Volume;

/// Per-parameter scale factors for an affine transform.
///
/// Gradient steps divide each parameter's gradient by its scale, putting
/// matrix entries (unitless) and translations (physical units) on a common
/// footing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformScales {
    /// Scales for the nine matrix entries, row-major.
    pub matrix: [[f64; 3]; 3],
    /// Scales for the three translation components.
    pub translation: [f64; 3],
}

const MIN_SCALE: f64 = 1e-8;

impl TransformScales {
    /// Unit scales for every parameter.
    pub fn identity() -> Self {
        Self {
            matrix: [[1.0; 3]; 3],
            translation: [1.0; 3],
        }
    }

    /// Estimate scales from the physical shift each parameter induces over
    /// the fixed volume's domain.
    ///
    /// A unit change of matrix entry `(i, j)` moves a point `x` by
    /// `|x_j - c_j|` along axis `i`; the scale is the square of the largest
    /// such shift over the fixed volume's eight physical corners. A unit
    /// change of a translation component moves every point by exactly one
    /// unit, so translation scales stay at 1.
    pub fn physical_shift<B: Backend>(fixed: &Volume<B>, center: &Point3) -> Self {
        let [nz, ny, nx] = fixed.extent();
        let mut max_offset = [0.0f64; 3];

        for &z in &[0.0, nz as f64 - 1.0] {
            for &y in &[0.0, ny as f64 - 1.0] {
                for &x in &[0.0, nx as f64 - 1.0] {
                    let corner = fixed.index_to_physical(&Point3::new([x, y, z]));
                    for j in 0..3 {
                        let offset = (corner[j] - center[j]).abs();
                        if offset > max_offset[j] {
                            max_offset[j] = offset;
                        }
                    }
                }
            }
        }

        let mut matrix = [[0.0; 3]; 3];
        for row in matrix.iter_mut() {
            for (j, entry) in row.iter_mut().enumerate() {
                *entry = (max_offset[j] * max_offset[j]).max(MIN_SCALE);
            }
        }

        Self {
            matrix,
            translation: [1.0; 3],
        }
    }
}
