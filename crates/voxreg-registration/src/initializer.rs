//! Geometry-based transform initialization.

use burn::tensor::backend::Backend;
use nalgebra::Matrix3;

use voxreg_core::transform::Affine;
use voxreg_core::volume::Volume;
use voxreg_core::InputError;

/// Build the centered starting transform for a registration run.
///
/// The transform is an identity matrix centered on the moving volume's
/// geometric center, with a translation that maps the fixed volume's center
/// onto the moving volume's center. Centers are bounding-box midpoints, not
/// intensity centroids, so the initializer ignores image content entirely.
pub fn centered_affine<B: Backend>(
    fixed: &Volume<B>,
    moving: &Volume<B>,
) -> Result<Affine, InputError> {
    let fixed_center = fixed.geometric_center();
    let moving_center = moving.geometric_center();

    // Forward convention maps fixed-space points into moving space, so the
    // centering translation is moving_center - fixed_center.
    let translation = moving_center - fixed_center;

    Affine::new(Matrix3::identity(), translation, moving_center)
}
