//! Triangulated surface mesh and vertex transformation.

use rayon::prelude::*;

use crate::error::InputError;
use crate::spatial::Point3;
use crate::transform::Affine;

/// A triangulated surface mesh.
///
/// Vertices keep their insertion order (index = position, 0-based); faces are
/// triples of vertex indices. Transforming a mesh only rewrites vertex
/// coordinates; connectivity is never reordered or mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    vertices: Vec<Point3>,
    faces: Vec<[usize; 3]>,
}

impl Mesh {
    /// Create a mesh, validating that every face references existing vertices.
    ///
    /// # Errors
    /// [`InputError::FaceIndexOutOfRange`] naming the first offending face.
    pub fn new(vertices: Vec<Point3>, faces: Vec<[usize; 3]>) -> Result<Self, InputError> {
        for (face, indices) in faces.iter().enumerate() {
            for &index in indices {
                if index >= vertices.len() {
                    return Err(InputError::FaceIndexOutOfRange {
                        face,
                        index,
                        vertex_count: vertices.len(),
                    });
                }
            }
        }
        Ok(Self { vertices, faces })
    }

    /// The vertices in insertion order.
    pub fn vertices(&self) -> &[Point3] {
        &self.vertices
    }

    /// The triangular faces as 0-based vertex index triples.
    pub fn faces(&self) -> &[[usize; 3]] {
        &self.faces
    }

    /// Apply a transform's forward mapping to every vertex.
    ///
    /// Vertices are independent, so the map runs in parallel. Faces pass
    /// through unchanged. To express a moving-space mesh in fixed space,
    /// call this with the *inverse* of the fitted fixed-to-moving transform.
    pub fn transform_vertices(&self, transform: &Affine) -> Self {
        let vertices = self
            .vertices
            .par_iter()
            .map(|v| transform.map_forward(v))
            .collect();
        Self {
            vertices,
            faces: self.faces.clone(),
        }
    }
}
