//! Wavefront OBJ mesh reading and writing.
//!
//! Only `v` (vertex position) and `f` (triangular face) records are
//! interpreted; normals, texture coordinates, comments and unknown records
//! are skipped. Face indices are 1-based on disk and may carry `/`-separated
//! sub-indices, of which only the vertex index is used.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use voxreg_core::mesh::Mesh;
use voxreg_core::spatial::Point3;

use crate::error::{IoError, IoResult};

/// Read a triangular mesh from an OBJ file.
///
/// Faces with more than three vertices are rejected; face indices are
/// validated against the number of vertices read so far plus the remainder
/// of the file (full-file validation happens in [`Mesh::new`]).
pub fn read_mesh<P: AsRef<Path>>(path: P) -> IoResult<Mesh> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| IoError::file(path, e))?;
    let reader = BufReader::new(file);

    let mut vertices: Vec<Point3> = Vec::new();
    let mut faces: Vec<[usize; 3]> = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line.map_err(|e| IoError::file(path, e))?;
        let mut tokens = line.split_whitespace();

        match tokens.next() {
            Some("v") => {
                let mut coords = [0.0f64; 3];
                for coord in coords.iter_mut() {
                    let token = tokens.next().ok_or_else(|| {
                        IoError::mesh_parse(path, line_no, "vertex has fewer than 3 coordinates")
                    })?;
                    *coord = token.parse::<f64>().map_err(|_| {
                        IoError::mesh_parse(
                            path,
                            line_no,
                            format!("invalid vertex coordinate '{token}'"),
                        )
                    })?;
                }
                vertices.push(Point3::new(coords));
            }
            Some("f") => {
                let mut indices = [0usize; 3];
                for slot in indices.iter_mut() {
                    let token = tokens.next().ok_or_else(|| {
                        IoError::mesh_parse(path, line_no, "face has fewer than 3 vertices")
                    })?;
                    *slot = parse_face_index(token)
                        .map_err(|message| IoError::mesh_parse(path, line_no, message))?;
                }
                if tokens.next().is_some() {
                    return Err(IoError::mesh_parse(
                        path,
                        line_no,
                        "face has more than 3 vertices; only triangles are supported",
                    ));
                }
                faces.push(indices);
            }
            // vn, vt, comments, object/group names, empty lines
            _ => {}
        }
    }

    Mesh::new(vertices, faces).map_err(IoError::from)
}

/// Write a triangular mesh as an OBJ file with `v` and `f` records.
pub fn write_mesh<P: AsRef<Path>>(path: P, mesh: &Mesh) -> IoResult<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| IoError::file(path, e))?;
    let mut writer = BufWriter::new(file);

    for vertex in mesh.vertices() {
        writeln!(writer, "v {} {} {}", vertex[0], vertex[1], vertex[2])
            .map_err(|e| IoError::file(path, e))?;
    }
    for face in mesh.faces() {
        writeln!(writer, "f {} {} {}", face[0] + 1, face[1] + 1, face[2] + 1)
            .map_err(|e| IoError::file(path, e))?;
    }
    writer.flush().map_err(|e| IoError::file(path, e))?;
    Ok(())
}

/// Parse one face token (`7`, `7/2` or `7/2/4`) into a 0-based vertex index.
fn parse_face_index(token: &str) -> Result<usize, String> {
    let vertex_part = token.split('/').next().unwrap_or(token);
    let one_based = vertex_part
        .parse::<usize>()
        .map_err(|_| format!("invalid face index '{token}'"))?;
    if one_based == 0 {
        return Err(format!("face index '{token}' is zero; OBJ indices are 1-based"));
    }
    Ok(one_based - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_file(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mesh.obj");
        std::fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn test_read_simple_mesh() {
        let (_dir, path) = write_file(
            "# a triangle\n\
             v 0 0 0\n\
             v 1 0 0\n\
             v 0 1 0\n\
             f 1 2 3\n",
        );
        let mesh = read_mesh(&path).unwrap();
        assert_eq!(mesh.vertices().len(), 3);
        assert_eq!(mesh.faces().len(), 1);
        assert_eq!(mesh.faces()[0], [0, 1, 2]);
    }

    #[test]
    fn test_slash_indices_use_vertex_part() {
        let (_dir, path) = write_file(
            "v 0 0 0\nv 1 0 0\nv 0 1 0\n\
             vn 0 0 1\n\
             vt 0 0\n\
             f 1/1/1 2/1/1 3/1/1\n",
        );
        let mesh = read_mesh(&path).unwrap();
        assert_eq!(mesh.faces()[0], [0, 1, 2]);
    }

    #[test]
    fn test_zero_index_is_rejected_with_line() {
        let (_dir, path) = write_file("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 0 1 2\n");
        let err = read_mesh(&path).unwrap_err();
        match err {
            IoError::MeshParse { line, .. } => assert_eq!(line, 4),
            other => panic!("expected MeshParse, got {other:?}"),
        }
    }

    #[test]
    fn test_out_of_range_index_is_rejected() {
        let (_dir, path) = write_file("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 9\n");
        let err = read_mesh(&path).unwrap_err();
        assert!(matches!(err, IoError::Input(_)));
    }

    #[test]
    fn test_quad_face_is_rejected() {
        let (_dir, path) = write_file("v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n");
        let err = read_mesh(&path).unwrap_err();
        assert!(matches!(err, IoError::MeshParse { line: 5, .. }));
    }

    #[test]
    fn test_mesh_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("roundtrip.obj");

        let mesh = Mesh::new(
            vec![
                Point3::new([0.0, 0.0, 0.0]),
                Point3::new([1.5, 0.0, 0.0]),
                Point3::new([0.0, 2.5, 0.0]),
            ],
            vec![[0, 1, 2]],
        )
        .unwrap();

        write_mesh(&path, &mesh).unwrap();
        let loaded = read_mesh(&path).unwrap();

        assert_eq!(loaded.faces(), mesh.faces());
        for (a, b) in loaded.vertices().iter().zip(mesh.vertices()) {
            for i in 0..3 {
                assert!((a[i] - b[i]).abs() < 1e-12);
            }
        }
    }
}
