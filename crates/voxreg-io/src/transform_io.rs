//! Serialization of affine transforms to JSON files.
//!
//! The format is a plain JSON object holding the matrix, translation and
//! center in f64, so a saved transform reloads bit-exactly.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use voxreg_core::transform::Affine;

use crate::error::{IoError, IoResult};

/// Write an affine transform as pretty-printed JSON.
pub fn write_transform<P: AsRef<Path>>(path: P, transform: &Affine) -> IoResult<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| IoError::file(path, e))?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, transform)
        .map_err(|e| IoError::invalid_transform(path, e.to_string()))?;
    Ok(())
}

/// Read an affine transform from a JSON file.
pub fn read_transform<P: AsRef<Path>>(path: P) -> IoResult<Affine> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| IoError::file(path, e))?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader).map_err(|e| IoError::invalid_transform(path, e.to_string()))
}
