//! Error types for volume, transform and mesh I/O.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for I/O operations.
pub type IoResult<T> = Result<T, IoError>;

/// Errors raised on the collaborator boundary: reading and writing volumes,
/// transforms and meshes.
///
/// Every variant names the offending path; text-format parse errors also name
/// the line.
#[derive(Debug, Error)]
pub enum IoError {
    /// The file could not be read or written.
    #[error("failed to access {path}: {source}")]
    File {
        /// Path that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A volume file could not be decoded.
    #[error("invalid volume file {path}: {message}")]
    InvalidVolume {
        /// Path of the rejected file.
        path: PathBuf,
        /// What was wrong with it.
        message: String,
    },

    /// A transform artifact could not be decoded.
    #[error("invalid transform file {path}: {message}")]
    InvalidTransform {
        /// Path of the rejected file.
        path: PathBuf,
        /// What was wrong with it.
        message: String,
    },

    /// A mesh text line could not be parsed.
    #[error("parse error in {path} at line {line}: {message}")]
    MeshParse {
        /// Path of the rejected file.
        path: PathBuf,
        /// 1-based line number of the offending line.
        line: usize,
        /// What was wrong with it.
        message: String,
    },

    /// The parsed data violates a structural invariant.
    #[error(transparent)]
    Input(#[from] voxreg_core::InputError),
}

impl IoError {
    pub(crate) fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::File {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid_volume(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::InvalidVolume {
            path: path.into(),
            message: message.into(),
        }
    }

    pub(crate) fn invalid_transform(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::InvalidTransform {
            path: path.into(),
            message: message.into(),
        }
    }

    pub(crate) fn mesh_parse(
        path: impl Into<PathBuf>,
        line: usize,
        message: impl Into<String>,
    ) -> Self {
        Self::MeshParse {
            path: path.into(),
            line,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mesh_parse_error_names_line() {
        let err = IoError::mesh_parse("mesh.obj", 12, "expected 3 coordinates");
        let msg = err.to_string();
        assert!(msg.contains("mesh.obj"));
        assert!(msg.contains("line 12"));
    }
}
