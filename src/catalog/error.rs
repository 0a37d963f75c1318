//! Catalog load errors. Every variant is fatal at startup.

use std::{io, path::PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed manifest `{}`", path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid path `{path}` in project `{project}`")]
    InvalidPath { project: String, path: String },

    #[error("route `{0}` is produced by more than one file")]
    DuplicateRoute(String),

    #[error("failed to compress `{}`", path.display())]
    Compress {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl LoadError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_path(project: &str, path: &str) -> Self {
        Self::InvalidPath {
            project: project.to_owned(),
            path: path.to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_io_error_names_path_and_keeps_source() {
        let err = LoadError::io(
            "dist/three/unbundled.html",
            io::Error::new(io::ErrorKind::NotFound, "no such file"),
        );
        assert!(err.to_string().contains("dist/three/unbundled.html"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_invalid_path_display() {
        let err = LoadError::invalid_path("moment", "../../../x.js");
        assert_eq!(
            err.to_string(),
            "invalid path `../../../x.js` in project `moment`"
        );
    }
}
