//! Manifest produced by the build pipeline.
//!
//! ```json
//! { "three": ["app.js", "src/Three.js", ...], "moment": ["app.js", ...] }
//! ```
//!
//! Each list is the project's module graph in dependency-resolved order,
//! relative to `<project>/unbundled/`.

use std::{collections::BTreeMap, fs, path::Path};

use serde::Deserialize;

use super::LoadError;
use crate::utils::path::join_route;

/// Project name → ordered module paths.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    projects: BTreeMap<String, Vec<String>>,
}

impl Manifest {
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let content = fs::read(path).map_err(|err| LoadError::io(path, err))?;
        let manifest: Self =
            serde_json::from_slice(&content).map_err(|source| LoadError::Manifest {
                path: path.to_path_buf(),
                source,
            })?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Reject empty module paths and project names that are not already
    /// normalized (`a/b` is fine, `a/../b` or `/a` is not).
    fn validate(&self) -> Result<(), LoadError> {
        for (project, modules) in &self.projects {
            if project.is_empty()
                || join_route(&[project.as_str()]).as_deref() != Some(project.as_str())
            {
                return Err(LoadError::invalid_path(project, project));
            }
            if let Some(empty) = modules.iter().find(|m| m.trim().is_empty()) {
                return Err(LoadError::invalid_path(project, empty));
            }
        }
        Ok(())
    }

    pub fn projects(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.projects
            .iter()
            .map(|(name, modules)| (name.as_str(), modules.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }
}
