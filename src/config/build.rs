//! `[build]` section configuration.
//!
//! Describes where the external build pipeline left its output.
//!
//! # Example
//!
//! ```toml
//! [build]
//! dist = "dist"                                   # Build output root
//! manifest = "dist/filelist.json"                 # Defaults to <dist>/filelist.json
//! root_documents = ["index.html", "display-results.js"]
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::ConfigDiagnostics;

/// Manifest file name inside the dist directory.
pub const MANIFEST_FILE: &str = "filelist.json";

/// Build output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Build output root.
    pub dist: PathBuf,

    /// Manifest path. `None` means `<dist>/filelist.json`.
    pub manifest: Option<PathBuf>,

    /// Project-independent files served from the dist root.
    pub root_documents: Vec<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            dist: PathBuf::from("dist"),
            manifest: None,
            root_documents: vec!["index.html".into(), "display-results.js".into()],
        }
    }
}

impl BuildConfig {
    /// Build config rooted at `dist`, with default root documents.
    #[cfg(test)]
    pub fn with_dist(dist: impl Into<PathBuf>) -> Self {
        Self {
            dist: dist.into(),
            ..Self::default()
        }
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.manifest
            .clone()
            .unwrap_or_else(|| self.dist.join(MANIFEST_FILE))
    }

    /// Resolve a route key to its file under the dist root.
    pub fn source_path(&self, route: &str) -> PathBuf {
        route
            .split('/')
            .fold(self.dist.clone(), |path, segment| path.join(segment))
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        for doc in &self.root_documents {
            if doc.is_empty() {
                diag.error("build.root_documents", "entries must not be empty");
            } else if Path::new(doc).is_absolute() || doc.split('/').any(|s| s == "..") {
                diag.error_with_hint(
                    "build.root_documents",
                    format!("`{doc}` must stay inside the dist directory"),
                    "use a path relative to `build.dist`",
                );
            }
        }
    }
}
