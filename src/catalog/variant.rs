//! Build variants produced per project by the external pipeline.

use std::fmt;

use crate::utils::path::join_route;

/// Script every project's module graph starts from.
pub const ENTRY_SCRIPT: &str = "app.js";

/// One of the three asset layouts built for each project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildVariant {
    /// One file per module, dependencies fetched individually.
    Unbundled,
    /// Single concatenated file, not tree-shaken.
    BundledUnoptimized,
    /// Single tree-shaken file.
    BundledOptimized,
}

impl BuildVariant {
    pub const ALL: [Self; 3] = [
        Self::Unbundled,
        Self::BundledUnoptimized,
        Self::BundledOptimized,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unbundled => "unbundled",
            Self::BundledUnoptimized => "bundled-unoptimized",
            Self::BundledOptimized => "bundled-optimized",
        }
    }

    pub const fn is_bundled(self) -> bool {
        !matches!(self, Self::Unbundled)
    }

    /// `<project>/<variant>.html`
    pub fn markup_route(self, project: &str) -> Option<String> {
        join_route(&[project, &format!("{}.html", self.as_str())])
    }

    /// `<project>/<variant>/app.js`
    pub fn entry_route(self, project: &str) -> Option<String> {
        join_route(&[project, self.as_str(), ENTRY_SCRIPT])
    }

    /// Route of a module file inside this variant's directory.
    pub fn module_route(self, project: &str, module: &str) -> Option<String> {
        join_route(&[project, self.as_str(), module])
    }
}

impl fmt::Display for BuildVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
