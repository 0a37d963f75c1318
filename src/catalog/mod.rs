//! In-memory asset catalog.
//!
//! Everything the server can answer with is read, transformed and
//! gzip-compressed here, once, before the listener opens. The result is an
//! immutable snapshot shared by every request handler.
//!
//! # Layout read from the dist directory
//!
//! ```text
//! dist/
//! ├── filelist.json                  # manifest
//! ├── index.html                     # root documents
//! ├── display-results.js
//! └── <project>/
//!     ├── unbundled.html             # preload hints injected here
//!     ├── unbundled/<module paths>   # one file per manifest entry
//!     ├── bundled-unoptimized.html
//!     ├── bundled-unoptimized/app.js
//!     ├── bundled-optimized.html
//!     └── bundled-optimized/app.js
//! ```

mod deps;
mod encode;
mod entry;
mod error;
mod manifest;
mod preload;
mod variant;

pub use deps::DependencyIndex;
pub use entry::{AssetKind, CatalogEntry};
pub use error::LoadError;
pub use manifest::Manifest;
pub use variant::{BuildVariant, ENTRY_SCRIPT};

#[cfg(test)]
pub use encode::gunzip;

use std::fs;

use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::{config::BuildConfig, log, logger::ProgressLine, utils::path::join_route};

/// Immutable snapshot of every servable route.
#[derive(Debug, Default)]
pub struct AssetCatalog {
    entries: FxHashMap<String, CatalogEntry>,
    deps: DependencyIndex,
}

impl AssetCatalog {
    /// Load every file named by the manifest and the root documents.
    ///
    /// Fails on the first missing or unreadable file; there is no partial
    /// catalog.
    pub fn load(build: &BuildConfig, preload: bool) -> Result<Self, LoadError> {
        log!("load"; "loading files into memory...");

        let manifest = Manifest::from_path(&build.manifest_path())?;
        let plan = LoadPlan::new(&manifest, build, preload)?;

        let progress = ProgressLine::new(&plan.counts());
        let loaded = plan
            .assets
            .par_iter()
            .map(|asset| -> Result<_, LoadError> {
                let entry = asset.load(build)?;
                progress.inc(asset.kind.label());
                Ok((asset.route.clone(), entry))
            })
            .collect::<Result<Vec<_>, _>>()?;
        progress.finish();

        let catalog = Self {
            entries: loaded.into_iter().collect(),
            deps: plan.deps,
        };

        log!(
            "load";
            "done loading: {} projects, {} files, {} KiB compressed, {} entry points with {} pushable dependencies",
            manifest.len(),
            catalog.len(),
            catalog.compressed_size() / 1024,
            catalog.deps.len(),
            catalog.deps.edge_count()
        );
        Ok(catalog)
    }

    pub fn get(&self, route: &str) -> Option<&CatalogEntry> {
        self.entries.get(route)
    }

    pub fn dependencies(&self) -> &DependencyIndex {
        &self.deps
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Sum of all compressed payloads.
    pub fn compressed_size(&self) -> usize {
        self.entries.values().map(CatalogEntry::content_length).sum()
    }
}

// ============================================================================
// Load plan
// ============================================================================

/// One file to read, with its route and optional preload hints.
#[derive(Debug)]
struct PlannedAsset {
    route: String,
    kind: AssetKind,
    /// Script routes to hint, in insertion order.
    preload: Option<Vec<String>>,
}

impl PlannedAsset {
    fn load(&self, build: &BuildConfig) -> Result<CatalogEntry, LoadError> {
        let path = build.source_path(&self.route);
        let mut content = fs::read(&path).map_err(|err| LoadError::io(&path, err))?;

        if let Some(hints) = &self.preload {
            match preload::inject_preload_hints(&content, hints.iter().map(String::as_str)) {
                Some(injected) => content = injected,
                None => log!("warning"; "no </head> in {}, preload hints skipped", self.route),
            }
        }

        let gzipped =
            encode::gzip(&content).map_err(|source| LoadError::Compress { path, source })?;
        Ok(CatalogEntry::new(self.kind, gzipped))
    }
}

/// Every file to load, computed from the manifest before any I/O on assets.
#[derive(Debug, Default)]
struct LoadPlan {
    assets: Vec<PlannedAsset>,
    seen: FxHashSet<String>,
    deps: DependencyIndex,
}

impl LoadPlan {
    fn new(manifest: &Manifest, build: &BuildConfig, preload: bool) -> Result<Self, LoadError> {
        let mut plan = Self::default();

        for (project, modules) in manifest.projects() {
            plan.add_project(project, modules, preload)?;
        }

        for doc in &build.root_documents {
            let route = join_route(&[doc.as_str()]).ok_or_else(|| LoadError::invalid_path("", doc))?;
            plan.push(route, None)?;
        }

        Ok(plan)
    }

    fn add_project(
        &mut self,
        project: &str,
        modules: &[String],
        preload: bool,
    ) -> Result<(), LoadError> {
        let invalid = |path: &str| LoadError::invalid_path(project, path);
        let unbundled = BuildVariant::Unbundled;

        let mut scripts: Vec<String> = Vec::with_capacity(modules.len());
        for module in modules {
            let route = unbundled
                .module_route(project, module)
                .ok_or_else(|| invalid(module.as_str()))?;
            if scripts.contains(&route) {
                log!("warning"; "`{}` lists {} more than once, keeping the first", project, module);
                continue;
            }
            scripts.push(route);
        }

        // Unbundled markup, hinting scripts in reverse manifest order
        let markup = unbundled.markup_route(project).ok_or_else(|| invalid(project))?;
        let hints = preload.then(|| scripts.iter().rev().cloned().collect());
        self.push(markup, hints)?;

        for script in &scripts {
            self.push(script.clone(), None)?;
        }

        let entry = unbundled.entry_route(project).ok_or_else(|| invalid(project))?;
        if scripts.contains(&entry) {
            self.deps.insert(entry, scripts);
        } else {
            log!("warning"; "manifest for `{}` does not list {}, nothing to push", project, ENTRY_SCRIPT);
        }

        for variant in BuildVariant::ALL.into_iter().filter(|v| v.is_bundled()) {
            let markup = variant.markup_route(project).ok_or_else(|| invalid(project))?;
            let bundle = variant.entry_route(project).ok_or_else(|| invalid(project))?;
            self.push(markup, None)?;
            self.push(bundle, None)?;
        }

        Ok(())
    }

    fn push(&mut self, route: String, preload: Option<Vec<String>>) -> Result<(), LoadError> {
        if !self.seen.insert(route.clone()) {
            return Err(LoadError::DuplicateRoute(route));
        }
        self.assets.push(PlannedAsset {
            kind: AssetKind::from_route(&route),
            route,
            preload,
        });
        Ok(())
    }

    /// Progress counters per asset kind.
    fn counts(&self) -> [(&'static str, usize); 3] {
        let count = |kind: AssetKind| self.assets.iter().filter(|a| a.kind == kind).count();
        [AssetKind::Markup, AssetKind::Script, AssetKind::Other].map(|k| (k.label(), count(k)))
    }
}

// ============================================================================
// Test fixture (available to all modules via `crate::catalog::fixture`)
// ============================================================================
