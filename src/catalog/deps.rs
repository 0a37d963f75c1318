//! Push candidates per unbundled entry point.

use rustc_hash::FxHashMap;

/// Entry point route → auxiliary module routes, in manifest (load) order.
///
/// Only unbundled entry points appear; bundled variants are single files.
#[derive(Debug, Clone, Default)]
pub struct DependencyIndex {
    entries: FxHashMap<String, Vec<String>>,
}

impl DependencyIndex {
    /// Record `deps` for `entry`, dropping the entry itself. Empty lists are
    /// not stored.
    pub fn insert(&mut self, entry: String, deps: impl IntoIterator<Item = String>) {
        let deps: Vec<_> = deps.into_iter().filter(|d| *d != entry).collect();
        if !deps.is_empty() {
            self.entries.insert(entry, deps);
        }
    }

    /// Dependencies in load order.
    pub fn get(&self, entry: &str) -> Option<&[String]> {
        self.entries.get(entry).map(Vec::as_slice)
    }

    /// Dependencies in push order, the reverse of manifest order.
    pub fn push_order<'a>(&'a self, entry: &str) -> impl Iterator<Item = &'a str> + use<'a> {
        self.get(entry)
            .unwrap_or_default()
            .iter()
            .rev()
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Total number of dependency edges.
    pub fn edge_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }
}
