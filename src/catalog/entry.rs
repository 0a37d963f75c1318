//! A single precompressed asset.

use bytes::Bytes;

use crate::utils::mime::{self, types};

/// Content classification of a served asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Markup,
    Script,
    Other,
}

impl AssetKind {
    pub fn from_route(route: &str) -> Self {
        match mime::from_path(route) {
            types::HTML => Self::Markup,
            types::JAVASCRIPT => Self::Script,
            _ => Self::Other,
        }
    }

    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Markup => types::HTML,
            Self::Script => types::JAVASCRIPT,
            Self::Other => types::OCTET_STREAM,
        }
    }

    /// Progress counter name.
    pub(super) const fn label(self) -> &'static str {
        match self {
            Self::Markup => "markup",
            Self::Script => "scripts",
            Self::Other => "other",
        }
    }
}

/// Immutable, gzip-encoded payload of one route.
///
/// `Bytes` clones share the allocation, so handing the body to several
/// streams at once costs a refcount bump.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    kind: AssetKind,
    body: Bytes,
}

impl CatalogEntry {
    pub fn new(kind: AssetKind, gzipped: Vec<u8>) -> Self {
        Self {
            kind,
            body: Bytes::from(gzipped),
        }
    }

    pub fn content_type(&self) -> &'static str {
        self.kind.content_type()
    }

    /// Compressed bytes, sent as-is with `content-encoding: gzip`.
    pub fn body(&self) -> Bytes {
        self.body.clone()
    }

    pub fn content_length(&self) -> usize {
        self.body.len()
    }
}
