//! Transport-neutral responses.

use std::time::Duration;

use bytes::Bytes;

use crate::{
    catalog::{AssetCatalog, CatalogEntry},
    utils::mime::{GZIP_ENCODING, types},
};

/// Status, entity headers and body of one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub content_type: Option<&'static str>,
    pub encoding: Option<&'static str>,
    pub cache_control: Option<&'static str>,
    /// Length of the full body, kept for HEAD replies.
    pub content_length: usize,
    pub body: Bytes,
    /// Hold the response back this long before sending it.
    pub delay: Option<Duration>,
}

impl Reply {
    /// `404` with no headers and an empty body.
    pub fn not_found() -> Self {
        Self {
            status: 404,
            content_type: None,
            encoding: None,
            cache_control: None,
            content_length: 0,
            body: Bytes::new(),
            delay: None,
        }
    }

    /// `400` with the reason as a plain-text body.
    pub fn bad_request(reason: impl Into<String>) -> Self {
        Self::uncompressed(400, types::PLAIN_TEXT, reason.into())
    }

    /// Generated content sent as is.
    pub fn uncompressed(status: u16, content_type: &'static str, body: impl Into<Bytes>) -> Self {
        let body = body.into();
        Self {
            status,
            content_type: Some(content_type),
            encoding: None,
            cache_control: None,
            content_length: body.len(),
            body,
            delay: None,
        }
    }

    /// `200` carrying the precompressed payload.
    pub fn asset(entry: &CatalogEntry) -> Self {
        Self {
            status: 200,
            content_type: Some(entry.content_type()),
            encoding: Some(GZIP_ENCODING),
            cache_control: None,
            content_length: entry.content_length(),
            body: entry.body(),
            delay: None,
        }
    }

    /// Synthesized response for a pushed dependency.
    pub fn pushed(entry: &CatalogEntry) -> Self {
        Self {
            content_type: Some(types::JAVASCRIPT),
            ..Self::asset(entry)
        }
    }

    /// Same status and headers, no body (HEAD).
    pub fn without_body(self) -> Self {
        Self {
            body: Bytes::new(),
            ..self
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == 200
    }

    /// Entity headers, excluding `content-length` which each transport
    /// writes its own way.
    pub fn headers(&self) -> Vec<(&'static str, &'static str)> {
        let mut headers = Vec::with_capacity(4);
        if let Some(content_type) = self.content_type {
            headers.push(("content-type", content_type));
        }
        if let Some(encoding) = self.encoding {
            headers.push(("content-encoding", encoding));
            headers.push(("vary", "Accept-Encoding"));
        }
        if let Some(cache_control) = self.cache_control {
            headers.push(("cache-control", cache_control));
        }
        headers
    }
}

/// The primary response for `route`.
pub fn reply_for(catalog: &AssetCatalog, route: &str) -> Reply {
    catalog.get(route).map_or_else(Reply::not_found, Reply::asset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{AssetKind, fixture, gunzip};

    #[test]
    fn test_not_found_is_bare() {
        let reply = Reply::not_found();
        assert_eq!(reply.status, 404);
        assert!(reply.headers().is_empty());
        assert!(reply.body.is_empty());
    }

    #[test]
    fn test_asset_headers() {
        let entry = CatalogEntry::new(AssetKind::Markup, vec![0x1f, 0x8b, 0]);
        let reply = Reply::asset(&entry);
        assert_eq!(reply.status, 200);
        assert_eq!(
            reply.headers(),
            [
                ("content-type", "text/html"),
                ("content-encoding", "gzip"),
                ("vary", "Accept-Encoding"),
            ]
        );
        assert_eq!(reply.content_length, 3);
    }

    #[test]
    fn test_bad_request_is_plain_text() {
        let reply = Reply::bad_request("bad depth");
        assert_eq!(reply.status, 400);
        assert!(!reply.is_success());
        assert_eq!(reply.headers(), [("content-type", "text/plain; charset=utf-8")]);
        assert_eq!(reply.content_length, 9);
        assert_eq!(reply.body, "bad depth");
    }

    #[test]
    fn test_cache_control_header() {
        let reply = Reply {
            cache_control: Some("max-age=86400"),
            ..Reply::uncompressed(200, "application/javascript", "x")
        };
        assert_eq!(
            reply.headers(),
            [
                ("content-type", "application/javascript"),
                ("cache-control", "max-age=86400"),
            ]
        );
    }

    #[test]
    fn test_pushed_is_always_javascript() {
        let entry = CatalogEntry::new(AssetKind::Other, vec![1]);
        let reply = Reply::pushed(&entry);
        assert_eq!(reply.content_type, Some("application/javascript"));
        assert_eq!(reply.encoding, Some("gzip"));
    }

    #[test]
    fn test_without_body_keeps_length() {
        let entry = CatalogEntry::new(AssetKind::Script, vec![1, 2, 3, 4]);
        let reply = Reply::asset(&entry).without_body();
        assert!(reply.body.is_empty());
        assert_eq!(reply.content_length, 4);
        assert!(reply.is_success());
    }

    #[test]
    fn test_reply_for_catalog() {
        let (_dir, build) = fixture::write();
        let catalog = AssetCatalog::load(&build, false).unwrap();

        let reply = reply_for(&catalog, "three/unbundled/src/a.js");
        assert_eq!(reply.content_type, Some("application/javascript"));
        assert_eq!(gunzip(&reply.body), fixture::content("three/unbundled/src/a.js"));

        assert_eq!(reply_for(&catalog, "three/unbundled/src/zzz.js"), Reply::not_found());
    }
}
