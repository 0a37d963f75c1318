//! MIME type detection utilities.
//!
//! Only markup and scripts are served.

use std::path::Path;

/// Common MIME type constants.
pub mod types {
    pub const HTML: &str = "text/html";
    pub const JAVASCRIPT: &str = "application/javascript";
    pub const OCTET_STREAM: &str = "application/octet-stream";
    pub const PLAIN_TEXT: &str = "text/plain; charset=utf-8";
}

/// Content encoding applied to every stored payload.
pub const GZIP_ENCODING: &str = "gzip";

/// Guess MIME type from a route key or file path.
pub fn from_path(path: impl AsRef<Path>) -> &'static str {
    from_extension(path.as_ref().extension().and_then(|e| e.to_str()))
}

/// Guess MIME type from file extension string.
pub fn from_extension(ext: Option<&str>) -> &'static str {
    match ext {
        Some("html" | "htm") => types::HTML,
        Some("js" | "mjs" | "cjs") => types::JAVASCRIPT,
        _ => types::OCTET_STREAM,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path() {
        assert_eq!(from_path("index.html"), types::HTML);
        assert_eq!(from_path("three/unbundled.html"), types::HTML);
        assert_eq!(from_path("three/unbundled/app.js"), types::JAVASCRIPT);
        assert_eq!(from_path("lib/module.mjs"), types::JAVASCRIPT);
        assert_eq!(from_path("filelist.json"), types::OCTET_STREAM);
        assert_eq!(from_path("README"), types::OCTET_STREAM);
    }
}
