//! Request path to route key resolution.
//!
//! Pure string manipulation: no filesystem access happens per request.

use std::{borrow::Cow, sync::LazyLock};

use percent_encoding::percent_decode_str;
use regex::Regex;

use crate::utils::path::strip_leading_slash;

/// Document served for paths ending in `/`.
pub const DEFAULT_DOCUMENT: &str = "index.html";

/// Cache-busting segment the benchmark runner prepends, e.g. `r/12345/`.
static CACHE_BUST_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^r/[0-9]+/").expect("cache-busting pattern is valid"));

/// Resolve a request path (optionally with a query string) to a route key.
///
/// 1. drop the query string and percent-decode
/// 2. `.../` becomes `.../index.html`
/// 3. strip one leading `/`
/// 4. strip a leading `r/<digits>/`
pub fn resolve(request_path: &str) -> String {
    let path = request_path
        .split(['?', '#'])
        .next()
        .unwrap_or_default();

    let mut path = percent_decode_str(path)
        .decode_utf8()
        .map(Cow::into_owned)
        .unwrap_or_else(|_| path.to_owned());

    if path.ends_with('/') {
        path.push_str(DEFAULT_DOCUMENT);
    }

    let path = strip_leading_slash(&path);
    CACHE_BUST_PREFIX.replace(path, "").into_owned()
}
