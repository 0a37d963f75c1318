//! Route key utilities.
//!
//! Route keys are `/`-separated relative paths, independent of the host
//! platform's separator. They double as the on-disk location of the asset
//! relative to the dist root.

/// Strip one leading slash from a URL path
///
/// # Examples
/// ```ignore
/// assert_eq!(strip_leading_slash("/three/app.js"), "three/app.js");
/// assert_eq!(strip_leading_slash("three/app.js"), "three/app.js");
/// assert_eq!(strip_leading_slash("/"), "");
/// ```
#[inline]
pub fn strip_leading_slash(url: &str) -> &str {
    url.strip_prefix('/').unwrap_or(url)
}

/// Join route segments and resolve `.` and `..` lexically.
///
/// Empty segments collapse, so `join_route(&["a/", "/b"])` is `"a/b"`.
/// Returns `None` when a `..` climbs above the first segment's root.
pub fn join_route(parts: &[&str]) -> Option<String> {
    let mut stack: Vec<&str> = Vec::new();

    for segment in parts.iter().flat_map(|part| part.split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                stack.pop()?;
            }
            other => stack.push(other),
        }
    }

    Some(stack.join("/"))
}
