//! `<link rel="preload">` injection for unbundled markup.

/// Closing head marker; hints go immediately before the first occurrence.
const HEAD_CLOSE: &[u8] = b"</head>";

/// One preload hint line for a script route.
pub fn preload_link(route: &str) -> String {
    format!(
        "  <link rel=\"preload\" href=\"/{route}\" as=\"script\" crossorigin=\"use-credentials\">\n"
    )
}

/// Insert one hint per route before `</head>`, in the order given.
///
/// Returns `None` when the markup has no `</head>`.
pub fn inject_preload_hints<'a>(
    content: &[u8],
    routes: impl IntoIterator<Item = &'a str>,
) -> Option<Vec<u8>> {
    let pos = content
        .windows(HEAD_CLOSE.len())
        .position(|w| w.eq_ignore_ascii_case(HEAD_CLOSE))?;

    let links: String = routes.into_iter().map(preload_link).collect();

    let mut result = Vec::with_capacity(content.len() + links.len());
    result.extend_from_slice(&content[..pos]);
    result.extend_from_slice(links.as_bytes());
    result.extend_from_slice(&content[pos..]);
    Some(result)
}
