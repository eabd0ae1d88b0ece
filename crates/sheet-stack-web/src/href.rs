#![forbid(unsafe_code)]

//! Href splitting and composition.
//!
//! History writes replace only the query; path and fragment must come back
//! unchanged. These helpers are platform independent so they can be tested
//! natively.

/// The three parts of a same-origin href that the navigator cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HrefParts<'a> {
    pub path: &'a str,
    /// Query without the leading `?`.
    pub query: &'a str,
    /// Fragment without the leading `#`.
    pub fragment: &'a str,
}

/// Split `href` into path, query and fragment.
///
/// A `?` after the first `#` belongs to the fragment.
#[must_use]
pub fn split_href(href: &str) -> HrefParts<'_> {
    let (rest, fragment) = href.split_once('#').unwrap_or((href, ""));
    let (path, query) = rest.split_once('?').unwrap_or((rest, ""));
    HrefParts {
        path,
        query,
        fragment,
    }
}

/// Join path, query and fragment, omitting empty separators.
#[must_use]
pub fn compose_href(path: &str, query: &str, fragment: &str) -> String {
    let query = query.strip_prefix('?').unwrap_or(query);
    let fragment = fragment.strip_prefix('#').unwrap_or(fragment);

    let mut href = String::with_capacity(path.len() + query.len() + fragment.len() + 2);
    href.push_str(path);
    if !query.is_empty() {
        href.push('?');
        href.push_str(query);
    }
    if !fragment.is_empty() {
        href.push('#');
        href.push_str(fragment);
    }
    href
}

/// `href` with its query replaced by `query`.
#[must_use]
pub fn with_query(href: &str, query: &str) -> String {
    let parts = split_href(href);
    compose_href(parts.path, query, parts.fragment)
}
