//! Asset reference helpers for markup rewriting.

/// Check if a reference points off-site.
///
/// Covers `scheme://host/...`, protocol-relative `//host/...`, and
/// scheme-only links such as `data:` or `mailto:`.
#[inline]
pub fn is_external_ref(link: &str) -> bool {
    if link.starts_with("//") {
        return true;
    }
    link.find(':').is_some_and(|pos| {
        pos > 0
            && link[..pos]
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}

/// Split a reference into its path and the `?query#fragment` suffix.
///
/// ```ignore
/// assert_eq!(split_suffix("css/a.css?x=1#top"), ("css/a.css", "?x=1#top"));
/// ```
#[inline]
pub fn split_suffix(link: &str) -> (&str, &str) {
    match link.find(['?', '#']) {
        Some(pos) => link.split_at(pos),
        None => (link, ""),
    }
}

/// Whether a query string already carries the given key.
pub fn query_has_key(suffix: &str, key: &str) -> bool {
    let query = suffix
        .strip_prefix('?')
        .map(|q| q.split('#').next().unwrap_or(""))
        .unwrap_or("");
    query
        .split('&')
        .any(|pair| pair.split('=').next() == Some(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_external_ref() {
        assert!(is_external_ref("https://cdn.example.com/a.js"));
        assert!(is_external_ref("//cdn.example.com/a.js"));
        assert!(is_external_ref("data:text/css,a{}"));
        assert!(!is_external_ref("css/style.min.css"));
        assert!(!is_external_ref("/js/script.js"));
        assert!(!is_external_ref("./js/script.js"));
    }

    #[test]
    fn test_split_suffix() {
        assert_eq!(split_suffix("css/a.css?x=1#top"), ("css/a.css", "?x=1#top"));
        assert_eq!(split_suffix("js/a.js#frag"), ("js/a.js", "#frag"));
        assert_eq!(split_suffix("js/a.js"), ("js/a.js", ""));
    }

    #[test]
    fn test_query_has_key() {
        assert!(query_has_key("?_v=123", "_v"));
        assert!(query_has_key("?a=1&_v=2#x", "_v"));
        assert!(!query_has_key("?a=1", "_v"));
        assert!(!query_has_key("", "_v"));
        assert!(!query_has_key("#_v", "_v"));
    }
}
