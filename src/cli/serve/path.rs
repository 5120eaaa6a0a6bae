//! URL to filesystem path resolution.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use percent_encoding::percent_decode_str;

/// Resolve a request URL to a file under `serve_root`.
///
/// Directories resolve to their `index.html`. Anything that escapes the
/// root (`..`, symlinks pointing outside) resolves to `None`.
pub fn resolve_path(url: &str, serve_root: &Path) -> Option<PathBuf> {
    let clean = normalize_url(url)?;

    if clean.split('/').any(|segment| segment == "..") {
        return None;
    }

    let canonical = serve_root.join(&clean).canonicalize().ok()?;
    let root_canonical = serve_root.canonicalize().ok()?;
    if !canonical.starts_with(&root_canonical) {
        return None;
    }

    if canonical.is_file() {
        return Some(canonical);
    }

    if canonical.is_dir() {
        let index = canonical.join("index.html");
        if index.is_file() {
            return Some(index);
        }
    }

    None
}

/// Strip query and fragment, percent-decode, trim slashes.
fn normalize_url(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let decoded = percent_decode_str(path).decode_utf8().ok()?;
    if decoded.contains('\\') || decoded.contains('\0') {
        return None;
    }
    Some(match decoded {
        Cow::Borrowed(s) => s.trim_matches('/').to_string(),
        Cow::Owned(s) => s.trim_matches('/').to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn site() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("build/css")).unwrap();
        fs::create_dir_all(dir.path().join("build/about")).unwrap();
        fs::write(dir.path().join("build/index.html"), "<p>home</p>").unwrap();
        fs::write(dir.path().join("build/about/index.html"), "<p>about</p>").unwrap();
        fs::write(dir.path().join("build/css/style.min.css"), "a{}").unwrap();
        fs::write(dir.path().join("secret.txt"), "nope").unwrap();
        dir
    }

    #[test]
    fn test_file_and_query() {
        let dir = site();
        let root = dir.path().join("build");
        let path = resolve_path("/css/style.min.css?_v=20240101000000", &root).unwrap();
        assert!(path.ends_with("css/style.min.css"));
    }

    #[test]
    fn test_directory_index() {
        let dir = site();
        let root = dir.path().join("build");
        assert!(resolve_path("/", &root).unwrap().ends_with("index.html"));
        assert!(resolve_path("/about/", &root).unwrap().ends_with("about/index.html"));
        assert!(resolve_path("/about", &root).is_some());
    }

    #[test]
    fn test_traversal_rejected() {
        let dir = site();
        let root = dir.path().join("build");
        assert!(resolve_path("/../secret.txt", &root).is_none());
        assert!(resolve_path("/%2e%2e/secret.txt", &root).is_none());
        assert!(resolve_path("/css/..%2F..%2Fsecret.txt", &root).is_none());
    }

    #[test]
    fn test_missing() {
        let dir = site();
        let root = dir.path().join("build");
        assert!(resolve_path("/nope.html", &root).is_none());
    }
}
