//! Filesystem path utilities.
//!
//! - `normalize_path` - absolute form (canonicalize + lexical fallback)
//! - `relative_display` - short form for log lines
//! - `write_atomic` - temp file + rename, never leaves a partial file behind

use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

use tempfile::NamedTempFile;

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`).
/// Paths that do not exist yet are made absolute against the current
/// directory and cleaned lexically.
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        };
        clean(&absolute)
    })
}

/// Fold `.` and `..` without touching the filesystem.
fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Display `path` relative to `root` when possible, with forward slashes.
pub fn relative_display(path: &Path, root: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.to_string_lossy().replace('\\', "/")
}

/// Write `bytes` to `path` through a sibling temp file and a rename.
///
/// Parent directories are created as needed. Readers (the dev server)
/// observe either the old or the new content. The temp file name is
/// unique, so concurrent writers never share one.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;

    let mut file = NamedTempFile::new_in(parent)?;
    file.write_all(bytes)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_normalize_path_relative() {
        let normalized = normalize_path(Path::new("relative/path/file.txt"));
        assert!(normalized.is_absolute());
    }

    #[test]
    fn test_normalize_missing_path_folds_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let root = normalize_path(dir.path());
        let missing = root.join("site/../dist/./out");
        assert_eq!(normalize_path(&missing), root.join("dist/out"));
    }

    #[test]
    fn test_relative_display() {
        let root = Path::new("/site/build");
        assert_eq!(
            relative_display(Path::new("/site/build/css/style.min.css"), root),
            "css/style.min.css"
        );
        assert_eq!(
            relative_display(Path::new("/elsewhere/a.css"), root),
            "/elsewhere/a.css"
        );
    }

    #[test]
    fn test_write_atomic_creates_parents() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("css/nested/style.min.css");

        write_atomic(&target, b"a{color:red}").unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"a{color:red}");

        write_atomic(&target, b"b{color:blue}").unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"b{color:blue}");

        let entries = fs::read_dir(target.parent().unwrap()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_write_atomic_concurrent_writers() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("img/sprite.svg");

        std::thread::scope(|scope| {
            for i in 0..8 {
                let target = &target;
                scope.spawn(move || {
                    write_atomic(target, format!("writer {i}").as_bytes()).unwrap();
                });
            }
        });

        let content = fs::read_to_string(&target).unwrap();
        assert!(content.starts_with("writer "));
        assert_eq!(fs::read_dir(target.parent().unwrap()).unwrap().count(), 1);
    }
}
