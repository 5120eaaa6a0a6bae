//! Deterministic source tree scanning.

use super::{AssetKind, PathTable};
use crate::config::ConfigDiagnostics;
use jwalk::WalkDir;
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};

const IGNORED_FILES: &[&str] = &[".DS_Store", "Thumbs.db"];

/// One matched input and where its output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Absolute source path.
    pub path: PathBuf,
    /// Source-relative path with forward slashes (what globs match).
    pub rel: String,
    /// Absolute destination path, before any task-specific renaming.
    pub dest: PathBuf,
}

/// A part of the source tree the walk could not read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unreadable {
    /// Source-relative path, empty for the root itself.
    pub rel: String,
    pub message: String,
}

/// Matched inputs of one category plus what could not be read.
#[derive(Debug, Default)]
pub struct Scan {
    pub files: Vec<SourceFile>,
    pub unreadable: Vec<Unreadable>,
}

fn relative(path: &Path, source: &Path) -> Option<String> {
    let rel = path.strip_prefix(source).ok()?;
    Some(rel.to_string_lossy().replace('\\', "/"))
}

/// Every regular file under the source root, sorted, as `(abs, rel)`.
fn walk_source(source: &Path) -> (Vec<(PathBuf, String)>, Vec<Unreadable>) {
    if !source.is_dir() {
        return (Vec::new(), Vec::new());
    }
    let mut files = Vec::new();
    let mut unreadable = Vec::new();

    for entry in WalkDir::new(source) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let rel = e.path().and_then(|p| relative(p, source)).unwrap_or_default();
                unreadable.push(Unreadable {
                    rel,
                    message: e.to_string(),
                });
                continue;
            }
        };
        let name = entry.file_name().to_str().unwrap_or_default();
        if !entry.file_type().is_file() || IGNORED_FILES.contains(&name) {
            continue;
        }
        let path = entry.path();
        if let Some(rel) = relative(&path, source) {
            files.push((path, rel));
        }
    }

    files.sort();
    unreadable.sort_by(|a, b| a.rel.cmp(&b.rel));
    (files, unreadable)
}

/// Files of one category in sorted order.
///
/// Unreadable directories are kept only when they could hold inputs of
/// the category.
pub fn scan_category(table: &PathTable, kind: AssetKind) -> Scan {
    let category = table.category(kind);
    let dest_dir = table.dest_dir(kind);
    let (files, unreadable) = walk_source(table.source());

    let files = files
        .into_iter()
        .filter(|(_, rel)| category.matches(rel))
        .filter_map(|(path, rel)| {
            let sub = category.sub_path(&rel)?;
            Some(SourceFile {
                dest: dest_dir.join(sub),
                path,
                rel,
            })
        })
        .collect();
    let unreadable = unreadable
        .into_iter()
        .filter(|u| category.may_contain(&u.rel))
        .collect();

    Scan { files, unreadable }
}

/// Reject source files matched by the include patterns of two categories.
pub fn check_overlaps(table: &PathTable) -> Result<(), ConfigDiagnostics> {
    let mut owners: FxHashMap<String, Vec<AssetKind>> = FxHashMap::default();
    let (files, _) = walk_source(table.source());
    for (_, rel) in files {
        let kinds: Vec<_> = table
            .categories()
            .iter()
            .filter(|c| c.matches(&rel))
            .map(|c| c.kind)
            .collect();
        if kinds.len() > 1 {
            owners.insert(rel, kinds);
        }
    }

    let mut overlaps: Vec<_> = owners.into_iter().collect();
    overlaps.sort();

    let mut diag = ConfigDiagnostics::new();
    for (rel, kinds) in overlaps {
        let names: Vec<_> = kinds.iter().map(|k| k.name()).collect();
        diag.error_with_hint(
            kinds[0].field_path(),
            format!("`{rel}` is matched by {}", names.join(" and ")),
            "every source file must belong to exactly one category, add an `exclude` pattern",
        );
    }
    diag.into_result()
}
