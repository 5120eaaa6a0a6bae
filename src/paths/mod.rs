//! Path table: asset categories mapped to source globs and destinations.
//!
//! Patterns are matched against paths relative to the source root with
//! forward slashes. `*` stays inside one directory, `**` crosses them,
//! and `{a,b}` alternates. A matched file keeps its sub-path relative to
//! the glob base (the literal directory prefix of the pattern that
//! matched it).
//!
//! ```text
//! source/img/photos/a.jpg  --img/**/*.jpg-->  build/img/photos/a.jpg
//! source/sass/style.scss   --sass/style.scss-->  build/css/style.scss
//! ```

mod scan;

pub use scan::{Scan, SourceFile, check_overlaps, scan_category};

use crate::config::{FieldPath, PackConfig};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("invalid glob `{pattern}` in [paths.{kind}]: {source}")]
pub struct PatternError {
    pub kind: AssetKind,
    pub pattern: String,
    #[source]
    pub source: globset::Error,
}

// ============================================================================
// AssetKind
// ============================================================================

/// Logical group of source files sharing one destination directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AssetKind {
    Font,
    Image,
    Icon,
    Script,
    Style,
    Markup,
}

/// Built-in layout for one category.
struct Defaults {
    include: &'static [&'static str],
    exclude: &'static [&'static str],
    /// `None` watches the include patterns.
    watch: Option<&'static [&'static str]>,
    dest: &'static str,
}

impl AssetKind {
    pub const ALL: [AssetKind; 6] = [
        AssetKind::Font,
        AssetKind::Image,
        AssetKind::Icon,
        AssetKind::Script,
        AssetKind::Style,
        AssetKind::Markup,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            AssetKind::Font => "font",
            AssetKind::Image => "image",
            AssetKind::Icon => "icon",
            AssetKind::Script => "script",
            AssetKind::Style => "style",
            AssetKind::Markup => "markup",
        }
    }

    pub const fn field_path(self) -> FieldPath {
        match self {
            AssetKind::Font => FieldPath::new("paths.font"),
            AssetKind::Image => FieldPath::new("paths.image"),
            AssetKind::Icon => FieldPath::new("paths.icon"),
            AssetKind::Script => FieldPath::new("paths.script"),
            AssetKind::Style => FieldPath::new("paths.style"),
            AssetKind::Markup => FieldPath::new("paths.markup"),
        }
    }

    const fn defaults(self) -> Defaults {
        match self {
            AssetKind::Font => Defaults {
                include: &["fonts/*.{woff2,woff}"],
                exclude: &[],
                watch: None,
                dest: "fonts",
            },
            AssetKind::Image => Defaults {
                include: &["img/**/*.{jpg,jpeg,png,svg}"],
                exclude: &["img/icons/**"],
                watch: None,
                dest: "img",
            },
            AssetKind::Icon => Defaults {
                include: &["img/icons/*.svg"],
                exclude: &[],
                watch: None,
                dest: "img",
            },
            AssetKind::Script => Defaults {
                include: &["js/script.js"],
                exclude: &[],
                watch: None,
                dest: "js",
            },
            AssetKind::Style => Defaults {
                include: &["sass/style.scss"],
                exclude: &[],
                watch: Some(&["sass/**/*.scss"]),
                dest: "css",
            },
            AssetKind::Markup => Defaults {
                include: &["*.html"],
                exclude: &[],
                watch: Some(&["**/*.html"]),
                dest: "",
            },
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// AssetCategory
// ============================================================================

/// Compiled patterns and destination of one category.
#[derive(Debug, Clone)]
pub struct AssetCategory {
    pub kind: AssetKind,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub watch: Vec<String>,
    /// Destination, relative to the output root.
    pub dest: PathBuf,
    include_set: GlobSet,
    /// Literal directory prefix of each include pattern (same order).
    bases: Vec<PathBuf>,
    exclude_set: GlobSet,
    watch_set: GlobSet,
}

impl AssetCategory {
    fn new(
        kind: AssetKind,
        include: Vec<String>,
        exclude: Vec<String>,
        watch: Vec<String>,
        dest: PathBuf,
    ) -> Result<Self, PatternError> {
        let include_set = build_globset(kind, &include)?;
        let exclude_set = build_globset(kind, &exclude)?;
        let watch_set = build_globset(kind, &watch)?;
        let bases = include.iter().map(|p| glob_base(p)).collect();
        Ok(Self {
            kind,
            include,
            exclude,
            watch,
            dest,
            include_set,
            bases,
            exclude_set,
            watch_set,
        })
    }

    /// Whether the source-relative path is an input of this category.
    pub fn matches(&self, rel: &str) -> bool {
        self.include_set.is_match(rel) && !self.exclude_set.is_match(rel)
    }

    /// Whether a change to the source-relative path concerns this category.
    pub fn watches(&self, rel: &str) -> bool {
        self.watch_set.is_match(rel) && !self.exclude_set.is_match(rel)
    }

    /// Whether files of this category could live at or below the
    /// source-relative directory `rel`.
    pub fn may_contain(&self, rel: &str) -> bool {
        let dir = Path::new(rel);
        self.bases.iter().zip(&self.include).any(|(base, pattern)| {
            base.starts_with(dir) || (pattern.contains("**") && dir.starts_with(base))
        })
    }

    /// Sub-path of a matched file relative to the base of the first
    /// include pattern that matched it.
    pub fn sub_path(&self, rel: &str) -> Option<PathBuf> {
        let idx = self.include_set.matches(rel).into_iter().min()?;
        let rel = Path::new(rel);
        Some(
            rel.strip_prefix(&self.bases[idx])
                .unwrap_or(rel)
                .to_path_buf(),
        )
    }
}

/// Literal directory prefix of a glob pattern.
///
/// `img/**/*.png` -> `img`, `sass/style.scss` -> `sass`, `*.html` -> ``.
pub fn glob_base(pattern: &str) -> PathBuf {
    let mut parts: Vec<&str> = pattern.split('/').collect();
    // The final component names files, never a directory.
    parts.pop();
    parts
        .into_iter()
        .take_while(|part| !part.contains(['*', '?', '[', '{']))
        .filter(|part| !part.is_empty() && *part != ".")
        .collect()
}

fn build_globset(kind: AssetKind, patterns: &[String]) -> Result<GlobSet, PatternError> {
    let wrap = |pattern: &str, source| PatternError {
        kind,
        pattern: pattern.to_string(),
        source,
    };
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern.trim_start_matches("./"))
            .literal_separator(true)
            .build()
            .map_err(|e| wrap(pattern, e))?;
        builder.add(glob);
    }
    builder.build().map_err(|e| wrap("<set>", e))
}

// ============================================================================
// PathTable
// ============================================================================

/// Fixed mapping from asset categories to globs and destinations.
#[derive(Debug, Clone)]
pub struct PathTable {
    source: PathBuf,
    output: PathBuf,
    categories: Vec<AssetCategory>,
}

impl PathTable {
    /// Build the table from the built-in layout and `[paths]` overrides.
    pub fn from_config(config: &PackConfig) -> Result<Self, PatternError> {
        let owned = |list: &[&str]| list.iter().map(|s| (*s).to_string()).collect::<Vec<_>>();

        let categories = AssetKind::ALL
            .into_iter()
            .map(|kind| {
                let defaults = kind.defaults();
                let overrides = config.paths.category(kind);

                let include = overrides
                    .include
                    .clone()
                    .unwrap_or_else(|| owned(defaults.include));
                let exclude = overrides
                    .exclude
                    .clone()
                    .unwrap_or_else(|| owned(defaults.exclude));
                let watch = overrides.watch.clone().unwrap_or_else(|| {
                    defaults.watch.map_or_else(|| include.clone(), owned)
                });
                let dest = overrides
                    .dest
                    .clone()
                    .unwrap_or_else(|| PathBuf::from(defaults.dest));
                let dest = dest
                    .components()
                    .filter(|c| !matches!(c, Component::CurDir))
                    .collect();

                AssetCategory::new(kind, include, exclude, watch, dest)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            source: config.source_dir().to_path_buf(),
            output: config.output_dir().to_path_buf(),
            categories,
        })
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn category(&self, kind: AssetKind) -> &AssetCategory {
        // ALL order is preserved by from_config
        &self.categories[kind as usize]
    }

    pub fn categories(&self) -> &[AssetCategory] {
        &self.categories
    }

    /// Absolute destination directory of a category.
    pub fn dest_dir(&self, kind: AssetKind) -> PathBuf {
        self.output.join(&self.category(kind).dest)
    }
}
