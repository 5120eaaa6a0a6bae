//! `[paths]` section configuration.
//!
//! Source and output roots plus per-category overrides of the path table.
//! Every key is optional; omitted keys keep the built-in layout.
//!
//! # Example
//!
//! ```toml
//! [paths]
//! source = "source"
//! output = "build"
//!
//! [paths.image]
//! include = ["img/**/*.{jpg,jpeg,png,svg}"]
//! exclude = ["img/icons/**"]
//!
//! [paths.style]
//! include = ["sass/style.scss"]
//! watch = ["sass/**/*.scss"]
//! dest = "css"
//! ```

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::paths::AssetKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Source root (relative to the project root).
    pub source: PathBuf,
    /// Output root; destroyed and rebuilt by every build.
    pub output: PathBuf,

    pub font: CategoryOverride,
    pub image: CategoryOverride,
    pub icon: CategoryOverride,
    pub script: CategoryOverride,
    pub style: CategoryOverride,
    pub markup: CategoryOverride,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            source: "source".into(),
            output: "build".into(),
            font: CategoryOverride::default(),
            image: CategoryOverride::default(),
            icon: CategoryOverride::default(),
            script: CategoryOverride::default(),
            style: CategoryOverride::default(),
            markup: CategoryOverride::default(),
        }
    }
}

/// Partial override of one asset category. `None` keeps the default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CategoryOverride {
    pub include: Option<Vec<String>>,
    pub exclude: Option<Vec<String>>,
    pub watch: Option<Vec<String>>,
    pub dest: Option<PathBuf>,
}

impl PathsConfig {
    pub fn category(&self, kind: AssetKind) -> &CategoryOverride {
        match kind {
            AssetKind::Font => &self.font,
            AssetKind::Image => &self.image,
            AssetKind::Icon => &self.icon,
            AssetKind::Script => &self.script,
            AssetKind::Style => &self.style,
            AssetKind::Markup => &self.markup,
        }
    }

    /// Validate raw paths and glob syntax (before normalization).
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.source.is_absolute() {
            diag.error_with_hint(
                FieldPath::new("paths.source"),
                format!("must be relative, got `{}`", self.source.display()),
                "paths are resolved against the directory holding the config file",
            );
        }
        if self.output.is_absolute() {
            diag.error_with_hint(
                FieldPath::new("paths.output"),
                format!("must be relative, got `{}`", self.output.display()),
                "paths are resolved against the directory holding the config file",
            );
        }
        for kind in AssetKind::ALL {
            let cat = self.category(kind);
            let field = kind.field_path();
            for pattern in cat.globs() {
                if let Err(e) = globset::Glob::new(pattern) {
                    diag.error(field, format!("invalid glob `{pattern}`: {}", e.kind()));
                }
            }
            if cat.include.as_ref().is_some_and(Vec::is_empty) {
                diag.error(field, "`include` must list at least one pattern");
            }
            if let Some(dest) = &cat.dest
                && (dest.is_absolute()
                    || dest.components().any(|c| matches!(c, std::path::Component::ParentDir)))
            {
                diag.error(
                    field,
                    format!("`dest` must stay inside the output root, got `{}`", dest.display()),
                );
            }
        }
    }
}

impl PathsConfig {
    /// Checks on the absolute roots, after CLI overrides and resolution.
    ///
    /// The output root is deleted on every build, so it must not be the
    /// project root, one of its ancestors, or overlap the source root.
    pub fn validate_resolved(&self, root: &Path, diag: &mut ConfigDiagnostics) {
        if root.starts_with(&self.output) {
            diag.error_with_hint(
                FieldPath::new("paths.output"),
                format!(
                    "`{}` is the project root or one of its parents, it is deleted on every build",
                    self.output.display()
                ),
                "point `[paths] output` or `--output` at a dedicated directory",
            );
        }
        if self.output.starts_with(&self.source) || self.source.starts_with(&self.output) {
            diag.error(
                FieldPath::new("paths.output"),
                format!(
                    "`{}` and `{}` must not contain one another",
                    self.source.display(),
                    self.output.display()
                ),
            );
        }
    }
}

impl CategoryOverride {
    fn globs(&self) -> impl Iterator<Item = &String> {
        self.include
            .iter()
            .chain(&self.exclude)
            .chain(&self.watch)
            .flatten()
    }
}
