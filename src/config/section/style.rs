//! `[style]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [style]
//! targets = ["defaults"]      # browserslist queries for vendor prefixing
//! minify = true
//! load_paths = ["node_modules"]
//! sourcemap = false           # write style.min.css.map next to each output
//! ```

use crate::config::{ConfigDiagnostics, FieldPath};
use lightningcss::targets::Browsers;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    /// Browserslist queries used for vendor prefixing.
    pub targets: Vec<String>,
    /// Minify the compiled stylesheet.
    pub minify: bool,
    /// Extra `@use`/`@import` search paths (relative to the source root).
    pub load_paths: Vec<PathBuf>,
    /// Write a source map next to every compiled stylesheet.
    pub sourcemap: bool,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            targets: vec!["defaults".into()],
            minify: true,
            load_paths: Vec::new(),
            sourcemap: false,
        }
    }
}

impl StyleConfig {
    /// Resolve the browserslist queries. `None` means no prefixing.
    pub fn browsers(&self) -> Option<Browsers> {
        if self.targets.is_empty() {
            return None;
        }
        Browsers::from_browserslist(&self.targets).ok().flatten()
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.targets.is_empty() {
            return;
        }
        if let Err(e) = Browsers::from_browserslist(&self.targets) {
            diag.error_with_hint(
                FieldPath::new("style.targets"),
                format!("invalid browserslist query: {e}"),
                "see https://browsersl.ist for the query syntax",
            );
        }
    }
}
