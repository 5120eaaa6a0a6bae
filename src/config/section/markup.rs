//! `[markup]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [markup]
//! minify = true
//!
//! [markup.version]
//! enable = true               # append ?_v=<token> to .css/.js references
//! key = "_v"
//! value = "20240101000000"    # freeze the token (default: build time, UTC)
//! manifest = "version.json"
//! ```

use crate::config::{ConfigDiagnostics, FieldPath};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkupConfig {
    /// Collapse insignificant whitespace and drop comments.
    pub minify: bool,
    pub version: VersionConfig,
}

impl Default for MarkupConfig {
    fn default() -> Self {
        Self {
            minify: true,
            version: VersionConfig::default(),
        }
    }
}

/// Cache-busting settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VersionConfig {
    pub enable: bool,
    /// Query parameter name.
    pub key: String,
    /// Frozen token. When unset, the build timestamp is used.
    pub value: Option<String>,
    /// Manifest file name, written at the output root.
    pub manifest: PathBuf,
}

impl Default for VersionConfig {
    fn default() -> Self {
        Self {
            enable: true,
            key: "_v".into(),
            value: None,
            manifest: "version.json".into(),
        }
    }
}

fn is_query_safe(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '~'))
}

impl MarkupConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        let version = &self.version;
        if !is_query_safe(&version.key) {
            diag.error(
                FieldPath::new("markup.version.key"),
                format!("`{}` is not a valid query parameter name", version.key),
            );
        }
        if let Some(value) = &version.value
            && !is_query_safe(value)
        {
            diag.error_with_hint(
                FieldPath::new("markup.version.value"),
                format!("`{value}` cannot be used in a query string"),
                "use letters, digits, `_`, `-`, `.` or `~`",
            );
        }
        if version.manifest.is_absolute() || version.manifest.file_name().is_none() {
            diag.error(
                FieldPath::new("markup.version.manifest"),
                "must be a relative file name",
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{ConfigDiagnostics, test_parse_config};

    #[test]
    fn test_markup_defaults() {
        let config = test_parse_config("");
        assert!(config.markup.minify);
        assert!(config.markup.version.enable);
        assert_eq!(config.markup.version.key, "_v");
        assert!(config.markup.version.value.is_none());
    }

    #[test]
    fn test_frozen_token() {
        let config = test_parse_config("[markup.version]\nvalue = \"20240101000000\"");
        assert_eq!(config.markup.version.value.as_deref(), Some("20240101000000"));
    }

    #[test]
    fn test_invalid_token_reported() {
        let config = test_parse_config("[markup.version]\nvalue = \"a b\"");
        let mut diag = ConfigDiagnostics::new();
        config.markup.validate(&mut diag);
        assert!(diag.has_errors());
    }
}
