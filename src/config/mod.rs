//! Pipeline configuration management for `sitepack.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── paths      # [paths] and per-category overrides
//! │   ├── style      # [style]
//! │   ├── image      # [image]
//! │   ├── markup     # [markup] and [markup.version]
//! │   └── serve      # [serve]
//! ├── types/         # Utility types
//! │   ├── error      # ConfigError, ConfigDiagnostics
//! │   ├── field      # FieldPath
//! │   └── handle     # Global config handle
//! └── mod.rs         # PackConfig (this file)
//! ```
//!
//! The config file is optional: without one every section keeps its
//! defaults and the project root is the current directory.

pub mod section;
pub mod types;
mod util;

use util::find_config_file;

pub use section::{ImageConfig, MarkupConfig, PathsConfig, ServeConfig, StyleConfig};
pub use types::{ConfigDiagnostics, ConfigError, FieldPath, cfg, init_config};

use crate::{
    cli::{BuildArgs, Cli, Commands, DevArgs},
    log,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing sitepack.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackConfig {
    /// Project root directory (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub style: StyleConfig,

    #[serde(default)]
    pub image: ImageConfig,

    #[serde(default)]
    pub markup: MarkupConfig,

    #[serde(default)]
    pub serve: ServeConfig,
}

impl PackConfig {
    /// Load configuration for the given CLI invocation.
    ///
    /// Searches upward from cwd for the config file; the project root is
    /// its parent directory, or cwd when there is no config file.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let (mut config, root) = match find_config_file(&cwd, &cli.config) {
            Some(path) => {
                let config = Self::from_path(&path)?;
                crate::debug!("config"; "loaded {}", path.display());
                let root = path.parent().map(Path::to_path_buf).unwrap_or(cwd);
                (config, root)
            }
            None => {
                crate::debug!("config"; "no {} found, using defaults", cli.config.display());
                (Self::default(), cwd)
            }
        };

        // Validate raw paths before normalization
        let mut diag = ConfigDiagnostics::new();
        config.paths.validate(&mut diag);
        diag.into_result().map_err(ConfigError::Diagnostics)?;

        config.apply_cli(cli);
        config.resolve_paths(&root);
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content).map_err(ConfigError::Toml)?;

        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), toml::de::Error> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    /// Absolute source root.
    pub fn source_dir(&self) -> &Path {
        &self.paths.source
    }

    /// Absolute output root.
    pub fn output_dir(&self) -> &Path {
        &self.paths.output
    }

    /// Cache-busting token for this run, `None` when disabled.
    pub fn version_token(&self) -> Option<String> {
        let version = &self.markup.version;
        version.enable.then(|| {
            version
                .value
                .clone()
                .unwrap_or_else(|| crate::utils::date::DateTimeUtc::now().compact())
        })
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    /// Apply command line overrides on top of file values.
    fn apply_cli(&mut self, cli: &Cli) {
        Self::update_option(&mut self.paths.source, cli.source.as_ref());
        Self::update_option(&mut self.paths.output, cli.output.as_ref());

        match cli.command() {
            Commands::Build { build_args } => self.apply_build_args(&build_args),
            Commands::Dev {
                build_args,
                dev_args,
            } => {
                self.apply_build_args(&build_args);
                self.apply_dev_args(&dev_args);
            }
        }
    }

    fn apply_build_args(&mut self, args: &BuildArgs) {
        crate::logger::set_verbose(args.verbose);

        if args.no_version {
            self.markup.version.enable = false;
        }
        if let Some(token) = &args.version_token {
            self.markup.version.enable = true;
            self.markup.version.value = Some(token.clone());
        }
    }

    fn apply_dev_args(&mut self, args: &DevArgs) {
        Self::update_option(&mut self.serve.interface, args.interface.as_ref());
        Self::update_option(&mut self.serve.port, args.port.as_ref());
        Self::update_option(&mut self.serve.watch, args.watch.as_ref());
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    // ========================================================================
    // path normalization
    // ========================================================================

    /// Anchor source and output roots at `root` (absolute afterwards).
    pub fn resolve_paths(&mut self, root: &Path) {
        let root = crate::utils::path::normalize_path(root);
        self.paths.source = crate::utils::path::normalize_path(&root.join(&self.paths.source));
        self.paths.output = crate::utils::path::normalize_path(&root.join(&self.paths.output));
        self.root = root;
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate the resolved configuration, collecting every problem.
    pub fn validate(&self) -> Result<()> {
        let mut diag = ConfigDiagnostics::new();

        if !self.paths.source.is_dir() {
            diag.error_with_hint(
                FieldPath::new("paths.source"),
                format!("source directory `{}` does not exist", self.paths.source.display()),
                "set `[paths] source` or pass `--source`",
            );
        }
        self.paths.validate_resolved(&self.root, &mut diag);
        self.style.validate(&mut diag);
        self.image.validate(&mut diag);
        self.markup.validate(&mut diag);
        self.serve.validate(&mut diag);

        diag.print_warnings();
        diag.into_result()
            .map_err(|e| ConfigError::Diagnostics(e).into())
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config content. Panics on unknown fields to catch typos in tests.
#[cfg(test)]
pub fn test_parse_config(content: &str) -> PackConfig {
    let (parsed, ignored) = PackConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

/// Default config rooted at `root` with a frozen version token.
#[cfg(test)]
pub fn test_config_at(root: &Path) -> PackConfig {
    let mut config = PackConfig::default();
    config.markup.version.value = Some("20240101000000".into());
    config.resolve_paths(root);
    config
}

// ============================================================================
// tests
// ============================================================================
