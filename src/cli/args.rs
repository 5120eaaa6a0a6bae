//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Static site asset pipeline
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (searched upward from the current directory)
    #[arg(short = 'C', long, global = true, default_value = "sitepack.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Source directory path (relative to project root)
    #[arg(short, long, global = true, value_hint = clap::ValueHint::DirPath)]
    pub source: Option<PathBuf>,

    /// Output directory path (relative to project root)
    #[arg(short, long, global = true, value_hint = clap::ValueHint::DirPath)]
    pub output: Option<PathBuf>,

    /// subcommands (default: dev)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Clean the output directory and run every task once
    #[command(visible_alias = "b")]
    Build {
        #[command(flatten)]
        build_args: BuildArgs,
    },

    /// Build once, then serve the output with live reload
    #[command(visible_alias = "d")]
    Dev {
        #[command(flatten)]
        build_args: BuildArgs,

        #[command(flatten)]
        dev_args: DevArgs,
    },
}

/// Shared build arguments for Build and Dev commands
#[derive(clap::Args, Debug, Clone, Default)]
pub struct BuildArgs {
    /// Freeze the cache-busting token (reproducible output)
    #[arg(long = "version-token", value_name = "TOKEN", conflicts_with = "no_version")]
    pub version_token: Option<String>,

    /// Disable cache-busting of stylesheet and script references
    #[arg(long = "no-version")]
    pub no_version: bool,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long)]
    pub verbose: bool,
}

/// Dev server arguments
#[derive(clap::Args, Debug, Clone, Default)]
pub struct DevArgs {
    /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
    #[arg(short, long)]
    pub interface: Option<std::net::IpAddr>,

    /// Port number to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Enable file watching for auto-rebuild
    #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub watch: Option<bool>,
}

impl Cli {
    /// Resolved subcommand; `dev` when none was given.
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Dev {
            build_args: BuildArgs::default(),
            dev_args: DevArgs::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_dev() {
        let cli = Cli::parse_from(["sitepack"]);
        assert!(matches!(cli.command(), Commands::Dev { .. }));
    }

    #[test]
    fn test_build_flags() {
        let cli = Cli::parse_from(["sitepack", "build", "--version-token", "20240101000000", "-V"]);
        let Commands::Build { build_args } = cli.command() else {
            panic!("expected build");
        };
        assert_eq!(build_args.version_token.as_deref(), Some("20240101000000"));
        assert!(build_args.verbose);
        assert!(!build_args.no_version);
    }

    #[test]
    fn test_version_flags_conflict() {
        let result = Cli::try_parse_from(["sitepack", "build", "--no-version", "--version-token", "x"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_dev_flags_and_global_paths() {
        let cli = Cli::parse_from(["sitepack", "dev", "-p", "8080", "-w", "false", "-o", "dist"]);
        let Commands::Dev { dev_args, .. } = cli.command() else {
            panic!("expected dev");
        };
        assert_eq!(dev_args.port, Some(8080));
        assert_eq!(dev_args.watch, Some(false));
        assert_eq!(cli.output, Some(PathBuf::from("dist")));
        assert_eq!(cli.config, PathBuf::from("sitepack.toml"));
    }
}
