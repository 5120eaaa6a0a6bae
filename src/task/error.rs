//! Task error taxonomy.

use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Why a task (or one file inside it) failed.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("{}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}{}: {message}", path.display(), Location(*line, *column))]
    Compile {
        path: PathBuf,
        line: Option<u32>,
        column: Option<u32>,
        message: String,
    },

    #[error("{}{}: {message}", path.display(), Location(*line, *column))]
    Syntax {
        path: PathBuf,
        line: Option<u32>,
        column: Option<u32>,
        message: String,
    },

    #[error("{}: {message}", path.display())]
    Tooling { path: PathBuf, message: String },
}

/// `:line:column` suffix, omitted when unknown.
struct Location(Option<u32>, Option<u32>);

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.0, self.1) {
            (Some(line), Some(column)) => write!(f, ":{line}:{column}"),
            (Some(line), None) => write!(f, ":{line}"),
            _ => Ok(()),
        }
    }
}

impl TaskError {
    pub fn fs(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }

    pub fn tooling(path: impl Into<PathBuf>, message: impl fmt::Display) -> Self {
        Self::Tooling {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// File the error is about.
    pub fn path(&self) -> &Path {
        match self {
            Self::Filesystem { path, .. }
            | Self::Compile { path, .. }
            | Self::Syntax { path, .. }
            | Self::Tooling { path, .. } => path,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Filesystem { .. } => "filesystem",
            Self::Compile { .. } => "compile",
            Self::Syntax { .. } => "syntax",
            Self::Tooling { .. } => "tooling",
        }
    }
}

/// Convert a byte offset into a 1-based `(line, column)` pair.
#[allow(clippy::cast_possible_truncation)]
pub fn line_col(source: &str, offset: usize) -> (u32, u32) {
    let offset = offset.min(source.len());
    let before = &source.as_bytes()[..offset];
    let line = before.iter().filter(|&&b| b == b'\n').count() + 1;
    let line_start = before
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |pos| pos + 1);
    let column = String::from_utf8_lossy(&before[line_start..]).chars().count() + 1;
    (line as u32, column as u32)
}
