//! Transform tasks.
//!
//! Each task reads one asset category from the source tree and writes
//! its outputs under the category's destination directory.
//!
//! | Task              | Reads  | Writes                                   |
//! |-------------------|--------|------------------------------------------|
//! | `clean`           |        | deletes the output root                  |
//! | `copy-fonts`      | font   | copies                                   |
//! | `compile-styles`  | style  | `*.min.css`                              |
//! | `minify-scripts`  | script | same names                               |
//! | `minify-html`     | markup | minified pages, `version.json`           |
//! | `optimize-images` | image  | re-encoded rasters, optimized SVGs       |
//! | `rasterize-webp`  | image  | `.webp` siblings of rasters              |
//! | `build-sprite`    | icon   | `sprite.svg`                             |
//!
//! [`check_destinations`] rejects layouts where two of these would write
//! the same file.

mod clean;
mod copy;
pub mod error;
mod image;
pub mod markup;
mod plan;
mod script;
pub mod sprite;
mod style;
mod webp;

pub use error::TaskError;
pub use plan::check_destinations;

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::config::PackConfig;
use crate::paths::{AssetKind, PathTable, Scan, SourceFile, scan_category};
use crate::reload::ReloadHandle;
use crate::utils::path::write_atomic;

// ============================================================================
// TaskId
// ============================================================================

/// Named unit of work in the build graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskId {
    Clean,
    CopyFonts,
    CompileStyles,
    MinifyScripts,
    MinifyHtml,
    OptimizeImages,
    RasterizeWebp,
    BuildSprite,
}

impl TaskId {
    pub const ALL: [TaskId; 8] = [
        TaskId::Clean,
        TaskId::CopyFonts,
        TaskId::CompileStyles,
        TaskId::MinifyScripts,
        TaskId::MinifyHtml,
        TaskId::OptimizeImages,
        TaskId::RasterizeWebp,
        TaskId::BuildSprite,
    ];

    /// Tasks that run after `copy-fonts`.
    pub const TRANSFORMS: [TaskId; 6] = [
        TaskId::CompileStyles,
        TaskId::MinifyScripts,
        TaskId::MinifyHtml,
        TaskId::OptimizeImages,
        TaskId::RasterizeWebp,
        TaskId::BuildSprite,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            TaskId::Clean => "clean",
            TaskId::CopyFonts => "copy-fonts",
            TaskId::CompileStyles => "compile-styles",
            TaskId::MinifyScripts => "minify-scripts",
            TaskId::MinifyHtml => "minify-html",
            TaskId::OptimizeImages => "optimize-images",
            TaskId::RasterizeWebp => "rasterize-webp",
            TaskId::BuildSprite => "build-sprite",
        }
    }

    /// Category whose watch globs trigger this task.
    pub const fn reads(self) -> Option<AssetKind> {
        match self {
            TaskId::Clean => None,
            TaskId::CopyFonts => Some(AssetKind::Font),
            TaskId::CompileStyles => Some(AssetKind::Style),
            TaskId::MinifyScripts => Some(AssetKind::Script),
            TaskId::MinifyHtml => Some(AssetKind::Markup),
            TaskId::OptimizeImages | TaskId::RasterizeWebp => Some(AssetKind::Image),
            TaskId::BuildSprite => Some(AssetKind::Icon),
        }
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// TaskContext
// ============================================================================

/// Everything a task needs; cheap to clone across threads.
#[derive(Clone)]
pub struct TaskContext {
    pub config: Arc<PackConfig>,
    pub table: Arc<PathTable>,
    pub reload: ReloadHandle,
}

impl TaskContext {
    pub fn new(config: Arc<PackConfig>, table: Arc<PathTable>, reload: ReloadHandle) -> Self {
        Self {
            config,
            table,
            reload,
        }
    }

    /// Same config and paths, different reload handle.
    pub fn with_reload(&self, reload: ReloadHandle) -> Self {
        Self {
            reload,
            ..self.clone()
        }
    }

    /// Matched inputs of a category, warning when there are none and for
    /// every directory that could hold inputs but was unreadable.
    pub fn inputs(&self, task: TaskId, kind: AssetKind) -> Vec<SourceFile> {
        let Scan { files, unreadable } = scan_category(&self.table, kind);
        for dir in &unreadable {
            crate::log!(
                "warning";
                "{}: skipped unreadable {}: {}",
                task,
                self.display(&self.table.source().join(&dir.rel)),
                dir.message
            );
        }
        if files.is_empty() {
            crate::log!(
                "warning";
                "{}: no files match [{}] in {}",
                task,
                self.table.category(kind).include.join(", "),
                self.display(self.table.source())
            );
        }
        files
    }

    /// Atomically write an output file and report it.
    pub fn write_output(&self, path: &Path, bytes: &[u8]) -> Result<(), TaskError> {
        write_atomic(path, bytes).map_err(|e| TaskError::fs(path, e))?;
        self.reload.changed(path);
        Ok(())
    }

    /// Short form of a path for log lines.
    pub fn display(&self, path: &Path) -> String {
        crate::utils::path::relative_display(path, &self.config.root)
    }
}

// ============================================================================
// TaskOutcome
// ============================================================================

/// Result of a task that did not fail outright.
#[derive(Debug)]
pub enum TaskOutcome {
    /// Every input was processed.
    Succeeded { written: usize },
    /// Some inputs were skipped because of per-file errors.
    Degraded {
        written: usize,
        failures: Vec<TaskError>,
    },
}

impl TaskOutcome {
    /// Fold per-file results into an outcome.
    pub fn from_results(results: Vec<Result<usize, TaskError>>) -> Self {
        let mut written = 0;
        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok(n) => written += n,
                Err(e) => failures.push(e),
            }
        }
        if failures.is_empty() {
            Self::Succeeded { written }
        } else {
            Self::Degraded { written, failures }
        }
    }

    pub fn written(&self) -> usize {
        match self {
            Self::Succeeded { written } | Self::Degraded { written, .. } => *written,
        }
    }
}

pub type TaskResult = Result<TaskOutcome, TaskError>;

/// Run one task to completion.
pub fn run_task(id: TaskId, ctx: &TaskContext) -> TaskResult {
    crate::debug!("task"; "start {}", id);
    let result = match id {
        TaskId::Clean => clean::run(ctx),
        TaskId::CopyFonts => copy::run(ctx),
        TaskId::CompileStyles => style::run(ctx),
        TaskId::MinifyScripts => script::run(ctx),
        TaskId::MinifyHtml => markup::run(ctx),
        TaskId::OptimizeImages => image::run(ctx),
        TaskId::RasterizeWebp => webp::run(ctx),
        TaskId::BuildSprite => sprite::run(ctx),
    };
    crate::debug!("task"; "end {} ({})", id, if result.is_ok() { "ok" } else { "failed" });
    result
}

/// Context rooted in a temp project, for task tests.
#[cfg(test)]
pub(crate) fn test_context(root: &Path) -> TaskContext {
    let config = crate::config::test_config_at(root);
    let table = PathTable::from_config(&config).unwrap();
    TaskContext::new(Arc::new(config), Arc::new(table), ReloadHandle::disabled())
}

/// Write a source fixture under `<root>/source/<rel>`.
#[cfg(test)]
pub(crate) fn write_source(root: &Path, rel: &str, content: impl AsRef<[u8]>) {
    let path = root.join("source").join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

/// Encode a 32x24 gradient in the given format.
#[cfg(test)]
pub(crate) fn raster_fixture(format: ::image::ImageFormat) -> Vec<u8> {
    let img = ::image::RgbImage::from_fn(32, 24, |x, y| {
        ::image::Rgb([(x * 8) as u8, (y * 10) as u8, 128])
    });
    let mut out = std::io::Cursor::new(Vec::new());
    ::image::DynamicImage::ImageRgb8(img)
        .write_to(&mut out, format)
        .unwrap();
    out.into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_task_names_unique() {
        let mut names: Vec<_> = TaskId::ALL.iter().map(|t| t.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), TaskId::ALL.len());
    }

    #[test]
    fn test_outcome_from_results() {
        let ok = TaskOutcome::from_results(vec![Ok(1), Ok(2)]);
        assert!(matches!(ok, TaskOutcome::Succeeded { written: 3 }));

        let degraded = TaskOutcome::from_results(vec![
            Ok(1),
            Err(TaskError::tooling("a.woff", "boom")),
        ]);
        assert!(matches!(degraded, TaskOutcome::Degraded { .. }));
        assert_eq!(degraded.written(), 1);
    }

    #[test]
    fn test_write_output_reports_change() {
        let dir = TempDir::new().unwrap();
        let ctx = test_context(dir.path());
        let (handle, batch) = ReloadHandle::recording();
        let ctx = ctx.with_reload(handle);

        let target = ctx.table.output().join("js/script.js");
        ctx.write_output(&target, b"console.log(1)").unwrap();

        assert_eq!(batch.drain(), vec![target.clone()]);
        assert_eq!(std::fs::read(target).unwrap(), b"console.log(1)");
    }
}
