//! Watch bindings: which source changes trigger which action.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher, GlobSet, GlobSetBuilder};

use super::types::DebouncedEvents;
use crate::paths::PathTable;
use crate::task::TaskId;
use crate::utils::path::normalize_path;

/// What a matching change triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WatchAction {
    Run(TaskId),
    Reload,
}

impl fmt::Display for WatchAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Run(task) => write!(f, "run {task}"),
            Self::Reload => f.write_str("reload"),
        }
    }
}

/// One source glob bound to an action.
#[derive(Debug, Clone)]
pub struct WatchBinding {
    pub pattern: String,
    pub action: WatchAction,
    matcher: GlobMatcher,
    /// Category excludes that veto the match.
    exclude: GlobSet,
}

impl WatchBinding {
    fn matches(&self, rel: &str) -> bool {
        self.matcher.is_match(rel) && !self.exclude.is_match(rel)
    }
}

/// All bindings of one watcher, created once at start.
#[derive(Debug, Clone)]
pub struct WatchBindings {
    source: PathBuf,
    bindings: Vec<WatchBinding>,
}

fn glob(pattern: &str) -> Result<globset::Glob, globset::Error> {
    GlobBuilder::new(pattern.trim_start_matches("./"))
        .literal_separator(true)
        .build()
}

impl WatchBindings {
    /// Bind every category's watch globs to the tasks reading it, and the
    /// extra `reload` globs to a plain browser reload.
    pub fn new(table: &PathTable, reload: &[String]) -> Result<Self, globset::Error> {
        let mut bindings = Vec::new();

        for task in TaskId::ALL {
            let Some(kind) = task.reads() else { continue };
            let category = table.category(kind);

            let mut exclude = GlobSetBuilder::new();
            for pattern in &category.exclude {
                exclude.add(glob(pattern)?);
            }
            let exclude = exclude.build()?;

            for pattern in &category.watch {
                bindings.push(WatchBinding {
                    pattern: pattern.clone(),
                    action: WatchAction::Run(task),
                    matcher: glob(pattern)?.compile_matcher(),
                    exclude: exclude.clone(),
                });
            }
        }

        for pattern in reload {
            bindings.push(WatchBinding {
                pattern: pattern.clone(),
                action: WatchAction::Reload,
                matcher: glob(pattern)?.compile_matcher(),
                exclude: GlobSet::empty(),
            });
        }

        Ok(Self {
            source: normalize_path(table.source()),
            bindings,
        })
    }

    pub fn bindings(&self) -> &[WatchBinding] {
        &self.bindings
    }

    /// Actions triggered by one path, if it lies under the source root.
    pub fn resolve_path(&self, path: &Path) -> Vec<WatchAction> {
        let Some(rel) = path
            .strip_prefix(&self.source)
            .ok()
            .map(|p| p.to_string_lossy().replace('\\', "/"))
        else {
            return Vec::new();
        };

        self.bindings
            .iter()
            .filter(|b| b.matches(&rel))
            .map(|b| b.action)
            .collect()
    }

    /// Distinct actions for a batch, tasks in pipeline order, reload last.
    pub(super) fn resolve(&self, events: &DebouncedEvents) -> Vec<WatchAction> {
        let actions: BTreeSet<WatchAction> = events
            .paths()
            .flat_map(|path| {
                let actions = self.resolve_path(path);
                if actions.is_empty() {
                    crate::debug!("watch"; "unbound: {}", path.display());
                }
                actions
            })
            .collect();
        actions.into_iter().collect()
    }
}

pub(super) fn log_events(events: &DebouncedEvents) {
    for (path, kind) in &events.0 {
        crate::debug!("watch"; "{}: {}", kind.label(), path.display());
    }
}
