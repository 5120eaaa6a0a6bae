//! Build graph: tasks as nodes, dependencies as edges.
//!
//! [`TaskGraph`] validates the shape once at construction; [`scheduler::run`]
//! executes it, starting every node whose dependencies have completed.

mod dag;
pub mod scheduler;

pub use dag::TaskGraph;
pub use scheduler::RunReport;

use std::fmt;
use thiserror::Error;

use crate::task::TaskId;

/// Graph construction errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("task `{0}` is declared twice")]
    Duplicate(TaskId),

    #[error("task `{task}` depends on unknown task `{dependency}`")]
    UnknownDependency { task: TaskId, dependency: TaskId },

    #[error("dependency cycle involving {}", join(.0))]
    Cycle(Vec<TaskId>),
}

fn join(ids: &[TaskId]) -> String {
    ids.iter().map(|id| id.name()).collect::<Vec<_>>().join(", ")
}

/// Per-run state of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    Pending,
    Running,
    Succeeded,
    /// Completed with per-file failures. Dependents still run.
    Degraded,
    Failed,
    /// Not run because a dependency failed.
    Skipped,
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Degraded => "degraded",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        })
    }
}
