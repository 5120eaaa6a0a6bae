//! Graph execution.
//!
//! Every node whose dependencies have completed runs on its own scoped
//! thread. Completions come back over a channel and unlock dependents.
//! A failed node marks its transitive dependents as skipped; siblings keep
//! running. Degraded nodes count as completed for scheduling.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use crossbeam::channel;

use super::{NodeState, TaskGraph};
use crate::task::{TaskError, TaskId, TaskOutcome, TaskResult};

/// Final state of one node.
#[derive(Debug)]
pub struct NodeReport {
    pub id: TaskId,
    pub state: NodeState,
    pub written: usize,
    /// The fatal error, or per-file failures of a degraded run.
    pub errors: Vec<TaskError>,
    pub elapsed: Duration,
}

/// Outcome of a whole graph run, in graph declaration order.
#[derive(Debug)]
pub struct RunReport {
    pub nodes: Vec<NodeReport>,
    pub elapsed: Duration,
}

impl RunReport {
    /// Every node succeeded without per-file failures.
    pub fn is_success(&self) -> bool {
        self.nodes.iter().all(|n| n.state == NodeState::Succeeded)
    }

    pub fn state(&self, id: TaskId) -> Option<NodeState> {
        self.nodes.iter().find(|n| n.id == id).map(|n| n.state)
    }

    pub fn count(&self, state: NodeState) -> usize {
        self.nodes.iter().filter(|n| n.state == state).count()
    }

    pub fn written(&self) -> usize {
        self.nodes.iter().map(|n| n.written).sum()
    }
}

/// Execute `graph`, calling `runner` once per node that gets to run.
pub fn run<F>(graph: &TaskGraph, runner: F) -> RunReport
where
    F: Fn(TaskId) -> TaskResult + Sync,
{
    let started = Instant::now();
    let n = graph.len();
    let mut nodes: Vec<NodeReport> = (0..n)
        .map(|i| NodeReport {
            id: graph.id(i),
            state: NodeState::Pending,
            written: 0,
            errors: Vec::new(),
            elapsed: Duration::ZERO,
        })
        .collect();
    let mut waiting: Vec<usize> = (0..n).map(|i| graph.deps(i).len()).collect();
    let mut ready: Vec<usize> = (0..n).filter(|&i| waiting[i] == 0).collect();

    let (tx, rx) = channel::unbounded::<(usize, TaskResult, Duration)>();
    let runner = &runner;

    std::thread::scope(|scope| {
        let mut in_flight = 0usize;
        loop {
            for i in ready.drain(..) {
                nodes[i].state = NodeState::Running;
                in_flight += 1;
                let tx = tx.clone();
                let id = graph.id(i);
                scope.spawn(move || {
                    let start = Instant::now();
                    let result = panic::catch_unwind(AssertUnwindSafe(|| runner(id)))
                        .unwrap_or_else(|payload| Err(panicked(id, payload.as_ref())));
                    // Receiver lives until every spawned node has reported
                    let _ = tx.send((i, result, start.elapsed()));
                });
            }
            if in_flight == 0 {
                break;
            }

            let Ok((i, result, elapsed)) = rx.recv() else {
                break;
            };
            in_flight -= 1;

            let node = &mut nodes[i];
            node.elapsed = elapsed;
            match result {
                Ok(outcome) => {
                    node.written = outcome.written();
                    match outcome {
                        TaskOutcome::Succeeded { .. } => node.state = NodeState::Succeeded,
                        TaskOutcome::Degraded { failures, .. } => {
                            node.state = NodeState::Degraded;
                            node.errors = failures;
                        }
                    }
                    for &d in graph.dependents(i) {
                        waiting[d] -= 1;
                        if waiting[d] == 0 && nodes[d].state == NodeState::Pending {
                            ready.push(d);
                        }
                    }
                }
                Err(err) => {
                    crate::debug!("graph"; "{} failed, skipping dependents", node.id);
                    node.state = NodeState::Failed;
                    node.errors.push(err);
                    skip_dependents(graph, i, &mut nodes);
                }
            }
        }
    });

    RunReport {
        nodes,
        elapsed: started.elapsed(),
    }
}

/// A panicking task fails its node like any other error.
fn panicked(id: TaskId, payload: &(dyn Any + Send)) -> TaskError {
    let message = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown cause");
    TaskError::tooling(id.name(), format!("task panicked: {message}"))
}

/// Mark every pending node downstream of `failed` as skipped.
fn skip_dependents(graph: &TaskGraph, failed: usize, nodes: &mut [NodeReport]) {
    let mut stack: Vec<usize> = graph.dependents(failed).to_vec();
    while let Some(i) = stack.pop() {
        if nodes[i].state == NodeState::Pending {
            nodes[i].state = NodeState::Skipped;
            stack.extend_from_slice(graph.dependents(i));
        }
    }
}
