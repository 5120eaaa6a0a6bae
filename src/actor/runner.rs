//! Runner Actor - re-runs tasks triggered by the watcher.
//!
//! Each task runs on the blocking pool with its own recording
//! `ReloadHandle`. A task is never run twice concurrently: triggers that
//! arrive while it runs collapse into one follow-up run.

use std::collections::BTreeSet;
use std::time::Instant;

use rustc_hash::FxHashSet;
use tokio::sync::mpsc;

use super::messages::{RunnerMsg, WsMsg};
use crate::reload::{HotReloadMessage, ReloadHandle};
use crate::task::{TaskContext, TaskError, TaskId, TaskOutcome, TaskResult, run_task};
use crate::utils::plural::plural_count;

/// Running and queued tasks.
#[derive(Debug, Default)]
pub struct TaskSlots {
    running: FxHashSet<TaskId>,
    queued: BTreeSet<TaskId>,
}

impl TaskSlots {
    /// `true` if the task may start now; otherwise it is queued.
    pub fn request(&mut self, task: TaskId) -> bool {
        if self.running.insert(task) {
            true
        } else {
            self.queued.insert(task);
            false
        }
    }

    /// Mark a run finished. `true` if a queued follow-up should start now
    /// (the slot stays taken).
    pub fn finish(&mut self, task: TaskId) -> bool {
        if self.queued.remove(&task) {
            true
        } else {
            self.running.remove(&task);
            false
        }
    }

    pub fn is_idle(&self) -> bool {
        self.running.is_empty()
    }
}

pub struct RunnerActor {
    rx: mpsc::Receiver<RunnerMsg>,
    /// Completions are posted back to this actor
    tx: mpsc::Sender<RunnerMsg>,
    ws_tx: mpsc::Sender<WsMsg>,
    ctx: TaskContext,
    slots: TaskSlots,
    /// Tasks whose last run failed
    failed: FxHashSet<TaskId>,
}

impl RunnerActor {
    pub fn new(
        rx: mpsc::Receiver<RunnerMsg>,
        tx: mpsc::Sender<RunnerMsg>,
        ws_tx: mpsc::Sender<WsMsg>,
        ctx: TaskContext,
    ) -> Self {
        Self {
            rx,
            tx,
            ws_tx,
            ctx,
            slots: TaskSlots::default(),
            failed: FxHashSet::default(),
        }
    }

    /// Start with tasks that failed during the initial build, so their
    /// first success clears the browser overlay.
    pub fn with_failed(mut self, tasks: impl IntoIterator<Item = TaskId>) -> Self {
        self.failed.extend(tasks);
        self
    }

    pub async fn run(mut self) {
        while let Some(msg) = self.rx.recv().await {
            match msg {
                RunnerMsg::Run(tasks) => {
                    for task in tasks {
                        if self.slots.request(task) {
                            self.spawn(task);
                        } else {
                            crate::debug!("runner"; "{} busy, queued", task);
                        }
                    }
                }

                RunnerMsg::Finished {
                    task,
                    result,
                    reload,
                    elapsed,
                } => {
                    let ms = elapsed.as_millis();
                    if self.report(task, result, reload, ms).await.is_err() {
                        break;
                    }
                    if self.slots.finish(task) {
                        crate::debug!("runner"; "{} re-running queued trigger", task);
                        self.spawn(task);
                    }
                }

                RunnerMsg::Shutdown => {
                    if !self.slots.is_idle() {
                        crate::debug!("runner"; "shutting down with tasks still running");
                    }
                    break;
                }
            }
        }
    }

    fn spawn(&self, task: TaskId) {
        let (handle, batch) = ReloadHandle::recording();
        let ctx = self.ctx.with_reload(handle);
        let output = self.ctx.table.output().to_path_buf();
        let tx = self.tx.clone();

        tokio::spawn(async move {
            let started = Instant::now();
            let result = tokio::task::spawn_blocking(move || run_task(task, &ctx))
                .await
                .unwrap_or_else(|e| {
                    Err(TaskError::tooling(task.name(), format!("task panicked: {e}")))
                });

            // Failed runs may leave partial writes; browsers only hear the error
            let reload = match &result {
                Ok(_) => batch.into_message(&output, task.name()),
                Err(_) => None,
            };

            let _ = tx
                .send(RunnerMsg::Finished {
                    task,
                    result,
                    reload,
                    elapsed: started.elapsed(),
                })
                .await;
        });
    }

    /// Print the outcome and notify browsers.
    async fn report(
        &mut self,
        task: TaskId,
        result: TaskResult,
        reload: Option<HotReloadMessage>,
        ms: u128,
    ) -> Result<(), mpsc::error::SendError<WsMsg>> {
        match result {
            Ok(TaskOutcome::Succeeded { written }) => {
                crate::logger::status_success(&format!(
                    "{task}: {} in {ms}ms",
                    plural_count(written, "file")
                ));
                self.recovered(task).await?;
            }
            Ok(TaskOutcome::Degraded { written, failures }) => {
                let detail = failures
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("\n");
                crate::logger::status_warning(&format!(
                    "{task}: {}, {} skipped\n{detail}",
                    plural_count(written, "file"),
                    failures.len()
                ));
                self.recovered(task).await?;
            }
            Err(e) => {
                crate::logger::status_error(&format!("{task} failed"), &e.to_string());
                self.failed.insert(task);
                return self
                    .ws_tx
                    .send(WsMsg::Error {
                        task: task.name().to_string(),
                        error: e.to_string(),
                    })
                    .await;
            }
        }

        if let Some(message) = reload {
            self.ws_tx.send(WsMsg::Send(message)).await?;
        }
        Ok(())
    }

    /// Clear the overlay once the last failing task has recovered.
    async fn recovered(&mut self, task: TaskId) -> Result<(), mpsc::error::SendError<WsMsg>> {
        if self.failed.remove(&task) && self.failed.is_empty() {
            self.ws_tx.send(WsMsg::ClearError).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{test_context, write_source};
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_slots_start_when_idle() {
        let mut slots = TaskSlots::default();
        assert!(slots.request(TaskId::CompileStyles));
        assert!(slots.request(TaskId::MinifyScripts));
        assert!(!slots.is_idle());
    }

    #[test]
    fn test_slots_coalesce_triggers() {
        let mut slots = TaskSlots::default();
        assert!(slots.request(TaskId::CompileStyles));
        assert!(!slots.request(TaskId::CompileStyles));
        assert!(!slots.request(TaskId::CompileStyles));

        // Three triggers, one follow-up
        assert!(slots.finish(TaskId::CompileStyles));
        assert!(!slots.is_idle());
        assert!(!slots.finish(TaskId::CompileStyles));
        assert!(slots.is_idle());
    }

    async fn recv(rx: &mut mpsc::Receiver<WsMsg>) -> WsMsg {
        tokio::time::timeout(Duration::from_secs(10), rx.recv())
            .await
            .unwrap()
            .unwrap()
    }

    fn start(ctx: TaskContext) -> (mpsc::Sender<RunnerMsg>, mpsc::Receiver<WsMsg>) {
        let (tx, rx) = mpsc::channel(32);
        let (ws_tx, ws_rx) = mpsc::channel(32);
        let actor = RunnerActor::new(rx, tx.clone(), ws_tx, ctx);
        tokio::spawn(actor.run());
        (tx, ws_rx)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_style_rerun_sends_css_swap() {
        let dir = TempDir::new().unwrap();
        write_source(dir.path(), "sass/style.scss", "$c: red;\nbody { color: $c; }\n");
        let (tx, mut ws_rx) = start(test_context(dir.path()));

        tx.send(RunnerMsg::Run(vec![TaskId::CompileStyles])).await.unwrap();

        match recv(&mut ws_rx).await {
            WsMsg::Send(HotReloadMessage::Css { paths }) => {
                assert_eq!(paths, vec!["/css/style.min.css".to_string()]);
            }
            other => panic!("unexpected message: {other:?}"),
        }
        tx.send(RunnerMsg::Shutdown).await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_failure_then_recovery() {
        let dir = TempDir::new().unwrap();
        write_source(dir.path(), "sass/style.scss", "body { color: ; \n");
        let (tx, mut ws_rx) = start(test_context(dir.path()));

        tx.send(RunnerMsg::Run(vec![TaskId::CompileStyles])).await.unwrap();
        match recv(&mut ws_rx).await {
            WsMsg::Error { task, .. } => assert_eq!(task, "compile-styles"),
            other => panic!("unexpected message: {other:?}"),
        }

        write_source(dir.path(), "sass/style.scss", "body { color: red; }\n");
        tx.send(RunnerMsg::Run(vec![TaskId::CompileStyles])).await.unwrap();
        assert!(matches!(recv(&mut ws_rx).await, WsMsg::ClearError));
        assert!(matches!(recv(&mut ws_rx).await, WsMsg::Send(HotReloadMessage::Css { .. })));

        tx.send(RunnerMsg::Shutdown).await.unwrap();
    }
}
