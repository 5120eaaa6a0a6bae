//! Actor Coordinator - Wires up the Watch-Mode Actor System
//!
//! The Coordinator is a thin orchestrator that:
//! - Creates communication channels
//! - Starts the WebSocket acceptor
//! - Wires up actors and runs them until shutdown

mod runtime;

use anyhow::{Context, Result};
use crossbeam::channel::Receiver;
use tokio::sync::mpsc;

use super::fs::{FsActor, WatchBindings};
use super::messages::{RunnerMsg, WsMsg};
use super::runner::RunnerActor;
use super::ws::WsActor;
use crate::task::{TaskContext, TaskId};

const CHANNEL_BUFFER: usize = 32;

/// Coordinator - wires up and runs the actor system.
pub struct Coordinator {
    ctx: TaskContext,
    ws_port: Option<u16>,
    watch: bool,
    /// Initial-build failures with their error text
    failed: Vec<(TaskId, String)>,
    shutdown_rx: Option<Receiver<()>>,
}

impl Coordinator {
    pub fn with_context(ctx: TaskContext) -> Self {
        let watch = ctx.config.serve.watch;
        Self {
            ctx,
            ws_port: None,
            watch,
            failed: Vec::new(),
            shutdown_rx: None,
        }
    }

    /// Set WebSocket port (first one tried).
    pub fn with_ws_port(mut self, port: u16) -> Self {
        self.ws_port = Some(port);
        self
    }

    /// Tasks that failed in the initial build; browsers see their error
    /// until they recover.
    pub fn with_failed(mut self, failed: Vec<(TaskId, String)>) -> Self {
        self.failed = failed;
        self
    }

    /// Set shutdown signal receiver.
    pub fn with_shutdown_signal(mut self, rx: Receiver<()>) -> Self {
        self.shutdown_rx = Some(rx);
        self
    }

    /// Run the actor system.
    pub async fn run(mut self) -> Result<()> {
        let (runner_tx, runner_rx) = mpsc::channel::<RunnerMsg>(CHANNEL_BUFFER);
        let (ws_tx, ws_rx) = mpsc::channel::<WsMsg>(CHANNEL_BUFFER);

        if let Some(port) = self.ws_port {
            let interface = self.ctx.config.serve.interface;
            match crate::reload::server::start_ws_server(interface, port, ws_tx.clone()) {
                Ok(actual_port) => crate::cli::serve::set_actual_ws_port(actual_port),
                Err(e) => crate::log!("warning"; "live reload disabled: {}", e),
            }
        }

        let fs_actor = if self.watch {
            let bindings = WatchBindings::new(&self.ctx.table, &self.ctx.config.serve.reload)
                .context("invalid watch pattern")?;
            let source = self.ctx.table.source().to_path_buf();
            let actor = FsActor::new(source, bindings, runner_tx.clone(), ws_tx.clone())
                .map_err(|e| anyhow::anyhow!("watcher failed: {}", e))?;
            Some(actor)
        } else {
            crate::debug!("actor"; "watching disabled");
            None
        };

        if let Some((task, error)) = self.failed.first() {
            // Replayed to browsers until the task recovers
            ws_tx
                .send(WsMsg::Error {
                    task: task.name().to_string(),
                    error: error.clone(),
                })
                .await
                .ok();
        }

        let runner = RunnerActor::new(runner_rx, runner_tx.clone(), ws_tx.clone(), self.ctx)
            .with_failed(self.failed.iter().map(|(task, _)| *task));
        let ws = WsActor::new(ws_rx);

        crate::debug!("actor"; "start");
        let shutdown_rx = self.shutdown_rx.take();
        runtime::run_actors(fs_actor, runner, ws, runner_tx, ws_tx, shutdown_rx).await;
        crate::debug!("actor"; "stopped");
        Ok(())
    }
}
