//! Actor message definitions.

use std::net::TcpStream;
use std::time::Duration;

use crate::reload::HotReloadMessage;
use crate::task::{TaskId, TaskResult};

/// Messages to the runner actor.
#[derive(Debug)]
pub enum RunnerMsg {
    /// Re-run these tasks (queued when already running).
    Run(Vec<TaskId>),
    /// A spawned run completed.
    Finished {
        task: TaskId,
        result: TaskResult,
        /// What to tell browsers about the files it wrote.
        reload: Option<HotReloadMessage>,
        elapsed: Duration,
    },
    Shutdown,
}

/// Messages to the WebSocket actor.
#[derive(Debug)]
pub enum WsMsg {
    /// Broadcast a message to every client.
    Send(HotReloadMessage),
    /// A task failed: show the overlay and remember it for new clients.
    Error { task: String, error: String },
    /// Every failed task has recovered.
    ClearError,
    /// Accepted TCP stream waiting for its handshake.
    AddClient(TcpStream),
    Shutdown,
}
