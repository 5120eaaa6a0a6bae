use std::time::Duration;

use crossbeam::channel::Receiver;
use tokio::sync::mpsc;

use crate::actor::fs::FsActor;
use crate::actor::messages::{RunnerMsg, WsMsg};
use crate::actor::runner::RunnerActor;
use crate::actor::ws::WsActor;

/// Run all actors until the shutdown signal (or until one of them stops).
pub(super) async fn run_actors(
    fs: Option<FsActor>,
    runner: RunnerActor,
    ws: WsActor,
    runner_tx: mpsc::Sender<RunnerMsg>,
    ws_tx: mpsc::Sender<WsMsg>,
    shutdown_rx: Option<Receiver<()>>,
) {
    let fs_handle = fs.map(|fs| tokio::spawn(fs.run()));
    let runner_handle = tokio::spawn(runner.run());
    let ws_handle = tokio::spawn(ws.run());

    if let Some(rx) = shutdown_rx {
        loop {
            if rx.try_recv().is_ok() || crate::core::is_shutdown() {
                crate::debug!("actor"; "shutdown signal received");
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    } else {
        tokio::select! {
            _ = runner_handle => {}
            _ = ws_handle => {}
        }
    }

    let _ = runner_tx.send(RunnerMsg::Shutdown).await;
    let _ = ws_tx.send(WsMsg::Shutdown).await;
    if let Some(handle) = fs_handle {
        handle.abort();
    }

    // Let the ws actor close its sockets
    tokio::time::sleep(Duration::from_millis(100)).await;
}
