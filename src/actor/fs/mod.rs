//! FileSystem actor
//!
//! Watches the source tree and turns debounced changes into task re-runs
//! or plain reloads.
//!
//! ```text
//! notify → Debouncer (timing, dedup) → WatchBindings → RunnerMsg / WsMsg
//! ```

mod debouncer;
mod router;
mod source_root;
mod types;

#[cfg(test)]
mod tests;

pub use router::{WatchAction, WatchBindings};

use std::path::PathBuf;

use notify::RecommendedWatcher;
use tokio::sync::mpsc;

use super::messages::{RunnerMsg, WsMsg};
use crate::reload::HotReloadMessage;
use crate::task::TaskId;
use debouncer::Debouncer;
use router::log_events;
use source_root::SourceRoot;

pub struct FsActor {
    /// notify callback channel (sync side)
    notify_rx: std::sync::mpsc::Receiver<notify::Result<notify::Event>>,
    /// Must stay alive for events to flow
    watcher: RecommendedWatcher,
    source: SourceRoot,
    bindings: WatchBindings,
    runner_tx: mpsc::Sender<RunnerMsg>,
    ws_tx: mpsc::Sender<WsMsg>,
    debouncer: Debouncer,
}

impl FsActor {
    pub fn new(
        source: PathBuf,
        bindings: WatchBindings,
        runner_tx: mpsc::Sender<RunnerMsg>,
        ws_tx: mpsc::Sender<WsMsg>,
    ) -> notify::Result<Self> {
        let (notify_tx, notify_rx) = std::sync::mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        })?;

        let source = SourceRoot::attach(source, &mut watcher)?;

        for binding in bindings.bindings() {
            crate::debug!("watch"; "{} -> {}", binding.pattern, binding.action);
        }

        Ok(Self {
            notify_rx,
            watcher,
            source,
            bindings,
            runner_tx,
            ws_tx,
            debouncer: Debouncer::new(),
        })
    }

    pub async fn run(self) {
        let Self {
            notify_rx,
            mut watcher,
            mut source,
            bindings,
            runner_tx,
            ws_tx,
            mut debouncer,
        } = self;

        let (async_tx, mut async_rx) = mpsc::channel::<notify::Event>(64);

        // notify only offers a sync callback
        std::thread::spawn(move || {
            while let Ok(result) = notify_rx.recv() {
                match result {
                    Ok(event) => {
                        if async_tx.blocking_send(event).is_err() {
                            break;
                        }
                    }
                    Err(e) => crate::log!("watch"; "notify error: {}", e),
                }
            }
        });

        loop {
            tokio::select! {
                biased;
                Some(event) = async_rx.recv() => debouncer.add_event(&event),
                _ = tokio::time::sleep(debouncer.sleep_duration()) => {
                    source.maintain(&mut watcher);
                    if dispatch(&mut debouncer, &bindings, &runner_tx, &ws_tx).await.is_err() {
                        break;
                    }
                }
            }
        }
    }
}

/// Send the actions of a released batch.
///
/// `Err(())` once a receiving actor has shut down.
async fn dispatch(
    debouncer: &mut Debouncer,
    bindings: &WatchBindings,
    runner_tx: &mpsc::Sender<RunnerMsg>,
    ws_tx: &mpsc::Sender<WsMsg>,
) -> Result<(), ()> {
    // Keep buffering until the server accepts requests
    if !crate::core::is_serving() {
        return Ok(());
    }
    let Some(events) = debouncer.take_if_ready() else {
        return Ok(());
    };
    log_events(&events);

    let actions = bindings.resolve(&events);
    crate::debug!("watch"; "{} changes -> {} actions", events.len(), actions.len());

    let tasks: Vec<TaskId> = actions
        .iter()
        .filter_map(|a| match a {
            WatchAction::Run(task) => Some(*task),
            WatchAction::Reload => None,
        })
        .collect();

    if !tasks.is_empty() {
        runner_tx.send(RunnerMsg::Run(tasks)).await.map_err(|_| ())?;
    }
    if actions.contains(&WatchAction::Reload) {
        let reason = events
            .paths()
            .find(|p| bindings.resolve_path(p).contains(&WatchAction::Reload))
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "source changed".into());
        crate::logger::status_success(&format!("reload: {reason}"));
        ws_tx
            .send(WsMsg::Send(HotReloadMessage::reload_with_reason(reason)))
            .await
            .map_err(|_| ())?;
    }
    Ok(())
}
