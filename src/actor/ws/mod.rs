//! WebSocket Actor
//!
//! Owns every live-reload client and broadcasts `HotReloadMessage`s.
//! The last task error is kept so browsers connecting later still see
//! the overlay.
//!
//! ```text
//! RunnerActor --[Send/Error/ClearError]--> WsActor --json--> Clients
//! ws acceptor --[AddClient]------------------^
//! ```

mod client_io;
mod delivery;

use std::net::TcpStream;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tungstenite::WebSocket;

use super::messages::WsMsg;
use crate::reload::HotReloadMessage;

/// Error currently shown in browsers, replayed to new clients.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingError {
    task: String,
    error: String,
}

type Clients = Arc<Mutex<Vec<WebSocket<TcpStream>>>>;

pub struct WsActor {
    rx: mpsc::Receiver<WsMsg>,
    /// Shared with the reader thread that detects closed sockets
    clients: Clients,
    pending_error: Mutex<Option<PendingError>>,
}

impl WsActor {
    pub fn new(rx: mpsc::Receiver<WsMsg>) -> Self {
        Self {
            rx,
            clients: Arc::new(Mutex::new(Vec::new())),
            pending_error: Mutex::new(None),
        }
    }

    pub async fn run(mut self) {
        let clients = Arc::clone(&self.clients);
        std::thread::spawn(move || client_io::reader_loop(&clients));

        while let Some(msg) = self.rx.recv().await {
            match msg {
                WsMsg::Send(message) => {
                    crate::debug!("ws"; "send {}", message.to_json());
                    self.broadcast(&message);
                }

                WsMsg::Error { task, error } => {
                    let message = HotReloadMessage::error(&task, &error);
                    *self.pending_error.lock() = Some(PendingError { task, error });
                    self.broadcast(&message);
                }

                WsMsg::ClearError => {
                    *self.pending_error.lock() = None;
                    self.broadcast(&HotReloadMessage::ClearError);
                }

                WsMsg::AddClient(stream) => self.add_client(stream),

                WsMsg::Shutdown => {
                    crate::debug!("ws"; "shutting down, closing {} clients", self.client_count());
                    for mut ws in self.clients.lock().drain(..) {
                        let _ = ws.close(None);
                    }
                    break;
                }
            }
        }
    }

    fn client_count(&self) -> usize {
        self.clients.lock().len()
    }
}
