use std::net::TcpStream;
use std::time::{Duration, Instant};

use tungstenite::protocol::Message;

use super::{Clients, WsActor};
use crate::reload::HotReloadMessage;

/// Poll interval of the reader thread.
const POLL_INTERVAL: Duration = Duration::from_millis(100);
/// Keep-alive period.
const PING_INTERVAL: Duration = Duration::from_secs(30);

impl WsActor {
    /// Finish the handshake and register the client.
    ///
    /// The handshake runs in blocking mode; afterwards the socket is
    /// switched to non-blocking for the reader thread.
    pub(super) fn add_client(&self, stream: TcpStream) {
        let mut ws = match tungstenite::accept(stream) {
            Ok(ws) => ws,
            Err(e) => {
                crate::log!("ws"; "handshake failed: {}", e);
                return;
            }
        };

        let greeting = HotReloadMessage::connected();
        if let Err(e) = ws.send(Message::Text(greeting.to_json().into())) {
            crate::debug!("ws"; "failed to send connected message: {}", e);
            return;
        }

        if let Some(pending) = self.pending_error.lock().as_ref() {
            let replay = HotReloadMessage::error(&pending.task, &pending.error);
            if let Err(e) = ws.send(Message::Text(replay.to_json().into())) {
                crate::debug!("ws"; "failed to send pending error: {}", e);
                return;
            }
        }

        let _ = ws.get_ref().set_nonblocking(true);

        let mut clients = self.clients.lock();
        clients.push(ws);
        crate::debug!("ws"; "client connected (total: {})", clients.len());
    }
}

/// Drop clients that closed or errored, and ping the rest periodically.
///
/// Clients never send anything meaningful; reads only surface closes.
pub(super) fn reader_loop(clients: &Clients) {
    let mut last_ping = Instant::now();

    while !crate::core::is_shutdown() {
        std::thread::sleep(POLL_INTERVAL);

        let mut clients = clients.lock();
        clients.retain_mut(|ws| match ws.read() {
            Ok(Message::Close(_)) => false,
            Ok(_) => true,
            Err(tungstenite::Error::Io(ref e)) if e.kind() == std::io::ErrorKind::WouldBlock => {
                true
            }
            Err(e) => {
                crate::debug!("ws"; "client dropped: {}", e);
                false
            }
        });

        if last_ping.elapsed() >= PING_INTERVAL {
            last_ping = Instant::now();
            let ping = Message::Text(HotReloadMessage::ping().to_json().into());
            clients.retain_mut(|ws| ws.send(ping.clone()).is_ok());
        }
    }
}
