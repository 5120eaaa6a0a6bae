use tungstenite::protocol::Message;

use super::WsActor;
use crate::reload::HotReloadMessage;

impl WsActor {
    /// Send to every client, dropping those whose socket fails.
    pub(super) fn broadcast(&self, message: &HotReloadMessage) {
        let mut clients = self.clients.lock();
        if clients.is_empty() {
            crate::debug!("ws"; "no clients connected");
            return;
        }

        let frame = Message::Text(message.to_json().into());
        clients.retain_mut(|ws| match ws.send(frame.clone()) {
            Ok(()) => true,
            Err(e) => {
                crate::debug!("ws"; "client disconnected: {}", e);
                false
            }
        });
        crate::debug!("ws"; "broadcast to {} clients", clients.len());
    }
}
