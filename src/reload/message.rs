//! Hot Reload Message Protocol
//!
//! JSON messages sent over the live-reload WebSocket.
//!
//! # Message Types
//!
//! - `reload`: Trigger full page reload
//! - `css`: Re-fetch the listed stylesheets without reloading
//! - `connected`: Handshake greeting
//! - `error` / `clear_error`: Show or hide the build error overlay
//! - `ping`: Keep connection alive

use serde::{Deserialize, Serialize};

/// Hot reload message sent over WebSocket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum HotReloadMessage {
    /// Full page reload
    Reload {
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    /// Stylesheet-only update: clients swap matching `<link>` hrefs
    Css {
        /// URL paths of the changed stylesheets (e.g. "/css/style.min.css")
        paths: Vec<String>,
    },

    /// Keep-alive ping (server → client)
    Ping { ts: u64 },

    /// Connection established
    Connected { version: String },

    /// Task failure (display overlay, no reload)
    Error { task: String, error: String },

    /// Clear error overlay (the task succeeded after a failure)
    #[serde(rename = "clear_error")]
    ClearError,
}

impl HotReloadMessage {
    pub fn reload_with_reason(reason: impl Into<String>) -> Self {
        Self::Reload {
            reason: Some(reason.into()),
        }
    }

    pub fn css(paths: Vec<String>) -> Self {
        Self::Css { paths }
    }

    pub fn connected() -> Self {
        Self::Connected {
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn error(task: impl Into<String>, error: impl Into<String>) -> Self {
        Self::Error {
            task: task.into(),
            error: error.into(),
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn ping() -> Self {
        use std::time::{SystemTime, UNIX_EPOCH};
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        Self::Ping { ts }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"type":"reload"}"#.to_string())
    }

    /// Parse from JSON string
    #[cfg(test)]
    pub fn from_json(s: &str) -> Option<Self> {
        serde_json::from_str(s).ok()
    }
}
