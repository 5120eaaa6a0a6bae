//! `[serve]` section configuration.
//!
//! Contains development server settings.
//!
//! # Example
//!
//! ```toml
//! [serve]
//! interface = "127.0.0.1"     # Network interface (127.0.0.1 = localhost only)
//! port = 3000                 # HTTP port number
//! ws_port = 35729             # Live-reload WebSocket port
//! watch = true                # Re-run tasks on file changes
//! reload = ["data/**/*.json"] # Extra source globs that only reload the browser
//! ```
//!
//! Use `interface = "0.0.0.0"` to make the server accessible from LAN.

use crate::config::{ConfigDiagnostics, FieldPath};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};

/// Development server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Network interface to bind.
    /// - `127.0.0.1` (default): localhost only
    /// - `0.0.0.0`: all interfaces (LAN accessible)
    pub interface: IpAddr,

    /// HTTP port number.
    pub port: u16,

    /// Live-reload WebSocket port.
    pub ws_port: u16,

    /// Enable file watcher for live reload.
    pub watch: bool,

    /// Source globs bound to a plain browser reload.
    pub reload: Vec<String>,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 3000,
            ws_port: 35729,
            watch: true,
            reload: Vec::new(),
        }
    }
}

impl ServeConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.interface.is_unspecified() {
            diag.warn(
                FieldPath::new("serve.interface"),
                format!("`{}` exposes the dev server to the network", self.interface),
            );
        }
        if self.port == self.ws_port {
            diag.error(
                FieldPath::new("serve.ws_port"),
                format!("must differ from `serve.port` ({})", self.port),
            );
        }
        for pattern in &self.reload {
            if let Err(e) = globset::Glob::new(pattern) {
                diag.error(
                    FieldPath::new("serve.reload"),
                    format!("invalid glob `{pattern}`: {}", e.kind()),
                );
            }
        }
    }
}
