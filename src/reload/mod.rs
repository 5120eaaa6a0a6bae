//! Live reload.
//!
//! ```text
//! task --ReloadHandle--> runner --WsMsg--> WsActor --json--> browser
//! ```
//!
//! - `handle` - destination-change reports from tasks
//! - `message` - JSON protocol (reload, css, error, clear_error)
//! - `server` - WebSocket acceptor feeding the `WsActor`

pub mod handle;
pub mod message;
pub mod server;

pub use handle::ReloadHandle;
pub use message::HotReloadMessage;
