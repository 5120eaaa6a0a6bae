//! Actor system for watch mode.
//!
//! ```text
//! FsActor --Run--> RunnerActor --Send/Error--> WsActor --> browsers
//!    |                                            ^
//!    +------------------Reload--------------------+
//! ```
//!
//! - `messages` - message types between actors
//! - `fs` - file watcher, debouncing and watch bindings
//! - `runner` - task re-runs, at most one per task at a time
//! - `ws` - WebSocket client registry and broadcast
//! - `coordinator` - wires channels and runs the actors

pub mod coordinator;
pub mod fs;
pub mod messages;
pub mod runner;
pub mod ws;

pub use coordinator::Coordinator;
