//! Process-wide state shared by the dev server and the actors.

mod state;

pub use state::{is_serving, is_shutdown, register_server, set_serving, setup_shutdown_handler};
