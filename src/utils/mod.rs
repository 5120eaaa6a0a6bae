//! Shared helpers used across tasks, the dev server and the logger.

pub mod date;
pub mod hash;
pub mod mime;
pub mod path;
pub mod plural;
