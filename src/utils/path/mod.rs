//! Path and URL utilities.
//!
//! - [`fs`]: Filesystem helpers (`normalize_path`, `relative_display`, `write_atomic`)
//! - [`route`]: Asset reference helpers (`is_external_ref`, `split_suffix`)

pub mod fs;
pub mod route;

pub use fs::{normalize_path, relative_display, write_atomic};
