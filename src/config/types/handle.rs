//! Global config handle.
//!
//! Uses `arc-swap` for lock-free reads from the server loop and the
//! watcher without threading the config through every call.

use crate::config::PackConfig;
use arc_swap::ArcSwap;
use std::sync::{Arc, LazyLock};

/// Global config storage.
pub static CONFIG: LazyLock<ArcSwap<PackConfig>> =
    LazyLock::new(|| ArcSwap::from_pointee(PackConfig::default()));

#[inline]
pub fn cfg() -> Arc<PackConfig> {
    CONFIG.load_full()
}

#[inline]
pub fn init_config(config: PackConfig) -> Arc<PackConfig> {
    let arc = Arc::new(config);
    CONFIG.store(Arc::clone(&arc));
    arc
}
