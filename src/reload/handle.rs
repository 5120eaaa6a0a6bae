//! Destination-change handle passed to tasks.
//!
//! Tasks report every file they write. In dev mode the runner gives each
//! task run a recording handle and turns the batch into one browser
//! message; `build` passes a disabled handle and the reports are dropped.

use std::path::{Path, PathBuf};

use crossbeam::channel::{Receiver, Sender, unbounded};

use super::message::HotReloadMessage;

#[derive(Debug, Clone, Default)]
pub struct ReloadHandle {
    tx: Option<Sender<PathBuf>>,
}

impl ReloadHandle {
    /// Handle that drops every report.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// Handle plus the batch collecting its reports.
    pub fn recording() -> (Self, ReloadBatch) {
        let (tx, rx) = unbounded();
        (Self { tx: Some(tx) }, ReloadBatch { rx })
    }

    /// Report a written or deleted destination file.
    pub fn changed(&self, path: &Path) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(path.to_path_buf());
        }
    }
}

/// Destination changes reported during one task run.
pub struct ReloadBatch {
    rx: Receiver<PathBuf>,
}

impl ReloadBatch {
    /// Drain reports, deduplicated and sorted.
    pub fn drain(&self) -> Vec<PathBuf> {
        let mut paths: Vec<_> = self.rx.try_iter().collect();
        paths.sort();
        paths.dedup();
        paths
    }

    /// Browser message for the drained reports.
    ///
    /// Stylesheet-only batches become a `css` swap, anything else a full
    /// reload. Source maps are ignored. `None` when nothing changed.
    pub fn into_message(self, output_root: &Path, reason: &str) -> Option<HotReloadMessage> {
        let mut paths = self.drain();
        paths.retain(|p| !p.extension().is_some_and(|e| e == "map"));
        if paths.is_empty() {
            return None;
        }

        let all_css = paths
            .iter()
            .all(|p| p.extension().is_some_and(|e| e == "css"));
        if !all_css {
            return Some(HotReloadMessage::reload_with_reason(reason));
        }

        let urls = paths
            .iter()
            .map(|p| {
                let rel = crate::utils::path::relative_display(p, output_root);
                format!("/{}", rel.trim_start_matches('/'))
            })
            .collect();
        Some(HotReloadMessage::css(urls))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_handle_is_noop() {
        let handle = ReloadHandle::disabled();
        assert!(handle.tx.is_none());
        handle.changed(Path::new("/site/build/index.html"));
    }

    #[test]
    fn test_css_batch() {
        let (handle, batch) = ReloadHandle::recording();
        handle.changed(Path::new("/site/build/css/style.min.css"));
        handle.changed(Path::new("/site/build/css/style.min.css"));

        let msg = batch.into_message(Path::new("/site/build"), "compile-styles");
        assert_eq!(
            msg,
            Some(HotReloadMessage::css(vec!["/css/style.min.css".into()]))
        );
    }

    #[test]
    fn test_source_map_keeps_css_swap() {
        let (handle, batch) = ReloadHandle::recording();
        handle.changed(Path::new("/site/build/css/style.min.css"));
        handle.changed(Path::new("/site/build/css/style.min.css.map"));

        let msg = batch.into_message(Path::new("/site/build"), "compile-styles");
        assert_eq!(
            msg,
            Some(HotReloadMessage::css(vec!["/css/style.min.css".into()]))
        );
    }

    #[test]
    fn test_mixed_batch_reloads() {
        let (handle, batch) = ReloadHandle::recording();
        handle.changed(Path::new("/site/build/css/style.min.css"));
        handle.changed(Path::new("/site/build/index.html"));

        let msg = batch.into_message(Path::new("/site/build"), "minify-html");
        assert!(matches!(msg, Some(HotReloadMessage::Reload { .. })));
    }

    #[test]
    fn test_empty_batch() {
        let (_handle, batch) = ReloadHandle::recording();
        assert!(batch.into_message(Path::new("/site/build"), "x").is_none());
    }
}
