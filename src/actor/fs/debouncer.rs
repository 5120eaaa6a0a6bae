use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;

use super::types::{ChangeKind, DebouncedEvents};
use crate::utils::path::normalize_path;

/// Quiet window before a batch is released.
pub(super) const DEBOUNCE_MS: u64 = 300;
/// Minimum gap between two released batches.
pub(super) const REBUILD_COOLDOWN_MS: u64 = 800;

/// Collects notify events into deduplicated batches.
pub(super) struct Debouncer {
    pub(super) changes: FxHashMap<PathBuf, ChangeKind>,
    pub(super) last_event: Option<Instant>,
    pub(super) last_release: Option<Instant>,
}

/// Combine a pending change with a new one for the same path.
///
/// `None` drops the path from the batch.
pub(super) fn merge(existing: ChangeKind, incoming: ChangeKind) -> Option<ChangeKind> {
    use ChangeKind::*;
    match (existing, incoming) {
        // Deleted then restored
        (Removed, Created | Modified) => Some(incoming),
        // Edited then deleted
        (Modified, Removed) => Some(Removed),
        // Appeared and vanished inside one window
        (Created, Removed) => None,
        // Otherwise the first event wins
        _ => Some(existing),
    }
}

impl Debouncer {
    pub(super) fn new() -> Self {
        Self {
            changes: FxHashMap::default(),
            last_event: None,
            last_release: None,
        }
    }

    pub(super) fn add_event(&mut self, event: &notify::Event) {
        use notify::EventKind;
        use notify::event::ModifyKind;

        let kind = match event.kind {
            EventKind::Create(_) => ChangeKind::Created,
            EventKind::Remove(_) => ChangeKind::Removed,
            // Metadata-only changes (mtime, chmod) would loop on our own writes
            EventKind::Modify(ModifyKind::Metadata(_)) => return,
            EventKind::Modify(_) => ChangeKind::Modified,
            _ => return,
        };

        for path in &event.paths {
            if is_temp_file(path) {
                continue;
            }
            let path = normalize_path(path);

            match self.changes.get(&path).copied() {
                None => {
                    crate::debug!("watch"; "{}: {}", kind.label(), path.display());
                    self.changes.insert(path, kind);
                }
                Some(existing) => match merge(existing, kind) {
                    Some(merged) if merged == existing => continue,
                    Some(merged) => {
                        crate::debug!("watch"; "{} -> {}: {}", existing.label(), merged.label(), path.display());
                        self.changes.insert(path, merged);
                    }
                    None => {
                        crate::debug!("watch"; "discard created+removed: {}", path.display());
                        self.changes.remove(&path);
                    }
                },
            }
            self.last_event = Some(Instant::now());
        }
    }

    /// Release the batch once the quiet window and cooldown have passed.
    pub(super) fn take_if_ready(&mut self) -> Option<DebouncedEvents> {
        if !self.is_ready() {
            return None;
        }

        let changes = std::mem::take(&mut self.changes);
        self.last_event = None;
        self.last_release = Some(Instant::now());

        let mut events: Vec<_> = changes.into_iter().collect();
        events.sort_by(|a, b| a.0.cmp(&b.0));
        Some(DebouncedEvents(events))
    }

    pub(super) fn is_ready(&self) -> bool {
        let Some(last_event) = self.last_event else {
            return false;
        };
        if last_event.elapsed() < Duration::from_millis(DEBOUNCE_MS) {
            return false;
        }
        if let Some(last_release) = self.last_release
            && last_release.elapsed() < Duration::from_millis(REBUILD_COOLDOWN_MS)
        {
            return false;
        }
        !self.changes.is_empty()
    }

    /// Time until the batch could next be released.
    pub(super) fn sleep_duration(&self) -> Duration {
        let Some(last_event) = self.last_event else {
            return Duration::from_secs(86400);
        };

        let debounce = Duration::from_millis(DEBOUNCE_MS).saturating_sub(last_event.elapsed());
        let cooldown = self
            .last_release
            .map(|t| Duration::from_millis(REBUILD_COOLDOWN_MS).saturating_sub(t.elapsed()))
            .unwrap_or(Duration::ZERO);

        debounce.max(cooldown).max(Duration::from_millis(1))
    }
}

/// Editor swap files, backups and dotfiles.
pub(super) fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}
