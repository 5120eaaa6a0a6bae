use std::path::PathBuf;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};

/// The watched source tree.
///
/// Editors and `git checkout` may delete and recreate the whole directory,
/// which silently drops the OS watch; `maintain` puts it back.
pub(super) struct SourceRoot {
    path: PathBuf,
    attached: bool,
}

impl SourceRoot {
    pub(super) fn attach(path: PathBuf, watcher: &mut RecommendedWatcher) -> notify::Result<Self> {
        watcher.watch(&path, RecursiveMode::Recursive)?;
        crate::debug!("watch"; "watching {}", path.display());
        Ok(Self {
            path,
            attached: true,
        })
    }

    pub(super) fn maintain(&mut self, watcher: &mut RecommendedWatcher) {
        match (self.attached, self.path.exists()) {
            (true, false) => {
                crate::log!("warning"; "source directory removed: {}", self.path.display());
                self.attached = false;
            }
            (false, true) => {
                if watcher.watch(&self.path, RecursiveMode::Recursive).is_ok() {
                    crate::log!("watch"; "source directory is back, watching again");
                    self.attached = true;
                }
            }
            _ => {}
        }
    }
}
