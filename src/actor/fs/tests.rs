use std::path::PathBuf;
use std::time::Duration;

use tempfile::TempDir;

use super::debouncer::{DEBOUNCE_MS, Debouncer, REBUILD_COOLDOWN_MS, is_temp_file, merge};
use super::router::{WatchAction, WatchBindings};
use super::types::{ChangeKind, DebouncedEvents};
use crate::config::test_config_at;
use crate::paths::PathTable;
use crate::task::TaskId;
use crate::utils::path::normalize_path;

fn make_event(paths: Vec<&str>, kind: notify::EventKind) -> notify::Event {
    notify::Event {
        kind,
        paths: paths.into_iter().map(PathBuf::from).collect(),
        attrs: Default::default(),
    }
}

fn modify_kind() -> notify::EventKind {
    notify::EventKind::Modify(notify::event::ModifyKind::Data(
        notify::event::DataChange::Any,
    ))
}

fn create_kind() -> notify::EventKind {
    notify::EventKind::Create(notify::event::CreateKind::File)
}

fn remove_kind() -> notify::EventKind {
    notify::EventKind::Remove(notify::event::RemoveKind::File)
}

/// Bindings over a temp project, plus its normalized source root.
fn bindings(reload: &[&str]) -> (TempDir, PathBuf, WatchBindings) {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("source")).unwrap();
    let config = test_config_at(dir.path());
    let table = PathTable::from_config(&config).unwrap();
    let reload: Vec<String> = reload.iter().map(|s| (*s).to_string()).collect();
    let bindings = WatchBindings::new(&table, &reload).unwrap();
    let source = normalize_path(&dir.path().join("source"));
    (dir, source, bindings)
}

// ============================================================================
// Debouncer
// ============================================================================

#[test]
fn test_debouncer_empty() {
    let mut debouncer = Debouncer::new();
    assert!(!debouncer.is_ready());
    assert!(debouncer.take_if_ready().is_none());
}

#[test]
fn test_event_kinds() {
    let mut debouncer = Debouncer::new();
    debouncer.add_event(&make_event(vec!["/tmp/a.scss"], create_kind()));
    debouncer.add_event(&make_event(vec!["/tmp/b.scss"], modify_kind()));
    debouncer.add_event(&make_event(vec!["/tmp/c.scss"], remove_kind()));

    assert_eq!(debouncer.changes.len(), 3);
    assert_eq!(debouncer.changes[&PathBuf::from("/tmp/a.scss")], ChangeKind::Created);
    assert_eq!(debouncer.changes[&PathBuf::from("/tmp/b.scss")], ChangeKind::Modified);
    assert_eq!(debouncer.changes[&PathBuf::from("/tmp/c.scss")], ChangeKind::Removed);
}

#[test]
fn test_metadata_only_ignored() {
    let mut debouncer = Debouncer::new();
    let kind = notify::EventKind::Modify(notify::event::ModifyKind::Metadata(
        notify::event::MetadataKind::WriteTime,
    ));
    debouncer.add_event(&make_event(vec!["/tmp/a.scss"], kind));
    assert!(debouncer.changes.is_empty());
    assert!(debouncer.last_event.is_none());
}

#[test]
fn test_temp_file_ignored() {
    let mut debouncer = Debouncer::new();
    debouncer.add_event(&make_event(vec!["/tmp/index.html"], modify_kind()));
    let first = debouncer.last_event.unwrap();

    std::thread::sleep(Duration::from_millis(5));
    debouncer.add_event(&make_event(vec!["/tmp/.index.html.swp"], modify_kind()));
    debouncer.add_event(&make_event(vec!["/tmp/index.html~"], modify_kind()));

    assert_eq!(debouncer.last_event.unwrap(), first);
    assert_eq!(debouncer.changes.len(), 1);
}

#[test]
fn test_is_temp_file() {
    assert!(is_temp_file(&PathBuf::from("/s/a.swp")));
    assert!(is_temp_file(&PathBuf::from("/s/.style.scss.1234.tmp")));
    assert!(is_temp_file(&PathBuf::from("/s/index.html~")));
    assert!(!is_temp_file(&PathBuf::from("/s/index.html")));
}

#[test]
fn test_merge_rules() {
    use ChangeKind::*;
    assert_eq!(merge(Removed, Created), Some(Created));
    assert_eq!(merge(Removed, Modified), Some(Modified));
    assert_eq!(merge(Modified, Removed), Some(Removed));
    assert_eq!(merge(Created, Removed), None);
    assert_eq!(merge(Created, Modified), Some(Created));
    assert_eq!(merge(Modified, Modified), Some(Modified));
}

#[test]
fn test_create_then_remove_discards() {
    let mut debouncer = Debouncer::new();
    debouncer.add_event(&make_event(vec!["/tmp/a.svg"], create_kind()));
    debouncer.add_event(&make_event(vec!["/tmp/a.svg"], remove_kind()));
    assert!(debouncer.changes.is_empty());
}

#[test]
fn test_duplicate_paths_in_one_event() {
    let mut debouncer = Debouncer::new();
    debouncer.add_event(&make_event(vec!["/tmp/a.js", "/tmp/a.js"], modify_kind()));
    assert_eq!(debouncer.changes.len(), 1);
}

#[test]
fn test_sleep_duration_no_events() {
    let debouncer = Debouncer::new();
    assert!(debouncer.sleep_duration() >= Duration::from_secs(3600));
}

#[test]
fn test_sleep_duration_after_event() {
    let mut debouncer = Debouncer::new();
    debouncer.last_event = Some(std::time::Instant::now());

    let dur = debouncer.sleep_duration();
    assert!(dur >= Duration::from_millis(DEBOUNCE_MS - 10));
    assert!(dur <= Duration::from_millis(DEBOUNCE_MS + 10));
}

#[test]
fn test_sleep_duration_respects_cooldown() {
    let mut debouncer = Debouncer::new();
    debouncer.last_event = Some(std::time::Instant::now());
    debouncer.last_release = Some(std::time::Instant::now());

    let dur = debouncer.sleep_duration();
    assert!(dur >= Duration::from_millis(REBUILD_COOLDOWN_MS - 10));
    assert!(dur <= Duration::from_millis(REBUILD_COOLDOWN_MS + 10));
}

#[test]
fn test_take_after_quiet_window() {
    let mut debouncer = Debouncer::new();
    debouncer.add_event(&make_event(vec!["/tmp/b.js", "/tmp/a.js"], modify_kind()));
    assert!(debouncer.take_if_ready().is_none());

    debouncer.last_event =
        Some(std::time::Instant::now() - Duration::from_millis(DEBOUNCE_MS + 1));
    let events = debouncer.take_if_ready().unwrap();
    let paths: Vec<_> = events.paths().cloned().collect();
    assert_eq!(paths, vec![PathBuf::from("/tmp/a.js"), PathBuf::from("/tmp/b.js")]);
    assert!(debouncer.changes.is_empty());
}

// ============================================================================
// Bindings
// ============================================================================

#[test]
fn test_partial_change_runs_styles() {
    let (_dir, source, bindings) = bindings(&[]);
    assert_eq!(
        bindings.resolve_path(&source.join("sass/blocks/_header.scss")),
        vec![WatchAction::Run(TaskId::CompileStyles)]
    );
}

#[test]
fn test_raster_change_runs_both_image_tasks() {
    let (_dir, source, bindings) = bindings(&[]);
    let actions = bindings.resolve_path(&source.join("img/photos/a.jpg"));
    assert!(actions.contains(&WatchAction::Run(TaskId::OptimizeImages)));
    assert!(actions.contains(&WatchAction::Run(TaskId::RasterizeWebp)));
}

#[test]
fn test_icon_change_only_builds_sprite() {
    let (_dir, source, bindings) = bindings(&[]);
    assert_eq!(
        bindings.resolve_path(&source.join("img/icons/close.svg")),
        vec![WatchAction::Run(TaskId::BuildSprite)]
    );
}

#[test]
fn test_nested_markup_is_watched() {
    let (_dir, source, bindings) = bindings(&[]);
    assert_eq!(
        bindings.resolve_path(&source.join("partials/nav.html")),
        vec![WatchAction::Run(TaskId::MinifyHtml)]
    );
}

#[test]
fn test_reload_binding_and_unbound() {
    let (_dir, source, bindings) = bindings(&["data/**/*.json"]);
    assert_eq!(
        bindings.resolve_path(&source.join("data/menu.json")),
        vec![WatchAction::Reload]
    );
    assert!(bindings.resolve_path(&source.join("notes.txt")).is_empty());
    assert!(bindings.resolve_path(&PathBuf::from("/elsewhere/index.html")).is_empty());
}

#[test]
fn test_batch_resolution_is_distinct_and_ordered() {
    let (_dir, source, bindings) = bindings(&["data/*.json"]);
    let events = DebouncedEvents(vec![
        (source.join("data/site.json"), ChangeKind::Modified),
        (source.join("index.html"), ChangeKind::Modified),
        (source.join("sass/style.scss"), ChangeKind::Modified),
        (source.join("sass/_base.scss"), ChangeKind::Created),
    ]);
    assert_eq!(
        bindings.resolve(&events),
        vec![
            WatchAction::Run(TaskId::CompileStyles),
            WatchAction::Run(TaskId::MinifyHtml),
            WatchAction::Reload,
        ]
    );
}
