use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use notify_debouncer_mini::{new_debouncer, DebouncedEventKind};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::event::Event;

/// Directories whose changes never affect `svn status`.
pub const IGNORED_DIRS: &[&str] = &[".svn"];

/// Default debounce interval in milliseconds.
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Watches a working copy and reports edits so the status list can be refreshed.
pub struct WorkingCopyWatcher {
    /// Whether the watcher is currently forwarding events.
    active: Arc<AtomicBool>,
    /// Handle to the debouncer (dropped to stop watching).
    _debouncer: notify_debouncer_mini::Debouncer<notify::RecommendedWatcher>,
}

impl WorkingCopyWatcher {
    /// Watch `root` recursively, sending one [`Event::FsChange`] per debounce
    /// window that saw changes outside the administrative directories.
    pub fn new(
        root: &Path,
        debounce_duration: Duration,
        event_tx: mpsc::UnboundedSender<Event>,
    ) -> notify::Result<Self> {
        let active = Arc::new(AtomicBool::new(true));
        let active_clone = active.clone();

        let mut debouncer = new_debouncer(
            debounce_duration,
            move |result: Result<Vec<notify_debouncer_mini::DebouncedEvent>, notify::Error>| {
                if !active_clone.load(Ordering::Relaxed) {
                    return;
                }

                match result {
                    Ok(events) => {
                        let paths: Vec<PathBuf> = events
                            .iter()
                            .filter(|e| e.kind == DebouncedEventKind::Any)
                            .map(|e| e.path.clone())
                            .filter(|p| !should_ignore(p))
                            .collect();

                        if paths.is_empty() {
                            return;
                        }
                        debug!(changed = paths.len(), "working copy changed");
                        let _ = event_tx.send(Event::FsChange(paths));
                    }
                    Err(e) => {
                        warn!(error = %e, "watcher error");
                    }
                }
            },
        )?;

        debouncer
            .watcher()
            .watch(root, notify::RecursiveMode::Recursive)?;

        Ok(Self {
            active,
            _debouncer: debouncer,
        })
    }

    /// Stop forwarding while our own action rewrites the working copy.
    pub fn pause(&self) {
        self.active.store(false, Ordering::Relaxed);
    }

    pub fn resume(&self) {
        self.active.store(true, Ordering::Relaxed);
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }
}

/// A path is ignored if any component is an administrative directory.
pub fn should_ignore(path: &Path) -> bool {
    path.components().any(|component| match component {
        std::path::Component::Normal(name) => {
            let name = name.to_string_lossy();
            IGNORED_DIRS.iter().any(|dir| name == *dir)
        }
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignore_admin_directory() {
        assert!(should_ignore(Path::new("/wc/.svn/wc.db")));
        assert!(should_ignore(Path::new("/wc/.svn/pristine/ab/abcd.svn-base")));
    }

    #[test]
    fn do_not_ignore_working_files() {
        assert!(!should_ignore(Path::new("/wc/src/main.c")));
        assert!(!should_ignore(Path::new("/wc/.svnignore")));
    }

    #[tokio::test]
    async fn reports_changes_outside_admin_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join(".svn")).unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let watcher = WorkingCopyWatcher::new(dir.path(), Duration::from_millis(50), tx).unwrap();
        assert!(watcher.is_active());

        std::fs::write(dir.path().join("edited.c"), "x").unwrap();
        let event = tokio::time::timeout(Duration::from_secs(10), rx.recv())
            .await
            .expect("no change reported")
            .expect("channel closed");
        match event {
            Event::FsChange(paths) => assert!(paths.iter().all(|p| !should_ignore(p))),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn pause_and_resume() {
        let dir = tempfile::TempDir::new().unwrap();
        let (tx, _rx) = mpsc::unbounded_channel();
        let watcher = WorkingCopyWatcher::new(dir.path(), Duration::from_millis(50), tx).unwrap();
        watcher.pause();
        assert!(!watcher.is_active());
        watcher.resume();
        assert!(watcher.is_active());
    }
}
