//! OS change-notification source built on the `notify` crate.
//!
//! Watches the layout file's directory rather than the file itself: many
//! editors save by writing a new file and renaming it over the old one, which
//! would silently end a watch on the original inode. Events are filtered down
//! to creations and modifications of the layout file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use tracing::{debug, info, warn};

use super::{ChangeSource, ReloadSignal, WatchGuard};

#[derive(Debug, Clone)]
pub struct NotifyWatcher {
    path: PathBuf,
}

impl NotifyWatcher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn watch_dir(&self) -> &Path {
        self.path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
    }
}

/// True if `event` means `target` may have new contents.
fn touches(event: &Event, target: &Path) -> bool {
    let relevant = matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Any
    );
    relevant
        && event
            .paths
            .iter()
            .any(|p| p.file_name().is_some() && p.file_name() == target.file_name())
}

impl ChangeSource for NotifyWatcher {
    fn name(&self) -> &'static str {
        "notify"
    }

    fn start(&self, signal: ReloadSignal) -> Result<WatchGuard> {
        let target = self.path.clone();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) if touches(&event, &target) => {
                debug!(target: "touchjoy::sources", kind = ?event.kind, "Layout file changed");
                signal.notify_one();
            }
            Ok(_) => {}
            Err(e) => {
                warn!(target: "touchjoy::sources", error = %e, "File watcher error");
            }
        })
        .context("Failed to create file watcher")?;

        let dir = self.watch_dir();
        watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch {}", dir.display()))?;
        info!(
            target: "touchjoy::sources",
            path = %self.path.display(),
            "NotifyWatcher started"
        );
        Ok(WatchGuard::watcher(watcher))
    }
}
