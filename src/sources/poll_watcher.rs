//! Polling change source.
//!
//! Checks the layout file's (length, mtime) signature at a fixed interval and
//! raises the reload signal whenever it differs from the last one seen. The
//! first poll only records the baseline.
//!
//! A missing file is silent: editors often delete and recreate the file while
//! saving, and the next poll picks up the new version.

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use anyhow::Result;
use tokio::time::{Instant, sleep};
use tracing::{info, trace};

use super::{ChangeSource, ReloadSignal, WatchGuard};

/// Default poll interval.
pub const DEFAULT_POLL_MS: u64 = 500;

/// Source that polls a single file for changes.
#[derive(Debug, Clone)]
pub struct PollWatcher {
    path: PathBuf,
    poll_ms: u64,
}

/// Coarse file signature: (length, mtime in milliseconds).
type Signature = (u64, u128);

impl PollWatcher {
    /// `poll_ms` defaults to 500ms with a 10ms minimum.
    pub fn new(path: impl Into<PathBuf>, poll_ms: Option<u64>) -> Self {
        Self {
            path: path.into(),
            poll_ms: poll_ms.unwrap_or(DEFAULT_POLL_MS).max(10),
        }
    }

    pub fn poll_ms(&self) -> u64 {
        self.poll_ms
    }

    fn signature(meta: &fs::Metadata) -> Signature {
        let mtime = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(SystemTime::UNIX_EPOCH).ok())
            .map(|d| d.as_millis())
            .unwrap_or(0);
        (meta.len(), mtime)
    }

    fn current_signature(&self) -> Option<Signature> {
        fs::metadata(&self.path)
            .ok()
            .filter(|m| m.is_file())
            .map(|m| Self::signature(&m))
    }
}

impl ChangeSource for PollWatcher {
    fn name(&self) -> &'static str {
        "poll"
    }

    fn start(&self, signal: ReloadSignal) -> Result<WatchGuard> {
        let this = self.clone();
        let task = tokio::spawn(async move {
            info!(
                target: "touchjoy::sources",
                path = %this.path.display(), poll_ms = this.poll_ms,
                "PollWatcher task started"
            );

            let interval = Duration::from_millis(this.poll_ms);
            let mut last = this.current_signature();
            let mut next_tick = Instant::now() + interval;

            loop {
                // Manual schedule instead of `interval` for drift control.
                let now = Instant::now();
                if now < next_tick {
                    sleep(next_tick - now).await;
                }
                next_tick += interval;

                let Some(sig) = this.current_signature() else {
                    continue;
                };
                if last == Some(sig) {
                    continue;
                }
                trace!(target: "touchjoy::sources", path = %this.path.display(), "Layout file changed");
                last = Some(sig);
                signal.notify_one();
            }
        });
        Ok(WatchGuard::task(task))
    }
}
