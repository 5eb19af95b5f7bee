/*!
Event sources (orchestration layer).

Two kinds of sources feed the runtime loop:

- Contact sources implement [`EventSource`] and push [`HostEvent`]s through an
  mpsc channel (`stdin_source.rs` -> `StdinSource`, newline-delimited JSON).
- Change sources implement [`ChangeSource`] and raise a shared reload signal
  when the layout file changes (`notify_watcher.rs` -> `NotifyWatcher`,
  `poll_watcher.rs` -> `PollWatcher`). The signal is a `tokio::sync::Notify`,
  so any burst of changes collapses into a single pending reload.

Sources never panic inside their tasks: they log and continue, or exit when
the receiving side is gone.
*/

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::Notify;
use tokio::{sync::mpsc::Sender, task::JoinHandle};
use tracing::info;

use crate::executor::translator::ContactEvent;
use crate::gamepad::geometry::ScreenBounds;

pub mod notify_watcher;
pub mod poll_watcher;
pub mod stdin_source;

pub use notify_watcher::NotifyWatcher;
pub use poll_watcher::PollWatcher;
pub use stdin_source::StdinSource;

/// Input delivered by the host surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// A contact event on the named button.
    Contact { button: String, event: ContactEvent },
    /// The display changed size.
    Resize(ScreenBounds),
}

/// A producer of host events.
pub trait EventSource: Send + Sync {
    /// Static human-readable identifier (used in logs).
    fn name(&self) -> &'static str;

    /// Start the source in the background. The task ends when the channel
    /// closes or the input is exhausted.
    fn start(&self, sender: Sender<HostEvent>) -> JoinHandle<()>;
}

/// Coalescing "the layout file changed" signal.
pub type ReloadSignal = Arc<Notify>;

/// Keeps a change source alive; dropping it stops the watch.
pub struct WatchGuard {
    _watcher: Option<notify::RecommendedWatcher>,
    task: Option<JoinHandle<()>>,
}

impl WatchGuard {
    pub(crate) fn watcher(watcher: notify::RecommendedWatcher) -> Self {
        Self {
            _watcher: Some(watcher),
            task: None,
        }
    }

    pub(crate) fn task(task: JoinHandle<()>) -> Self {
        Self {
            _watcher: None,
            task: Some(task),
        }
    }
}

impl Drop for WatchGuard {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// A transport that tells the runtime the layout file changed.
pub trait ChangeSource: Send {
    fn name(&self) -> &'static str;

    /// Begin watching; every detected change raises `signal`.
    fn start(&self, signal: ReloadSignal) -> Result<WatchGuard>;
}

/// Spawn every contact source, returning their `JoinHandle`s.
pub fn spawn_all_sources(
    sources: &[Box<dyn EventSource>],
    sender: Sender<HostEvent>,
) -> Vec<JoinHandle<()>> {
    sources
        .iter()
        .map(|src| {
            info!(
                target: "touchjoy::sources",
                source = %src.name(),
                "Starting source task"
            );
            src.start(sender.clone())
        })
        .collect()
}
