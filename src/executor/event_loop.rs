//! The single serialized context that owns the [`Runtime`].
//!
//! Host events, reload signals and finished reload parses all funnel into one
//! `select!` loop, so input translation and model replacement never overlap.
//! Parsing itself runs on the blocking pool; its result comes back through an
//! internal channel and is installed from inside the loop. A change signalled
//! while a parse is in flight schedules exactly one more parse once it lands.

use std::path::{Path, PathBuf};

use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use super::runtime::{Flow, Runtime};
use super::synth::InputSynthesizer;
use crate::config::{Loader, ParseError};
use crate::gamepad::GamepadModel;
use crate::host::Surface;
use crate::sources::{HostEvent, ReloadSignal};

type ParseResult = Result<GamepadModel, ParseError>;

pub struct EventLoop<S, P> {
    runtime: Runtime<S, P>,
    events: Receiver<HostEvent>,
    reload: ReloadSignal,
    loader: Loader,
    config_path: PathBuf,
    shutdown: CancellationToken,
}

impl<S: InputSynthesizer, P: Surface> EventLoop<S, P> {
    pub fn new(
        runtime: Runtime<S, P>,
        events: Receiver<HostEvent>,
        reload: ReloadSignal,
        loader: Loader,
        config_path: impl Into<PathBuf>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            runtime,
            events,
            reload,
            loader,
            config_path: config_path.into(),
            shutdown,
        }
    }

    /// Run until the shutdown token is cancelled or a quit button fires.
    /// Held keys are released on the way out. Hands the runtime back for
    /// inspection.
    pub async fn run(mut self) -> Runtime<S, P> {
        let (parsed_tx, mut parsed_rx) = mpsc::channel::<ParseResult>(1);
        let mut parsing = false;
        let mut rerun = false;
        let mut events_open = true;

        info!(
            target: "touchjoy::runtime",
            config = %self.config_path.display(),
            "Event loop started"
        );

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => {
                    info!(target: "touchjoy::runtime", "Shutdown requested");
                    break;
                }
                Some(result) = parsed_rx.recv() => {
                    parsing = false;
                    self.runtime.apply_reload(result);
                    if rerun {
                        rerun = false;
                        spawn_parse(&self.loader, &self.config_path, &parsed_tx);
                        parsing = true;
                    }
                }
                _ = self.reload.notified() => {
                    if parsing {
                        trace!(target: "touchjoy::runtime", "Reload already in flight; queued one more");
                        rerun = true;
                    } else {
                        spawn_parse(&self.loader, &self.config_path, &parsed_tx);
                        parsing = true;
                    }
                }
                event = self.events.recv(), if events_open => match event {
                    Some(HostEvent::Contact { button, event }) => {
                        if self.runtime.contact_by_name(&button, event) == Flow::Quit {
                            info!(target: "touchjoy::runtime", %button, "Quit button released");
                            self.shutdown.cancel();
                            break;
                        }
                    }
                    Some(HostEvent::Resize(screen)) => self.runtime.set_screen(screen),
                    None => {
                        debug!(target: "touchjoy::runtime", "All contact sources closed");
                        events_open = false;
                    }
                },
            }
        }

        self.runtime.release_all();
        self.runtime
    }
}

/// Parse the layout on the blocking pool and post the result to `results`.
fn spawn_parse(loader: &Loader, path: &Path, results: &Sender<ParseResult>) {
    let loader = loader.clone();
    let path = path.to_path_buf();
    let results = results.clone();
    debug!(target: "touchjoy::runtime", path = %path.display(), "Reloading layout");
    tokio::task::spawn_blocking(move || {
        let result = loader.load_from_path(&path);
        // The loop is gone if this fails; nothing left to install into.
        let _ = results.blocking_send(result);
    });
}
