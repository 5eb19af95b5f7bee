//! Stdin contact source.
//!
//! Reads newline-delimited JSON contact events, standing in for the OS touch
//! surface:
//!
//! ```text
//! {"event":"down","button":"stick","x":90,"y":50}
//! {"event":"move","button":"stick","x":10,"y":50}
//! {"event":"up","button":"stick"}
//! {"event":"down","button":"jump","extra_info":4283520768}
//! {"event":"resize","width":1280,"height":720}
//! ```
//!
//! Behavior:
//! - Blank lines are skipped; malformed lines are logged with `warn!` and ignored.
//! - `resize` lines with a non-positive side are logged and ignored.
//! - Events whose `extra_info` carries the mouse-from-touch signature are
//!   dropped, the genuine touch event is expected separately.
//! - EOF or a closed channel ends the task.

use serde::Deserialize;
use tokio::{
    io::{self, AsyncBufRead, AsyncBufReadExt, BufReader},
    sync::mpsc::Sender,
    task::JoinHandle,
};
use tracing::{error, info, trace, warn};

use super::{EventSource, HostEvent};
use crate::executor::translator::{ContactEvent, LocalPoint};
use crate::gamepad::geometry::ScreenBounds;
use crate::host::is_touch_synthesized;

/// Source that reads newline-delimited JSON contact events from stdin.
#[derive(Debug, Clone, Default)]
pub struct StdinSource;

impl StdinSource {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl EventSource for StdinSource {
    fn name(&self) -> &'static str {
        "stdin"
    }

    fn start(&self, sender: Sender<HostEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(target: "touchjoy::sources", "StdinSource task started (reading lines)");
            read_events(BufReader::new(io::stdin()), sender).await;
            trace!(target: "touchjoy::sources", "StdinSource task ended");
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
enum WireEvent {
    Down {
        button: String,
        x: Option<i32>,
        y: Option<i32>,
        #[serde(default)]
        extra_info: u64,
    },
    Move {
        button: String,
        x: i32,
        y: i32,
        #[serde(default)]
        extra_info: u64,
    },
    Up {
        button: String,
        #[serde(default)]
        extra_info: u64,
    },
    Resize {
        width: i32,
        height: i32,
    },
}

impl WireEvent {
    /// Convert to a host event, or `None` if the host must drop it.
    fn into_host_event(self) -> Option<HostEvent> {
        let (button, event, extra_info) = match self {
            WireEvent::Resize { width, height } => {
                let bounds = ScreenBounds::checked(width, height);
                if bounds.is_none() {
                    warn!(target: "touchjoy::sources", width, height, "Ignoring non-positive screen size");
                }
                return bounds.map(HostEvent::Resize);
            }
            WireEvent::Down { button, x, y, extra_info } => {
                let at = x.zip(y).map(|(x, y)| LocalPoint::new(x, y));
                (button, ContactEvent::Down(at), extra_info)
            }
            WireEvent::Move { button, x, y, extra_info } => {
                (button, ContactEvent::Move(LocalPoint::new(x, y)), extra_info)
            }
            WireEvent::Up { button, extra_info } => (button, ContactEvent::Up, extra_info),
        };
        if is_touch_synthesized(extra_info) {
            trace!(target: "touchjoy::sources", %button, "Dropping mouse event synthesized from touch");
            return None;
        }
        Some(HostEvent::Contact { button, event })
    }
}

/// Parse one line. `Ok(None)` means the line is valid but carries nothing to deliver.
fn parse_line(raw: &str) -> Result<Option<HostEvent>, serde_json::Error> {
    let wire: WireEvent = serde_json::from_str(raw)?;
    Ok(wire.into_host_event())
}

/// Forward events from any line reader until EOF or until the channel closes.
pub async fn read_events<R: AsyncBufRead + Unpin>(mut reader: R, sender: Sender<HostEvent>) {
    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => {
                info!(target: "touchjoy::sources", "EOF on contact input; source exiting");
                break;
            }
            Ok(_) => {
                let raw = line.trim();
                if raw.is_empty() {
                    continue;
                }
                match parse_line(raw) {
                    Ok(Some(event)) => {
                        if let Err(e) = sender.send(event).await {
                            error!(
                                target: "touchjoy::sources",
                                error = %e,
                                "Channel closed while sending contact event; terminating task"
                            );
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => {
                        warn!(
                            target: "touchjoy::sources",
                            error = %e,
                            line = raw,
                            "Failed to parse contact event line"
                        );
                    }
                }
            }
            Err(e) => {
                warn!(
                    target: "touchjoy::sources",
                    error = %e,
                    "Error reading contact input; terminating task"
                );
                break;
            }
        }
    }
}
