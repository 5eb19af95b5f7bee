#![forbid(unsafe_code)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! touchjoy: an on-screen virtual gamepad for touch displays.
//!
//! An INI layout file declares buttons (keys, mouse wheels, analog-style
//! sticks, a quit button). Touch contacts on those buttons are translated into
//! synthesized keyboard and mouse input, and the layout hot-reloads when the
//! file changes.
//!
//! Modules:
//! - `config`: INI tokenizer, layout loader, button models and parse errors.
//! - `gamepad`: the button registry and placement geometry.
//! - `executor`: contact translation, input synthesis, runtime and event loop.
//! - `host`: the presentation seam (surfaces, screen detection, layout dump).
//! - `sources`: contact input and config-change watchers.
//! - `utils`: config path helpers.
//!
//! Use `touchjoy::prelude::*` to bring commonly used items into scope quickly.

/// Public module: layout parsing (tokenizer, loader, models, errors).
pub mod config;
/// Public module: translation, synthesis and the runtime loop.
pub mod executor;
/// Public module: button registry and geometry.
pub mod gamepad;
/// Public module: presentation seam.
pub mod host;
/// Public module: event and change sources (stdin, notify, poll).
pub mod sources;
/// Public module: utilities.
pub mod utils;

/// Crate-level constants for consumers that want to inspect package metadata at runtime.
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns the crate version (e.g., "0.1.0").
#[inline]
pub const fn version() -> &'static str {
    PKG_VERSION
}

/// Map a level name to a tracing level. Unknown names yield `None`.
pub fn parse_level(name: &str) -> Option<tracing::Level> {
    use tracing::Level;
    match name.to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" | "warning" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

/// Initialize tracing (logging).
/// - `level` wins if given and valid.
/// - Otherwise honors the `RUST_LOG` environment variable as a simple level.
/// - Falls back to `info` level.
///
/// Logs go to stderr so stdout stays free for `--dump` output.
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init_tracing(level: Option<&str>) {
    use tracing_subscriber::fmt;

    let level = level
        .and_then(parse_level)
        .or_else(|| std::env::var("RUST_LOG").ok().as_deref().and_then(parse_level))
        .unwrap_or(tracing::Level::INFO);

    // Ignore the error if the global subscriber was already set.
    let _ = fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .try_init();
}

/// A convenient set of exports for most consumers.
///
/// Bring this into scope with:
/// `use touchjoy::prelude::*;`
pub mod prelude {
    // Common result/error handling
    pub use anyhow::{Context, Error, Result, anyhow, bail, ensure};

    // Serialization
    pub use serde::{Deserialize, Serialize};

    // Tracing macros
    pub use tracing::{debug, error, info, instrument, trace, warn};

    // External crates (namespaced) if callers want direct access
    pub use crate as touchjoy;
    pub use enigo;

    // Frequently used internal items
    pub use crate::config::{Loader, ParseError, load_from_path, load_from_str};
    pub use crate::executor::{ContactEvent, EventLoop, Flow, InputAction, Runtime};
    pub use crate::gamepad::GamepadModel;
    pub use crate::gamepad::geometry::{Rect, ScreenBounds};
    pub use crate::{config, executor, gamepad, host, sources, utils};
}
