#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

/*!
Executor module for touchjoy.

This module wires together:
- `translator`: pure contact-event -> input-action translation per button type
- `synth`: the input synthesizer seam (Enigo-backed, or recording for tests)
- `runtime`: owns the live gamepad model, applies contacts and reloads
- `event_loop`: the single task that serializes host events and reloads

Typical usage:
- Load a `GamepadModel` with `config::load_from_path`.
- Construct a `Runtime` with a synthesizer and a host surface.
- Hand it to an `EventLoop` together with the event channel and reload signal.

Example:
```no_run
use touchjoy::config;
use touchjoy::executor::{EnigoSynthesizer, Runtime};
use touchjoy::executor::translator::ContactEvent;
use touchjoy::gamepad::geometry::ScreenBounds;
use touchjoy::host::HeadlessSurface;
use tokio_util::sync::CancellationToken;

let model = config::load_from_str("[jump]\ntype=key\nkeycode=32\n").unwrap();
let synth = EnigoSynthesizer::new(true, CancellationToken::new()); // dry-run mode
let mut rt = Runtime::new(model, ScreenBounds::new(1920, 1080), synth, HeadlessSurface::new());
rt.contact_by_name("jump", ContactEvent::Down(None));
rt.contact_by_name("jump", ContactEvent::Up);
```
*/

pub mod event_loop;
pub mod runtime;
pub mod synth;
pub mod translator;

// Re-exports for convenient access from `touchjoy::executor::*`
pub use event_loop::EventLoop;
pub use runtime::{Flow, Runtime};
pub use synth::{EnigoSynthesizer, InputSynthesizer, RecordingSynthesizer};
pub use translator::{ContactEvent, InputAction, LocalPoint, translate};
