use anyhow::{Context, Result};
use enigo::Keyboard as _;
use enigo::Mouse as _;
use enigo::{Axis, Coordinate, Direction, Enigo, Settings};
use tokio_util::sync::CancellationToken;
use tracing::{info, trace};

use crate::executor::translator::InputAction;

/// Sink for synthesized host input.
pub trait InputSynthesizer {
    fn press(&mut self, keycode: u16) -> Result<()>;
    fn release(&mut self, keycode: u16) -> Result<()>;
    /// One wheel pulse at an absolute screen position. Positive scrolls up.
    fn scroll(&mut self, x: i32, y: i32, amount: i32) -> Result<()>;
    /// Ask the host to shut down.
    fn terminate(&mut self);
}

/// Synthesizes real input through Enigo, or only logs it in dry-run mode.
///
/// `terminate()` cancels the shutdown token handed in at construction.
pub struct EnigoSynthesizer {
    dry_run: bool,
    enigo: Option<Enigo>,
    shutdown: CancellationToken,
}

impl EnigoSynthesizer {
    pub fn new(dry_run: bool, shutdown: CancellationToken) -> Self {
        Self {
            dry_run,
            enigo: None,
            shutdown,
        }
    }

    fn key(&mut self, keycode: u16, direction: Direction) -> Result<()> {
        if self.dry_run {
            info!(target: "touchjoy::synth", keycode, ?direction, "DRY-RUN key");
            return Ok(());
        }
        let enigo = self.ensure_enigo()?;
        trace!(target: "touchjoy::synth", keycode, ?direction, "key");
        enigo
            .raw(keycode, direction)
            .with_context(|| format!("Failed to send keycode {keycode}"))?;
        Ok(())
    }

    fn ensure_enigo(&mut self) -> Result<&mut Enigo> {
        if self.enigo.is_none() {
            trace!(target: "touchjoy::synth", "Initializing Enigo");
            self.enigo =
                Some(Enigo::new(&Settings::default()).context("Failed to initialize Enigo")?);
        }
        self.enigo.as_mut().context("Enigo is not initialized")
    }
}

impl InputSynthesizer for EnigoSynthesizer {
    fn press(&mut self, keycode: u16) -> Result<()> {
        self.key(keycode, Direction::Press)
    }

    fn release(&mut self, keycode: u16) -> Result<()> {
        self.key(keycode, Direction::Release)
    }

    fn scroll(&mut self, x: i32, y: i32, amount: i32) -> Result<()> {
        if self.dry_run {
            info!(target: "touchjoy::synth", x, y, amount, "DRY-RUN scroll");
            return Ok(());
        }
        let enigo = self.ensure_enigo()?;
        trace!(target: "touchjoy::synth", x, y, amount, "scroll");
        enigo
            .move_mouse(x, y, Coordinate::Abs)
            .context("Failed to move cursor for scroll")?;
        // Enigo scrolls down for positive lengths.
        enigo
            .scroll(-amount, Axis::Vertical)
            .context("Failed to scroll")?;
        Ok(())
    }

    fn terminate(&mut self) {
        info!(target: "touchjoy::synth", "Quit requested");
        self.shutdown.cancel();
    }
}

/// Records every call instead of performing it. Useful for tests and for
/// embedding the runtime where input is delivered some other way.
#[derive(Debug, Default)]
pub struct RecordingSynthesizer {
    pub actions: Vec<InputAction>,
}

impl RecordingSynthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take everything recorded so far.
    pub fn drain(&mut self) -> Vec<InputAction> {
        std::mem::take(&mut self.actions)
    }
}

impl InputSynthesizer for RecordingSynthesizer {
    fn press(&mut self, keycode: u16) -> Result<()> {
        self.actions.push(InputAction::Press(keycode));
        Ok(())
    }

    fn release(&mut self, keycode: u16) -> Result<()> {
        self.actions.push(InputAction::Release(keycode));
        Ok(())
    }

    fn scroll(&mut self, x: i32, y: i32, amount: i32) -> Result<()> {
        self.actions.push(InputAction::Scroll { x, y, amount });
        Ok(())
    }

    fn terminate(&mut self) {
        self.actions.push(InputAction::Terminate);
    }
}
