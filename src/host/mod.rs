//! Presentation side of the gamepad.
//!
//! Creating and painting real button windows is left to a [`Surface`]
//! implementation. The crate ships [`HeadlessSurface`], which logs the
//! resolved layout, plus the helpers any surface needs: layout resolution,
//! screen detection and the touch-origin mouse filter.

use anyhow::{Context, Result};
use enigo::Mouse as _;
use enigo::{Enigo, Settings};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::{Button, ParseError};
use crate::gamepad::geometry::{self, Rect, ScreenBounds};
use crate::gamepad::{ButtonId, GamepadModel};

/// Signature the OS puts in a mouse message's extra info when the message was
/// synthesized from a touch contact.
pub const MOUSE_FROM_TOUCH_SIGNATURE: u64 = 0xFF51_5700;

/// True for mouse events the OS derived from a touch. Those must be dropped,
/// the genuine touch event is delivered separately.
pub fn is_touch_synthesized(extra_info: u64) -> bool {
    extra_info & MOUSE_FROM_TOUCH_SIGNATURE == MOUSE_FROM_TOUCH_SIGNATURE
}

/// Bounds used when none are given and detection fails.
pub const FALLBACK_SCREEN: ScreenBounds = ScreenBounds::new(1920, 1080);

/// Size of the main display as reported by the OS.
pub fn detect_screen() -> Result<ScreenBounds> {
    let enigo = Enigo::new(&Settings::default()).context("Failed to initialize Enigo")?;
    let (width, height) = enigo
        .main_display()
        .context("Failed to query main display size")?;
    Ok(ScreenBounds::new(width, height))
}

/// One button as it appears on screen.
#[derive(Debug, Clone, Serialize)]
pub struct LayoutEntry<'a> {
    pub id: ButtonId,
    #[serde(flatten)]
    pub button: &'a Button,
    pub rect: Rect,
}

/// Resolve every button of `model` against `screen`, in insertion order.
pub fn layout(model: &GamepadModel, screen: ScreenBounds) -> Vec<LayoutEntry<'_>> {
    model
        .iter()
        .map(|(id, button)| LayoutEntry {
            id,
            button,
            rect: geometry::resolve(&button.placement, screen),
        })
        .collect()
}

/// Owner of the on-screen button surfaces.
///
/// The runtime always calls [`Surface::teardown`] before [`Surface::build`]
/// on reload, so old and new buttons never coexist.
pub trait Surface {
    /// Create one surface per button of `model`.
    fn build(&mut self, model: &GamepadModel, screen: ScreenBounds);
    /// Destroy every surface created by the last `build`.
    fn teardown(&mut self);
    /// Show a layout error to the user.
    fn report(&mut self, title: &str, error: &ParseError);
}

/// Surface that only logs what a windowed host would show.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    live: usize,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of surfaces currently built.
    pub fn live(&self) -> usize {
        self.live
    }
}

impl Surface for HeadlessSurface {
    fn build(&mut self, model: &GamepadModel, screen: ScreenBounds) {
        for entry in layout(model, screen) {
            let Rect { x, y, width, height } = entry.rect;
            if width == 0 || height == 0 {
                warn!(target: "touchjoy::host", button = %entry.button.name, "Zero-sized button");
            }
            info!(
                target: "touchjoy::host",
                button = %entry.button.name,
                kind = ?entry.button.button_type(),
                x, y, width, height,
                color_key = %entry.button.color_key,
                "Button surface"
            );
        }
        self.live = model.len();
        info!(target: "touchjoy::host", buttons = self.live, %screen, "Gamepad shown");
    }

    fn teardown(&mut self) {
        if self.live > 0 {
            info!(target: "touchjoy::host", buttons = self.live, "Gamepad hidden");
        }
        self.live = 0;
    }

    fn report(&mut self, title: &str, error: &ParseError) {
        error!(
            target: "touchjoy::host",
            line = error.line,
            message = error.message(),
            "{title}"
        );
        eprintln!("{title}\n{error}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_from_str;

    #[test]
    fn touch_signature_filter() {
        assert!(is_touch_synthesized(0xFF51_5700));
        assert!(is_touch_synthesized(0xFF51_5780));
        assert!(!is_touch_synthesized(0));
        assert!(!is_touch_synthesized(0xFF51_0000));
    }

    #[test]
    fn layout_follows_insertion_order_and_screen() {
        let model = load_from_str("[b]\nright=10\n[a]\nx=5\nbottom=7\n").unwrap();
        let entries = layout(&model, ScreenBounds::new(800, 600));
        let got: Vec<_> = entries
            .iter()
            .map(|e| (e.button.name.as_str(), e.rect.x, e.rect.y))
            .collect();
        assert_eq!(got, [("b", 790, 0), ("a", 5, 593)]);
    }

    #[test]
    fn layout_serializes_with_rect() {
        let model = load_from_str("[q]\ntype=quit\nx=3\n").unwrap();
        let json = serde_json::to_value(layout(&model, FALLBACK_SCREEN)).unwrap();
        assert_eq!(json[0]["name"], "q");
        assert_eq!(json[0]["type"], "quit");
        assert_eq!(json[0]["rect"]["x"], 3);
    }

    #[test]
    fn headless_surface_tracks_live_count() {
        let model = load_from_str("[a]\nx=1\n[b]\nx=2\n").unwrap();
        let mut surface = HeadlessSurface::new();
        surface.build(&model, FALLBACK_SCREEN);
        assert_eq!(surface.live(), 2);
        surface.teardown();
        assert_eq!(surface.live(), 0);
    }
}
