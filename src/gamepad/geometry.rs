//! Anchor + margin + size + screen bounds -> absolute rectangle.
//!
//! Nothing here is cached: callers resolve again whenever the screen or a
//! button's placement changes.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::config::models::{HAnchor, Placement, VAnchor};

/// Size of the screen the buttons are laid out on, in pixels.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct ScreenBounds {
    pub width: i32,
    pub height: i32,
}

impl ScreenBounds {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// Bounds with both sides positive, or `None`.
    pub const fn checked(width: i32, height: i32) -> Option<Self> {
        if width > 0 && height > 0 {
            Some(Self { width, height })
        } else {
            None
        }
    }
}

impl fmt::Display for ScreenBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for ScreenBounds {
    type Err = String;

    /// Parses `WIDTHxHEIGHT`, e.g. `1920x1080`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
        let width: i32 = w.trim().parse().map_err(|_| format!("bad width '{w}'"))?;
        let height: i32 = h.trim().parse().map_err(|_| format!("bad height '{h}'"))?;
        Self::checked(width, height)
            .ok_or_else(|| format!("screen size must be positive, got '{s}'"))
    }
}

/// A rectangle region on screen.
#[derive(Debug, Copy, Clone, Default, Serialize, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Resolve a placement against the screen.
pub fn resolve(placement: &Placement, screen: ScreenBounds) -> Rect {
    let x = match placement.h_anchor {
        HAnchor::Left => placement.h_margin,
        HAnchor::Right => screen
            .width
            .saturating_sub(placement.h_margin.saturating_add(placement.width)),
    };
    let y = match placement.v_anchor {
        VAnchor::Top => placement.v_margin,
        VAnchor::Bottom => screen
            .height
            .saturating_sub(placement.v_margin.saturating_add(placement.height)),
    };
    Rect {
        x,
        y,
        width: placement.width,
        height: placement.height,
    }
}
