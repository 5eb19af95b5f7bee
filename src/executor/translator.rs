//! Contact events -> synthesized input actions.
//!
//! Translation is a pure state machine over a single [`Button`]: it reads and
//! updates the button's session state and returns the actions to perform, in
//! order. It never fails and performs no I/O.

use crate::config::models::{
    Button, ButtonKind, KeyButton, QuitButton, StickButton, StickDirection, WheelButton,
};
use crate::gamepad::geometry::Rect;

/// Contact position relative to the button's top-left corner.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LocalPoint {
    pub x: i32,
    pub y: i32,
}

impl LocalPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// One step of a contact's lifecycle on a button.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ContactEvent {
    /// Contact began. The position is optional because plain mouse clicks
    /// on non-stick buttons do not need it.
    Down(Option<LocalPoint>),
    Move(LocalPoint),
    Up,
}

/// Synthesized input to perform.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InputAction {
    Press(u16),
    Release(u16),
    /// One wheel pulse at a screen position. Positive scrolls up.
    Scroll { x: i32, y: i32, amount: i32 },
    Terminate,
}

/// Offset of the wheel cursor from the button's top-left corner, so the
/// pulse lands on whatever lies under the button rather than on it.
pub const WHEEL_CURSOR_OFFSET: i32 = 5;

/// Apply `event` to `button`, whose current screen rectangle is `rect`.
pub fn translate(button: &mut Button, rect: Rect, event: ContactEvent) -> Vec<InputAction> {
    match &mut button.kind {
        ButtonKind::Key(key) => translate_key(key, event),
        ButtonKind::Wheel(wheel) => translate_wheel(wheel, rect, event),
        ButtonKind::Stick(stick) => translate_stick(stick, rect, event),
        ButtonKind::Quit(quit) => translate_quit(quit, event),
    }
}

fn translate_quit(quit: &mut QuitButton, event: ContactEvent) -> Vec<InputAction> {
    match event {
        ContactEvent::Down(_) => {
            quit.armed = true;
            Vec::new()
        }
        ContactEvent::Move(_) => Vec::new(),
        ContactEvent::Up if quit.armed => {
            quit.armed = false;
            vec![InputAction::Terminate]
        }
        ContactEvent::Up => Vec::new(),
    }
}

fn translate_key(key: &mut KeyButton, event: ContactEvent) -> Vec<InputAction> {
    // Keycode 0 is unbound.
    if key.code == 0 {
        return Vec::new();
    }
    match (event, key.sticky) {
        (ContactEvent::Down(_), false) => vec![InputAction::Press(key.code)],
        (ContactEvent::Up, false) => vec![InputAction::Release(key.code)],
        (ContactEvent::Down(_), true) => {
            key.latched = !key.latched;
            if key.latched {
                vec![InputAction::Press(key.code)]
            } else {
                vec![InputAction::Release(key.code)]
            }
        }
        (ContactEvent::Up, true) | (ContactEvent::Move(_), _) => Vec::new(),
    }
}

fn translate_wheel(wheel: &WheelButton, rect: Rect, event: ContactEvent) -> Vec<InputAction> {
    match event {
        ContactEvent::Up => vec![InputAction::Scroll {
            x: rect.x.saturating_sub(WHEEL_CURSOR_OFFSET),
            y: rect.y.saturating_sub(WHEEL_CURSOR_OFFSET),
            amount: wheel.pulse(),
        }],
        ContactEvent::Down(_) | ContactEvent::Move(_) => Vec::new(),
    }
}

fn translate_stick(stick: &mut StickButton, rect: Rect, event: ContactEvent) -> Vec<InputAction> {
    let wanted = match event {
        ContactEvent::Down(Some(at)) | ContactEvent::Move(at) => {
            deflection(at, rect, stick.threshold)
        }
        ContactEvent::Down(None) | ContactEvent::Up => [false; 4],
    };

    let mut actions = Vec::new();
    for dir in StickDirection::ALL {
        let i = dir.index();
        if wanted[i] == stick.is_held(dir) {
            continue;
        }
        let code = stick.code(dir);
        actions.push(if wanted[i] {
            InputAction::Press(code)
        } else {
            InputAction::Release(code)
        });
        stick.held[i] = wanted[i];
    }
    actions
}

/// Release everything `button` still holds on the host and clear its session
/// state. Used before a button is discarded.
pub fn release_held(button: &mut Button) -> Vec<InputAction> {
    match &mut button.kind {
        ButtonKind::Key(key) => {
            let was_latched = std::mem::take(&mut key.latched);
            if was_latched && key.code != 0 {
                vec![InputAction::Release(key.code)]
            } else {
                Vec::new()
            }
        }
        ButtonKind::Wheel(_) => Vec::new(),
        ButtonKind::Stick(stick) => translate_stick(stick, Rect::default(), ContactEvent::Up),
        ButtonKind::Quit(quit) => {
            quit.armed = false;
            Vec::new()
        }
    }
}

/// Directions past `threshold` for a contact at `at`, indexed by
/// [`StickDirection::index`].
fn deflection(at: LocalPoint, rect: Rect, threshold: f32) -> [bool; 4] {
    if rect.width <= 0 || rect.height <= 0 {
        return [false; 4];
    }
    let joy_x = 2.0 * at.x as f32 / rect.width as f32 - 1.0;
    let joy_y = 2.0 * at.y as f32 / rect.height as f32 - 1.0;

    let mut out = [false; 4];
    out[StickDirection::Up.index()] = joy_y < -threshold;
    out[StickDirection::Down.index()] = joy_y > threshold;
    out[StickDirection::Left.index()] = joy_x < -threshold;
    out[StickDirection::Right.index()] = joy_x > threshold;
    out
}
