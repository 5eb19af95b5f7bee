use std::fmt;
use std::path::PathBuf;

use image::RgbaImage;
use serde::Serialize;

/// Button behavior selected with the `type` key.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonType {
    Key,
    Wheel,
    Stick,
    Quit,
}

impl ButtonType {
    /// Parse a `type = ...` value.
    pub fn from_config(value: &str) -> Option<Self> {
        match value {
            "key" => Some(Self::Key),
            "wheel" => Some(Self::Wheel),
            "stick" => Some(Self::Stick),
            "quit" => Some(Self::Quit),
            _ => None,
        }
    }
}

/// Screen edge a horizontal margin is measured from.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HAnchor {
    #[default]
    Left,
    Right,
}

/// Screen edge a vertical margin is measured from.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VAnchor {
    #[default]
    Top,
    Bottom,
}

/// Geometry inputs of a button. The absolute rectangle is derived from these
/// and the screen bounds by [`crate::gamepad::geometry::resolve`].
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub h_anchor: HAnchor,
    pub h_margin: i32,
    pub v_anchor: VAnchor,
    pub v_margin: i32,
    /// Taken from the artwork; 0 until an image is loaded.
    pub width: i32,
    pub height: i32,
}

/// Transparency color of the artwork.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct ColorKey(pub [u8; 3]);

impl ColorKey {
    /// Accepts `#RRGGBB` or `0xRRGGBB`.
    pub fn from_config(value: &str) -> Option<Self> {
        let hex = value
            .strip_prefix('#')
            .or_else(|| value.strip_prefix("0x"))
            .or_else(|| value.strip_prefix("0X"))?;
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let rgb = u32::from_str_radix(hex, 16).ok()?;
        Some(Self([(rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8]))
    }
}

impl fmt::Display for ColorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "#{r:02x}{g:02x}{b:02x}")
    }
}

impl Serialize for ColorKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Decoded button artwork. Dropping it releases the pixels.
#[derive(Clone, PartialEq, Eq)]
pub struct Artwork {
    pub path: PathBuf,
    pub pixels: RgbaImage,
}

impl fmt::Debug for Artwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Artwork")
            .field("path", &self.path)
            .field("width", &self.pixels.width())
            .field("height", &self.pixels.height())
            .finish()
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WheelDirection {
    Up,
    Down,
}

impl WheelDirection {
    pub fn from_config(value: &str) -> Option<Self> {
        match value {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            _ => None,
        }
    }

    /// +1 for up, -1 for down.
    pub const fn sign(self) -> i32 {
        match self {
            Self::Up => 1,
            Self::Down => -1,
        }
    }
}

/// One of the four virtual stick directions. The declaration order is the
/// order in which edge changes are emitted.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StickDirection {
    Up,
    Down,
    Left,
    Right,
}

impl StickDirection {
    pub const ALL: [StickDirection; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Config key holding the keycode for this direction.
    pub const fn config_key(self) -> &'static str {
        match self {
            Self::Up => "keyup",
            Self::Down => "keydown",
            Self::Left => "keyleft",
            Self::Right => "keyright",
        }
    }

    pub fn from_config_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.config_key() == key)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KeyButton {
    pub code: u16,
    pub sticky: bool,
    /// Sticky keys only: the key is currently held down.
    #[serde(skip)]
    pub latched: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WheelButton {
    pub direction: WheelDirection,
    pub amount: u32,
}

impl Default for WheelButton {
    fn default() -> Self {
        Self {
            direction: WheelDirection::Up,
            amount: 1,
        }
    }
}

impl WheelButton {
    /// Signed scroll pulse emitted on release.
    pub fn pulse(&self) -> i32 {
        let amount = i32::try_from(self.amount).unwrap_or(i32::MAX);
        self.direction.sign() * amount
    }
}

pub const DEFAULT_STICK_THRESHOLD: f32 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StickButton {
    pub threshold: f32,
    /// Keycodes indexed by [`StickDirection::index`].
    pub codes: [u16; 4],
    /// Edge state per direction: true while that direction's key is held.
    #[serde(skip)]
    pub held: [bool; 4],
}

impl Default for StickButton {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_STICK_THRESHOLD,
            codes: [0; 4],
            held: [false; 4],
        }
    }
}

impl StickButton {
    pub fn code(&self, dir: StickDirection) -> u16 {
        self.codes[dir.index()]
    }

    pub fn is_held(&self, dir: StickDirection) -> bool {
        self.held[dir.index()]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QuitButton {
    /// A Down has been seen and not yet released.
    #[serde(skip)]
    pub armed: bool,
}

/// Type-specific part of a button, including its session state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ButtonKind {
    Key(KeyButton),
    Wheel(WheelButton),
    Stick(StickButton),
    Quit(QuitButton),
}

impl ButtonKind {
    /// Fresh extras for a type, with defaults and cleared state.
    pub fn new(ty: ButtonType) -> Self {
        match ty {
            ButtonType::Key => Self::Key(KeyButton::default()),
            ButtonType::Wheel => Self::Wheel(WheelButton::default()),
            ButtonType::Stick => Self::Stick(StickButton::default()),
            ButtonType::Quit => Self::Quit(QuitButton::default()),
        }
    }

    pub fn button_type(&self) -> ButtonType {
        match self {
            Self::Key(_) => ButtonType::Key,
            Self::Wheel(_) => ButtonType::Wheel,
            Self::Stick(_) => ButtonType::Stick,
            Self::Quit(_) => ButtonType::Quit,
        }
    }
}

/// A named on-screen control.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Button {
    pub name: String,
    #[serde(flatten)]
    pub kind: ButtonKind,
    pub placement: Placement,
    pub color_key: ColorKey,
    #[serde(skip)]
    pub artwork: Option<Artwork>,
}

impl Button {
    /// New button of the given type with default placement and no artwork.
    pub fn new(name: impl Into<String>, ty: ButtonType) -> Self {
        Self {
            name: name.into(),
            kind: ButtonKind::new(ty),
            placement: Placement::default(),
            color_key: ColorKey::default(),
            artwork: None,
        }
    }

    pub fn button_type(&self) -> ButtonType {
        self.kind.button_type()
    }

    /// Install decoded artwork; the button takes its size from the pixels.
    pub fn set_artwork(&mut self, artwork: Artwork) -> Option<Artwork> {
        self.placement.width = i32::try_from(artwork.pixels.width()).unwrap_or(i32::MAX);
        self.placement.height = i32::try_from(artwork.pixels.height()).unwrap_or(i32::MAX);
        self.artwork.replace(artwork)
    }
}
