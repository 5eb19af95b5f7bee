//! Layout configuration: the INI format, button models and the loader.
//!
//! Example:
//! use touchjoy::config::load_from_path;
//!
//! let model = load_from_path("config.ini")?;

pub mod error;
pub mod ini;
pub mod loader;
pub mod models;

pub use error::{ErrorCategory, ParseCause, ParseError, ParseErrorKind};

pub use models::{
    Artwork, Button, ButtonKind, ButtonType, ColorKey, HAnchor, KeyButton, Placement, QuitButton,
    StickButton, StickDirection, VAnchor, WheelButton, WheelDirection,
};

pub use loader::{Loader, load_from_path, load_from_str};
