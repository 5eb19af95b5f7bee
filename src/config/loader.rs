use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, trace, warn};

use super::error::{ParseError, ParseErrorKind};
use super::ini::{self, Entry};
use super::models::{
    Artwork, Button, ButtonKind, ButtonType, ColorKey, HAnchor, StickDirection, VAnchor,
    WheelDirection,
};
use crate::gamepad::{DEFAULT_CAPACITY, GamepadModel};

/// Builds a [`GamepadModel`] from INI text.
///
/// The model is assembled in a local buffer and only returned on full
/// success; any error drops it, releasing artwork decoded so far.
#[derive(Debug, Clone)]
pub struct Loader {
    base_dir: PathBuf,
    capacity: usize,
}

impl Default for Loader {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            capacity: DEFAULT_CAPACITY,
        }
    }
}

/// What the loader learned about one section while applying its entries.
#[derive(Debug)]
struct SectionInfo {
    header_line: usize,
    explicit_type: bool,
    has_keycode: bool,
    has_direction: bool,
    stick_codes: [bool; 4],
}

impl SectionInfo {
    fn new(header_line: usize, explicit_type: bool) -> Self {
        Self {
            header_line,
            explicit_type,
            has_keycode: false,
            has_direction: false,
            stick_codes: [false; 4],
        }
    }

    fn missing_property(&self, kind: &ButtonKind) -> Option<ParseErrorKind> {
        if !self.explicit_type {
            return None;
        }
        match kind {
            ButtonKind::Key(_) if !self.has_keycode => Some(ParseErrorKind::MissingKeycode),
            ButtonKind::Wheel(_) if !self.has_direction => {
                Some(ParseErrorKind::MissingWheelDirection)
            }
            ButtonKind::Stick(_) if self.stick_codes.contains(&false) => {
                Some(ParseErrorKind::MissingStickKeycode)
            }
            _ => None,
        }
    }
}

impl Loader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory `image=` paths are resolved against.
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = dir.into();
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Read and parse a layout file. A missing or unreadable file is reported
    /// on line 0.
    pub fn load_from_path<P: AsRef<Path>>(&self, path: P) -> Result<GamepadModel, ParseError> {
        let path_ref = path.as_ref();
        let text = fs::read_to_string(path_ref).map_err(|e| {
            debug!(
                target: "touchjoy::config",
                path = %path_ref.display(), error = %e,
                "Failed to read layout file"
            );
            ParseError::io(e)
        })?;
        let model = self.load_from_str(&text)?;
        debug!(
            target: "touchjoy::config",
            path = %path_ref.display(),
            buttons = model.len(),
            "Loaded layout"
        );
        Ok(model)
    }

    /// Parse layout text.
    ///
    /// Each button's `type` is resolved before any of its other properties are
    /// checked, so `type` may appear anywhere in its section. The first error
    /// in file order wins.
    pub fn load_from_str(&self, text: &str) -> Result<GamepadModel, ParseError> {
        let tokens = ini::tokenize(text);
        let (types, type_error) = resolve_types(&tokens.entries);
        let barrier = earliest(tokens.error, type_error);

        let mut model = GamepadModel::with_capacity(self.capacity);
        let mut sections: Vec<SectionInfo> = Vec::new();

        for entry in &tokens.entries {
            if barrier.as_ref().is_some_and(|b| entry.line >= b.line) {
                break;
            }
            let declared = types.get(entry.section).copied();
            let id = model
                .find_or_create(entry.section, declared.unwrap_or(ButtonType::Key))
                .map_err(|e| {
                    debug!(target: "touchjoy::config", error = %e, "Registry rejected button");
                    ParseError::new(entry.line, ParseErrorKind::TooManyButtons)
                })?;
            if id.index() == sections.len() {
                sections.push(SectionInfo::new(entry.section_line, declared.is_some()));
            }
            trace!(
                target: "touchjoy::config",
                line = entry.line, button = entry.section, key = entry.key,
                "Applying property"
            );
            self.apply(&mut model[id], &mut sections[id.index()], entry)?;
        }

        if let Some(err) = barrier {
            return Err(err);
        }

        for ((_, button), info) in model.iter().zip(&sections) {
            if let Some(kind) = info.missing_property(&button.kind) {
                return Err(ParseError::new(info.header_line, kind));
            }
            if button.artwork.is_none() {
                warn!(
                    target: "touchjoy::config",
                    button = %button.name,
                    "Button has no image and will be zero-sized"
                );
            }
        }

        Ok(model)
    }

    fn apply(
        &self,
        button: &mut Button,
        info: &mut SectionInfo,
        entry: &Entry<'_>,
    ) -> Result<(), ParseError> {
        let fail = |kind| ParseError::new(entry.line, kind);
        let bad_number = || fail(ParseErrorKind::InvalidNumber);
        let value = entry.value;

        match entry.key {
            "x" | "left" => {
                let margin = parse_margin(value).ok_or_else(bad_number)?;
                button.placement.h_anchor = HAnchor::Left;
                button.placement.h_margin = margin;
            }
            "y" | "top" => {
                let margin = parse_margin(value).ok_or_else(bad_number)?;
                button.placement.v_anchor = VAnchor::Top;
                button.placement.v_margin = margin;
            }
            "right" => {
                let margin = parse_margin(value).ok_or_else(bad_number)?;
                button.placement.h_anchor = HAnchor::Right;
                button.placement.h_margin = margin;
            }
            "bottom" => {
                let margin = parse_margin(value).ok_or_else(bad_number)?;
                button.placement.v_anchor = VAnchor::Bottom;
                button.placement.v_margin = margin;
            }
            // Already resolved up front.
            "type" => {}
            "image" => {
                let path = self.base_dir.join(value);
                let decoded = image::open(&path)
                    .map_err(|e| fail(ParseErrorKind::ImageLoad).with_cause(e))?;
                button.set_artwork(Artwork {
                    path,
                    pixels: decoded.to_rgba8(),
                });
            }
            "colorkey" => {
                button.color_key = ColorKey::from_config(value)
                    .ok_or_else(|| fail(ParseErrorKind::InvalidColorKey))?;
            }
            "keycode" => {
                let ButtonKind::Key(key) = &mut button.kind else {
                    return Err(fail(ParseErrorKind::InvalidProperty));
                };
                key.code = parse_keycode(value).ok_or_else(bad_number)?;
                info.has_keycode = true;
            }
            "sticky" => {
                let ButtonKind::Key(key) = &mut button.kind else {
                    return Err(fail(ParseErrorKind::InvalidProperty));
                };
                key.sticky =
                    parse_bool(value).ok_or_else(|| fail(ParseErrorKind::InvalidBool))?;
            }
            "direction" => {
                let ButtonKind::Wheel(wheel) = &mut button.kind else {
                    return Err(fail(ParseErrorKind::InvalidProperty));
                };
                wheel.direction = WheelDirection::from_config(value)
                    .ok_or_else(|| fail(ParseErrorKind::InvalidWheelDirection))?;
                info.has_direction = true;
            }
            "amount" => {
                let ButtonKind::Wheel(wheel) = &mut button.kind else {
                    return Err(fail(ParseErrorKind::InvalidProperty));
                };
                wheel.amount = parse_int(value)
                    .filter(|n| *n > 0)
                    .and_then(|n| u32::try_from(n).ok())
                    .ok_or_else(|| fail(ParseErrorKind::InvalidScrollAmount))?;
            }
            "threshold" => {
                let ButtonKind::Stick(stick) = &mut button.kind else {
                    return Err(fail(ParseErrorKind::InvalidProperty));
                };
                let threshold: f32 = value.parse().map_err(|_| bad_number())?;
                if !(threshold > 0.0 && threshold < 1.0) {
                    return Err(fail(ParseErrorKind::InvalidThreshold));
                }
                stick.threshold = threshold;
            }
            other => {
                let Some(dir) = StickDirection::from_config_key(other) else {
                    return Err(fail(ParseErrorKind::InvalidProperty));
                };
                let ButtonKind::Stick(stick) = &mut button.kind else {
                    return Err(fail(ParseErrorKind::InvalidProperty));
                };
                stick.codes[dir.index()] = parse_keycode(value).ok_or_else(bad_number)?;
                info.stick_codes[dir.index()] = true;
            }
        }
        Ok(())
    }
}

/// Load a layout file, resolving images relative to the file's directory.
pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<GamepadModel, ParseError> {
    let path_ref = path.as_ref();
    let base_dir = path_ref
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    Loader::new().with_base_dir(base_dir).load_from_path(path_ref)
}

/// Parse layout text, resolving images relative to the working directory.
pub fn load_from_str(text: &str) -> Result<GamepadModel, ParseError> {
    Loader::new().load_from_str(text)
}

/// Effective type of each section (last valid `type` wins) and the first
/// invalid `type` value, if any.
fn resolve_types<'a>(
    entries: &[Entry<'a>],
) -> (HashMap<&'a str, ButtonType>, Option<ParseError>) {
    let mut types = HashMap::new();
    let mut error = None;
    for entry in entries.iter().filter(|e| e.key == "type") {
        match ButtonType::from_config(entry.value) {
            Some(ty) => {
                types.insert(entry.section, ty);
            }
            None if error.is_none() => {
                error = Some(ParseError::new(entry.line, ParseErrorKind::InvalidType));
            }
            None => {}
        }
    }
    (types, error)
}

fn earliest(a: Option<ParseError>, b: Option<ParseError>) -> Option<ParseError> {
    match (a, b) {
        (Some(a), Some(b)) => Some(if b.line < a.line { b } else { a }),
        (a, b) => a.or(b),
    }
}

/// Integer in decimal, `0x` hex or leading-zero octal, optionally signed.
pub(crate) fn parse_int(value: &str) -> Option<i64> {
    let (negative, digits) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value.strip_prefix('+').unwrap_or(value)),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    let magnitude = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        i64::from_str_radix(hex, 16).ok()?
    } else if digits.len() > 1 && digits.starts_with('0') {
        i64::from_str_radix(&digits[1..], 8).ok()?
    } else {
        digits.parse().ok()?
    };
    Some(if negative { -magnitude } else { magnitude })
}

fn parse_margin(value: &str) -> Option<i32> {
    parse_int(value).and_then(|n| i32::try_from(n).ok())
}

fn parse_keycode(value: &str) -> Option<u16> {
    parse_int(value).and_then(|n| u16::try_from(n).ok())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::error::ErrorCategory;
    use crate::config::models::KeyButton;
    use crate::gamepad::geometry::{ScreenBounds, resolve};
    use image::RgbaImage;
    use std::fs;
    use tempfile::TempDir;

    const SCREEN: ScreenBounds = ScreenBounds::new(1920, 1080);

    fn err(text: &str) -> ParseError {
        load_from_str(text).expect_err("layout should be rejected")
    }

    fn write_png(dir: &Path, name: &str, w: u32, h: u32) {
        RgbaImage::new(w, h).save(dir.join(name)).unwrap();
    }

    #[test]
    fn simple_layout_resolves_positions() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("simple.ini");
        fs::write(&path, "[up]\nx=30\ny=60\n\n[down]\nx=40\ny=30\n").unwrap();

        let model = load_from_path(&path).unwrap();
        assert_eq!(model.len(), 2);
        let up = resolve(&model.by_name("up").unwrap().placement, SCREEN);
        let down = resolve(&model.by_name("down").unwrap().placement, SCREEN);
        assert_eq!((up.x, up.y), (30, 60));
        assert_eq!((down.x, down.y), (40, 30));
    }

    #[test]
    fn left_and_top_reanchor_after_right_and_bottom() {
        let model = load_from_str("[b]\nright=10\nbottom=20\nleft=30\ntop=40\n").unwrap();
        let placement = model.by_name("b").unwrap().placement;
        assert_eq!(placement.h_anchor, HAnchor::Left);
        assert_eq!(placement.h_margin, 30);
        assert_eq!(placement.v_anchor, VAnchor::Top);
        assert_eq!(placement.v_margin, 40);
        let rect = resolve(&placement, SCREEN);
        assert_eq!((rect.x, rect.y), (30, 40));
    }

    #[test]
    fn extreme_margins_load_and_resolve() {
        let model = load_from_str("[b]\nright=-2147483648\nbottom=2147483647\n").unwrap();
        let rect = resolve(&model.by_name("b").unwrap().placement, SCREEN);
        assert_eq!(rect.x, i32::MAX);
        assert_eq!(rect.y, 1080 - i32::MAX);
    }

    #[test]
    fn missing_file_is_line_zero() {
        let dir = TempDir::new().unwrap();
        let err = load_from_path(dir.path().join("notfound.ini")).unwrap_err();
        assert_eq!(err.line, 0);
        assert_eq!(err.category(), ErrorCategory::Io);
    }

    #[test]
    fn malformed_second_line_is_reported_on_line_two() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fail.ini");
        fs::write(&path, "[up]\nthis is not a property\nx=1\n").unwrap();
        let err = load_from_path(&path).unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.category(), ErrorCategory::Syntax);
    }

    #[test]
    fn unknown_key_fails_immediately() {
        let e = err("[a]\nx=1\ncolour=red\ny=2\n");
        assert_eq!((e.line, e.kind), (3, ParseErrorKind::InvalidProperty));
    }

    #[test]
    fn type_specific_key_on_wrong_type() {
        let e = err("[a]\ntype=quit\nkeycode=32\n");
        assert_eq!((e.line, e.kind), (3, ParseErrorKind::InvalidProperty));
        let e = err("[a]\ntype=key\nkeycode=32\namount=2\n");
        assert_eq!((e.line, e.kind), (4, ParseErrorKind::InvalidProperty));
    }

    #[test]
    fn type_may_follow_type_specific_keys() {
        let model = load_from_str("[w]\ndirection=down\namount=3\ntype=wheel\n").unwrap();
        let ButtonKind::Wheel(wheel) = &model.by_name("w").unwrap().kind else {
            panic!("expected wheel");
        };
        assert_eq!(wheel.direction, WheelDirection::Down);
        assert_eq!(wheel.amount, 3);
    }

    #[test]
    fn reopened_section_resumes_editing() {
        let text = "[a]\ntype=key\nkeycode=65\n[b]\ntype=quit\n[a]\nsticky=yes\nright=5\n";
        let model = load_from_str(text).unwrap();
        assert_eq!(model.len(), 2);
        let a = model.by_name("a").unwrap();
        assert_eq!(
            a.kind,
            ButtonKind::Key(KeyButton {
                code: 65,
                sticky: true,
                latched: false
            })
        );
        assert_eq!(a.placement.h_anchor, HAnchor::Right);
        assert_eq!(a.placement.h_margin, 5);
        let names: Vec<_> = model.iter().map(|(_, b)| b.name.clone()).collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn wheel_defaults_and_validation() {
        let model = load_from_str("[w]\ntype=wheel\ndirection=up\n").unwrap();
        let ButtonKind::Wheel(wheel) = &model.by_name("w").unwrap().kind else {
            panic!("expected wheel");
        };
        assert_eq!(wheel.amount, 1);

        let e = err("[w]\ntype=wheel\ndirection=sideways\n");
        assert_eq!((e.line, e.kind), (3, ParseErrorKind::InvalidWheelDirection));
        for bad in ["0", "-2", "lots"] {
            let e = err(&format!("[w]\ntype=wheel\ndirection=up\namount={bad}\n"));
            assert_eq!((e.line, e.kind), (4, ParseErrorKind::InvalidScrollAmount));
        }
    }

    #[test]
    fn invalid_type_value() {
        let e = err("[a]\nx=1\ntype=joystick\n");
        assert_eq!((e.line, e.kind), (3, ParseErrorKind::InvalidType));
    }

    #[test]
    fn earlier_error_wins_over_later_invalid_type() {
        let e = err("[a]\nbogus=1\n[b]\ntype=joystick\n");
        assert_eq!((e.line, e.kind), (2, ParseErrorKind::InvalidProperty));
    }

    #[test]
    fn semantic_error_before_syntax_error_wins() {
        let e = err("[a]\ntype=quit\nkeycode=1\n[broken\n");
        assert_eq!(e.line, 3);
    }

    #[test]
    fn capacity_overflow_is_reported() {
        let text: String = (0..3).map(|i| format!("[b{i}]\nx={i}\n")).collect();
        let e = Loader::new().with_capacity(2).load_from_str(&text).unwrap_err();
        assert_eq!(e.kind, ParseErrorKind::TooManyButtons);
        assert_eq!(e.line, 6);
        assert!(e.to_string().contains("capacity"));
    }

    #[test]
    fn explicit_types_require_their_properties() {
        let e = err("[a]\nx=1\n[k]\ntype=key\ny=2\n");
        assert_eq!((e.line, e.kind), (3, ParseErrorKind::MissingKeycode));
        let e = err("[w]\ntype=wheel\n");
        assert_eq!((e.line, e.kind), (1, ParseErrorKind::MissingWheelDirection));
        let e = err("[s]\ntype=stick\nkeyup=1\nkeydown=2\nkeyleft=3\n");
        assert_eq!((e.line, e.kind), (1, ParseErrorKind::MissingStickKeycode));
    }

    #[test]
    fn stick_properties() {
        let text = "[s]\nkeyup=0x26\nkeydown=0x28\nkeyleft=0x25\nkeyright=0x27\nthreshold=0.3\ntype=stick\n";
        let model = load_from_str(text).unwrap();
        let ButtonKind::Stick(stick) = &model.by_name("s").unwrap().kind else {
            panic!("expected stick");
        };
        assert_eq!(stick.codes, [0x26, 0x28, 0x25, 0x27]);
        assert_eq!(stick.threshold, 0.3);
        assert_eq!(stick.held, [false; 4]);
    }

    #[test]
    fn stick_threshold_out_of_range_is_rejected() {
        for bad in ["0", "1", "1.5", "-0.2", "NaN"] {
            let e = err(&format!("[s]\ntype=stick\nthreshold={bad}\n"));
            assert_eq!(e.line, 3, "threshold={bad}");
            assert_eq!(e.kind, ParseErrorKind::InvalidThreshold, "threshold={bad}");
        }
        let e = err("[s]\ntype=stick\nthreshold=half\n");
        assert_eq!(e.kind, ParseErrorKind::InvalidNumber);
    }

    #[test]
    fn numeric_forms() {
        assert_eq!(parse_int("42"), Some(42));
        assert_eq!(parse_int("-7"), Some(-7));
        assert_eq!(parse_int("0x1B"), Some(27));
        assert_eq!(parse_int("010"), Some(8));
        assert_eq!(parse_int("0"), Some(0));
        assert_eq!(parse_int(""), None);
        assert_eq!(parse_int("12px"), None);
        assert_eq!(parse_int("0x-5"), None);
        let e = err("[a]\nx=ten\n");
        assert_eq!((e.line, e.kind), (2, ParseErrorKind::InvalidNumber));
        let e = err("[a]\ntype=key\nkeycode=70000\n");
        assert_eq!(e.kind, ParseErrorKind::InvalidNumber);
    }

    #[test]
    fn images_size_the_button_and_resolve_against_base_dir() {
        let dir = TempDir::new().unwrap();
        write_png(dir.path(), "btn.png", 64, 48);
        fs::write(
            dir.path().join("pad.ini"),
            "[a]\ntype=key\nkeycode=32\nimage=btn.png\nright=10\nbottom=20\ncolorkey=#ff00ff\n",
        )
        .unwrap();

        let model = load_from_path(dir.path().join("pad.ini")).unwrap();
        let a = model.by_name("a").unwrap();
        assert_eq!((a.placement.width, a.placement.height), (64, 48));
        assert_eq!(a.color_key, ColorKey([255, 0, 255]));
        let rect = resolve(&a.placement, SCREEN);
        assert_eq!((rect.x, rect.y), (1920 - 74, 1080 - 68));
    }

    #[test]
    fn unreadable_image_fails_on_its_line() {
        let dir = TempDir::new().unwrap();
        write_png(dir.path(), "ok.png", 8, 8);
        fs::write(dir.path().join("not-an-image.png"), b"nope").unwrap();
        let loader = Loader::new().with_base_dir(dir.path());

        let e = loader
            .load_from_str("[a]\nimage=ok.png\n[b]\nimage=missing.png\n")
            .unwrap_err();
        assert_eq!((e.line, e.kind), (4, ParseErrorKind::ImageLoad));
        let e = loader
            .load_from_str("[a]\nimage=not-an-image.png\n")
            .unwrap_err();
        assert_eq!((e.line, e.kind), (2, ParseErrorKind::ImageLoad));
        assert!(e.cause.is_some());
    }

    #[test]
    fn parsing_is_deterministic() {
        let text = "[s]\ntype=stick\nkeyup=1\nkeydown=2\nkeyleft=3\nkeyright=4\n[q]\ntype=quit\nx=9\n";
        assert_eq!(load_from_str(text).unwrap(), load_from_str(text).unwrap());
    }

    #[test]
    fn untyped_sections_are_unbound_keys() {
        let model = load_from_str("[plain]\nx=1\n").unwrap();
        assert_eq!(
            model.by_name("plain").unwrap().kind,
            ButtonKind::Key(KeyButton::default())
        );
    }
}
