use std::io;

use thiserror::Error;

/// Broad class of a [`ParseError`], useful for callers that only care whether
/// the file could be read at all or whether its contents are wrong.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The file is missing or unreadable (line is always 0).
    Io,
    /// A line is not a well-formed INI directive.
    Syntax,
    /// The directive is well-formed but makes no sense for the layout.
    Semantic,
}

/// What went wrong while loading a layout. Every kind maps to a fixed message.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    Io,
    UnterminatedSection,
    EmptySectionName,
    SectionNameTooLong,
    PropertyOutsideSection,
    MissingEquals,
    EmptyKey,
    InvalidProperty,
    InvalidType,
    InvalidWheelDirection,
    InvalidScrollAmount,
    InvalidNumber,
    InvalidBool,
    InvalidColorKey,
    InvalidThreshold,
    ImageLoad,
    TooManyButtons,
    MissingKeycode,
    MissingWheelDirection,
    MissingStickKeycode,
}

impl ParseErrorKind {
    /// Static diagnostic shown to the user.
    pub const fn message(self) -> &'static str {
        match self {
            Self::Io => "Could not read config file",
            Self::UnterminatedSection => "Section header is missing ']'",
            Self::EmptySectionName => "Section name is empty",
            Self::SectionNameTooLong => "Section name is too long",
            Self::PropertyOutsideSection => "Property outside of any section",
            Self::MissingEquals => "Expected 'key = value'",
            Self::EmptyKey => "Property name is empty",
            Self::InvalidProperty => "Invalid button property",
            Self::InvalidType => "Invalid button type",
            Self::InvalidWheelDirection => "Invalid wheel direction",
            Self::InvalidScrollAmount => "Invalid scroll amount",
            Self::InvalidNumber => "Invalid number",
            Self::InvalidBool => "Invalid boolean value",
            Self::InvalidColorKey => "Invalid color key",
            Self::InvalidThreshold => "Stick threshold must be between 0 and 1",
            Self::ImageLoad => "Could not load image",
            Self::TooManyButtons => "Too many buttons: layout capacity exceeded",
            Self::MissingKeycode => "Key button has no keycode",
            Self::MissingWheelDirection => "Wheel button has no direction",
            Self::MissingStickKeycode => "Stick button is missing a direction keycode",
        }
    }

    pub const fn category(self) -> ErrorCategory {
        match self {
            Self::Io => ErrorCategory::Io,
            Self::UnterminatedSection
            | Self::EmptySectionName
            | Self::SectionNameTooLong
            | Self::PropertyOutsideSection
            | Self::MissingEquals
            | Self::EmptyKey => ErrorCategory::Syntax,
            _ => ErrorCategory::Semantic,
        }
    }
}

/// Underlying library error, kept for `source()` chains in logs.
#[derive(Debug, Error)]
pub enum ParseCause {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Image(#[from] image::ImageError),
}

/// A located layout error. Line numbers are 1-based; 0 means the file itself
/// could not be read.
#[derive(Debug, Error)]
#[error("{}\nLine: {line}", kind.message())]
pub struct ParseError {
    pub line: usize,
    pub kind: ParseErrorKind,
    #[source]
    pub cause: Option<ParseCause>,
}

impl ParseError {
    pub fn new(line: usize, kind: ParseErrorKind) -> Self {
        Self {
            line,
            kind,
            cause: None,
        }
    }

    pub fn io(err: io::Error) -> Self {
        Self {
            line: 0,
            kind: ParseErrorKind::Io,
            cause: Some(ParseCause::Io(err)),
        }
    }

    pub fn with_cause(mut self, cause: impl Into<ParseCause>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    pub fn message(&self) -> &'static str {
        self.kind.message()
    }

    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_message_and_line() {
        let err = ParseError::new(7, ParseErrorKind::InvalidWheelDirection);
        assert_eq!(err.to_string(), "Invalid wheel direction\nLine: 7");
    }

    #[test]
    fn io_errors_are_line_zero() {
        let err = ParseError::io(io::Error::new(io::ErrorKind::NotFound, "gone"));
        assert_eq!(err.line, 0);
        assert_eq!(err.category(), ErrorCategory::Io);
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn categories() {
        assert_eq!(
            ParseErrorKind::MissingEquals.category(),
            ErrorCategory::Syntax
        );
        assert_eq!(
            ParseErrorKind::TooManyButtons.category(),
            ErrorCategory::Semantic
        );
    }
}
