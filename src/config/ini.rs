//! Line-oriented INI tokenizer.
//!
//! Produces the flat list of `key = value` entries in file order, each tagged
//! with the section it belongs to. Only syntax is checked here; what the keys
//! mean is the loader's business.
//!
//! Accepted syntax:
//! - `[name]` section headers (name trimmed, non-empty, at most [`MAX_SECTION_LEN`] bytes)
//! - `key = value` entries, both sides trimmed
//! - blank lines and full-line comments starting with `;` or `#`
//! - an optional UTF-8 byte order mark

use super::error::{ParseError, ParseErrorKind};

/// Longest accepted section (button) name, in bytes.
pub const MAX_SECTION_LEN: usize = 64;

/// One `key = value` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry<'a> {
    /// 1-based line of this entry.
    pub line: usize,
    pub section: &'a str,
    /// Line of the `[section]` header that introduced this entry.
    pub section_line: usize,
    pub key: &'a str,
    pub value: &'a str,
}

/// Result of tokenizing a whole document.
///
/// Tokenizing stops at the first syntax error; `entries` then holds everything
/// before it so the loader can still report an earlier semantic error first.
#[derive(Debug, Default)]
pub struct Tokens<'a> {
    pub entries: Vec<Entry<'a>>,
    pub error: Option<ParseError>,
}

pub fn tokenize(text: &str) -> Tokens<'_> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut tokens = Tokens::default();
    let mut section: Option<(&str, usize)> = None;

    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let trimmed = raw.trim();

        if trimmed.is_empty() || trimmed.starts_with(';') || trimmed.starts_with('#') {
            continue;
        }

        if let Some(rest) = trimmed.strip_prefix('[') {
            match parse_header(rest) {
                Ok(name) => section = Some((name, line)),
                Err(kind) => {
                    tokens.error = Some(ParseError::new(line, kind));
                    break;
                }
            }
            continue;
        }

        let Some((key, value)) = trimmed.split_once('=') else {
            tokens.error = Some(ParseError::new(line, ParseErrorKind::MissingEquals));
            break;
        };
        let key = key.trim();
        if key.is_empty() {
            tokens.error = Some(ParseError::new(line, ParseErrorKind::EmptyKey));
            break;
        }
        let Some((name, section_line)) = section else {
            tokens.error = Some(ParseError::new(
                line,
                ParseErrorKind::PropertyOutsideSection,
            ));
            break;
        };

        tokens.entries.push(Entry {
            line,
            section: name,
            section_line,
            key,
            value: value.trim(),
        });
    }

    tokens
}

fn parse_header(rest: &str) -> Result<&str, ParseErrorKind> {
    let Some(end) = rest.find(']') else {
        return Err(ParseErrorKind::UnterminatedSection);
    };
    let trailing = rest[end + 1..].trim_start();
    if !(trailing.is_empty() || trailing.starts_with(';') || trailing.starts_with('#')) {
        return Err(ParseErrorKind::UnterminatedSection);
    }
    let name = rest[..end].trim();
    if name.is_empty() {
        return Err(ParseErrorKind::EmptySectionName);
    }
    if name.len() > MAX_SECTION_LEN {
        return Err(ParseErrorKind::SectionNameTooLong);
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_carry_section_and_lines() {
        let tokens = tokenize("; layout\n[up]\nx = 30\n\ny=60\n[down]\nx=40\n");
        assert!(tokens.error.is_none());
        let got: Vec<_> = tokens
            .entries
            .iter()
            .map(|e| (e.line, e.section, e.section_line, e.key, e.value))
            .collect();
        assert_eq!(
            got,
            vec![
                (3, "up", 2, "x", "30"),
                (5, "up", 2, "y", "60"),
                (7, "down", 6, "x", "40"),
            ]
        );
    }

    #[test]
    fn value_may_contain_equals_and_spaces() {
        let tokens = tokenize("[a]\nimage = art/my button=1.png\n");
        assert_eq!(tokens.entries[0].value, "art/my button=1.png");
    }

    #[test]
    fn stops_at_first_syntax_error_and_keeps_prefix() {
        let tokens = tokenize("[a]\nx=1\ngarbage\ny=2\n");
        assert_eq!(tokens.entries.len(), 1);
        let err = tokens.error.unwrap();
        assert_eq!(err.line, 3);
        assert_eq!(err.kind, ParseErrorKind::MissingEquals);
    }

    #[test]
    fn header_errors() {
        assert_eq!(
            tokenize("[open\n").error.unwrap().kind,
            ParseErrorKind::UnterminatedSection
        );
        assert_eq!(
            tokenize("[  ]\n").error.unwrap().kind,
            ParseErrorKind::EmptySectionName
        );
        let long = format!("[{}]\n", "n".repeat(MAX_SECTION_LEN + 1));
        assert_eq!(
            tokenize(&long).error.unwrap().kind,
            ParseErrorKind::SectionNameTooLong
        );
        assert!(tokenize("[ok] ; trailing comment\n").error.is_none());
    }

    #[test]
    fn entry_before_any_section() {
        let err = tokenize("x=1\n").error.unwrap();
        assert_eq!(err.line, 1);
        assert_eq!(err.kind, ParseErrorKind::PropertyOutsideSection);
    }

    #[test]
    fn bom_and_crlf_are_tolerated() {
        let tokens = tokenize("\u{feff}[a]\r\nx=1\r\n");
        assert!(tokens.error.is_none());
        assert_eq!(tokens.entries[0].value, "1");
        assert_eq!(tokens.entries[0].line, 2);
    }
}
