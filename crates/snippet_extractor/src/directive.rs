// crates/snippet_extractor/src/directive.rs

//! Recognition and parsing of snippet directive lines.
//!
//! A directive line starts with optional spaces, one of the file's comment
//! markers, at most one space, and the literal `snippet-`. What follows is
//! the directive name (up to the first `:`), a bracketed argument, and for
//! `snippet-start` an optional dedent width after the closing bracket:
//!
//! ```text
//! # snippet-start:[widget.setup] 4
//!     body lines...
//! # snippet-end:[widget.setup]
//! ```
//!
//! Tab-indented comments deliberately do not match; only space indentation
//! can precede the marker.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::SnipperError;

/// First run of one or two digits, as used for the dedent width.
static DEDENT_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new("[0-9][0-9]?").unwrap());

/// Directive names that are recognized metadata but change nothing:
/// catalog tooling reads them, the extractor only validates their shape.
const IGNORED_DIRECTIVES: &[&str] = &[
    "service",
    "comment",
    "keyword",
    "sourceauthor",
    "sourcedate",
    "sourcedescription",
    "sourcetype",
];

/// A parsed directive line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Directive {
    Start { name: String, dedent: usize },
    Append { name: String },
    End { name: String },
    Echo { text: String },
    Ignored,
}

/// Builds the regex that detects directive lines for one source file,
/// from that file's comment marker tokens. Returns `None` when the token
/// list is empty or contains an empty token, since such a pattern would
/// match far too much.
pub(crate) fn tag_regex(markers: &[String]) -> Option<Regex> {
    if markers.is_empty() || markers.iter().any(|marker| marker.is_empty()) {
        return None;
    }
    let escaped: Vec<String> = markers.iter().map(|marker| regex::escape(marker)).collect();
    let pattern = format!("^ *(?:{}) ?snippet-", escaped.join("|"));
    // The only variable parts are escaped, so the pattern cannot be invalid.
    Some(Regex::new(&pattern).unwrap())
}

impl Directive {
    /// Parses the directive on `line`, where `tag_end` is the byte offset
    /// just past the matched `snippet-` literal.
    pub(crate) fn parse(
        line: &str,
        tag_end: usize,
        lineno: usize,
        path: &Path,
    ) -> Result<Directive, SnipperError> {
        let rest = &line[tag_end..];
        let name_end = rest.find(':').unwrap_or(rest.len());
        let directive = rest[..name_end].trim_end();

        if IGNORED_DIRECTIVES.contains(&directive) {
            // Metadata still has to be well-formed.
            bracket_argument(line, lineno, path)?;
            return Ok(Directive::Ignored);
        }

        match directive {
            "start" => {
                let name = bracket_argument(line, lineno, path)?;
                let dedent = dedent_width(line);
                Ok(Directive::Start { name, dedent })
            }
            "append" => Ok(Directive::Append {
                name: bracket_argument(line, lineno, path)?,
            }),
            "end" => Ok(Directive::End {
                name: bracket_argument(line, lineno, path)?,
            }),
            "echo" => Ok(Directive::Echo {
                text: bracket_argument(line, lineno, path)?,
            }),
            _ => Err(SnipperError::InvalidDirective {
                directive: directive.to_string(),
                line: lineno,
                path: path.to_path_buf(),
            }),
        }
    }
}

/// Extracts the text between the first `[` and the first `]` after it,
/// right-trimmed. Every directive takes exactly one such argument.
fn bracket_argument(line: &str, lineno: usize, path: &Path) -> Result<String, SnipperError> {
    let argument = line.find('[').and_then(|open| {
        let rest = &line[open + 1..];
        rest.find(']')
            .map(|close| rest[..close].trim_end().to_string())
    });
    argument.ok_or_else(|| SnipperError::MissingArgument {
        line: lineno,
        path: path.to_path_buf(),
    })
}

/// The dedent width of a `snippet-start` line: the first run of digits
/// after the last `]`, capped at two digits, defaulting to zero.
fn dedent_width(line: &str) -> usize {
    let after = match line.rfind(']') {
        Some(close) => &line[close + 1..],
        None => return 0,
    };
    DEDENT_DIGITS
        .find(after)
        .and_then(|digits| digits.as_str().parse().ok())
        .unwrap_or(0)
}
