// crates/snippet_extractor/src/error.rs

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong while scanning a source file. Every
/// variant is fatal to the run: a half-extracted snippet set is worse
/// than none, so the caller is expected to stop at the first error.
#[derive(Debug, Error)]
pub enum SnipperError {
    #[error("no usable comment markers for {}", .path.display())]
    NoMarkers { path: PathBuf },

    #[error("invalid directive snippet-{directive} at line {line} in {}", .path.display())]
    InvalidDirective {
        directive: String,
        line: usize,
        path: PathBuf,
    },

    #[error("snippet directive missing its [argument] at line {line} in {}", .path.display())]
    MissingArgument { line: usize, path: PathBuf },

    #[error("snippet {name} already open at line {line} in {}", .path.display())]
    AlreadyOpen {
        name: String,
        line: usize,
        path: PathBuf,
    },

    #[error(
        "duplicate snippet {name} at line {line} in {} (originally defined in {})",
        .path.display(),
        .origin.display()
    )]
    Duplicate {
        name: String,
        line: usize,
        path: PathBuf,
        origin: PathBuf,
    },

    #[error("snippet {name} appended before any start at line {line} in {}", .path.display())]
    AppendWithoutStart {
        name: String,
        line: usize,
        path: PathBuf,
    },

    #[error("snippet {name} ended but not open at line {line} in {}", .path.display())]
    EndNotOpen {
        name: String,
        line: usize,
        path: PathBuf,
    },

    #[error("echo '{text}' outside any snippet at line {line} in {}", .path.display())]
    EchoOutsideSnippet {
        text: String,
        line: usize,
        path: PathBuf,
    },

    #[error("tab found in snippet {name} at line {line} in {}", .path.display())]
    TabInSnippet {
        name: String,
        line: usize,
        path: PathBuf,
    },

    #[error(
        "cannot dedent snippet {name} by {dedent} at line {line} in {}: line is indented by {indent}",
        .path.display()
    )]
    DedentOverrun {
        name: String,
        dedent: usize,
        indent: usize,
        line: usize,
        path: PathBuf,
    },

    #[error("snippet-end tag(s) for {names} missing in {}", .path.display())]
    Unterminated { names: String, path: PathBuf },

    #[error("failed to read {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Coarse classification of a [`SnipperError`], used to label diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The marker configuration made the scan impossible.
    Config,
    /// A directive line did not have the expected shape.
    Parse,
    /// A directive was valid but arrived in the wrong order.
    State,
    /// A snippet body line violated a content rule.
    Content,
    /// The underlying filesystem failed.
    Io,
}

impl SnipperError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SnipperError::NoMarkers { .. } => ErrorKind::Config,
            SnipperError::InvalidDirective { .. } | SnipperError::MissingArgument { .. } => {
                ErrorKind::Parse
            }
            SnipperError::AlreadyOpen { .. }
            | SnipperError::Duplicate { .. }
            | SnipperError::AppendWithoutStart { .. }
            | SnipperError::EndNotOpen { .. }
            | SnipperError::EchoOutsideSnippet { .. }
            | SnipperError::Unterminated { .. } => ErrorKind::State,
            SnipperError::TabInSnippet { .. } | SnipperError::DedentOverrun { .. } => {
                ErrorKind::Content
            }
            SnipperError::Read { .. } | SnipperError::Write { .. } => ErrorKind::Io,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::Config => "config error",
            ErrorKind::Parse => "parse error",
            ErrorKind::State => "state error",
            ErrorKind::Content => "content error",
            ErrorKind::Io => "i/o error",
        };
        f.write_str(label)
    }
}
