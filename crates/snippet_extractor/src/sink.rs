// crates/snippet_extractor/src/sink.rs

//! Write targets for snippet bodies.
//!
//! Body lines are buffered while a snippet is open and only touch the
//! filesystem when its `snippet-end` arrives. A source file that fails
//! mid-scan therefore leaves no partial snippet file behind.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;

/// Receives the body lines of one open snippet region.
pub trait SnippetSink {
    /// Buffers one line. The line comes in already dedented and
    /// right-trimmed; the sink supplies the newline.
    fn write_line(&mut self, line: &str);

    /// Materializes the buffered lines. Called exactly once, when the
    /// region's `snippet-end` is reached.
    fn finish(&mut self) -> io::Result<()>;
}

enum WriteMode {
    /// `snippet-start`: replace whatever is at the path.
    Create,
    /// `snippet-append`: extend the existing snippet file.
    Append,
}

/// Buffers lines in memory and writes the snippet file on [`finish`].
///
/// [`finish`]: SnippetSink::finish
pub struct FileSink {
    path: PathBuf,
    mode: WriteMode,
    buffer: String,
}

impl FileSink {
    pub fn create(path: PathBuf) -> Self {
        FileSink {
            path,
            mode: WriteMode::Create,
            buffer: String::new(),
        }
    }

    pub fn append(path: PathBuf) -> Self {
        FileSink {
            path,
            mode: WriteMode::Append,
            buffer: String::new(),
        }
    }
}

impl SnippetSink for FileSink {
    fn write_line(&mut self, line: &str) {
        self.buffer.push_str(line);
        self.buffer.push('\n');
    }

    fn finish(&mut self) -> io::Result<()> {
        match self.mode {
            WriteMode::Create => fs::write(&self.path, self.buffer.as_bytes()),
            WriteMode::Append => {
                let mut file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&self.path)?;
                file.write_all(self.buffer.as_bytes())
            }
        }
    }
}

/// Swallows everything. Used for snippets that were already extracted
/// from an identical copy of the file, so the scan still validates the
/// region without writing it twice.
pub struct NullSink;

impl SnippetSink for NullSink {
    fn write_line(&mut self, _line: &str) {}

    fn finish(&mut self) -> io::Result<()> {
        Ok(())
    }
}
