// crates/snippet_extractor/src/lib.rs

//! Extraction of named snippet regions from marked-up source files.
//!
//! Source files declare snippets with comment directives:
//!
//! ```text
//! # snippet-start:[hello.main] 4
//!     print("hello")
//! # snippet-end:[hello.main]
//! ```
//!
//! A [`Snipper`] scans one file at a time and writes each named region to
//! `<snippet_dir>/<name>.txt`, dedenting body lines by the width declared
//! on the `snippet-start` line. Snippet names are global across a run;
//! when the same name turns up again in a byte-identical file with the
//! same basename (vendored copies of one example are common), the second
//! definition is validated but not written. Any other re-definition, and
//! any malformed or misordered directive, aborts the scan with a
//! [`SnipperError`].

mod directive;
pub mod error;
pub mod sink;

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use directive::Directive;
pub use error::{ErrorKind, SnipperError};
use sink::{FileSink, NullSink, SnippetSink};

/// How one directive progressed, for per-file progress reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnippetStatus {
    /// A new snippet file was started.
    Written,
    /// The region duplicated an identical copy and was skipped.
    Duplicate,
    /// The region was appended to this file's earlier snippet.
    Appended,
}

impl SnippetStatus {
    /// Single-letter code used in progress output.
    pub fn letter(self) -> char {
        match self {
            SnippetStatus::Written => 'W',
            SnippetStatus::Duplicate => 'X',
            SnippetStatus::Appended => 'A',
        }
    }
}

struct OpenSnippet {
    name: String,
    dedent: usize,
    sink: Box<dyn SnippetSink>,
}

/// Per-file scan state. Dropped at the end of each scan; only the
/// [`Snipper`] registry survives across files.
struct FileScan<'a> {
    path: &'a Path,
    /// The file's full, undecorated text, kept for duplicate comparison.
    text: &'a str,
    /// Snippets opened so far in this file, with the dedent each declared.
    started: HashMap<String, usize>,
    /// Names whose output is suppressed because an identical copy already
    /// produced it.
    duplicates: HashSet<String>,
    /// Currently open regions, in the order they were opened.
    open: Vec<OpenSnippet>,
    /// One `(name, status)` event per start/append directive, in file order.
    events: Vec<(String, SnippetStatus)>,
}

impl<'a> FileScan<'a> {
    fn new(path: &'a Path, text: &'a str) -> Self {
        FileScan {
            path,
            text,
            started: HashMap::new(),
            duplicates: HashSet::new(),
            open: Vec::new(),
            events: Vec::new(),
        }
    }

    fn is_open(&self, name: &str) -> bool {
        self.open.iter().any(|open| open.name == name)
    }
}

/// The extraction engine. One instance spans a whole run, so that snippet
/// names collide across files and duplicate copies are detected.
pub struct Snipper {
    snippet_dir: PathBuf,
    /// Which file first defined each snippet name.
    origins: HashMap<String, PathBuf>,
    /// Raw text of files that won a duplicate comparison, so a third and
    /// fourth copy do not re-read the origin from disk.
    cache: HashMap<PathBuf, String>,
    extracted: usize,
}

impl Snipper {
    pub fn new(snippet_dir: &Path) -> Self {
        Snipper {
            snippet_dir: snippet_dir.to_path_buf(),
            origins: HashMap::new(),
            cache: HashMap::new(),
            extracted: 0,
        }
    }

    /// Number of distinct snippet files started so far. Appends and
    /// duplicate skips do not count.
    pub fn extracted(&self) -> usize {
        self.extracted
    }

    /// Scans one source file, writing any snippet regions it defines.
    ///
    /// `markers` are the comment tokens that may introduce a directive in
    /// this file. On success returns the `(name, status)` events in the
    /// order the directives appeared, for progress display. Every failure
    /// is fatal: no snippet file is written for a region whose end was
    /// never reached.
    pub fn scan_file(
        &mut self,
        path: &Path,
        markers: &[String],
    ) -> Result<Vec<(String, SnippetStatus)>, SnipperError> {
        let tag = directive::tag_regex(markers).ok_or_else(|| SnipperError::NoMarkers {
            path: path.to_path_buf(),
        })?;
        let text = source_encoding::read_to_string(path).map_err(|source| SnipperError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let mut scan = FileScan::new(path, &text);
        for (index, line) in text.trim_end().lines().enumerate() {
            let lineno = index + 1;
            match tag.find(line) {
                Some(found) => {
                    let directive = Directive::parse(line, found.end(), lineno, path)?;
                    self.apply(&mut scan, directive, lineno)?;
                }
                None => body_line(&mut scan, line, lineno)?,
            }
        }

        if !scan.open.is_empty() {
            let names: Vec<&str> = scan.open.iter().map(|open| open.name.as_str()).collect();
            return Err(SnipperError::Unterminated {
                names: names.join(" "),
                path: path.to_path_buf(),
            });
        }
        Ok(scan.events)
    }

    fn apply(
        &mut self,
        scan: &mut FileScan<'_>,
        directive: Directive,
        lineno: usize,
    ) -> Result<(), SnipperError> {
        match directive {
            Directive::Start { name, dedent } => self.start(scan, name, dedent, lineno),
            Directive::Append { name } => self.append(scan, name, lineno),
            Directive::End { name } => self.end(scan, name, lineno),
            Directive::Echo { text } => echo(scan, text, lineno),
            Directive::Ignored => Ok(()),
        }
    }

    fn start(
        &mut self,
        scan: &mut FileScan<'_>,
        name: String,
        dedent: usize,
        lineno: usize,
    ) -> Result<(), SnipperError> {
        if scan.is_open(&name) {
            return Err(SnipperError::AlreadyOpen {
                name,
                line: lineno,
                path: scan.path.to_path_buf(),
            });
        }

        let origin = self.origins.get(&name).cloned();
        let (status, sink): (SnippetStatus, Box<dyn SnippetSink>) = match origin {
            Some(origin) => {
                if self.is_identical_copy(scan, &origin)? {
                    log::debug!(
                        "snippet {} re-defined by identical copy {}",
                        name,
                        scan.path.display()
                    );
                    scan.duplicates.insert(name.clone());
                    (SnippetStatus::Duplicate, Box::new(NullSink))
                } else {
                    return Err(SnipperError::Duplicate {
                        name,
                        line: lineno,
                        path: scan.path.to_path_buf(),
                        origin,
                    });
                }
            }
            None => {
                self.origins.insert(name.clone(), scan.path.to_path_buf());
                self.extracted += 1;
                let sink = FileSink::create(self.output_path(&name));
                (SnippetStatus::Written, Box::new(sink))
            }
        };

        scan.started.insert(name.clone(), dedent);
        scan.events.push((name.clone(), status));
        scan.open.push(OpenSnippet { name, dedent, sink });
        Ok(())
    }

    fn append(
        &mut self,
        scan: &mut FileScan<'_>,
        name: String,
        lineno: usize,
    ) -> Result<(), SnipperError> {
        if scan.is_open(&name) {
            return Err(SnipperError::AlreadyOpen {
                name,
                line: lineno,
                path: scan.path.to_path_buf(),
            });
        }
        // Appending re-uses the dedent declared by this file's start.
        let dedent = match scan.started.get(&name) {
            Some(dedent) => *dedent,
            None => {
                return Err(SnipperError::AppendWithoutStart {
                    name,
                    line: lineno,
                    path: scan.path.to_path_buf(),
                })
            }
        };
        let sink: Box<dyn SnippetSink> = if scan.duplicates.contains(&name) {
            Box::new(NullSink)
        } else {
            Box::new(FileSink::append(self.output_path(&name)))
        };
        scan.events.push((name.clone(), SnippetStatus::Appended));
        scan.open.push(OpenSnippet { name, dedent, sink });
        Ok(())
    }

    fn end(
        &mut self,
        scan: &mut FileScan<'_>,
        name: String,
        lineno: usize,
    ) -> Result<(), SnipperError> {
        let index = match scan.open.iter().position(|open| open.name == name) {
            Some(index) => index,
            None => {
                return Err(SnipperError::EndNotOpen {
                    name,
                    line: lineno,
                    path: scan.path.to_path_buf(),
                })
            }
        };
        let mut finished = scan.open.remove(index);
        finished.sink.finish().map_err(|source| SnipperError::Write {
            path: self.output_path(&finished.name),
            source,
        })
    }

    /// Whether `scan`'s file is a byte-identical copy of `origin` with the
    /// same basename. Two files that merely share a snippet name are a
    /// conflict; two checked-in copies of one example are not.
    fn is_identical_copy(
        &mut self,
        scan: &FileScan<'_>,
        origin: &Path,
    ) -> Result<bool, SnipperError> {
        if origin == scan.path || origin.file_name() != scan.path.file_name() {
            return Ok(false);
        }
        let original = self.cached_text(origin)?;
        Ok(original == scan.text)
    }

    fn cached_text(&mut self, origin: &Path) -> Result<&str, SnipperError> {
        match self.cache.entry(origin.to_path_buf()) {
            Entry::Occupied(entry) => Ok(entry.into_mut().as_str()),
            Entry::Vacant(entry) => {
                let text =
                    source_encoding::read_to_string(origin).map_err(|source| SnipperError::Read {
                        path: origin.to_path_buf(),
                        source,
                    })?;
                Ok(entry.insert(text).as_str())
            }
        }
    }

    fn output_path(&self, name: &str) -> PathBuf {
        self.snippet_dir.join(format!("{}.txt", name))
    }
}

/// Routes a non-directive line into every open region, dedenting and
/// right-trimming it per region.
fn body_line(scan: &mut FileScan<'_>, line: &str, lineno: usize) -> Result<(), SnipperError> {
    for open in &mut scan.open {
        if line.contains('\t') {
            return Err(SnipperError::TabInSnippet {
                name: open.name.clone(),
                line: lineno,
                path: scan.path.to_path_buf(),
            });
        }
        let body = match dedent(line, open.dedent) {
            Ok(body) => body,
            Err(indent) => {
                return Err(SnipperError::DedentOverrun {
                    name: open.name.clone(),
                    dedent: open.dedent,
                    indent,
                    line: lineno,
                    path: scan.path.to_path_buf(),
                })
            }
        };
        open.sink.write_line(body.trim_end());
    }
    Ok(())
}

/// Writes echoed text verbatim into every open region, bypassing the
/// dedent and tab rules. Echoing with no region open is an error.
fn echo(scan: &mut FileScan<'_>, text: String, lineno: usize) -> Result<(), SnipperError> {
    if scan.open.is_empty() {
        return Err(SnipperError::EchoOutsideSnippet {
            text,
            line: lineno,
            path: scan.path.to_path_buf(),
        });
    }
    for open in &mut scan.open {
        open.sink.write_line(&text);
    }
    Ok(())
}

/// Strips `width` leading characters from `line`, provided they are all
/// whitespace. On a violation returns the line's actual indentation depth.
fn dedent(line: &str, width: usize) -> Result<&str, usize> {
    if width == 0 {
        return Ok(line);
    }
    let cut = line
        .char_indices()
        .nth(width)
        .map(|(index, _)| index)
        .unwrap_or(line.len());
    let (stripped, rest) = line.split_at(cut);
    if stripped.chars().all(char::is_whitespace) {
        Ok(rest)
    } else {
        Err(line.chars().take_while(|c| c.is_whitespace()).count())
    }
}
