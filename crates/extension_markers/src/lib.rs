// crates/extension_markers/src/lib.rs

//! The filename-extension to comment-marker table.
//!
//! Which comment tokens may introduce a snippet directive depends on the
//! language a file is written in, and the language is judged by its filename
//! extension. The table is a YAML mapping from extension to a
//! whitespace-separated string of marker tokens:
//!
//! ```yaml
//! .py: "#"
//! .js: //
//! .abap: "* \""
//! .txt: ""
//! ```
//!
//! An empty (or null) marker string explicitly excludes an extension:
//! such files are recognized as source files but never scanned. Entries
//! keep their document order, and a filename is matched against them
//! first-entry-wins, so a `.tsx` entry listed before `.sx` claims
//! `component.tsx` even though both are suffixes of it.

use std::io;
use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};
use thiserror::Error;

/// Errors raised while loading the extension table.
#[derive(Debug, Error)]
pub enum MarkerMapError {
    #[error("failed to read extension map {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse extension map {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("extension map {}: keys must be strings", .path.display())]
    InvalidKey { path: PathBuf },

    #[error("extension map {}: markers for {extension} must be a string", .path.display())]
    InvalidMarkers { path: PathBuf, extension: String },
}

/// The ordered extension table loaded from a YAML file.
#[derive(Debug, Clone, Default)]
pub struct ExtensionMarkers {
    entries: Vec<(String, Vec<String>)>,
}

impl ExtensionMarkers {
    /// Loads the table from `path`, preserving the document order of the
    /// YAML mapping.
    pub fn load(path: &Path) -> Result<Self, MarkerMapError> {
        let text = source_encoding::read_to_string(path).map_err(|source| MarkerMapError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(path, &text)
    }

    fn from_yaml(path: &Path, text: &str) -> Result<Self, MarkerMapError> {
        let mapping: Mapping = serde_yaml::from_str(text).map_err(|source| MarkerMapError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        let mut entries = Vec::with_capacity(mapping.len());
        for (key, value) in mapping {
            let extension = match key.as_str() {
                Some(extension) => extension.to_string(),
                None => {
                    return Err(MarkerMapError::InvalidKey {
                        path: path.to_path_buf(),
                    })
                }
            };
            let markers = match value {
                Value::Null => Vec::new(),
                Value::String(tokens) => {
                    tokens.split_whitespace().map(str::to_string).collect()
                }
                _ => {
                    return Err(MarkerMapError::InvalidMarkers {
                        path: path.to_path_buf(),
                        extension,
                    })
                }
            };
            entries.push((extension, markers));
        }
        Ok(ExtensionMarkers { entries })
    }

    /// Returns the marker tokens for the first entry whose extension is a
    /// suffix of `path`, or `None` when no entry matches. An explicitly
    /// excluded extension yields an empty slice.
    pub fn markers_for(&self, path: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(extension, _)| path.ends_with(extension.as_str()))
            .map(|(_, markers)| markers.as_slice())
    }

    /// The extensions that carry at least one marker token, in document
    /// order. These are the files the extractor will actually scan.
    pub fn processable_extensions(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries
            .iter()
            .filter(|(_, markers)| !markers.is_empty())
            .map(|(extension, _)| extension.as_str())
    }
}
