// crates/source_encoding/src/lib.rs

//! Decoded file reads for the snippet tool-chain.
//!
//! Every file the tools read (source files as well as the extension map)
//! goes through [`read_to_string`], which decodes the raw bytes according to
//! the `SOURCE_ENCODING` environment variable. Any label understood by the
//! WHATWG Encoding Standard works ("latin1", "windows-1252", "utf-16le",
//! ...); when the variable is unset or blank the default is UTF-8. Decoding
//! is strict: malformed input is reported as an error rather than smuggled
//! through as replacement characters. A leading byte-order mark matching the
//! configured encoding is stripped; a BOM never switches the decoder to a
//! different encoding.
//!
//! Output files are not covered here; everything the tools write is UTF-8.

use std::env;
use std::fs;
use std::io;
use std::path::Path;

use encoding_rs::Encoding;

/// Environment variable naming the character encoding of all input files.
pub const SOURCE_ENCODING_VAR: &str = "SOURCE_ENCODING";

/// Reads the file at `path` and decodes it with the configured encoding.
///
/// Returns an error if the file cannot be read, if `SOURCE_ENCODING` names
/// an unknown encoding, or if the contents are malformed in that encoding.
pub fn read_to_string(path: &Path) -> io::Result<String> {
    let bytes = fs::read(path)?;
    let encoding = configured_encoding()?;
    let (text, had_errors) = decode(&bytes, encoding);
    if had_errors {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("{} is not valid {}", path.display(), encoding.name()),
        ));
    }
    Ok(text)
}

/// Resolves the encoding selected by `SOURCE_ENCODING`.
///
/// The variable is consulted on every call rather than cached, so a caller
/// that sets it for a child process gets the expected behavior.
pub fn configured_encoding() -> io::Result<&'static Encoding> {
    let label = match env::var(SOURCE_ENCODING_VAR) {
        Ok(label) if !label.trim().is_empty() => label,
        _ => return Ok(encoding_rs::UTF_8),
    };
    Encoding::for_label(label.trim().as_bytes()).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("unknown source encoding '{}'", label.trim()),
        )
    })
}

fn decode(bytes: &[u8], encoding: &'static Encoding) -> (String, bool) {
    let (text, had_errors) = encoding.decode_with_bom_removal(bytes);
    (text.into_owned(), had_errors)
}
