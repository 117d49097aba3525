use anyhow::{bail, Context, Result};
use clap::error::ErrorKind;
use clap::{Arg, Command};
use std::env;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::process;

use extension_markers::ExtensionMarkers;
use snippet_extractor::Snipper;

/// Filename of the extension table used when none is given on the
/// command line. Resolved next to the executable, like any other bare
/// table filename.
const DEFAULT_EXTENSION_MAP: &str = "snippet-extensions.yml";

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("error")).init();

    let parsed = Command::new("extract_snippets")
        .version("0.1.0")
        .about("Extracts tagged snippet regions from the source files named on stdin")
        .arg(
            Arg::new("snippet_dir")
                .value_name("SNIPPET_DIR")
                .help("Directory that receives the extracted snippet files"),
        )
        .arg(
            Arg::new("extension_map")
                .value_name("EXTENSION_MAP")
                .help("YAML map of filename extensions to comment markers"),
        )
        .try_get_matches();

    // Help and version go to stdout and exit 0; any other usage error exits
    // with status 1 like every other failure.
    let matches = match parsed {
        Ok(matches) => matches,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(err) => {
            err.print()?;
            process::exit(1);
        }
    };

    // 1. Validate the output directory. Both arguments are checked by
    // hand so that every failure exits with the same status.
    let snippet_dir = match matches.get_one::<String>("snippet_dir").map(PathBuf::from) {
        Some(dir) if dir.is_dir() => dir,
        Some(dir) => bail!("snippet output directory {} does not exist", dir.display()),
        None => bail!("snippet output directory not passed"),
    };

    // 2. Load the extension table.
    let map_path = resolve_extension_map(
        matches
            .get_one::<String>("extension_map")
            .map(String::as_str),
    )?;
    if !map_path.is_file() {
        bail!("source file extension map {} not found", map_path.display());
    }
    let markers = ExtensionMarkers::load(&map_path)
        .with_context(|| format!("failed to load extension map {}", map_path.display()))?;

    let extensions: Vec<&str> = markers.processable_extensions().collect();
    println!("extracting snippets in source files {}\n", extensions.join(" "));

    // 3. Scan every candidate file named on stdin.
    let mut snipper = Snipper::new(&snippet_dir);
    let mut seen = 0usize;
    let mut processed = 0usize;

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("failed to read candidate path from stdin")?;
        let path = match normalize_path(&line) {
            Some(path) => path,
            None => continue,
        };
        if path.contains("/.") {
            log::debug!("skipping hidden path {}", path);
            continue;
        }
        seen += 1;
        let tokens = match markers.markers_for(&path) {
            Some(tokens) if !tokens.is_empty() => tokens,
            _ => {
                log::debug!("no comment markers for {}", path);
                continue;
            }
        };
        println!("{}", path);
        let events = match snipper.scan_file(Path::new(&path), tokens) {
            Ok(events) => events,
            Err(err) => {
                let kind = err.kind();
                return Err(anyhow::Error::from(err)
                    .context(format!("snippet extraction failed ({})", kind)));
            }
        };
        for (name, status) in events {
            println!("    {} {}", status.letter(), name);
        }
        processed += 1;
    }

    // 4. Summarize and exit.
    println!(
        "\n==== {} snippet(s) extracted from {} source file(s) processed of {} candidate(s)\n",
        snipper.extracted(),
        processed,
        seen
    );
    Ok(())
}

/// Standardizes one stdin entry on Linux-style relative paths: trims it,
/// turns backslashes into slashes and prefixes `./` unless the path
/// already starts with `./` or `/` or names a Windows drive. Blank
/// entries come back as `None`.
fn normalize_path(raw: &str) -> Option<String> {
    let path = raw.trim().replace('\\', "/");
    if path.is_empty() {
        return None;
    }
    if path.starts_with("./") || path.starts_with('/') || has_drive_prefix(&path) {
        Some(path)
    } else {
        Some(format!("./{}", path))
    }
}

/// True for Windows drive paths such as `C:/tmp/example.py`.
fn has_drive_prefix(path: &str) -> bool {
    let mut chars = path.chars();
    matches!(
        (chars.next(), chars.next()),
        (Some(letter), Some(':')) if letter.is_ascii_alphabetic()
    )
}

/// Resolves the extension-map argument. A bare filename (no path
/// separator) is looked up next to the executable, so the default table
/// can ship alongside the installed binary; anything with a separator is
/// used as given.
fn resolve_extension_map(argument: Option<&str>) -> Result<PathBuf> {
    let name = argument.unwrap_or(DEFAULT_EXTENSION_MAP);
    if name.contains('/') || name.contains('\\') {
        return Ok(PathBuf::from(name));
    }
    let exe = env::current_exe().context("failed to locate the running executable")?;
    let dir = exe.parent().unwrap_or_else(|| Path::new("."));
    Ok(dir.join(name))
}
