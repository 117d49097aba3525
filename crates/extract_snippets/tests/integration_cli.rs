// tests/integration_cli.rs

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Writes `contents` under `root/rel`, creating parent directories.
fn write_file(root: &Path, rel: &str, contents: &str) -> PathBuf {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, contents).unwrap();
    path
}

/// Lays out a work directory with a snippets/ output directory and a
/// small extension table, and returns a command pointed at both. Tests
/// feed candidate paths relative to `root` on stdin.
fn extract_cmd(root: &TempDir) -> Command {
    fs::create_dir_all(root.path().join("snippets")).unwrap();
    write_file(
        root.path(),
        "snippet-extensions.yml",
        ".py: \"#\"\n.txt: \"\"\n",
    );
    let mut cmd = Command::cargo_bin("extract_snippets").unwrap();
    cmd.current_dir(root.path())
        .env_remove("SOURCE_ENCODING")
        .arg("snippets")
        .arg("./snippet-extensions.yml");
    cmd
}

fn snippet(root: &TempDir, name: &str) -> String {
    fs::read_to_string(root.path().join("snippets").join(format!("{}.txt", name))).unwrap()
}

/// --- Test: the happy path, start to finish ---
#[test]
fn test_extracts_a_snippet_end_to_end() {
    let root = TempDir::new().unwrap();
    write_file(
        root.path(),
        "src/app.py",
        "import sys\n\
         # snippet-start:[demo.main] 4\n\
         \x20   print(\"hello\")\n\
         # snippet-end:[demo.main]\n",
    );

    extract_cmd(&root)
        .write_stdin("src/app.py\n")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "extracting snippets in source files .py\n",
        ))
        .stdout(predicate::str::contains("./src/app.py"))
        .stdout(predicate::str::contains("    W demo.main"))
        .stdout(predicate::str::contains(
            "==== 1 snippet(s) extracted from 1 source file(s) processed of 1 candidate(s)",
        ));

    assert_eq!(snippet(&root, "demo.main"), "print(\"hello\")\n");
}

/// --- Test: duplicate copies and appends show their status letters ---
#[test]
fn test_duplicate_copies_and_appends_are_reported() {
    let root = TempDir::new().unwrap();
    let contents = "# snippet-start:[shared]\nbody\n# snippet-end:[shared]\n\
                    # snippet-append:[shared]\nmore\n# snippet-end:[shared]\n";
    write_file(root.path(), "python/a/lambda.py", contents);
    write_file(root.path(), "python/b/lambda.py", contents);

    extract_cmd(&root)
        .write_stdin("python/a/lambda.py\npython/b/lambda.py\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("    W shared"))
        .stdout(predicate::str::contains("    X shared"))
        .stdout(predicate::str::contains("    A shared"))
        .stdout(predicate::str::contains(
            "==== 1 snippet(s) extracted from 2 source file(s) processed of 2 candidate(s)",
        ));

    assert_eq!(snippet(&root, "shared"), "body\nmore\n");
}

/// --- Test: blank and hidden stdin entries are not even candidates ---
#[test]
fn test_blank_and_hidden_paths_are_skipped() {
    let root = TempDir::new().unwrap();
    write_file(
        root.path(),
        "src/app.py",
        "# snippet-start:[only]\nx\n# snippet-end:[only]\n",
    );

    extract_cmd(&root)
        .write_stdin("\n   \n.git/hooks/sample.py\nsrc/.vendor/lib.py\nsrc/app.py\n")
        .assert()
        .success()
        .stdout(predicate::str::contains(".git").not())
        .stdout(predicate::str::contains(".vendor").not())
        .stdout(predicate::str::contains(
            "==== 1 snippet(s) extracted from 1 source file(s) processed of 1 candidate(s)",
        ));
}

/// --- Test: candidates without usable markers are seen but not scanned ---
#[test]
fn test_unmatched_and_excluded_extensions_are_not_processed() {
    let root = TempDir::new().unwrap();
    write_file(root.path(), "README.md", "no markers here\n");
    write_file(root.path(), "notes.txt", "# snippet-start:[nope]\n");
    write_file(
        root.path(),
        "src/app.py",
        "# snippet-start:[real]\nx\n# snippet-end:[real]\n",
    );

    extract_cmd(&root)
        .write_stdin("README.md\nnotes.txt\nsrc/app.py\n")
        .assert()
        .success()
        // Only scanned files are echoed.
        .stdout(predicate::str::contains("./README.md").not())
        .stdout(predicate::str::contains("./notes.txt").not())
        .stdout(predicate::str::contains("./src/app.py"))
        .stdout(predicate::str::contains(
            "==== 1 snippet(s) extracted from 1 source file(s) processed of 3 candidate(s)",
        ));
}

/// --- Test: conflicting re-definition stops the whole run ---
#[test]
fn test_conflicting_snippet_definition_fails_the_run() {
    let root = TempDir::new().unwrap();
    write_file(
        root.path(),
        "a/widget.py",
        "# snippet-start:[widget]\nalpha\n# snippet-end:[widget]\n",
    );
    write_file(
        root.path(),
        "b/widget.py",
        "# snippet-start:[widget]\nbeta\n# snippet-end:[widget]\n",
    );

    extract_cmd(&root)
        .write_stdin("a/widget.py\nb/widget.py\n")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("state error"))
        .stderr(predicate::str::contains("duplicate snippet widget"))
        .stderr(predicate::str::contains("./a/widget.py"));
}

/// --- Test: an unterminated region fails and leaves nothing behind ---
#[test]
fn test_unterminated_region_fails_and_writes_no_file() {
    let root = TempDir::new().unwrap();
    write_file(
        root.path(),
        "src/app.py",
        "# snippet-start:[dangling]\nbody\n",
    );

    extract_cmd(&root)
        .write_stdin("src/app.py\n")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(
            "snippet-end tag(s) for dangling missing",
        ));

    assert!(!root.path().join("snippets/dangling.txt").exists());
}

/// --- Test: a tab inside a region is reported with its line ---
#[test]
fn test_tab_inside_a_region_is_a_content_error() {
    let root = TempDir::new().unwrap();
    write_file(
        root.path(),
        "src/app.py",
        "# snippet-start:[tabs]\n\tindented\n# snippet-end:[tabs]\n",
    );

    extract_cmd(&root)
        .write_stdin("src/app.py\n")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("content error"))
        .stderr(predicate::str::contains(
            "tab found in snippet tabs at line 2",
        ));
}

/// --- Test: argument validation ---
#[test]
fn test_missing_output_directory_fails() {
    let root = TempDir::new().unwrap();
    let mut cmd = Command::cargo_bin("extract_snippets").unwrap();
    cmd.current_dir(root.path())
        .arg("no-such-dir")
        .write_stdin("")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("snippet output directory"));
}

#[test]
fn test_no_arguments_at_all_fails() {
    let mut cmd = Command::cargo_bin("extract_snippets").unwrap();
    cmd.write_stdin("")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(
            "snippet output directory not passed",
        ));
}

#[test]
fn test_surplus_argument_fails_with_status_one() {
    let root = TempDir::new().unwrap();
    extract_cmd(&root)
        .arg("surplus")
        .write_stdin("")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("unexpected argument 'surplus'"));
}

#[test]
fn test_unknown_flag_fails_with_status_one() {
    let root = TempDir::new().unwrap();
    extract_cmd(&root)
        .arg("--frobnicate")
        .write_stdin("")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("unexpected argument"));
}

#[test]
fn test_version_flag_is_not_a_failure() {
    let mut cmd = Command::cargo_bin("extract_snippets").unwrap();
    cmd.arg("--version")
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.1.0"));
}

#[test]
fn test_missing_extension_map_fails() {
    let root = TempDir::new().unwrap();
    fs::create_dir_all(root.path().join("snippets")).unwrap();
    let mut cmd = Command::cargo_bin("extract_snippets").unwrap();
    cmd.current_dir(root.path())
        .arg("snippets")
        .arg("./absent.yml")
        .write_stdin("")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("source file extension map"))
        .stderr(predicate::str::contains("not found"));
}

/// --- Test: the default table name is looked up next to the binary ---
#[test]
fn test_default_extension_map_is_exe_relative() {
    let root = TempDir::new().unwrap();
    fs::create_dir_all(root.path().join("snippets")).unwrap();
    let mut cmd = Command::cargo_bin("extract_snippets").unwrap();
    cmd.current_dir(root.path())
        .arg("snippets")
        .write_stdin("")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("snippet-extensions.yml"));
}

/// --- Test: SOURCE_ENCODING applies to the files being scanned ---
#[test]
fn test_source_encoding_selects_the_input_encoding() {
    let root = TempDir::new().unwrap();
    fs::create_dir_all(root.path().join("snippets")).unwrap();
    write_file(
        root.path(),
        "snippet-extensions.yml",
        ".py: \"#\"\n",
    );
    // "café" in Latin-1; not valid UTF-8.
    let mut contents = b"# snippet-start:[enc]\n".to_vec();
    contents.extend_from_slice(b"caf\xe9\n");
    contents.extend_from_slice(b"# snippet-end:[enc]\n");
    fs::write(root.path().join("app.py"), &contents).unwrap();

    let mut cmd = Command::cargo_bin("extract_snippets").unwrap();
    cmd.current_dir(root.path())
        .arg("snippets")
        .arg("./snippet-extensions.yml")
        .env("SOURCE_ENCODING", "latin1")
        .write_stdin("app.py\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("    W enc"));

    // Output files are UTF-8 regardless of the input encoding.
    assert_eq!(snippet(&root, "enc"), "café\n");
}

#[test]
fn test_non_utf8_input_fails_under_the_default_encoding() {
    let root = TempDir::new().unwrap();
    fs::create_dir_all(root.path().join("snippets")).unwrap();
    write_file(
        root.path(),
        "snippet-extensions.yml",
        ".py: \"#\"\n",
    );
    fs::write(root.path().join("app.py"), b"# snippet-start:[enc]\ncaf\xe9\n").unwrap();

    let mut cmd = Command::cargo_bin("extract_snippets").unwrap();
    cmd.current_dir(root.path())
        .arg("snippets")
        .arg("./snippet-extensions.yml")
        .env_remove("SOURCE_ENCODING")
        .write_stdin("app.py\n")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("failed to read"))
        .stderr(predicate::str::contains("not valid UTF-8"));
}
