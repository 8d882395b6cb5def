//! End-to-end tests of the `as-siblings` binary: output and exit codes.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

fn run_as_siblings(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_as-siblings"))
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .expect("Failed to execute as-siblings binary")
}

fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_diff_same_named_files() {
    let dir = TempDir::new().unwrap();
    let old = write_file(&dir.path().join("old"), "as2org.txt", "1|OrgA\n2|OrgA\n3|OrgB\n");
    let new = write_file(&dir.path().join("new"), "as2org.txt", "1|OrgA\n2|OrgB\n3|OrgB\n");

    let output = run_as_siblings(&["diff", old.to_str().unwrap(), new.to_str().unwrap()]);
    assert!(
        output.status.success(),
        "diff failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = stdout_of(&output);
    assert!(stdout.contains("old -> new: 1 added, 1 removed"));
    assert!(stdout.contains("+ AS2 <-> AS3"));
    assert!(stdout.contains("- AS1 <-> AS2"));
}

#[test]
fn test_diff_with_explicit_labels() {
    let dir = TempDir::new().unwrap();
    let old = write_file(dir.path(), "20240101.a.txt", "1|OrgA\n2|OrgB\n");
    let new = write_file(dir.path(), "20240101.b.txt", "1|OrgA\n2|OrgA\n");

    let output = run_as_siblings(&[
        "diff",
        old.to_str().unwrap(),
        new.to_str().unwrap(),
        "--old-label",
        "morning",
        "--new-label",
        "evening",
    ]);
    assert!(output.status.success());
    let stdout = stdout_of(&output);
    assert!(stdout.contains("morning -> evening: 1 added, 0 removed"));
    assert!(stdout.contains("+ AS1 <-> AS2"));
}

#[test]
fn test_check_reports_siblings() {
    let dir = TempDir::new().unwrap();
    let path = write_file(dir.path(), "20240101.txt", "2497|IIJ\n2510|IIJ\n3356|LVLT\n");

    let output = run_as_siblings(&["check", path.to_str().unwrap(), "AS2497", "2510"]);
    assert!(output.status.success());
    assert!(stdout_of(&output).contains("AS2497 and AS2510 are siblings in 20240101"));

    let output = run_as_siblings(&["check", path.to_str().unwrap(), "2497", "3356"]);
    assert!(output.status.success());
    assert!(stdout_of(&output).contains("are not siblings"));
}

#[test]
fn test_missing_file_exits_with_one() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.txt");

    let output = run_as_siblings(&["stats", missing.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed to load"));
    assert!(output.stdout.is_empty());
}

#[test]
fn test_build_error_exits_with_one() {
    let dir = TempDir::new().unwrap();
    let path = write_file(dir.path(), "20240101.txt", "1|OrgA\n1|OrgB\n");

    let output = run_as_siblings(&["stats", path.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("AS1 appears twice"));
}
