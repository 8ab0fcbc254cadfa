use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::TempDir;

fn seed(dir: &std::path::Path) {
    for name in ["hello.mdx", "hello.pdf", "hello_issues.json", "old.pro", "keep.json", "notes.txt"] {
        fs::write(dir.join(name), "x").expect("failed to write file");
    }
}

#[test]
fn sweep_deletes_only_artifacts() {
    let temp = TempDir::new().expect("failed to create temp dir");
    seed(temp.path());

    Command::cargo_bin("repofix-sweep")
        .expect("binary not found")
        .arg("--dir")
        .arg(temp.path())
        .env("LOG_LEVEL", "info")
        .assert()
        .success();

    let mut left: Vec<_> = fs::read_dir(temp.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    left.sort();
    assert_eq!(left, vec!["keep.json", "notes.txt"]);
}

#[test]
fn sweep_dry_run_keeps_files() {
    let temp = TempDir::new().expect("failed to create temp dir");
    seed(temp.path());

    Command::cargo_bin("repofix-sweep")
        .expect("binary not found")
        .arg("--dir")
        .arg(temp.path())
        .arg("--dry-run")
        .assert()
        .success();

    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 6);
}

#[test]
fn sweep_missing_directory_fails() {
    let temp = TempDir::new().expect("failed to create temp dir");

    Command::cargo_bin("repofix-sweep")
        .expect("binary not found")
        .arg("--dir")
        .arg(temp.path().join("absent"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to sweep"));
}

#[test]
fn server_help_lists_overrides() {
    Command::cargo_bin("repofix")
        .expect("binary not found")
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("--port")
                .and(predicate::str::contains("--output-dir"))
                .and(predicate::str::contains("--log-level")),
        );
}
