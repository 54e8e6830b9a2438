// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Integration tests for the repofinder CLI

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use tempfile::TempDir;

/// repofinder pointed at an empty settings file, so the user's own config
/// file and `REPOFINDER_*` variables stay out; `--config` still overrides it
fn repofinder() -> Command {
    let empty = Path::new(env!("CARGO_TARGET_TMPDIR")).join("repofinder-empty.toml");
    fs::write(&empty, "").unwrap();

    let mut cmd = Command::cargo_bin("repofinder").expect("binary builds");
    cmd.env("REPOFINDER_CONFIG", &empty)
        .env_remove("REPOFINDER_CHUNK_SIZE")
        .env_remove("REPOFINDER_MARKER")
        .env_remove("REPOFINDER_QUERY");
    cmd
}

/// Lay out the a / b / c fixture: two repositories and one plain directory
fn setup_root() -> TempDir {
    let root = TempDir::new().unwrap();
    fs::create_dir_all(root.path().join("a/.git")).unwrap();
    fs::create_dir_all(root.path().join("b/src")).unwrap();
    fs::create_dir_all(root.path().join("c/.git")).unwrap();
    fs::write(root.path().join("README"), "not scanned").unwrap();
    root
}

fn git_available() -> bool {
    process::Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Create a repository with one commit by a fixed author
fn git_repo_with_commit(dir: &Path) {
    fs::create_dir_all(dir).unwrap();
    let git = |args: &[&str]| {
        let status = process::Command::new("git")
            .args(args)
            .current_dir(dir)
            .env("GIT_AUTHOR_NAME", "Jane Doe")
            .env("GIT_AUTHOR_EMAIL", "jane@example.com")
            .env("GIT_AUTHOR_DATE", "2021-05-01T10:00:00+00:00")
            .env("GIT_COMMITTER_NAME", "Jane Doe")
            .env("GIT_COMMITTER_EMAIL", "jane@example.com")
            .env("GIT_COMMITTER_DATE", "2021-05-01T10:00:00+00:00")
            .status()
            .expect("Failed to execute git");
        assert!(status.success(), "git {args:?} failed");
    };
    git(&["init", "-q"]);
    fs::write(dir.join("file.txt"), "hello").unwrap();
    git(&["add", "file.txt"]);
    git(&["-c", "commit.gpgsign=false", "commit", "-q", "-m", "first"]);
}

/// `good` holds a repository; `locked/sub` cannot be read. `None` when the
/// permission bits do not bind the current user (root)
#[cfg(unix)]
fn root_with_unreadable_chunk() -> Option<(TempDir, PathBuf)> {
    use std::os::unix::fs::PermissionsExt;

    let root = TempDir::new().unwrap();
    fs::create_dir_all(root.path().join("good/.git")).unwrap();
    let locked = root.path().join("locked/sub");
    fs::create_dir_all(&locked).unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    if fs::read_dir(&locked).is_ok() {
        unlock(&locked);
        return None;
    }
    Some((root, locked))
}

/// Make `dir` removable again so the temp dir can be cleaned up
#[cfg(unix)]
fn unlock(dir: &Path) {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(dir, fs::Permissions::from_mode(0o755)).unwrap();
}

#[test]
fn test_scan_prints_repositories() {
    let root = setup_root();

    let output = repofinder()
        .args(["--root", root.path().to_str().unwrap()])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let stdout = String::from_utf8(output).unwrap();

    assert!(stdout.contains(&format!("Project: {}\n", root.path().join("a").display())));
    assert!(stdout.contains(&format!("Project: {}\n", root.path().join("c").display())));
    assert!(!stdout.contains(&root.path().join("b").display().to_string()));
    assert!(!stdout.contains("Author:"));
    assert_eq!(stdout.matches("Project: ").count(), 2);
    assert!(stdout.ends_with("\n\n"));
}

#[test]
fn test_missing_root_is_rejected() {
    repofinder()
        .assert()
        .failure()
        .stderr(predicate::str::contains("root must not be empty"));
}

#[test]
fn test_empty_root_is_rejected() {
    repofinder()
        .args(["--root", ""])
        .assert()
        .failure()
        .stderr(predicate::str::contains("root must not be empty"));
}

#[test]
fn test_non_positive_chunk_size_is_rejected() {
    let root = setup_root();
    for size in ["0", "-2"] {
        repofinder()
            .args(["--root", root.path().to_str().unwrap(), "--chunk-size", size])
            .assert()
            .failure()
            .stderr(predicate::str::contains("chunk-size must be a positive integer"));
    }
}

#[test]
fn test_all_invalid_fields_reported_together() {
    repofinder()
        .args(["--root", "", "--chunk-size", "0"])
        .assert()
        .failure()
        .stderr(
            predicate::str::contains("root must not be empty")
                .and(predicate::str::contains("chunk-size must be a positive integer")),
        );
}

#[test]
fn test_unlistable_root_fails() {
    let root = TempDir::new().unwrap();
    let missing = root.path().join("missing");

    repofinder()
        .args(["--root", missing.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("filesystem error"));
}

#[test]
fn test_json_output() {
    let root = setup_root();

    let output = repofinder()
        .args(["--root", root.path().to_str().unwrap(), "--chunk-size", "1", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
    let mut names: Vec<_> = value
        .as_array()
        .expect("top-level array of records")
        .iter()
        .map(|r| r["name"].as_str().unwrap().to_string())
        .collect();
    names.sort();
    assert_eq!(names, vec!["a", "c"]);
}

#[test]
fn test_user_config_file_is_ignored() {
    let root = setup_root();
    let home = TempDir::new().unwrap();
    let user_config = home.path().join("repofinder/config.toml");
    fs::create_dir_all(user_config.parent().unwrap()).unwrap();
    fs::write(&user_config, "chunk_size = 0\n").unwrap();

    repofinder()
        .env("XDG_CONFIG_HOME", home.path())
        .args(["--root", root.path().to_str().unwrap()])
        .assert()
        .success();
}

#[cfg(unix)]
#[test]
fn test_keep_going_reports_failed_chunk() {
    let Some((root, locked)) = root_with_unreadable_chunk() else {
        eprintln!("directory still readable, skipping");
        return;
    };

    let assert = repofinder()
        .args(["--root", root.path().to_str().unwrap(), "--keep-going", "--chunk-size", "1"])
        .assert();
    unlock(&locked);

    let output = assert.failure().get_output().clone();
    let stdout = String::from_utf8(output.stdout).unwrap();
    let stderr = String::from_utf8(output.stderr).unwrap();

    assert_eq!(stdout, format!("Project: {}\n\n", root.path().join("good").display()));
    assert!(stderr.contains("chunk 1 (locked) failed: filesystem error"), "{stderr}");
    assert!(stderr.contains("1 of the scan chunks failed"), "{stderr}");
}

#[cfg(unix)]
#[test]
fn test_without_keep_going_failed_chunk_aborts() {
    let Some((root, locked)) = root_with_unreadable_chunk() else {
        eprintln!("directory still readable, skipping");
        return;
    };

    let assert = repofinder()
        .args(["--root", root.path().to_str().unwrap(), "--chunk-size", "1"])
        .assert();
    unlock(&locked);

    assert
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("filesystem error"));
}

#[test]
fn test_chunk_size_from_config_file() {
    let root = setup_root();
    let config = TempDir::new().unwrap();
    let config_path = config.path().join("repofinder.toml");
    fs::write(&config_path, "chunk_size = 0\n").unwrap();

    // The configured default is validated like a flag value
    repofinder()
        .args(["--root", root.path().to_str().unwrap()])
        .args(["--config", config_path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("chunk-size"));

    // ...and the flag still wins
    repofinder()
        .args(["--root", root.path().to_str().unwrap(), "--chunk-size", "2"])
        .args(["--config", config_path.to_str().unwrap()])
        .assert()
        .success();
}

#[test]
fn test_dig_with_default_log_format() {
    if !git_available() {
        eprintln!("git not available, skipping");
        return;
    }
    let root = TempDir::new().unwrap();
    git_repo_with_commit(&root.path().join("project"));

    repofinder()
        .args(["--root", root.path().to_str().unwrap(), "--dig"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Author: Jane Doe <jane@example.com>")
                .and(predicate::str::contains("CreatedAt: unknown")),
        );
}

#[test]
fn test_dig_with_formatted_query() {
    if !git_available() {
        eprintln!("git not available, skipping");
        return;
    }
    let root = TempDir::new().unwrap();
    git_repo_with_commit(&root.path().join("project"));

    repofinder()
        .args(["--root", root.path().to_str().unwrap(), "--dig", "--query", "formatted"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Author: Jane Doe <jane@example.com>")
                .and(predicate::str::contains("CreatedAt: 2021-05-01T10:00:00+00:00")),
        );
}

#[test]
fn test_dig_on_unreadable_repository_degrades() {
    if !git_available() {
        eprintln!("git not available, skipping");
        return;
    }
    let root = TempDir::new().unwrap();
    git_repo_with_commit(&root.path().join("good"));
    // An empty `.git` is not a repository git can read; the pipeline still
    // exits with head's status, so the record keeps empty metadata
    fs::create_dir_all(root.path().join("broken/.git")).unwrap();

    let output = repofinder()
        .args(["--root", root.path().to_str().unwrap(), "--dig", "--chunk-size", "1"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let stdout = String::from_utf8(output).unwrap();

    let broken = format!(
        "Project: {}\nAuthor: \nCreatedAt: unknown\n",
        root.path().join("broken").display()
    );
    assert!(stdout.contains(&broken), "unexpected output:\n{stdout}");
    assert!(stdout.contains("Author: Jane Doe <jane@example.com>"));
}
