use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use git2::{Repository, Signature};
use predicates::str::contains;
use tempfile::TempDir;

fn stampsync_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("stampsync"));
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env("NO_COLOR", "1");
    cmd
}

fn commit(repo: &Repository, file: &str, content: &[u8]) -> String {
    let workdir = repo.workdir().expect("workdir");
    fs::write(workdir.join(file), content).expect("write file");
    let mut index = repo.index().expect("index");
    index.add_path(Path::new(file)).expect("stage");
    index.write().expect("write index");
    let tree = repo
        .find_tree(index.write_tree().expect("write tree"))
        .expect("tree");
    let sig = Signature::now("Test User", "test@example.com").expect("signature");
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&git2::Commit> = parent.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, "commit", &tree, &parents)
        .expect("commit")
        .to_string()
}

#[test]
fn header_prints_parsed_stamp() {
    let home = TempDir::new().expect("home");
    let script = home.path().join("door_Xed.lsl");
    fs::write(&script, "//door - abc123+\ndefault {}\n").expect("write script");

    stampsync_cmd(home.path())
        .args(["header", script.to_str().expect("utf8 path")])
        .assert()
        .success()
        .stdout(contains("name:    door"))
        .stdout(contains("version: abc123"))
        .stdout(contains("dirty:   yes"));
}

#[test]
fn header_rejects_unstamped_file() {
    let home = TempDir::new().expect("home");
    let script = home.path().join("plain_Xed.lsl");
    fs::write(&script, "default {}\n").expect("write script");

    stampsync_cmd(home.path())
        .args(["header", script.to_str().expect("utf8 path")])
        .assert()
        .failure()
        .stderr(contains("unable to recognize"))
        .stderr(contains("no header"));
}

#[test]
fn identify_reports_unique_exact_match_as_json() {
    let home = TempDir::new().expect("home");
    let repo_dir = TempDir::new().expect("repo");
    let raw = Repository::init(repo_dir.path()).expect("init");
    let id = commit(&raw, "door.lsl", b"X");

    let script = home.path().join("door_Xed.lsl");
    fs::write(&script, format!("//door - {id}\nX")).expect("write script");

    let output = stampsync_cmd(home.path())
        .args([
            "identify",
            script.to_str().expect("utf8 path"),
            "--repo",
            repo_dir.path().to_str().expect("utf8 path"),
            "--json",
        ])
        .output()
        .expect("run identify");
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(report["name"], "door");
    assert_eq!(report["verdict"], "unique");
    assert_eq!(report["strategy"], "exact_commit");
    assert_eq!(report["candidates"][0]["commit"], id.as_str());
    assert_eq!(report["candidates"][0]["path"], "door.lsl");

    // identify never writes
    assert_eq!(fs::read_to_string(&script).expect("read"), format!("//door - {id}\nX"));
}

#[test]
fn identify_table_shows_no_match() {
    let home = TempDir::new().expect("home");
    let repo_dir = TempDir::new().expect("repo");
    let raw = Repository::init(repo_dir.path()).expect("init");
    let id = commit(&raw, "door.lsl", b"X");

    let script = home.path().join("door_Xed.lsl");
    fs::write(&script, format!("//door - {id}\nsomething else")).expect("write script");

    stampsync_cmd(home.path())
        .args([
            "identify",
            script.to_str().expect("utf8 path"),
            "--repo",
            repo_dir.path().to_str().expect("utf8 path"),
        ])
        .assert()
        .success()
        .stdout(contains("door - "))
        .stdout(contains("no match"));
}

#[test]
fn identify_without_repositories_fails() {
    let home = TempDir::new().expect("home");
    let script = home.path().join("door_Xed.lsl");
    fs::write(&script, "//door - abc\nX").expect("write script");
    let config = home.path().join("missing.yaml");

    stampsync_cmd(home.path())
        .args([
            "identify",
            script.to_str().expect("utf8 path"),
            "--config",
            config.to_str().expect("utf8 path"),
        ])
        .assert()
        .failure()
        .stderr(contains("no repositories to search"));
}

#[test]
fn watch_without_repositories_fails_before_watching() {
    let home = TempDir::new().expect("home");
    let config = home.path().join("config.yaml");
    fs::write(&config, "settle_ms: 10\n").expect("write config");

    stampsync_cmd(home.path())
        .args(["watch", "--config", config.to_str().expect("utf8 path")])
        .assert()
        .failure()
        .stderr(contains("no repositories configured"));
}

#[test]
fn watch_rejects_unknown_log_format() {
    let home = TempDir::new().expect("home");

    stampsync_cmd(home.path())
        .args(["watch", "--log-format", "yaml"])
        .assert()
        .failure()
        .stderr(contains("unknown log format"));
}
