//! End-to-end tests of the `derby-bundle` binary.

// assert_cmd::Command::cargo_bin is deprecated but still works
#![allow(deprecated)]

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn derby_bundle(cwd: &Path) -> Command {
    let mut cmd = Command::cargo_bin("derby-bundle").unwrap();
    cmd.current_dir(cwd)
        .env_remove("RUST_LOG")
        .env_remove("DERBY_ENV")
        .env_remove("NODE_ENV");
    cmd
}

fn project() -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::write(root.join("app.js"), "var derby = require('derby');\nwindow.derby = derby;\n")
        .unwrap();
    let derby = root.join("node_modules/derby");
    fs::create_dir_all(&derby).unwrap();
    fs::write(
        derby.join("package.json"),
        r#"{"name":"derby","version":"0.0.0","main":"index.js"}"#,
    )
    .unwrap();
    fs::write(derby.join("index.js"), "module.exports = { ok: true };\n").unwrap();
    fs::create_dir(root.join("public")).unwrap();
    temp
}

#[test]
fn tag_prints_script_tag() {
    let temp = TempDir::new().unwrap();
    derby_bundle(temp.path())
        .args(["tag", "--url", "/derby/app-abc.js", "--crossorigin"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            r#"<script async data-derby-app src="/derby/app-abc.js" crossorigin></script>"#,
        ));
}

#[test]
fn empty_tag_url_is_rejected() {
    let temp = TempDir::new().unwrap();
    derby_bundle(temp.path())
        .args(["tag", "--url", ""])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--url must not be empty"));
}

#[test]
fn write_without_entry_file_fails() {
    let temp = project();
    derby_bundle(temp.path())
        .args(["--no-color", "write", "--entry", "missing.js", "--name", "app"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("File not found"));
}

#[test]
fn write_requires_an_app_name() {
    let temp = project();
    derby_bundle(temp.path())
        .args(["--no-color", "write", "--entry", "app.js"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration error"));
}

#[test]
fn write_bundles_into_public_derby() {
    let temp = project();
    let assert = derby_bundle(temp.path())
        .args([
            "--no-color",
            "--quiet",
            "write",
            "--entry",
            "app.js",
            "--name",
            "app",
            "--base-url",
            "https://cdn.test",
        ])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("https://cdn.test/derby/app-"));

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let hash = stdout.lines().nth(1).unwrap();
    let out = temp.path().join("public/derby");
    assert!(out.join(format!("app-{hash}.js")).is_file());
    assert!(out.join(format!("app-{hash}.map.json")).is_file());
}

#[test]
fn config_file_supplies_defaults() {
    let temp = project();
    fs::write(
        temp.path().join("derby.toml"),
        r#"
[app]
name = "fromfile"
filename = "app.js"

[bundle]
disable_script_map = true
"#,
    )
    .unwrap();

    derby_bundle(temp.path())
        .args(["--no-color", "--quiet", "write"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("/derby/fromfile-"));

    let files: Vec<_> = fs::read_dir(temp.path().join("public/derby"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(files.len(), 1);
    assert!(files[0].ends_with(".js"));
}
