//! Tests for the stylescope command-line tool.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

const THEME_CSS: &str = include_str!("fixtures/theme.css");

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn stylescope(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_stylescope"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run stylescope")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Copy the theme fixture into a temp dir so it can be edited in place.
fn scratch_theme() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("theme.css");
    std::fs::write(&path, THEME_CSS).unwrap();
    (dir, path)
}

#[test]
fn test_extract_prints_element_rules() {
    let css = fixture("theme.css");
    let html = fixture("login.html");
    let output = stylescope(&[
        "extract",
        css.to_str().unwrap(),
        "--html",
        html.to_str().unwrap(),
        "--node",
        "#kc-registration a",
    ]);

    assert!(output.status.success());
    assert_eq!(stdout(&output), "#kc-registration > span > a {\n  color: #2563eb;\n}\n");
}

#[test]
fn test_extract_json() {
    let css = fixture("theme.css");
    let html = fixture("login.html");
    let output = stylescope(&[
        "extract",
        css.to_str().unwrap(),
        "--html",
        html.to_str().unwrap(),
        "--node",
        "body",
        "--json",
    ]);

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["css"], "body {\n  font-family: 'Inter', sans-serif;\n}");
}

#[test]
fn test_replace_in_place() {
    let (_dir, theme) = scratch_theme();
    let edit_dir = TempDir::new().unwrap();
    let edit = edit_dir.path().join("edit.css");
    std::fs::write(&edit, "#kc-login {\n  background-color: #16a34a;\n}\n").unwrap();
    let html = fixture("login.html");

    let output = stylescope(&[
        "replace",
        theme.to_str().unwrap(),
        "--html",
        html.to_str().unwrap(),
        "--node",
        "#kc-login",
        "--with",
        edit.to_str().unwrap(),
        "--in-place",
    ]);

    assert!(output.status.success());
    let updated = std::fs::read_to_string(&theme).unwrap();
    assert!(updated.contains("#kc-login {\n  background-color: #16a34a;\n}"));
    assert!(!updated.contains("background-color: #2563eb"));
    assert!(updated.starts_with("@import url("));
}

#[test]
fn test_replace_selector_inserts_at_start() {
    let (_dir, theme) = scratch_theme();
    let edit_dir = TempDir::new().unwrap();
    let edit = edit_dir.path().join("rule.css");
    std::fs::write(&edit, ".instruction {\n  color: red;\n}").unwrap();

    let output = stylescope(&[
        "replace-selector",
        theme.to_str().unwrap(),
        "--with",
        edit.to_str().unwrap(),
        "--insert-at",
        "start",
        "--json",
    ]);

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["changed"], true);
    assert_eq!(value["options"]["insert_position_when_missing"], "start");
    assert!(value["css"].as_str().unwrap().starts_with(".instruction {"));
    assert_eq!(std::fs::read_to_string(&theme).unwrap(), THEME_CSS);
}

#[test]
fn test_rejected_replacement_leaves_file_untouched() {
    let (_dir, theme) = scratch_theme();
    let edit_dir = TempDir::new().unwrap();
    let edit = edit_dir.path().join("broken.css");
    std::fs::write(&edit, ".subtitle . {\n  color: red;\n}").unwrap();

    let output = stylescope(&[
        "replace-selector",
        theme.to_str().unwrap(),
        "--with",
        edit.to_str().unwrap(),
        "-i",
        "--json",
    ]);

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["changed"], false);
    assert_eq!(std::fs::read_to_string(&theme).unwrap(), THEME_CSS);
}

#[test]
fn test_targets_exit_status() {
    let dir = TempDir::new().unwrap();
    let hit = dir.path().join("hit.css");
    let miss = dir.path().join("miss.css");
    std::fs::write(&hit, "#username:focus { outline: none; }").unwrap();
    std::fs::write(&miss, ".instruction { color: red; }").unwrap();
    let html = fixture("login.html");

    let run = |css: &Path| {
        stylescope(&[
            "targets",
            css.to_str().unwrap(),
            "--html",
            html.to_str().unwrap(),
            "--node",
            "#username",
        ])
    };

    let output = run(&hit);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "true\n");

    let output = run(&miss);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout(&output), "false\n");
}

#[test]
fn test_blocks_json() {
    let css = fixture("theme.css");
    let output = stylescope(&["blocks", css.to_str().unwrap(), "--json"]);

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let blocks = value.as_array().unwrap();
    assert_eq!(blocks.len(), 8);
    assert_eq!(blocks[0]["kind"], "at-rule");
    assert_eq!(blocks[1]["prelude"], "body");
    assert_eq!(blocks[7]["kind"], "media");
    assert_eq!(blocks[7]["prelude"], "(max-width: 768px)");
    assert_eq!(blocks[7]["children"].as_array().unwrap().len(), 2);
}

#[test]
fn test_missing_element_is_an_error() {
    let css = fixture("theme.css");
    let html = fixture("login.html");
    let output = stylescope(&[
        "extract",
        css.to_str().unwrap(),
        "--html",
        html.to_str().unwrap(),
        "--node",
        "#does-not-exist",
    ]);

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error: no element matches `#does-not-exist`"));
}
