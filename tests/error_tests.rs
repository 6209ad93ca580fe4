//! Error scenario integration tests
//!
//! None of these may touch a camera: invalid usage is rejected up front.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn duo_stitch_bin(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("duo-stitch").expect("binary should build");
    cmd.env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join("config"))
        .env("DUO_STITCH_OUTPUT_DIR", home.path().join("videos"))
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn invalid_max_duration_is_usage_error() {
    let home = TempDir::new().unwrap();
    duo_stitch_bin(&home)
        .args(["--max-duration", "invalid"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid max duration"));
}

#[test]
fn malformed_canvas_is_usage_error() {
    let home = TempDir::new().unwrap();
    duo_stitch_bin(&home)
        .args(["--canvas", "widescreen"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid canvas size"));
}

#[test]
fn odd_canvas_is_usage_error() {
    let home = TempDir::new().unwrap();
    duo_stitch_bin(&home)
        .args(["--canvas", "1081x1920"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("even"));
}

#[test]
fn zero_fps_is_usage_error() {
    let home = TempDir::new().unwrap();
    duo_stitch_bin(&home)
        .args(["compose", "a.mp4", "b.mp4", "--fps", "0"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Frame rate"));
}

// dirs only honours XDG_CONFIG_HOME on Linux
#[cfg(target_os = "linux")]
#[test]
fn invalid_config_file_value_is_usage_error() {
    let home = TempDir::new().unwrap();
    let config_dir = home.path().join("config").join("duo-stitch");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(config_dir.join("config.toml"), "container = \"avi\"\n").unwrap();

    duo_stitch_bin(&home)
        .arg("list")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid container"));
}

#[test]
fn compose_missing_sources_fails() {
    let home = TempDir::new().unwrap();
    let front = home.path().join("missing_front.mp4");
    let back = home.path().join("missing_back.mp4");

    duo_stitch_bin(&home)
        .arg("compose")
        .arg(&front)
        .arg(&back)
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Video track not found"));
}

#[test]
fn config_get_unknown_key() {
    let home = TempDir::new().unwrap();
    duo_stitch_bin(&home)
        .args(["config", "get", "unknown_key"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Unknown key"));
}

#[test]
fn config_set_invalid_value() {
    let home = TempDir::new().unwrap();
    duo_stitch_bin(&home)
        .args(["config", "set", "canvas_width", "1081"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("positive and even"));
}

#[test]
fn config_set_invalid_bool() {
    let home = TempDir::new().unwrap();
    duo_stitch_bin(&home)
        .args(["config", "set", "notify", "maybe"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("'true' or 'false'"));
}
