//! Integration tests for the top-level CLI: help, config and the main menu.

mod common;

use assert_cmd::Command;
use common::TestEnv;
use predicates::prelude::*;
use std::fs;

#[test]
fn test_help_lists_helpers() {
    Command::cargo_bin("tutils")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("ssh"))
        .stdout(predicate::str::contains("pr"))
        .stdout(predicate::str::contains("bump"))
        .stdout(predicate::str::contains("update"))
        .stdout(predicate::str::contains("install"));
}

#[test]
fn test_version_flag() {
    Command::cargo_bin("tutils")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_unknown_bump_kind_is_rejected() {
    let env = TestEnv::new();
    env.cmd().args(["bump", "huge"]).assert().failure();
}

#[test]
fn test_config_path_prints_given_file() {
    let env = TestEnv::new();
    env.cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(env.config.display().to_string()));
}

#[test]
fn test_config_init_and_show() {
    let env = TestEnv::new();
    fs::remove_file(&env.config).unwrap();

    env.cmd()
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created config"));

    let content = fs::read_to_string(&env.config).unwrap();
    assert!(content.contains("update_ttl_secs = 300"));

    env.cmd()
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));

    env.cmd()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("release_repo"))
        .stdout(predicate::str::contains(env.home.join("servers.txt").display().to_string()));
}

#[test]
fn test_config_env_var_is_used() {
    let env = TestEnv::new();
    let other = env.temp.path().join("elsewhere.toml");

    Command::cargo_bin("tutils")
        .unwrap()
        .env("TUTILS_CONFIG", &other)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(other.display().to_string()));
}

#[test]
fn test_invalid_config_is_reported() {
    let env = TestEnv::new();
    fs::write(&env.config, "update_ttl_secs = \"soon\"\n").unwrap();

    env.cmd()
        .args(["ssh", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse config"));
}

#[test]
fn test_menu_exit() {
    let env = TestEnv::new();
    env.cmd()
        .write_stdin("5\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("What do you want to do?"))
        .stdout(predicate::str::contains("Connect to server via SSH"));
}

#[test]
fn test_menu_end_of_input_exits_cleanly() {
    let env = TestEnv::new();
    env.cmd().write_stdin("").assert().success();
}

#[test]
fn test_menu_back_from_ssh_returns_to_menu() {
    let env = TestEnv::new();

    // ssh menu with no servers: 4) Back; then 5) Exit
    let assert = env.cmd().write_stdin("2\n4\n5\n").assert().success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    assert_eq!(stdout.matches("What do you want to do?").count(), 2);
}

#[test]
fn test_pending_update_notice_is_shown() {
    let env = TestEnv::new();
    fs::create_dir_all(&env.home).unwrap();
    fs::write(
        env.home.join(".update_available.json"),
        r#"{"latest": "v99.0.0", "local": "0.1.0", "timestamp": 0.0}"#,
    )
    .unwrap();

    env.cmd()
        .arg("ssh")
        .write_stdin("4\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("Update available: v99.0.0"));

    env.cmd()
        .args(["--quiet", "ssh"])
        .write_stdin("4\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("Update available").not());
}
