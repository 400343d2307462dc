//! Integration tests for `tutils ssh`.

mod common;

use common::TestEnv;
use predicates::prelude::*;

#[test]
fn test_add_list_remove() {
    let env = TestEnv::new();

    env.cmd()
        .args(["ssh", "add", "--name", "Web", "--host", "example.com", "--user", "root"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Server Web (root@example.com) added"));

    assert_eq!(env.read_servers(), "Web|root@example.com\n");

    env.cmd()
        .args(["ssh", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Web (root@example.com)"));

    env.cmd()
        .args(["ssh", "remove", "Web"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed Web (root@example.com)."));

    env.cmd()
        .args(["ssh", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No servers saved"));
}

#[test]
fn test_add_with_password_warns_and_restricts_file() {
    let env = TestEnv::new();

    env.cmd()
        .args(["ssh", "add", "--name", "Db", "--host", "admin@10.0.0.5", "--password", "s|ecret"])
        .assert()
        .success()
        .stdout(predicate::str::contains("stored in plain text"));

    assert_eq!(env.read_servers(), "Db|admin@10.0.0.5|s|ecret\n");

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(env.servers_file()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    env.cmd()
        .args(["ssh", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Db (admin@10.0.0.5) [password]"))
        .stdout(predicate::str::contains("s|ecret").not());
}

#[test]
fn test_list_skips_malformed_lines() {
    let env = TestEnv::new();
    env.write_servers("# comment\nOnlyOneField\nProd|deploy@prod.example.com\n\nBroken|\n");

    env.cmd()
        .args(["ssh", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Prod (deploy@prod.example.com)"))
        .stdout(predicate::str::contains("OnlyOneField").not())
        .stdout(predicate::str::contains("Broken").not());
}

#[test]
fn test_remove_keeps_comments_and_other_lines() {
    let env = TestEnv::new();
    env.write_servers("# keep me\nA|a@one\nOnlyOneField\nB|b@two\n");

    env.cmd().args(["ssh", "remove", "A"]).assert().success();

    let content = env.read_servers();
    assert!(content.contains("# keep me"));
    assert!(content.contains("OnlyOneField"));
    assert!(content.contains("B|b@two"));
    assert!(!content.contains("A|a@one"));
}

#[test]
fn test_remove_unknown_server_fails() {
    let env = TestEnv::new();
    env.write_servers("A|a@one\n");

    env.cmd()
        .args(["ssh", "remove", "Nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no saved server named 'Nope'"));

    assert_eq!(env.read_servers(), "A|a@one\n");
}

#[test]
fn test_add_rejects_separator_in_name() {
    let env = TestEnv::new();

    env.cmd()
        .args(["ssh", "add", "--name", "a|b", "--host", "h", "--user", "u"])
        .assert()
        .failure();

    assert!(!env.servers_file().exists());
}

#[test]
fn test_menu_creates_template_and_goes_back() {
    let env = TestEnv::new();

    // no servers yet: 1) Add 2) Remove 3) Clear 4) Back
    env.cmd()
        .arg("ssh")
        .write_stdin("4\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created template servers file"))
        .stdout(predicate::str::contains("Clear SSH known_hosts"));

    assert!(env.read_servers().starts_with('#'));
}

#[test]
fn test_menu_add_server_interactively() {
    let env = TestEnv::new();

    env.cmd()
        .arg("ssh")
        .write_stdin("1\nStaging\nstaging.example.com\nubuntu\n\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Server Staging (ubuntu@staging.example.com) added"));

    assert!(env.read_servers().ends_with("Staging|ubuntu@staging.example.com\n"));
}

#[test]
fn test_menu_reprompts_on_invalid_choice() {
    let env = TestEnv::new();

    env.cmd()
        .arg("ssh")
        .write_stdin("9\nabc\n4\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Invalid choice, enter a number between 1 and 4."));
}
