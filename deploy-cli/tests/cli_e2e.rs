//! End-to-end CLI tests exercising the profile and history subcommands
//! against a temporary `XDG_CONFIG_HOME`.

use std::process::Command;

use assert_cmd::cargo::cargo_bin;
use predicates::prelude::*;

fn deploy_cmd(config_home: &std::path::Path) -> Command {
    let mut cmd = Command::new(cargo_bin("deploy"));
    cmd.env("XDG_CONFIG_HOME", config_home);
    cmd.env("DEPLOY_TOOL_MASTER_KEY", "test-key-for-e2e");
    cmd
}

#[test]
fn test_profile_add_then_list_then_show() {
    let config_home = tempfile::TempDir::new().unwrap();

    deploy_cmd(config_home.path())
        .args([
            "profile",
            "add",
            "staging",
            "--host",
            "ftp.example.com",
            "--protocol",
            "sftp",
            "--username",
            "deployer",
            "--remote-root",
            "/var/www/staging",
            "--local-build-dir",
            "dist",
            "--password",
            "secret123",
        ])
        .assert()
        .success();

    deploy_cmd(config_home.path())
        .args(["profile", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("staging"));

    deploy_cmd(config_home.path())
        .args(["profile", "show", "staging"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ftp.example.com"))
        .stdout(predicate::str::contains("secret123").not());
}

#[test]
fn test_profile_show_missing_profile_exits_with_profile_not_found_code() {
    let config_home = tempfile::TempDir::new().unwrap();

    deploy_cmd(config_home.path())
        .args(["profile", "show", "does-not-exist"])
        .assert()
        .code(7);
}

#[test]
fn test_history_list_with_no_entries_reports_empty() {
    let config_home = tempfile::TempDir::new().unwrap();

    deploy_cmd(config_home.path())
        .args(["history", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No deployment history"));
}

#[test]
fn test_profile_remove_missing_profile_exits_with_profile_not_found_code() {
    let config_home = tempfile::TempDir::new().unwrap();

    deploy_cmd(config_home.path())
        .args(["profile", "remove", "ghost"])
        .assert()
        .code(7);
}
