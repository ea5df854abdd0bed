//! Integration tests for the installer binary's argument handling and
//! fail-fast validation.

#![allow(clippy::expect_used)]

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

const SECRETS: &[&str] = &[
    "API_KEY_OPENAI",
    "API_KEY_ANTHROPIC",
    "AUTH_LOGIN",
    "AUTH_PASSWORD",
    "RFC_PASSWORD",
];

/// The binary with an empty environment and `HOME` pointing at `home`.
fn installer(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("agent-zero-install"));
    cmd.env_clear().env("HOME", home).env("NO_COLOR", "1");
    cmd
}

fn with_all_secrets(cmd: &mut Command) -> &mut Command {
    for name in SECRETS {
        cmd.env(name, format!("{}-value-for-tests", name.to_lowercase()));
    }
    cmd
}

// --- Help and version ---

#[test]
fn test_help_flag_lists_environment() {
    let home = tempfile::tempdir().expect("tempdir");
    installer(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("API_KEY_OPENAI"))
        .stdout(predicate::str::contains("AGENT_ZERO_DIR"));
}

#[test]
fn test_version_flag_shows_version() {
    let home = tempfile::tempdir().expect("tempdir");
    installer(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("agent-zero-install"))
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_unknown_argument_is_a_usage_error() {
    let home = tempfile::tempdir().expect("tempdir");
    installer(home.path())
        .arg("--yes")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unexpected argument"));
}

// --- Fail-fast validation ---

#[test]
fn test_missing_secrets_exit_one_and_touch_nothing() {
    let home = tempfile::tempdir().expect("tempdir");
    installer(home.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Required secrets are not set"))
        .stderr(predicate::str::contains("API_KEY_OPENAI"))
        .stderr(predicate::str::contains("RFC_PASSWORD"));

    assert!(
        !home.path().join("agent-zero").exists(),
        "install dir must not be created"
    );
}

#[test]
fn test_fatal_error_is_marked_on_stderr_only() {
    let home = tempfile::tempdir().expect("tempdir");
    installer(home.path())
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::starts_with("  ✗ Error: Required secrets are not set"))
        .stderr(predicate::str::contains('\u{1b}').not());
}

#[test]
fn test_placeholder_secret_is_rejected() {
    let home = tempfile::tempdir().expect("tempdir");
    let mut cmd = installer(home.path());
    with_all_secrets(&mut cmd)
        .env("AUTH_PASSWORD", "  ChangeMe ")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("placeholder value: AUTH_PASSWORD"))
        .stderr(predicate::str::contains("missing").not());
}

#[test]
fn test_invalid_port_is_rejected() {
    let home = tempfile::tempdir().expect("tempdir");
    let mut cmd = installer(home.path());
    with_all_secrets(&mut cmd)
        .env("GUI_PORT", "70000")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("GUI_PORT must be a port number"));
}

#[test]
fn test_equal_ports_are_rejected() {
    let home = tempfile::tempdir().expect("tempdir");
    let mut cmd = installer(home.path());
    with_all_secrets(&mut cmd)
        .env("GUI_PORT", "8080")
        .env("API_PORT", "8080")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("must differ"));
}
