mod common;

use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::tempdir;

use common::{MockService, tokens_json};

#[test]
fn dry_run_counting_up_without_start_fails_with_inline_message() {
    let mut cmd = cargo_bin_cmd!("dentifrice");
    cmd.env_remove("DENTIFRICE_BASE_URL")
        .args(["create", "--dry-run", "--count", "up", "--name", "uptime"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "If clock counts up, a start date is needed.",
        ));
}

#[test]
fn dry_run_prints_preview_without_contacting_service() {
    let mut cmd = cargo_bin_cmd!("dentifrice");
    cmd.env_remove("DENTIFRICE_BASE_URL")
        .args([
            "create",
            "--dry-run",
            "--name",
            "exam",
            "--end-date",
            "2099-06-30",
            "--end-time",
            "09:00",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("exam  [DOWN]  until 2099-06-30 09:00"));
}

#[test]
fn set_assigns_fields_by_input_name() {
    let mut cmd = cargo_bin_cmd!("dentifrice");
    cmd.env_remove("DENTIFRICE_BASE_URL")
        .args([
            "create",
            "--dry-run",
            "--name",
            "ignored",
            "--set",
            "enddate=2099-06-30",
            "--set",
            "name=exam",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("exam  [DOWN]  until 2099-06-30 00:00"));
}

#[test]
fn set_rejects_unknown_field_name() {
    let mut cmd = cargo_bin_cmd!("dentifrice");
    cmd.args(["create", "--dry-run", "--set", "hasStart=true"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown form field 'hasStart'"));
}

#[test]
fn dry_run_rejects_malformed_date() {
    let mut cmd = cargo_bin_cmd!("dentifrice");
    cmd.args(["create", "--dry-run", "--end-date", "30/06/2099"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not a valid date"));
}

#[test]
fn list_prints_clocks_from_service() {
    let service = MockService::start(|_| {
        (
            200,
            r#"[{"_id": "c1", "name": "uptime", "start": "2020-01-01T00:00:00Z", "count": "UP"}]"#
                .to_string(),
        )
    });
    let dir = tempdir().expect("tempdir");

    let mut cmd = cargo_bin_cmd!("dentifrice");
    cmd.arg("--base-url")
        .arg(&service.base_url)
        .arg("--tokens")
        .arg(dir.path().join("tokens.json"))
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("uptime  [UP]  since"));
}

#[test]
fn list_failure_is_reported_and_exits_nonzero() {
    let service = MockService::start(|_| (503, "{}".to_string()));
    let dir = tempdir().expect("tempdir");

    let mut cmd = cargo_bin_cmd!("dentifrice");
    cmd.arg("--base-url")
        .arg(&service.base_url)
        .arg("--tokens")
        .arg(dir.path().join("tokens.json"))
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "warning: A request failed in the background.",
        ))
        .stderr(predicate::str::contains("clock list unavailable"));
}

#[test]
fn login_saves_tokens_to_file() {
    let service = MockService::start(|_| (200, tokens_json("a-1", "r-1")));
    let dir = tempdir().expect("tempdir");
    let tokens = dir.path().join("tokens.json");

    let mut cmd = cargo_bin_cmd!("dentifrice");
    cmd.arg("--base-url")
        .arg(&service.base_url)
        .arg("--tokens")
        .arg(&tokens)
        .args(["login", "--code", "oauth-code"])
        .assert()
        .success();

    let saved: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&tokens).expect("token file")).expect("json");
    assert_eq!(saved["access_token"], "a-1");
    assert_eq!(saved["refresh_token"], "r-1");
    assert_eq!(service.requests()[0].query, "code=oauth-code");
}

#[test]
fn refresh_without_stored_token_fails() {
    let service = MockService::start(|_| (200, tokens_json("a-1", "r-1")));
    let dir = tempdir().expect("tempdir");

    let mut cmd = cargo_bin_cmd!("dentifrice");
    cmd.arg("--base-url")
        .arg(&service.base_url)
        .arg("--tokens")
        .arg(dir.path().join("tokens.json"))
        .arg("refresh")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no refresh token"));
    assert!(service.requests().is_empty());
}

#[test]
fn network_commands_require_base_url() {
    let mut cmd = cargo_bin_cmd!("dentifrice");
    cmd.env_remove("DENTIFRICE_BASE_URL")
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--base-url"));
}
