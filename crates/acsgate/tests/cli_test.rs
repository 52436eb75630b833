//! Integration tests for the `acsgate` CLI binary.
//!
//! Argument parsing, help output, shell completions, and error handling run
//! without any ACS; the device tests talk to a mocked NBI.
#![allow(clippy::unwrap_used)]

use std::process::Output;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `acsgate` binary with env isolation.
///
/// Clears all `ACSGATE_*` and API-key variables and points config
/// directories at `config_home` so tests never touch the user's real
/// configuration. A throwaway API key keeps the keyring out of the way.
fn acsgate_cmd_in(config_home: &str) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("acsgate");
    cmd.env("HOME", config_home)
        .env("XDG_CONFIG_HOME", config_home)
        .env_remove("ACSGATE_PROFILE")
        .env_remove("ACSGATE_DEFAULT_PROFILE")
        .env_remove("ACSGATE_NBI_URL")
        .env_remove("ACSGATE_API_KEY")
        .env_remove("ACSGATE_OUTPUT")
        .env_remove("ACSGATE_INSECURE")
        .env_remove("ACSGATE_TIMEOUT")
        .env_remove("GENIEACS_API_KEY")
        .env_remove("ACS_API_KEY_FILE")
        .env_remove("GENIEACS_API_KEY_FILE")
        .env_remove("RUST_LOG")
        .env("ACS_API_KEY", "test-key");
    cmd
}

fn acsgate_cmd() -> assert_cmd::Command {
    acsgate_cmd_in("/tmp/acsgate-cli-test-nonexistent")
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

/// Run the binary off the async runtime so the mock server keeps serving.
async fn run(args: Vec<String>) -> Output {
    tokio::task::spawn_blocking(move || acsgate_cmd().args(args).output().unwrap())
        .await
        .unwrap()
}

fn args(server: &MockServer, rest: &[&str]) -> Vec<String> {
    ["--nbi-url", &server.uri()]
        .iter()
        .chain(rest)
        .map(ToString::to_string)
        .collect()
}

fn v(value: impl Into<Value>) -> Value {
    json!({ "_value": value.into() })
}

async fn mount_device(server: &MockServer, id: &str, doc: Value) {
    Mock::given(method("GET"))
        .and(path("/devices"))
        .and(query_param("query", json!({ "_id": id }).to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([doc])))
        .mount(server)
        .await;
}

fn legacy_doc() -> Value {
    json!({
        "_id": "dev2",
        "_lastInform": "2020-01-01T00:00:00.000Z",
        "InternetGatewayDevice": {
            "DeviceInfo": { "ProductClass": v("EX141"), "SoftwareVersion": v("1.1.0") },
            "LANDevice": { "1": { "WLANConfiguration": {
                "1": { "SSID": v("EX141-2G") },
                "3": { "SSID": v("EX141-5G") }
            } } }
        }
    })
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = acsgate_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    acsgate_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("devices")
            .and(predicate::str::contains("wifi"))
            .and(predicate::str::contains("pppoe"))
            .and(predicate::str::contains("metrics"))
            .and(predicate::str::contains("health")),
    );
}

#[test]
fn test_version_flag() {
    acsgate_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("acsgate"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    acsgate_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    acsgate_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let output = acsgate_cmd().arg("foobar").output().unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_invalid_output_format() {
    let output = acsgate_cmd()
        .args(["--output", "invalid", "health"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(
        text.contains("invalid") || text.contains("possible values"),
        "Expected error about the output format:\n{text}"
    );
}

#[test]
fn test_reboot_requires_yes_without_terminal() {
    acsgate_cmd()
        .args(["devices", "reboot", "dev1"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("requires confirmation"));
}

#[test]
fn test_short_wifi_password_is_a_usage_error() {
    acsgate_cmd()
        .args(["wifi", "set", "dev1", "--ssid", "casa", "--password", "short"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("8-63"));
}

#[test]
fn test_ssid_param_requires_password_param() {
    let output = acsgate_cmd()
        .args([
            "wifi", "set", "dev1", "--ssid", "casa", "--password", "segredo123",
            "--ssid-param", "Device.WiFi.SSID.1.SSID",
        ])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_unknown_profile_is_rejected() {
    acsgate_cmd()
        .args(["--profile", "ghost", "health"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("ghost"));
}

#[test]
fn test_unreachable_nbi_fails_health() {
    acsgate_cmd()
        .args(["--nbi-url", "http://127.0.0.1:1", "--timeout", "2", "-o", "json", "health"])
        .assert()
        .code(7)
        .stdout(predicate::str::contains("\"ok\": false"));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_show_no_config() {
    acsgate_cmd().args(["config", "show"]).assert().success();
}

#[test]
fn test_config_path_follows_xdg() {
    let dir = tempfile::tempdir().unwrap();
    let home = dir.path().display().to_string();
    acsgate_cmd_in(&home)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("acsgate").and(predicate::str::contains("config.toml")));
}

#[test]
fn test_malformed_config_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let config_dir = dir.path().join("acsgate");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(config_dir.join("config.toml"), "default_profile = [unterminated").unwrap();

    acsgate_cmd_in(&dir.path().display().to_string())
        .args(["config", "show"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("config"));
}

#[test]
fn test_profile_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let config_dir = dir.path().join("acsgate");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(
        config_dir.join("config.toml"),
        "default_profile = \"lab\"\n\n[defaults]\noutput = \"plain\"\n\n\
         [profiles.lab]\nnbi_url = \"http://acs.lab:7557\"\napi_key = \"s3cret\"\n",
    )
    .unwrap();

    let output = acsgate_cmd_in(&dir.path().display().to_string())
        .args(["config", "show"])
        .output()
        .unwrap();
    assert!(output.status.success());
    // Plain output from the config defaults lists profile names.
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "lab");

    acsgate_cmd_in(&dir.path().display().to_string())
        .args(["-o", "json", "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("********").and(predicate::str::contains("s3cret").not()));
}

// ── Against a mocked NBI ────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_devices_get_renders_summary() {
    let server = MockServer::start().await;
    mount_device(&server, "dev2", legacy_doc()).await;

    let output = run(args(&server, &["-o", "json", "devices", "get", "dev2"])).await;
    assert!(output.status.success(), "{}", combined_output(&output));

    let summary: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["device_id"], "dev2");
    assert_eq!(summary["model"], "EX141");
    assert_eq!(summary["data_model"], "legacy");
    assert_eq!(summary["online"], false);
    assert_eq!(summary["wifi"]["ssid_5"], "EX141-5G");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_devices_ssid_plain_prints_value() {
    let server = MockServer::start().await;
    mount_device(&server, "dev2", legacy_doc()).await;

    let output = run(args(&server, &["-o", "plain", "devices", "ssid", "dev2", "--band", "5"])).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "EX141-5G");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_missing_device_exits_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let output = run(args(&server, &["devices", "get", "ghost"])).await;
    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("ghost"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_reboot_with_yes_submits_task() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/devices/dev1/tasks"))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({
            "_id": "task-1",
            "name": "reboot",
            "device": "dev1",
            "timestamp": "2024-01-01T00:00:00.000Z"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let output = run(args(&server, &["-y", "-o", "plain", "devices", "reboot", "dev1"])).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "task-1");
    assert!(String::from_utf8_lossy(&output.stderr).contains("Task queued"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_upstream_failure_exits_upstream() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/devices/dev1/tasks"))
        .respond_with(ResponseTemplate::new(500).set_body_string("fault 9002"))
        .mount(&server)
        .await;

    let output = run(args(&server, &["devices", "params", "dev1", "Device.DeviceInfo.UpTime"])).await;
    assert_eq!(output.status.code(), Some(9));
    assert!(combined_output(&output).contains("fault 9002"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_health_ok() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let output = run(args(&server, &["-o", "plain", "health"])).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "ok");
}
