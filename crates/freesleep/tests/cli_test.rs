//! Integration tests for the `freesleep` CLI binary.
//!
//! Argument parsing, help output, completions and error handling run
//! without a pod; the remaining tests point the binary at a wiremock
//! free-sleep server.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};
use wiremock::matchers::{body_json, body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `freesleep` binary with env isolation.
///
/// Clears all `FREESLEEP_*` env vars and points config directories at
/// `home` so tests never touch the user's real configuration.
fn freesleep_cmd(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("freesleep");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("FREESLEEP_PROFILE")
        .env_remove("FREESLEEP_HOST")
        .env_remove("FREESLEEP_PORT")
        .env_remove("FREESLEEP_OUTPUT")
        .env_remove("FREESLEEP_TIMEOUT")
        .env_remove("FREESLEEP_DEFAULT_PROFILE");
    cmd
}

fn isolated() -> tempfile::TempDir {
    tempfile::tempdir().unwrap()
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

/// A local port with nothing listening on it.
fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let home = isolated();
    let output = freesleep_cmd(home.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    let home = isolated();
    freesleep_cmd(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("free-sleep")
                .and(predicate::str::contains("status"))
                .and(predicate::str::contains("watch"))
                .and(predicate::str::contains("alarm")),
        );
}

#[test]
fn test_version_flag() {
    let home = isolated();
    freesleep_cmd(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("freesleep"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    let home = isolated();
    freesleep_cmd(home.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    let home = isolated();
    freesleep_cmd(home.path())
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let home = isolated();
    let output = freesleep_cmd(home.path()).arg("foobar").output().unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(text.contains("foobar"), "{text}");
}

#[test]
fn test_invalid_side_rejected_by_parser() {
    let home = isolated();
    freesleep_cmd(home.path())
        .args(["set", "temp", "middle", "70"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("middle"));
}

#[test]
fn test_status_without_config() {
    let home = isolated();
    freesleep_cmd(home.path())
        .arg("status")
        .assert()
        .code(4)
        .stderr(predicate::str::contains("No pod configured"));
}

#[test]
fn test_unknown_profile() {
    let home = isolated();
    freesleep_cmd(home.path())
        .args(["--profile", "attic", "status"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("attic"));
}

#[test]
fn test_out_of_range_temperature_rejected_before_connecting() {
    let home = isolated();
    freesleep_cmd(home.path())
        .args(["--host", "127.0.0.1", "--port"])
        .arg(closed_port().to_string())
        .args(["set", "temp", "left", "120"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("target_temperature_f"));
}

#[test]
fn test_unreachable_pod() {
    let home = isolated();
    freesleep_cmd(home.path())
        .args(["--host", "127.0.0.1", "--timeout", "2", "--port"])
        .arg(closed_port().to_string())
        .arg("status")
        .assert()
        .code(7)
        .stderr(predicate::str::contains("Could not connect"));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_init_then_profiles() {
    let home = isolated();
    freesleep_cmd(home.path())
        .args(["config", "init", "--host", "192.168.1.50", "--name", "bedroom"])
        .assert()
        .success();

    freesleep_cmd(home.path())
        .args(["config", "profiles", "-o", "plain"])
        .assert()
        .success()
        .stdout(predicate::str::contains("bedroom"));

    freesleep_cmd(home.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("default_profile = \"bedroom\"")
                .and(predicate::str::contains("host = \"192.168.1.50\""))
                .and(predicate::str::contains("port = 3000")),
        );
}

#[test]
fn test_config_use_unknown_profile() {
    let home = isolated();
    freesleep_cmd(home.path())
        .args(["config", "use", "attic"])
        .assert()
        .code(4);
}

#[test]
fn test_config_path_under_config_home() {
    let home = isolated();
    freesleep_cmd(home.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("freesleep").and(predicate::str::contains("config.toml")));
}

// ── Against a pod ───────────────────────────────────────────────────

fn week(time: &str) -> Value {
    let alarm = json!({
        "alarm": {
            "time": time,
            "enabled": true,
            "vibrationIntensity": 40,
            "vibrationPattern": "rise",
            "duration": 20
        }
    });
    json!({
        "monday": alarm, "tuesday": alarm, "wednesday": alarm, "thursday": alarm,
        "friday": alarm, "saturday": alarm, "sunday": alarm
    })
}

async fn mount_json(server: &MockServer, route: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mock_pod() -> MockServer {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "/api/deviceStatus",
        json!({
            "left": {
                "currentTemperatureF": 76.5,
                "targetTemperatureF": 82,
                "isAlarmVibrating": false,
                "isOn": true
            },
            "right": {
                "currentTemperatureF": 74,
                "targetTemperatureF": 70,
                "isAlarmVibrating": false,
                "isOn": false
            },
            "waterLevel": "true",
            "isPriming": false,
            "settings": { "ledBrightness": 60 },
            "coverVersion": "Pod 4",
            "hubVersion": "Pod 4",
            "freeSleep": { "version": "2.3.1", "branch": "main" },
            "wifiStrength": 72
        }),
    )
    .await;
    mount_json(
        &server,
        "/api/settings",
        json!({
            "left": { "name": "Alex", "awayMode": false },
            "right": { "awayMode": false },
            "primePodDaily": { "enabled": true, "time": "14:00" },
            "rebootDaily": false
        }),
    )
    .await;
    mount_json(
        &server,
        "/api/metrics/presence",
        json!({ "left": { "present": true }, "right": { "present": false } }),
    )
    .await;
    mount_json(
        &server,
        "/api/schedules",
        json!({ "left": week("07:00"), "right": week("06:15") }),
    )
    .await;
    mount_json(&server, "/api/services", json!({ "biometrics": { "enabled": true } })).await;
    server
}

/// Run the binary off the async runtime so the mock server keeps serving.
async fn run_against(
    server: &MockServer,
    args: &'static [&'static str],
) -> (tempfile::TempDir, std::process::Output) {
    let port = server.address().port().to_string();
    tokio::task::spawn_blocking(move || {
        let home = isolated();
        let output = freesleep_cmd(home.path())
            .args(["--host", "127.0.0.1", "--port", &port])
            .args(args)
            .output()
            .unwrap();
        (home, output)
    })
    .await
    .unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn test_status_json() {
    let server = mock_pod().await;
    let (_home, output) = run_against(&server, &["status", "-o", "json"]).await;
    assert!(output.status.success(), "{}", combined_output(&output));

    let state: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(state["available"], json!(true));
    assert_eq!(state["snapshot"]["left"]["target_temperature_f"], json!(82));
    assert_eq!(state["snapshot"]["left"]["mode"], json!("heating"));
    assert_eq!(state["derived"]["right"]["activity"], json!("idle"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_status_table() {
    let server = mock_pod().await;
    let (_home, output) = run_against(&server, &["status"]).await;
    assert!(output.status.success(), "{}", combined_output(&output));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("available"), "{stdout}");
    assert!(stdout.contains("Alex"), "{stdout}");
    assert!(stdout.contains("82°F"), "{stdout}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_set_temperature_posts_to_pod() {
    let server = mock_pod().await;
    Mock::given(method("POST"))
        .and(path("/api/deviceStatus"))
        .and(body_json(json!({ "left": { "targetTemperatureF": 75 } })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let (_home, output) = run_against(&server, &["set", "temp", "left", "75"]).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    assert!(String::from_utf8_lossy(&output.stderr).contains("75°F"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rejected_write_fails() {
    let server = mock_pod().await;
    Mock::given(method("POST"))
        .and(path("/api/settings"))
        .respond_with(ResponseTemplate::new(400).set_body_string("nope"))
        .mount(&server)
        .await;

    let (_home, output) = run_against(&server, &["set", "away", "left", "on"]).await;
    assert_eq!(output.status.code(), Some(1), "{}", combined_output(&output));
    assert!(combined_output(&output).contains("http_400"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_alarm_show_plain() {
    let server = mock_pod().await;
    let (_home, output) = run_against(&server, &["alarm", "show", "-o", "plain"]).await;
    assert!(output.status.success(), "{}", combined_output(&output));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("left 07:00"), "{stdout}");
    assert!(stdout.contains("right 06:15"), "{stdout}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_alarm_skip_tonight_posts_override() {
    let server = mock_pod().await;
    Mock::given(method("POST"))
        .and(path("/api/settings"))
        .and(body_partial_json(json!({
            "right": { "scheduleOverrides": { "alarm": { "disabled": true } } }
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let (_home, output) = run_against(&server, &["alarm", "skip-tonight", "right", "on"]).await;
    assert!(output.status.success(), "{}", combined_output(&output));
}
