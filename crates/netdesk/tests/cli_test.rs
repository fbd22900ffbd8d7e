//! Integration tests for the `netdesk` CLI binary.
//!
//! Argument parsing, help output and config handling run without a backend;
//! the rest talk to a wiremock server standing in for it.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `netdesk` binary with env isolation.
///
/// Clears all `NETDESK_*` variables and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn netdesk_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("netdesk");
    cmd.env("HOME", "/tmp/netdesk-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/netdesk-cli-test-nonexistent")
        .env_remove("NETDESK_CONFIG")
        .env_remove("NETDESK_URL")
        .env_remove("NETDESK_TOKEN")
        .env_remove("NETDESK_BACKEND__URL")
        .env_remove("RUST_LOG");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn site_body() -> serde_json::Value {
    json!({
        "connection": { "vlanNumber": "01-0179", "description": "Board room" },
        "switches": [{
            "id": 1,
            "name": "SW-CORE-01",
            "location": "Server room A",
            "model": "Cisco Catalyst 3850",
            "ports": [
                { "id": 1, "number": 1, "status": "active", "speed": "1 Gbps", "device": "Server-01" },
                { "id": 3, "number": 3, "status": "inactive", "speed": "1 Gbps", "device": null }
            ]
        }],
        "addresses": [{
            "ip": "10.190.1.160",
            "isRealIp": false,
            "mac": "00:1b:63:84:45:e6",
            "hostname": "iMacPro",
            "vendor": "Apple",
            "status": "active",
            "dhcp": "16 min",
            "internet": "9.89 kbit/s",
            "macBind": "00:1b:63:84:45:e7"
        }],
        "policy": {
            "dhcpMode": "auto",
            "ipDistributionMode": "advanced",
            "internetAccess": "closed",
            "incomingSpeed": 100,
            "outgoingSpeed": 100,
            "autoBlock": null
        }
    })
}

async fn backend() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/site"))
        .respond_with(ResponseTemplate::new(200).set_body_json(site_body()))
        .mount(&server)
        .await;
    server
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = netdesk_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    netdesk_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("switches")
            .and(predicate::str::contains("ports"))
            .and(predicate::str::contains("policy"))
            .and(predicate::str::contains("diagnose")),
    );
}

#[test]
fn test_version_flag() {
    netdesk_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("netdesk"));
}

#[test]
fn test_completions_zsh() {
    netdesk_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

#[test]
fn test_policy_subcommands_exist() {
    netdesk_cmd()
        .args(["policy", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("show")
                .and(predicate::str::contains("dhcp"))
                .and(predicate::str::contains("distribution"))
                .and(predicate::str::contains("internet"))
                .and(predicate::str::contains("cancel-auto-block")),
        );
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_honours_flag() {
    netdesk_cmd()
        .args(["--config", "/tmp/netdesk-elsewhere.toml", "config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/tmp/netdesk-elsewhere.toml"));
}

#[test]
fn test_config_show_no_config() {
    netdesk_cmd().args(["config", "show"]).assert().success();
}

#[test]
fn test_config_show_redacts_token() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        "[backend]\nurl = \"https://netdesk.lan/\"\ntoken = \"s3cret\"\n",
    )
    .unwrap();

    netdesk_cmd()
        .args(["--config", path.to_str().unwrap(), "config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("https://netdesk.lan/")
                .and(predicate::str::contains("s3cret").not()),
        );
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let output = netdesk_cmd().arg("foobar").output().unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_invalid_output_format() {
    let output = netdesk_cmd()
        .args(["--output", "invalid", "switches"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("invalid") || text.contains("possible values"),
        "Expected error about valid output formats:\n{text}"
    );
}

#[test]
fn test_switches_without_backend_url() {
    netdesk_cmd()
        .arg("switches")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("No backend URL"));
}

#[test]
fn test_connection_failure_exit_code() {
    // Port 9 (discard) is closed on test hosts.
    netdesk_cmd()
        .args(["--url", "http://127.0.0.1:9/", "--timeout", "5", "switches"])
        .assert()
        .code(7)
        .stderr(predicate::str::contains("Could not reach the backend"));
}

// ── Against a mock backend ──────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_switches_plain_lists_ids() {
    let server = backend().await;
    netdesk_cmd()
        .args(["--url", &server.uri(), "-o", "plain", "switches"])
        .assert()
        .success()
        .stdout("1\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_ports_by_switch_name() {
    let server = backend().await;
    netdesk_cmd()
        .args(["--url", &server.uri(), "--color", "never", "ports", "sw-core-01"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Server-01")
                .and(predicate::str::contains("inactive")),
        );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unknown_switch_is_not_found() {
    let server = backend().await;
    netdesk_cmd()
        .args(["--url", &server.uri(), "ports", "SW-EDGE-09"])
        .assert()
        .code(4);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_addresses_flag_binding_mismatch() {
    let server = backend().await;
    netdesk_cmd()
        .args(["--url", &server.uri(), "addresses"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(mismatch)"))
        .stderr(predicate::str::contains("1 address(es)"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_caps_with_closed_internet_is_validation() {
    let server = backend().await;
    netdesk_cmd()
        .args([
            "--url",
            &server.uri(),
            "policy",
            "internet",
            "closed",
            "--incoming",
            "50",
        ])
        .assert()
        .code(5);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_policy_change_is_pushed() {
    let server = backend().await;
    Mock::given(method("PUT"))
        .and(path("/v1/policy"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    netdesk_cmd()
        .args(["--url", &server.uri(), "-o", "json", "policy", "dhcp", "manual"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"dhcp_mode\": \"manual\""));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_delete_ports_requires_yes_when_not_interactive() {
    let server = backend().await;
    netdesk_cmd()
        .args(["--url", &server.uri(), "delete-ports", "--switch", "1", "3"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--yes"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_delete_ports_sends_ids() {
    let server = backend().await;
    Mock::given(method("POST"))
        .and(path("/v1/ports/delete"))
        .and(body_json(json!({ "portIds": [3] })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    netdesk_cmd()
        .args(["--url", &server.uri(), "-y", "delete-ports", "--switch", "1", "3"])
        .assert()
        .success();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_diagnose_loads_tab_with_chosen_chart() {
    let server = backend().await;
    Mock::given(method("GET"))
        .and(path("/v1/switches/1/ports/1/telemetry"))
        .and(query_param("chart", "errors"))
        .and(query_param("interval", "1h"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "tab": "graph", "data": { "samples": [4, 5, 6] } })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/switches/1/ports/1/telemetry"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "tab": "graph", "data": {} })),
        )
        .mount(&server)
        .await;

    netdesk_cmd()
        .args([
            "--url",
            &server.uri(),
            "-o",
            "plain",
            "diagnose",
            "--switch",
            "1",
            "--port",
            "1",
            "--chart",
            "errors",
            "--interval",
            "1h",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("[4,5,6]"));
}
