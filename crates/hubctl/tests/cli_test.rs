//! Integration tests for the `hubctl` CLI binary.
//!
//! Argument parsing, config handling and exit codes run without a
//! backend; session and device commands run against a wiremock double.
#![allow(clippy::unwrap_used)]

use std::path::PathBuf;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PNG_URI: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

// ── Helpers ─────────────────────────────────────────────────────────

/// An isolated home: config file and state directory under a tempdir.
struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn config_path(&self) -> PathBuf {
        self.dir.path().join("config").join("config.toml")
    }

    fn state_dir(&self) -> PathBuf {
        self.dir.path().join("state")
    }

    fn state_file(&self) -> PathBuf {
        self.state_dir().join("default").join("state.json")
    }

    /// Pretend a previous `login` stored `token`.
    fn seed_token(&self, token: &str) {
        let file = self.state_file();
        std::fs::create_dir_all(file.parent().unwrap()).unwrap();
        std::fs::write(file, json!({ "token": token }).to_string()).unwrap();
    }

    fn state(&self) -> serde_json::Value {
        serde_json::from_str(&std::fs::read_to_string(self.state_file()).unwrap()).unwrap()
    }

    /// Build a [`Command`] for the `hubctl` binary with env isolation.
    ///
    /// Clears all `HUBCTL_*` env vars and points every config and state
    /// path into the sandbox so tests never touch the real user setup.
    fn cmd(&self) -> assert_cmd::Command {
        let mut cmd = cargo_bin_cmd!("hubctl");
        cmd.env("HOME", self.dir.path())
            .env("XDG_CONFIG_HOME", self.dir.path().join("xdg-config"))
            .env("XDG_DATA_HOME", self.dir.path().join("xdg-data"))
            .env("HUBCTL_CONFIG", self.config_path())
            .env("HUBCTL_STATE_DIR", self.state_dir())
            .env("NO_COLOR", "1")
            .env_remove("HUBCTL_PROFILE")
            .env_remove("HUBCTL_API_URL")
            .env_remove("HUBCTL_OUTPUT")
            .env_remove("HUBCTL_INSECURE")
            .env_remove("HUBCTL_TIMEOUT")
            .env_remove("HUBCTL_USERNAME")
            .env_remove("HUBCTL_PASSWORD")
            .env_remove("RUST_LOG");
        cmd
    }

    fn cmd_for(&self, server: &MockServer) -> assert_cmd::Command {
        let mut cmd = self.cmd();
        cmd.args(["--api-url", &server.uri()]);
        cmd
    }
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

async fn mount_devices(server: &MockServer, devices: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/devices"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(devices))
        .mount(server)
        .await;
}

fn lamp(state: &str) -> serde_json::Value {
    json!([{
        "_id": "r1",
        "device_id": "lamp-1",
        "name": "Lamp",
        "owner": "alice",
        "state": state
    }])
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let sandbox = Sandbox::new();
    let output = sandbox.cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    Sandbox::new().cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("IoT hub")
            .and(predicate::str::contains("login"))
            .and(predicate::str::contains("devices")),
    );
}

#[test]
fn test_version_flag() {
    Sandbox::new()
        .cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("hubctl"));
}

#[test]
fn test_completions_bash() {
    Sandbox::new()
        .cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_register_needs_id_or_scan() {
    let output = Sandbox::new()
        .cmd()
        .args(["devices", "register", "--name", "Lamp"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_honors_override() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            sandbox.config_path().display().to_string(),
        ));
}

#[test]
fn test_config_set_use_and_profiles() {
    let sandbox = Sandbox::new();

    sandbox
        .cmd()
        .args(["config", "set", "profiles.lab.api_url", "http://lab.local:8000"])
        .assert()
        .success();
    sandbox
        .cmd()
        .args(["config", "set", "profiles.lab.timeout", "5"])
        .assert()
        .success();
    sandbox.cmd().args(["config", "use", "lab"]).assert().success();

    let raw = std::fs::read_to_string(sandbox.config_path()).unwrap();
    assert!(raw.contains("default_profile = \"lab\""), "{raw}");
    assert!(raw.contains("timeout = 5"), "{raw}");

    sandbox
        .cmd()
        .args(["config", "profiles", "-o", "plain"])
        .assert()
        .success()
        .stdout(predicate::str::contains("lab"));
}

#[test]
fn test_config_use_unknown_profile() {
    let output = Sandbox::new()
        .cmd()
        .args(["config", "use", "nope"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("'nope' not found"));
}

#[test]
fn test_config_show_masks_password() {
    let sandbox = Sandbox::new();
    std::fs::create_dir_all(sandbox.config_path().parent().unwrap()).unwrap();
    std::fs::write(
        sandbox.config_path(),
        "[profiles.default]\napi_url = \"http://hub.local\"\nusername = \"alice\"\npassword = \"hunter2\"\n",
    )
    .unwrap();

    sandbox
        .cmd()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("****").and(predicate::str::contains("hunter2").not()));
}

// ── Session ─────────────────────────────────────────────────────────

#[test]
fn test_whoami_without_session() {
    let output = Sandbox::new().cmd().arg("whoami").output().unwrap();
    assert_eq!(output.status.code(), Some(3));
    assert!(combined_output(&output).contains("Not logged in"));
}

#[test]
fn test_devices_list_without_session() {
    let output = Sandbox::new()
        .cmd()
        .args(["devices", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_login_list_toggle_logout() {
    let server = MockServer::start().await;
    let sandbox = Sandbox::new();

    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "access_token": "tok", "token_type": "bearer" })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/device/lamp-1/toggle"))
        .and(header("authorization", "Bearer tok"))
        .and(body_json(json!({ "state": "ON" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "ok" })))
        .expect(1)
        .mount(&server)
        .await;
    mount_devices(&server, lamp("ON")).await;

    // login
    let output = sandbox
        .cmd_for(&server)
        .args(["login", "-u", "alice", "--password-stdin"])
        .write_stdin("secret\n")
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));
    assert!(String::from_utf8_lossy(&output.stdout).contains("Logged in as alice"));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Welcome back!"));
    assert_eq!(sandbox.state(), json!({ "token": "tok", "username": "alice" }));

    // whoami reads the remembered username offline
    sandbox
        .cmd()
        .args(["whoami", "-o", "plain"])
        .assert()
        .success()
        .stdout("alice\n");

    // list
    let output = sandbox
        .cmd_for(&server)
        .args(["devices", "list", "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));
    insta::assert_snapshot!(String::from_utf8_lossy(&output.stdout).trim_end(), @r#"
    [
      {
        "_id": "r1",
        "device_id": "lamp-1",
        "name": "Lamp",
        "owner": "alice",
        "state": "ON"
      }
    ]
    "#);

    // toggle on
    sandbox
        .cmd_for(&server)
        .args(["devices", "on", "lamp-1", "-o", "plain"])
        .assert()
        .success()
        .stdout("ON\n")
        .stderr(predicate::str::contains("Device activated").and(predicate::str::contains("Lamp is now ON")));

    // logout
    sandbox
        .cmd()
        .arg("logout")
        .assert()
        .success()
        .stderr(predicate::str::contains("Logged out"));
    assert_eq!(sandbox.state(), json!({}));
    sandbox.cmd().arg("whoami").assert().code(3);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_login_failure_shows_backend_detail() {
    let server = MockServer::start().await;
    let sandbox = Sandbox::new();

    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "detail": "bad credentials" })))
        .mount(&server)
        .await;

    let output = sandbox
        .cmd_for(&server)
        .args(["login", "-u", "alice", "--password-stdin"])
        .write_stdin("wrong\n")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Login failed"), "{stderr}");
    assert!(stderr.contains("bad credentials"), "{stderr}");
    assert!(!sandbox.state_file().exists());
}

#[test]
fn test_logout_recovers_from_corrupt_state_file() {
    let sandbox = Sandbox::new();
    let file = sandbox.state_file();
    std::fs::create_dir_all(file.parent().unwrap()).unwrap();
    std::fs::write(&file, "{not json").unwrap();

    sandbox
        .cmd()
        .arg("logout")
        .assert()
        .success()
        .stderr(predicate::str::contains("Logged out"));
    assert_eq!(sandbox.state(), json!({}));

    sandbox.cmd().arg("whoami").assert().code(3);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_toggle_flips_current_state() {
    let server = MockServer::start().await;
    let sandbox = Sandbox::new();
    sandbox.seed_token("tok");

    mount_devices(&server, lamp("ON")).await;
    Mock::given(method("POST"))
        .and(path("/device/lamp-1/toggle"))
        .and(body_json(json!({ "state": "OFF" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "ok" })))
        .expect(1)
        .mount(&server)
        .await;

    sandbox
        .cmd_for(&server)
        .args(["devices", "toggle", "lamp-1"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Device deactivated"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_get_unknown_device_is_not_found() {
    let server = MockServer::start().await;
    let sandbox = Sandbox::new();
    sandbox.seed_token("tok");
    mount_devices(&server, json!([])).await;

    let output = sandbox
        .cmd_for(&server)
        .args(["devices", "get", "ghost"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("device 'ghost' not found"));
}

// ── Onboarding ──────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_add_device_saves_qr() {
    let server = MockServer::start().await;
    let sandbox = Sandbox::new();
    sandbox.seed_token("tok");
    let qr_dir = sandbox.dir.path().join("qr");
    std::fs::create_dir_all(&qr_dir).unwrap();

    Mock::given(method("POST"))
        .and(path("/device"))
        .and(body_json(json!({ "name": "Lamp" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "device_id": "a1b2",
            "topic": "devices/a1b2",
            "qr": PNG_URI
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_devices(&server, json!([])).await;

    sandbox
        .cmd_for(&server)
        .args(["devices", "add", "--name", " Lamp ", "--save-qr"])
        .arg(&qr_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("a1b2"))
        .stderr(predicate::str::contains("Device added successfully!"));

    let png = std::fs::read(qr_dir.join("a1b2-qr-code.png")).unwrap();
    assert_eq!(&png[1..4], b"PNG");
}

async fn mount_add_device(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/device"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "device_id": "a1b2",
            "topic": "devices/a1b2",
            "qr": PNG_URI
        })))
        .expect(1)
        .mount(server)
        .await;
    mount_devices(server, json!([])).await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_add_device_saves_qr_to_working_dir_by_default() {
    let server = MockServer::start().await;
    let sandbox = Sandbox::new();
    sandbox.seed_token("tok");
    mount_add_device(&server).await;

    sandbox
        .cmd_for(&server)
        .current_dir(sandbox.dir.path())
        .args(["devices", "add", "--name", "Lamp"])
        .assert()
        .success()
        .stdout(predicate::str::contains("a1b2-qr-code.png"));

    let png = std::fs::read(sandbox.dir.path().join("a1b2-qr-code.png")).unwrap();
    assert_eq!(&png[1..4], b"PNG");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_add_device_prints_result_when_qr_cannot_be_written() {
    let server = MockServer::start().await;
    let sandbox = Sandbox::new();
    sandbox.seed_token("tok");
    mount_add_device(&server).await;

    let target = sandbox.dir.path().join("missing").join("qr.png");
    let output = sandbox
        .cmd_for(&server)
        .args(["devices", "add", "--name", "Lamp", "--save-qr"])
        .arg(&target)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Device ID: a1b2"));
    assert!(stdout.contains("Topic:     devices/a1b2"));
    assert!(stdout.contains(PNG_URI));
    assert!(combined_output(&output).contains("failed to write"));
    assert!(!target.exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_register_scanned_id_uses_placeholder_name() {
    let server = MockServer::start().await;
    let sandbox = Sandbox::new();
    sandbox.seed_token("tok");

    Mock::given(method("POST"))
        .and(path("/device"))
        .and(body_json(json!({ "id": "dev-123", "name": "Unnamed Device" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "device_id": "dev-123",
            "topic": "devices/dev-123",
            "message": "Device registered"
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_devices(&server, json!([])).await;

    sandbox
        .cmd_for(&server)
        .args(["devices", "register", "--scan", "-", "-o", "plain"])
        .write_stdin("\ndev-123\n")
        .assert()
        .success()
        .stdout("dev-123\n")
        .stderr(
            predicate::str::contains("QR Code scanned!")
                .and(predicate::str::contains("Device registered successfully!")),
        );
}

// ── Transport ───────────────────────────────────────────────────────

#[test]
fn test_unreachable_backend_exit_code() {
    let sandbox = Sandbox::new();
    sandbox.seed_token("tok");

    // Bind then release a port so nothing is listening on it.
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();

    let output = sandbox
        .cmd()
        .args(["--api-url", &format!("http://127.0.0.1:{port}"), "devices", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(7), "{}", combined_output(&output));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to load devices"));
}
