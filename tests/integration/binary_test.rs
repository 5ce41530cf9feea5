//! Runs the querychat binary against the mock backend.

use std::io::Write;
use std::process::{Command, Output, Stdio};

fn run(args: &[&str], stdin: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_querychat"))
        .args(args)
        .env_remove("QUERYCHAT_BACKEND_URL")
        .env_remove("QUERYCHAT_TIMEOUT_SECS")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to start querychat");

    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(stdin.as_bytes())
        .expect("failed to write stdin");

    child.wait_with_output().expect("failed to wait for querychat")
}

#[test]
fn test_piped_session_writes_transcript() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("absent.toml");
    let transcript = dir.path().join("session.html");

    let output = run(
        &[
            "--mock-backend",
            "--config",
            config.to_str().unwrap(),
            "--transcript",
            transcript.to_str().unwrap(),
        ],
        "SELECT 1\n",
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(0), "stderr: {stderr}");
    assert!(stdout.contains("Mock result for: SELECT 1"));

    let html = std::fs::read_to_string(&transcript).unwrap();
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("user-message"));
    assert!(html.contains("<td>Mock result for: SELECT 1</td>"));
}

#[test]
fn test_invalid_backend_url_exits_with_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("absent.toml");

    let output = run(
        &[
            "--config",
            config.to_str().unwrap(),
            "--backend-url",
            "ftp://reports.example.com",
        ],
        "",
    );

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Configuration Error"));
}
