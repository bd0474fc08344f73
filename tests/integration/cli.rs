//! The demo binary driven over piped standard input

use std::io::Write;
use std::process::{Command, Output, Stdio};

use tempfile::tempdir;

fn run_cli(input: &str) -> Output {
    let dir = tempdir().expect("Failed to create temp dir");
    let config = dir.path().join("none.toml");

    let mut child = Command::new(env!("CARGO_BIN_EXE_repl-breakpoint"))
        .arg("--plain")
        .arg("--quiet")
        .arg("--config")
        .arg(&config)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn command");

    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(input.as_bytes())
        .expect("Failed to write input");

    child.wait_with_output().expect("Failed to collect child output")
}

#[test]
fn test_cli_evaluates_piped_lines() {
    let output = run_cli("1+1\n$a + sq(3)\nreturn\n");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "STDERR: {}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.contains("$a is 2"));
    assert!(stdout.contains("\n> 2\n> 11\n> "), "STDOUT: {}", stdout);
    assert!(!stdout.contains("REPL launched"));
}

#[test]
fn test_cli_fatal_error_sets_exit_code() {
    let output = run_cli("trigger_error('halt', E_USER_ERROR);\n1\n");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(output.status.code(), Some(255));
    assert!(stdout.contains("Fatal error [256]: halt"), "STDOUT: {}", stdout);
}

#[test]
fn test_cli_reads_config_file() {
    let dir = tempdir().expect("Failed to create temp dir");
    let config = dir.path().join("config.toml");
    std::fs::write(&config, "[repl]\nprompt = \"dbg> \"\n").expect("Failed to write config");

    let mut child = Command::new(env!("CARGO_BIN_EXE_repl-breakpoint"))
        .args(["--plain", "--quiet", "--config"])
        .arg(&config)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("Failed to spawn command");
    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(b"3*3\n")
        .expect("Failed to write input");
    let output = child.wait_with_output().expect("Failed to collect child output");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\ndbg> 9\ndbg> "), "STDOUT: {}", stdout);
}
