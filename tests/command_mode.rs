//! Integration tests for command mode (-c/--command flag) and file input

use std::io::Write;
use std::process::{Command, Stdio};

fn numline() -> (Command, tempfile::TempDir) {
    // Tests must be deterministic and not depend on a user's ~/.config/numline/config.toml.
    let config_home = tempfile::tempdir().expect("Failed to create temp dir");
    let mut cmd = Command::new("cargo");
    cmd.arg("run")
        .arg("-q")
        .arg("--")
        .env("XDG_CONFIG_HOME", config_home.path())
        .env_remove("RUST_LOG");
    (cmd, config_home)
}

fn run_command(args: &[&str]) -> (String, String, i32) {
    let (mut cmd, _config_home) = numline();
    let output = cmd.args(args).output().expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let exit_code = output.status.code().unwrap_or(-1);

    (stdout, stderr, exit_code)
}

fn run_with_stdin(args: &[&str], input: &str) -> (String, i32) {
    let (mut cmd, _config_home) = numline();
    let mut child = cmd
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("Failed to execute command");
    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(input.as_bytes())
        .expect("Failed to write stdin");
    let output = child.wait_with_output().expect("Failed to wait for command");
    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        output.status.code().unwrap_or(-1),
    )
}

#[test]
fn test_basic_arithmetic() {
    let (stdout, _, code) = run_command(&["-c", "5 + 3"]);
    assert_eq!(stdout.trim(), "8");
    assert_eq!(code, 0);
}

#[test]
fn test_one_output_line_per_input_line() {
    let (stdout, _, code) = run_command(&["-c", "x = 10\n# heading\nx * 2"]);
    assert_eq!(stdout, "10\n\n20\n");
    assert_eq!(code, 0);
}

#[test]
fn test_unit_conversion() {
    let (stdout, _, _) = run_command(&["-c", "20 inches in cm"]);
    assert_eq!(stdout.trim(), "50.8");
}

#[test]
fn test_percent_and_sum() {
    let (stdout, _, _) = run_command(&["-c", "100 - 20%\n20\n\nsum"]);
    assert_eq!(stdout, "80\n20\n\n100\n");
}

#[test]
fn test_line_errors_are_not_fatal() {
    let (stdout, _, code) = run_command(&["-c", "10 kg in cm\n1 + 1"]);
    assert_eq!(
        stdout,
        "Error: Cannot convert between weight and length\n2\n"
    );
    assert_eq!(code, 0);
}

#[test]
fn test_strict_exit_code() {
    let (_, _, code) = run_command(&["--strict", "-c", "5 XYZ in USD"]);
    assert_eq!(code, 2);
    let (_, _, code) = run_command(&["--strict", "-c", "5 EUR in USD"]);
    assert_eq!(code, 0);
}

#[test]
fn test_json_output() {
    let (stdout, _, code) = run_command(&["--json", "-c", "## Rent\n1200 * 12"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("\"type\": \"header\""));
    assert!(stdout.contains("\"headerLevel\": 2"));
    assert!(stdout.contains("\"result\": \"14,400\""));
}

#[test]
fn test_annotate_uses_column() {
    let (stdout, _, _) = run_command(&["-a", "--column", "8", "-c", "2 * 3\n// done"]);
    assert_eq!(stdout, "2 * 3    = 6\n// done\n");
}

#[test]
fn test_file_input_and_markdown_export() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("trip.calc");
    let output = dir.path().join("trip.md");
    std::fs::write(&input, "fuel = 40\nfuel * 3\n").unwrap();

    let (stdout, _, code) = run_command(&[
        input.to_str().unwrap(),
        "-o",
        output.to_str().unwrap(),
    ]);
    assert_eq!(code, 0);
    assert!(stdout.starts_with("Exported to"));
    let md = std::fs::read_to_string(&output).unwrap();
    assert!(md.contains("| 2 | fuel * 3 | 120 |"));
}

#[test]
fn test_rates_file() {
    let dir = tempfile::tempdir().unwrap();
    let rates = dir.path().join("rates.json");
    std::fs::write(&rates, r#"{"base": "USD", "rates": {"EUR": 0.5}}"#).unwrap();

    let (stdout, _, _) = run_command(&["--rates", rates.to_str().unwrap(), "-c", "10 USD in EUR"]);
    assert_eq!(stdout.trim(), "5");
}

#[test]
fn test_bad_rates_file_keeps_fallback_rates() {
    let dir = tempfile::tempdir().unwrap();
    let rates = dir.path().join("rates.json");
    std::fs::write(&rates, "not json").unwrap();

    let (stdout, stderr, code) =
        run_command(&["--rates", rates.to_str().unwrap(), "-c", "100 USD in EUR"]);
    assert_eq!(stdout.trim(), "92");
    assert!(stderr.contains("exchange rate refresh failed"));
    assert_eq!(code, 0);
}

#[test]
fn test_unreachable_rates_url_keeps_fallback_rates() {
    let (stdout, stderr, code) = run_command(&[
        "--rates-url",
        "http://127.0.0.1:1/v4/latest/USD",
        "-c",
        "100 USD in EUR\n-2 ^ 2",
    ]);
    assert_eq!(stdout, "92\n-4\n");
    assert!(stderr.contains("exchange rate refresh failed"));
    assert_eq!(code, 0);
}

#[test]
fn test_config_file_sets_column() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    std::fs::write(&config, "[display]\nresult_column = 4\n").unwrap();

    let (stdout, stderr, _) =
        run_command(&["--config", config.to_str().unwrap(), "-a", "-c", "1+1"]);
    assert_eq!(stdout, "1+1  = 2\n");
    assert!(!stderr.contains("Warning"));
}

#[test]
fn test_stdin_document() {
    let (stdout, code) = run_with_stdin(&[], "3 * 3\nprev + 1\n");
    assert_eq!(stdout, "9\n10\n");
    assert_eq!(code, 0);
}

#[test]
fn test_interactive_session() {
    let (stdout, code) = run_with_stdin(&["-i"], "a = 2\na ^ 3\n:vars\n:quit\n");
    assert_eq!(stdout, "2\n8\na = 2\n");
    assert_eq!(code, 0);
}

#[test]
fn test_unknown_option() {
    let (_, stderr, code) = run_command(&["--bogus"]);
    assert!(stderr.contains("Unknown option: --bogus"));
    assert_eq!(code, 1);
}

#[test]
fn test_missing_file() {
    let (_, stderr, code) = run_command(&["/definitely/not/here.calc"]);
    assert!(stderr.contains("Error: Failed to read"));
    assert_eq!(code, 1);
}
