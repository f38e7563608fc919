use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

use tempfile::TempDir;

const VCS_YAML: &str = r#"
name: vcs
version: "0.3.0"
description: Toy version control
options:
  - name: verbose
    short: v
    kind: boolean
    description: Print more
commands:
  - name: commit
    description: Record changes
    options:
      - name: message
        short: m
        required: true
      - name: amend
        kind: boolean
  - name: remote
    commands:
      - name: add
        arguments:
          - name: name
            required: true
          - name: url
  - name: bench
    options:
      - name: runs
        kind: number
        default: 3
"#;

fn write_definition(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("failed to write definition");
    path
}

fn cmdtree(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_cmdtree"))
        .args(args)
        .output()
        .expect("failed to run cmdtree")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn parse_json(file: &PathBuf, args: &[&str]) -> serde_json::Value {
    let mut full = vec!["parse", file.to_str().unwrap(), "--"];
    full.extend_from_slice(args);
    let output = cmdtree(&full);
    assert!(output.status.success(), "parse failed: {}", stderr(&output));
    serde_json::from_slice(&output.stdout).expect("parse output should be JSON")
}

// ---------------------------------------------------------------------------
// check
// ---------------------------------------------------------------------------

#[test]
fn check_reports_command_count() {
    let dir = TempDir::new().unwrap();
    let file = write_definition(&dir, "vcs.yaml", VCS_YAML);

    let output = cmdtree(&["check", file.to_str().unwrap()]);
    assert!(output.status.success());
    assert_eq!(
        stdout(&output).trim(),
        "Validated definition 'vcs' with 5 command(s)."
    );
}

#[test]
fn check_rejects_broken_definition() {
    let dir = TempDir::new().unwrap();
    let file = write_definition(
        &dir,
        "bad.json",
        r#"{ "name": "bad", "options": [
            { "name": "force", "short": "f", "kind": "boolean" },
            { "name": "file", "short": "f" }
        ] }"#,
    );

    let output = cmdtree(&["check", file.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).starts_with("error: Invalid definition"));
    assert!(stderr(&output).contains("alias '-f'"));
}

#[test]
fn check_rejects_unknown_extension() {
    let dir = TempDir::new().unwrap();
    let file = write_definition(&dir, "vcs.txt", VCS_YAML);

    let output = cmdtree(&["check", file.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("unsupported definition format: txt"));
}

// ---------------------------------------------------------------------------
// help / completion
// ---------------------------------------------------------------------------

#[test]
fn help_for_nested_command_includes_inherited_options() {
    let dir = TempDir::new().unwrap();
    let file = write_definition(&dir, "vcs.yaml", VCS_YAML);

    let output = cmdtree(&["help", file.to_str().unwrap(), "remote", "add"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("Usage: vcs remote add [options] <name> [url]"));
    assert!(text.contains("-v, --verbose"));
}

#[test]
fn help_for_unknown_path_fails() {
    let dir = TempDir::new().unwrap();
    let file = write_definition(&dir, "vcs.yaml", VCS_YAML);

    let output = cmdtree(&["help", file.to_str().unwrap(), "push"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Unknown sub-command 'push' under 'vcs'"));
}

#[test]
fn completion_script_uses_program_name() {
    let dir = TempDir::new().unwrap();
    let file = write_definition(&dir, "vcs.yaml", VCS_YAML);

    let output = cmdtree(&["completion", file.to_str().unwrap(), "--program", "my-vcs"]);
    assert!(output.status.success());
    let script = stdout(&output);
    assert!(script.contains("complete -o default -F _my_vcs_completions my-vcs"));
}

// ---------------------------------------------------------------------------
// parse
// ---------------------------------------------------------------------------

#[test]
fn parse_resolves_sub_command_with_inherited_flag() {
    let dir = TempDir::new().unwrap();
    let file = write_definition(&dir, "vcs.yaml", VCS_YAML);

    let json = parse_json(&file, &["-v", "commit", "-m", "first"]);
    assert_eq!(json["command"], serde_json::json!(["vcs", "commit"]));
    assert_eq!(json["action"], "invoke");
    assert_eq!(json["options"]["verbose"], true);
    assert_eq!(json["options"]["message"], "first");
    assert_eq!(json["options"]["amend"], false);
}

#[test]
fn parse_applies_defaults_and_arguments() {
    let dir = TempDir::new().unwrap();
    let file = write_definition(&dir, "vcs.yaml", VCS_YAML);

    let json = parse_json(&file, &["remote", "add", "origin", "https://example.org"]);
    assert_eq!(json["arguments"]["name"], "origin");
    assert_eq!(json["arguments"]["url"], "https://example.org");
    assert_eq!(json["rest"], serde_json::json!(["origin", "https://example.org"]));

    let json = parse_json(&file, &["bench"]);
    assert_eq!(json["options"]["runs"], 3.0);
}

#[test]
fn parse_reports_help_and_candidates() {
    let dir = TempDir::new().unwrap();
    let file = write_definition(&dir, "vcs.yaml", VCS_YAML);

    let json = parse_json(&file, &["commit", "help"]);
    assert_eq!(json["action"], "help");

    let json = parse_json(&file, &["get-completions", "co"]);
    assert_eq!(json["action"], "candidates");
    assert_eq!(json["candidates"], serde_json::json!(["commit"]));
}

#[test]
fn parse_reports_binding_errors() {
    let dir = TempDir::new().unwrap();
    let file = write_definition(&dir, "vcs.yaml", VCS_YAML);
    let path = file.to_str().unwrap();

    let output = cmdtree(&["parse", path, "--", "bench", "--runs", "many"]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(
        stderr(&output).trim(),
        "error: 'runs': expected number value, got 'many'"
    );

    let output = cmdtree(&["parse", path, "--", "commit", "-m", "a", "--message", "b"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("was given as both -m and --message"));

    let output = cmdtree(&["parse", path, "--", "commit"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("missing required value for 'message'"));
}

#[test]
fn parse_yaml_output() {
    let dir = TempDir::new().unwrap();
    let file = write_definition(&dir, "vcs.yaml", VCS_YAML);

    let output = cmdtree(&["parse", file.to_str().unwrap(), "--format", "yaml", "--", "commit", "-m", "x"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("action: invoke"));
    assert!(text.contains("message: x"));
}
