mod support;

use std::process::{Command, Output};
use support::{javapack_bin, Workspace};

fn run(args: &[&str]) -> Output {
    Command::new(javapack_bin())
        .env_clear()
        .env("JBP_LOG_LEVEL", "error")
        .args(args)
        .output()
        .expect("Failed to execute javapack")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

#[test]
fn test_cli_help() {
    let output = run(&["--help"]);
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("Two-phase buildpack for JVM applications"));
    for command in ["detect", "supply", "finalize", "release"] {
        assert!(out.contains(command), "help is missing {}", command);
    }
}

#[test]
fn test_cli_version() {
    let output = run(&["--version"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("javapack"));
}

#[test]
fn test_detect_spring_boot() {
    let ws = Workspace::new();
    ws.spring_boot_app("2.7.0");

    let output = run(&["detect", ws.app().to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output).trim(), "spring-boot=2.7.0");
}

#[test]
fn test_detect_json_lists_jre() {
    let ws = Workspace::new();
    ws.spring_boot_app("2.7.0");

    let output = run(&["detect", ws.app().to_str().unwrap(), "--format", "json"]);
    assert!(output.status.success());
    let plan: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(plan["container"]["id"], "spring_boot");
    assert_eq!(plan["jre"]["tag"], "open-jdk-jre=17.0.13");
    assert_eq!(plan["agents"], serde_json::json!([]));
}

#[test]
fn test_detect_empty_app_fails() {
    let ws = Workspace::new();

    let output = run(&["detect", ws.app().to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).trim().is_empty());
}

#[test]
fn test_supply_with_empty_cache_fails() {
    let ws = Workspace::new();
    ws.spring_boot_app("2.7.0");
    let deps = ws.stager.deps_dir().to_str().unwrap().to_string();
    let cache = ws.stager.cache_dir().to_str().unwrap().to_string();

    let output = run(&["supply", ws.app().to_str().unwrap(), &cache, &deps, "0"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("not found in dependency cache"));
    assert!(!ws.stager.marker_path().exists());
}

#[test]
fn test_finalize_without_supply_fails() {
    let ws = Workspace::new();
    ws.spring_boot_app("2.7.0");
    let deps = ws.stager.deps_dir().to_str().unwrap().to_string();
    let cache = ws.stager.cache_dir().to_str().unwrap().to_string();

    let output = run(&["finalize", ws.app().to_str().unwrap(), &cache, &deps, "0"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("missing state from supply phase"));
}

#[test]
fn test_release_without_finalize_fails() {
    let ws = Workspace::new();
    let deps = ws.stager.deps_dir().to_str().unwrap().to_string();

    let output = run(&["release", &deps, "0"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_invalid_index_rejected() {
    let ws = Workspace::new();
    let deps = ws.stager.deps_dir().to_str().unwrap().to_string();

    let output = run(&["release", &deps, "first"]);
    assert!(!output.status.success());
}
