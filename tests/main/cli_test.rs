//! CLI contract tests.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use serde_json::Value;

fn trendscope(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("trendscope").expect("binary should build");
    cmd.env("HOME", home).env_remove("RUST_LOG");
    cmd
}

fn stdout_json(output: &std::process::Output) -> Value {
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    match serde_json::from_slice(&output.stdout) {
        Ok(value) => value,
        Err(err) => panic!("stdout should be JSON: {err}"),
    }
}

#[test]
fn parse_offline_prints_intent() {
    let home = tempfile::tempdir().expect("tempdir should be created");
    let output = trendscope(home.path())
        .args(["parse", "--offline", "Warframe vs Crusader Kings"])
        .output()
        .expect("command should run");
    let value = stdout_json(&output);
    assert_eq!(value["query_type"], "COMPARISON");
    assert_eq!(value["primary_entity"], "warframe");
    assert_eq!(value["secondary_entity"], "crusader kings");
    assert_eq!(value["provenance"], "rule_only");
}

#[test]
fn parse_without_credentials_falls_back_to_rules() {
    let home = tempfile::tempdir().expect("tempdir should be created");
    let output = trendscope(home.path())
        .env_remove("GEMINI_API_KEY")
        .args(["parse", "Hades"])
        .output()
        .expect("command should run");
    let value = stdout_json(&output);
    assert_eq!(value["query_type"], "DEEP_DIVE");
    assert_eq!(value["provenance"], "rule_only");
}

#[test]
fn prompt_embeds_query() {
    let home = tempfile::tempdir().expect("tempdir should be created");
    let output = trendscope(home.path())
        .args(["prompt", "what about Hades"])
        .output()
        .expect("command should run");
    let value = stdout_json(&output);
    let user = value["user"].as_str().unwrap_or_default();
    assert!(user.starts_with("Parse this query: \"what about Hades\""));
    assert!(value["system"].as_str().is_some());
}

#[test]
fn merge_reads_saved_response() {
    let home = tempfile::tempdir().expect("tempdir should be created");
    let response = home.path().join("response.json");
    fs::write(
        &response,
        r#"{"query_type":"DEEP_DIVE","entities":["Hades II"],"category":"GAMES","confidence":0.9}"#,
    )
    .expect("response should be written");

    let output = trendscope(home.path())
        .arg("merge")
        .arg("Hades")
        .arg(&response)
        .output()
        .expect("command should run");
    let value = stdout_json(&output);
    assert_eq!(value["intent"]["primary_entity"], "Hades II");
    assert_eq!(value["intent"]["provenance"], "llm_enhanced");
    assert!(value["diagnostic"].is_null());
}

#[test]
fn event_reads_payload_from_stdin() {
    let home = tempfile::tempdir().expect("tempdir should be created");
    fs::create_dir_all(home.path().join(".trendscope")).expect("config dir should be created");
    fs::write(
        home.path().join(".trendscope/config.toml"),
        "[parser]\nenabled = false\n",
    )
    .expect("config should be written");

    let payload = r#"{"text":"How big is Clair Obscur's fandom?","user_id":"U1","channel_id":"C1"}"#;
    let output = trendscope(home.path())
        .args(["event", "-"])
        .write_stdin(payload)
        .output()
        .expect("command should run");
    let value = stdout_json(&output);
    assert_eq!(value["query"]["user_id"], "U1");
    assert_eq!(value["query"]["reply_to"]["kind"], "channel");
    assert_eq!(value["intent"]["query_type"], "SIZING");
    assert_eq!(value["intent"]["primary_entity"], "Clair Obscur");
}

#[test]
fn explicit_missing_config_is_an_error() {
    let home = tempfile::tempdir().expect("tempdir should be created");
    trendscope(home.path())
        .args(["--config", "/nonexistent/trendscope.toml", "parse", "x"])
        .assert()
        .failure();
}
