#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

fn fis(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("fis-chaos").unwrap();
    cmd.current_dir(dir.path())
        .env("FIS_CHAOS_CACHE_DIR", dir.path())
        .env_remove("FIS_CHAOS_CONFIG")
        .env_remove("RUST_LOG");
    cmd
}

fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

fn record(dir: &TempDir, region: &str) -> PathBuf {
    dir.path().join(format!("fis_actions_{region}.json"))
}

const CAPABILITIES: &str = r#"{
  "fis_actions": [
    {"id": "aws:ec2:stop-instances", "description": "Stop EC2 instances"},
    {"id": "aws:rds:failover-db-cluster", "description": "Fail over an Aurora cluster"}
  ],
  "resource_types": [
    {"type": "aws:ec2:instance", "description": "EC2 instance"},
    {"type": "aws:rds:cluster", "description": "Aurora cluster"}
  ]
}"#;

fn refresh(dir: &TempDir, region: &str) {
    let data = write(dir, "capabilities.json", CAPABILITIES);
    fis(dir)
        .args(["cache", "refresh", "--region", region, "--file"])
        .arg(&data)
        .assert()
        .success();
}

fn template(action_id: &str) -> String {
    serde_json::json!({
        "description": "Stop web tier",
        "actions": {
            "StopWeb": {"actionId": action_id, "targets": {"Instances": "Web"}}
        },
        "targets": {
            "Web": {
                "resourceType": "aws:ec2:instance",
                "resourceTags": {"tier": "web"},
                "selectionMode": "COUNT(1)"
            }
        },
        "stopConditions": [{"source": "aws:cloudwatch:alarm", "value": "arn:alarm"}]
    })
    .to_string()
}

// ---------------------------------------------------------------------------
// fis-chaos cache
// ---------------------------------------------------------------------------

#[test]
fn status_on_empty_cache() {
    let dir = TempDir::new().unwrap();
    fis(&dir)
        .args(["cache", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No cached regions"));

    fis(&dir)
        .args(["cache", "status", "--region", "us-east-1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("empty"));
}

#[test]
fn refresh_writes_record_and_reads_fresh() {
    let dir = TempDir::new().unwrap();
    refresh(&dir, "us-west-2");
    assert!(record(&dir, "us-west-2").exists());

    let output = fis(&dir)
        .args(["cache", "show", "--region", "us-west-2", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let body: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(body["cache_status"], "fresh");
    assert_eq!(body["region"], "us-west-2");
    assert_eq!(body["fis_actions"][0]["id"], "aws:ec2:stop-instances");
    assert_eq!(body["resource_types"][1]["type"], "aws:rds:cluster");

    fis(&dir)
        .args(["cache", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("us-west-2"))
        .stdout(predicate::str::contains("fresh"));
}

#[test]
fn regions_are_independent() {
    let dir = TempDir::new().unwrap();
    refresh(&dir, "us-east-1");

    fis(&dir)
        .args(["cache", "show", "--region", "eu-west-1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Status: empty"));
}

#[test]
fn stale_record_is_still_shown() {
    let dir = TempDir::new().unwrap();
    let stale = serde_json::json!({
        "region": "us-east-1",
        "fis_actions": [{"id": "aws:ec2:stop-instances", "description": ""}],
        "resource_types": [{"type": "aws:ec2:instance", "description": ""}],
        "last_updated": "2020-01-01T00:00:00Z",
        "cache_ttl_hours": 24
    });
    std::fs::write(record(&dir, "us-east-1"), stale.to_string()).unwrap();

    fis(&dir)
        .args(["cache", "show", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""cache_status": "stale""#))
        .stdout(predicate::str::contains("aws:ec2:stop-instances"));
}

#[test]
fn corrupted_record_reads_empty_and_is_removed() {
    let dir = TempDir::new().unwrap();
    std::fs::write(record(&dir, "us-east-1"), "{ not json").unwrap();

    fis(&dir)
        .args(["cache", "status", "--region", "us-east-1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("empty"));
    assert!(!record(&dir, "us-east-1").exists());
}

#[test]
fn refresh_rejects_empty_data() {
    let dir = TempDir::new().unwrap();
    let data = write(&dir, "empty.json", r#"{"fis_actions": [], "resource_types": []}"#);
    fis(&dir)
        .args(["cache", "refresh", "--file"])
        .arg(&data)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no fis_actions or resource_types"));
    assert!(!record(&dir, "us-east-1").exists());
}

#[test]
fn refresh_with_blank_ids_keeps_existing_record() {
    let dir = TempDir::new().unwrap();
    refresh(&dir, "us-east-1");
    let blank = write(&dir, "blank.json", r#"{"fis_actions": ["  "], "resource_types": [""]}"#);
    fis(&dir)
        .args(["cache", "refresh", "--file"])
        .arg(&blank)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no fis_actions or resource_types"));

    let file = write(&dir, "template.json", &template("svc:unknown-action"));
    fis(&dir).arg("validate").arg(&file).assert().failure();
}

#[test]
fn refresh_rejects_bad_region() {
    let dir = TempDir::new().unwrap();
    let data = write(&dir, "capabilities.json", CAPABILITIES);
    fis(&dir)
        .args(["cache", "refresh", "--region", "../etc", "--file"])
        .arg(&data)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid region"));
}

#[test]
fn clear_one_and_all() {
    let dir = TempDir::new().unwrap();
    refresh(&dir, "us-east-1");
    refresh(&dir, "eu-west-1");

    fis(&dir)
        .args(["cache", "clear", "--region", "eu-west-1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 1"));
    assert!(!record(&dir, "eu-west-1").exists());
    assert!(record(&dir, "us-east-1").exists());

    fis(&dir)
        .args(["cache", "clear", "--all", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""removed": 1"#));
    assert!(!record(&dir, "us-east-1").exists());
}

// ---------------------------------------------------------------------------
// fis-chaos validate
// ---------------------------------------------------------------------------

#[test]
fn validate_accepts_known_identifiers() {
    let dir = TempDir::new().unwrap();
    refresh(&dir, "us-east-1");
    let file = write(&dir, "template.json", &template("aws:ec2:stop-instances"));

    fis(&dir)
        .arg("validate")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("is valid"));
}

#[test]
fn validate_rejects_unknown_action() {
    let dir = TempDir::new().unwrap();
    refresh(&dir, "us-east-1");
    let file = write(&dir, "template.json", &template("svc:unknown-action"));

    fis(&dir)
        .arg("validate")
        .arg(&file)
        .assert()
        .failure()
        .stdout(predicate::str::contains(
            "Action 'svc:unknown-action' is not available in current capabilities",
        ))
        .stderr(predicate::str::contains("failed validation"));
}

#[test]
fn validate_json_reports_result() {
    let dir = TempDir::new().unwrap();
    refresh(&dir, "us-east-1");
    let file = write(&dir, "template.json", &template("svc:unknown-action"));

    let output = fis(&dir)
        .args(["validate", "--json"])
        .arg(&file)
        .output()
        .unwrap();
    assert!(!output.status.success());
    let body: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(body["result"]["valid"], false);
    assert_eq!(
        body["result"]["invalid_actions"],
        serde_json::json!(["svc:unknown-action"])
    );
    assert_eq!(body["cache_status"], "fresh");
}

#[test]
fn validate_malformed_template_fails() {
    let dir = TempDir::new().unwrap();
    refresh(&dir, "us-east-1");
    let file = write(&dir, "template.json", "this is not json");

    fis(&dir)
        .arg("validate")
        .arg(&file)
        .assert()
        .failure()
        .stdout(predicate::str::contains("Malformed template"));
}

#[test]
fn validate_with_empty_cache_passes_with_warning() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "template.json", &template("svc:unknown-action"));

    fis(&dir)
        .arg("validate")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("[warning]"));
}

// ---------------------------------------------------------------------------
// fis-chaos prompt
// ---------------------------------------------------------------------------

#[test]
fn prompt_includes_capabilities_and_architecture() {
    let dir = TempDir::new().unwrap();
    refresh(&dir, "us-east-1");

    fis(&dir)
        .args(["prompt", "--arch", "ALB in front of an ASG with Aurora"])
        .assert()
        .success()
        .stdout(predicate::str::contains("- aws:ec2:stop-instances: Stop EC2 instances"))
        .stdout(predicate::str::contains("ALB in front of an ASG with Aurora"));
}

#[test]
fn prompt_reads_architecture_file() {
    let dir = TempDir::new().unwrap();
    refresh(&dir, "us-east-1");
    let arch = write(&dir, "arch.md", "Three-tier app on ECS Fargate");

    fis(&dir)
        .args(["prompt", "--arch-file"])
        .arg(&arch)
        .assert()
        .success()
        .stdout(predicate::str::contains("Three-tier app on ECS Fargate"));
}

#[test]
fn prompt_requires_cached_capabilities() {
    let dir = TempDir::new().unwrap();
    fis(&dir)
        .args(["prompt", "--arch", "anything"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no usable cached capabilities"));
}

// ---------------------------------------------------------------------------
// fis-chaos config
// ---------------------------------------------------------------------------

#[test]
fn config_defaults() {
    let dir = TempDir::new().unwrap();
    fis(&dir)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("us-east-1"))
        .stdout(predicate::str::contains("(defaults)"));
}

#[test]
fn config_init_writes_defaults_once() {
    let dir = TempDir::new().unwrap();
    fis(&dir).args(["config", "init"]).assert().success();
    let written = std::fs::read_to_string(dir.path().join("config.yaml")).unwrap();
    assert!(written.contains("default_region: us-east-1"));
    assert!(written.contains("ttl_hours: 24"));

    fis(&dir)
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
    fis(&dir).args(["config", "init", "--force"]).assert().success();
}

#[test]
fn config_default_region_applies() {
    let dir = TempDir::new().unwrap();
    write(&dir, "config.yaml", "default_region: eu-central-1\n");
    refresh(&dir, "eu-central-1");

    fis(&dir)
        .args(["cache", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Region: eu-central-1"))
        .stdout(predicate::str::contains("Status: fresh"));
}

#[test]
fn config_validate_flags_errors() {
    let dir = TempDir::new().unwrap();
    write(&dir, "config.yaml", "default_region: Mars\nttl_hours: 0\n");

    fis(&dir)
        .args(["config", "validate"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("[error] default_region"))
        .stdout(predicate::str::contains("ttl_hours is 0"));
}

// ---------------------------------------------------------------------------
// logging
// ---------------------------------------------------------------------------

#[test]
fn rust_log_raises_verbosity() {
    let dir = TempDir::new().unwrap();
    fis(&dir)
        .args(["cache", "status"])
        .assert()
        .success()
        .stderr(predicate::str::contains("resolved cache directory").not());

    fis(&dir)
        .env("RUST_LOG", "debug")
        .args(["cache", "status"])
        .assert()
        .success()
        .stderr(predicate::str::contains("resolved cache directory"));
}

// ---------------------------------------------------------------------------
// fis-chaos mcp
// ---------------------------------------------------------------------------

#[test]
fn mcp_round_trip_over_stdio() {
    let dir = TempDir::new().unwrap();
    let input = [
        r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
        r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
        r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
        r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"get_valid_fis_actions","arguments":{"region":"us-east-1"}}}"#,
    ]
    .join("\n");

    let output = fis(&dir).arg("mcp").write_stdin(input).output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let responses: Vec<serde_json::Value> = stdout
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(responses.len(), 3, "notification must not be answered");
    assert_eq!(responses[0]["result"]["serverInfo"]["name"], "aws-chaos-engineering");
    assert_eq!(responses[1]["result"]["tools"].as_array().unwrap().len(), 4);

    let text = responses[2]["result"]["content"][0]["text"].as_str().unwrap();
    let body: serde_json::Value = serde_json::from_str(text).unwrap();
    assert_eq!(body["cache_status"], "empty");
}
