#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn remedy(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("remedy").unwrap();
    cmd.current_dir(dir.path())
        .env("REMEDY_CONFIG", dir.path().join("remedy.yaml"))
        .env_remove("RUST_LOG");
    cmd
}

fn write_config(dir: &TempDir, yaml: &str) {
    std::fs::write(dir.path().join("remedy.yaml"), yaml).unwrap();
}

// ---------------------------------------------------------------------------
// remedy normalize
// ---------------------------------------------------------------------------

#[test]
fn normalize_resolves_alias() {
    let dir = TempDir::new().unwrap();
    remedy(&dir)
        .args(["normalize", "block_ip"])
        .assert()
        .success()
        .stdout("block\n");
}

#[test]
fn normalize_ignores_case_and_whitespace() {
    let dir = TempDir::new().unwrap();
    remedy(&dir)
        .args(["normalize", "  Restart_Service "])
        .assert()
        .success()
        .stdout("restart\n");
}

#[test]
fn normalize_json_reports_route() {
    let dir = TempDir::new().unwrap();
    let out = remedy(&dir)
        .args(["normalize", "drain_node", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let v: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(v["action"], "drain");
    assert_eq!(v["route"], "approval_gate");
    assert_eq!(v["requires"], "target.service");
    assert_eq!(v["requires_approval"], true);
}

#[test]
fn normalize_unknown_action_fails() {
    let dir = TempDir::new().unwrap();
    remedy(&dir)
        .args(["normalize", "frobnicate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported action: frobnicate"));
}

// ---------------------------------------------------------------------------
// remedy actions
// ---------------------------------------------------------------------------

#[test]
fn actions_lists_every_canonical_action() {
    let dir = TempDir::new().unwrap();
    remedy(&dir)
        .arg("actions")
        .assert()
        .success()
        .stdout(predicate::str::contains("list_blocked"))
        .stdout(predicate::str::contains("ban_ip"))
        .stdout(predicate::str::contains("approval_gate"));
}

#[test]
fn actions_json_has_eight_entries() {
    let dir = TempDir::new().unwrap();
    let out = remedy(&dir)
        .args(["actions", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let v: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(v.as_array().unwrap().len(), 8);
}

// ---------------------------------------------------------------------------
// remedy config
// ---------------------------------------------------------------------------

#[test]
fn config_show_without_file_prints_defaults() {
    let dir = TempDir::new().unwrap();
    remedy(&dir)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("port: 8080"))
        .stdout(predicate::str::contains("ttl_unit_secs: 60"));
}

#[test]
fn config_validate_warns_on_dry_run_defaults() {
    let dir = TempDir::new().unwrap();
    remedy(&dir)
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[warning] enforcement is dry_run"));
}

#[test]
fn config_validate_fails_on_zero_ttl() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "block:\n  ttl_unit_secs: 0\n");
    remedy(&dir)
        .args(["config", "validate"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("[error] block.ttl_unit_secs is 0"))
        .stderr(predicate::str::contains("config validation found errors"));
}

#[test]
fn config_validate_flags_missing_cloudflare_token() {
    let dir = TempDir::new().unwrap();
    write_config(
        &dir,
        "enforcement:\n  type: cloudflare\n  zone_id: zone-1\n  api_token_env: REMEDY_CLI_TEST_UNSET_TOKEN\n",
    );
    remedy(&dir)
        .args(["config", "validate", "--json"])
        .env_remove("REMEDY_CLI_TEST_UNSET_TOKEN")
        .assert()
        .failure()
        .stdout(predicate::str::contains("REMEDY_CLI_TEST_UNSET_TOKEN"));
}

#[test]
fn malformed_config_is_reported() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "block: [not, a, map\n");
    remedy(&dir)
        .args(["config", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load config"));
}

// ---------------------------------------------------------------------------
// remedy serve
// ---------------------------------------------------------------------------

#[test]
fn serve_refuses_config_with_errors() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "block:\n  ttl_unit_secs: 0\n");
    remedy(&dir)
        .args(["serve", "--port", "0"])
        .timeout(std::time::Duration::from_secs(10))
        .assert()
        .failure()
        .stderr(predicate::str::contains("refusing to serve with config errors"))
        .stderr(predicate::str::contains("ttl_unit_secs is 0"));
}
