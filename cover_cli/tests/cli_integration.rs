use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::tempdir;

// Short travel times keep real-clock runs fast.
fn write_config(dir: &Path, transport: &str) -> PathBuf {
    let store = dir.join("state").join("positions.json");
    let toml = format!(
        r#"
[controller]
tick_ms = 10
calibration_slack_ms = 20
calibration_settle_ms = 20

[store]
path = "{store}"

{transport}

[covers.living]
name = "Living Room"
opening_time = 300
closing_time = 250
mqtt_command_topic = "home/living/cover/set"
mqtt_payload_open = "OPEN"
mqtt_payload_close = "CLOSE"
mqtt_payload_stop = "STOP"
"#,
        store = store.display().to_string().replace('\\', "/"),
    );
    let path = dir.join("cover.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn cmd(cfg: &Path) -> Command {
    let mut cmd = Command::cargo_bin("relay-cover").unwrap();
    cmd.arg("--config").arg(cfg);
    cmd
}

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["open", "living"], 0, "at 100%", "stdout")]
#[case(&["set-position", "living", "50"], 0, "at 50%", "stdout")]
#[case(&["set-position", "living", "-20"], 0, "at 0%", "stdout")]
#[case(&["set-position", "living"], 2, "required", "stderr")]
#[case(&["close", "attic"], 3, "No cover named", "stderr")]
#[case(&["stop", "living"], 0, "idle", "stdout")]
#[case(&["self-check"], 0, "OK:", "stdout")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_config(dir.path(), "");

    let assert = cmd(&cfg).args(args).assert().code(exit_code);

    match stream {
        "stdout" => {
            assert.stdout(predicate::str::contains(needle));
        }
        "stderr" => {
            assert.stderr(predicate::str::contains(needle));
        }
        other => panic!("unknown stream: {other}"),
    }
}

#[rstest]
fn position_survives_restart() {
    let dir = tempdir().unwrap();
    let cfg = write_config(dir.path(), "");

    cmd(&cfg)
        .args(["set-position", "living", "40"])
        .assert()
        .success();

    let out = cmd(&cfg)
        .args(["--json", "status", "living"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(v["cover"], "living");
    assert_eq!(v["name"], "Living Room");
    assert_eq!(v["position"], 40);
    assert_eq!(v["direction"], "idle");

    let doc: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("state/positions.json")).unwrap())
            .unwrap();
    assert_eq!(doc["version"], 1);
    assert_eq!(doc["key"], "mqtt_relay_cover");
    assert_eq!(doc["data"]["living"], 40);
}

#[rstest]
fn calibrate_reports_closed() {
    let dir = tempdir().unwrap();
    let cfg = write_config(dir.path(), "");

    cmd(&cfg)
        .args(["--json", "calibrate", "living"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""outcome":"calibrated""#))
        .stdout(predicate::str::contains(r#""position":0"#));
}

#[rstest]
fn corrupt_store_exits_with_store_code() {
    let dir = tempdir().unwrap();
    let cfg = write_config(dir.path(), "");
    fs::create_dir_all(dir.path().join("state")).unwrap();
    fs::write(dir.path().join("state/positions.json"), "{ not json").unwrap();

    cmd(&cfg)
        .args(["open", "living"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("position store"));
}

#[rstest]
fn json_errors_are_structured() {
    let dir = tempdir().unwrap();
    let cfg = write_config(dir.path(), "");

    let out = cmd(&cfg)
        .args(["--json", "status", "attic"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(3));
    let line = String::from_utf8_lossy(&out.stderr);
    let last = line.lines().last().unwrap();
    let v: serde_json::Value = serde_json::from_str(last).unwrap();
    assert_eq!(v["reason"], "UnknownCover");
}

#[rstest]
fn invalid_config_names_the_field() {
    let dir = tempdir().unwrap();
    let cfg = dir.path().join("bad.toml");
    fs::write(
        &cfg,
        r#"
[covers.living]
opening_time = 0
mqtt_command_topic = "t"
mqtt_payload_open = "OPEN"
mqtt_payload_close = "CLOSE"
mqtt_payload_stop = "STOP"
"#,
    )
    .unwrap();

    cmd(&cfg)
        .args(["self-check"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("covers.living.opening_time"));
}

#[rstest]
fn spool_transport_writes_command_lines() {
    let dir = tempdir().unwrap();
    let spool_dir = dir.path().join("spool");
    fs::create_dir_all(&spool_dir).unwrap();
    let spool = spool_dir.join("commands.jsonl");
    let transport = format!(
        "[transport]\nkind = \"spool\"\nspool_path = \"{}\"",
        spool.display().to_string().replace('\\', "/")
    );
    let cfg = write_config(dir.path(), &transport);

    cmd(&cfg).args(["open", "living"]).assert().success();

    let payloads: Vec<String> = fs::read_to_string(&spool)
        .unwrap()
        .lines()
        .map(|l| {
            let v: serde_json::Value = serde_json::from_str(l).unwrap();
            assert_eq!(v["topic"], "home/living/cover/set");
            v["payload"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(payloads, vec!["STOP", "OPEN", "STOP"]);
}

#[rstest]
fn spool_self_check_fails_without_directory() {
    let dir = tempdir().unwrap();
    let transport = format!(
        "[transport]\nkind = \"spool\"\nspool_path = \"{}\"",
        dir.path()
            .join("missing/commands.jsonl")
            .display()
            .to_string()
            .replace('\\', "/")
    );
    let cfg = write_config(dir.path(), &transport);

    cmd(&cfg)
        .args(["self-check"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("not available"));
}
