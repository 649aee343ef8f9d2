use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

// Minimal valid config for the simulated backend with a fast loop
fn write_config(dir: &tempfile::TempDir, extra: &str) -> PathBuf {
    let toml = format!(
        r#"
[control]
sample_interval_ms = 5

[sim]
max_rpm = 3000.0
temp_f = 75.0
{extra}
"#
    );
    let path = dir.path().join("fanctl.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn fanctl(cfg: &PathBuf) -> Command {
    let mut cmd = Command::cargo_bin("fanctl").unwrap();
    cmd.env_remove("RUST_LOG")
        .env_remove("FANCTL_SIM_TEMP_F")
        .arg("--config")
        .arg(cfg);
    cmd
}

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["curve", "--temp-f", "96"], 0, "duty=255", "stdout")]
#[case(&["curve", "--temp-f", "79.9"], 0, "duty=0", "stdout")]
#[case(&["curve", "--temp-f", "-10"], 0, "duty=0", "stdout")]
#[case(&["curve"], 2, "required", "stderr")]
#[case(&["self-check"], 0, "OK: temp=75.0F", "stdout")]
#[case(&["run", "--cycles", "2"], 0, "fan off", "stdout")]
#[case(&["run", "--interval-ms", "0", "--cycles", "1"], 4, "interval-ms", "stderr")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "");

    let mut cmd = fanctl(&cfg);
    for a in args {
        cmd.arg(a);
    }
    let assert = cmd.assert().code(exit_code);

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
#[case(82.0, 64)]
#[case(86.0, 128)]
#[case(91.0, 192)]
fn self_check_uses_sim_temperature_override(#[case] temp_f: f64, #[case] duty: u8) {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "");
    fanctl(&cfg)
        .env("FANCTL_SIM_TEMP_F", temp_f.to_string())
        .arg("self-check")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("target duty={duty}")));
}

#[test]
fn run_json_reports_duty_and_stops() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "");
    let out = fanctl(&cfg)
        .env("FANCTL_SIM_TEMP_F", "91")
        .args(["--json", "--log-level", "warn", "run", "--cycles", "3"])
        .output()
        .unwrap();
    assert!(out.status.success());

    let stdout = String::from_utf8(out.stdout).unwrap();
    let events: Vec<serde_json::Value> = stdout
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    let last = events.last().unwrap();
    assert_eq!(last["event"], "stopped");
    assert!(last["cycles"].as_u64().unwrap() >= 3);
    assert_eq!(last["duty"], 0);
    assert_eq!(last["last_duty"], 192);
    assert_eq!(last["interrupted"], false);
    for ev in &events[..events.len() - 1] {
        assert_eq!(ev["event"], "report");
        assert_eq!(ev["duty"], 192);
    }
}

#[test]
fn curve_json_output() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "[curve]\nbands = [[100.0, 100], { threshold_f = 120.0, duty = 200 }]\n");
    let out = fanctl(&cfg)
        .args(["--json", "curve", "--temp-f", "110"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(v["duty"], 100);
    assert_eq!(v["fan_speed_pct"], 39.0);
}

#[rstest]
#[case("[control]\nsample_interval_ms = 0\n", "sample_interval_ms")]
#[case("[pins]\nfan_pwm = 4\ntach = 4\n", "must differ")]
#[case("[curve]\nbands = [[90.0, 255], [80.0, 64]]\n", "strictly ascending")]
#[case("[logging]\nrotation = \"weekly\"\n", "rotation")]
fn invalid_config_exits_with_config_code(#[case] body: &str, #[case] needle: &str) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, body).unwrap();
    fanctl(&path)
        .args(["curve", "--temp-f", "80"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains(needle));
}

#[test]
fn missing_config_file_is_config_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    fanctl(&path)
        .arg("self-check")
        .assert()
        .code(4)
        .stderr(predicate::str::contains("read config"));
}

#[test]
fn bad_sim_override_is_json_config_error() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "");
    let out = fanctl(&cfg)
        .env("FANCTL_SIM_TEMP_F", "warm")
        .args(["--json", "self-check"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(4));
    let stderr = String::from_utf8(out.stderr).unwrap();
    let line = stderr
        .lines()
        .rev()
        .find(|l| l.starts_with('{') && l.contains("\"reason\""))
        .unwrap();
    let v: serde_json::Value = serde_json::from_str(line).unwrap();
    assert_eq!(v["reason"], "Config");
    assert_eq!(v["exit_code"], 4);
}

#[test]
fn file_logging_writes_json_lines() {
    let dir = tempdir().unwrap();
    let log = dir.path().join("fanctl.log");
    let cfg = write_config(
        &dir,
        &format!(
            "[logging]\nfile = {:?}\nlevel = \"info\"\n",
            log.to_string_lossy()
        ),
    );
    fanctl(&cfg)
        .args(["run", "--cycles", "1"])
        .assert()
        .success();
    let text = fs::read_to_string(&log).unwrap_or_default();
    assert!(
        text.lines().any(|l| l.contains("fan controller started")),
        "log file missing controller start: {text}"
    );
}
