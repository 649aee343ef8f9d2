use fanctl_config::{load_file, load_toml};
use rstest::rstest;
use std::fs;
use tempfile::tempdir;

#[test]
fn empty_file_yields_stock_wiring() {
    let cfg = load_toml("").expect("parse empty TOML");
    cfg.validate().expect("defaults must validate");
    assert_eq!(cfg.pins.fan_pwm, 18);
    assert_eq!(cfg.pins.tach, 23);
    assert_eq!(cfg.control.sample_interval_ms, 10_000);
    assert_eq!(
        cfg.curve.bands,
        vec![(80.0, 64), (85.0, 128), (90.0, 192), (95.0, 255)]
    );
    assert_eq!(cfg.sensor.command, "vcgencmd");
}

#[test]
fn accepts_table_and_tuple_bands() {
    let toml = r#"
[curve]
bands = [
    [70.0, 32],
    { threshold_f = 90.0, duty = 255 },
]
"#;
    let cfg = load_toml(toml).expect("parse TOML");
    cfg.validate().expect("valid curve");
    assert_eq!(cfg.curve.bands, vec![(70.0, 32), (90.0, 255)]);
}

#[rstest]
#[case("[control]\nsample_interval_ms = 0\n", "sample_interval_ms must be >= 1")]
#[case("[pins]\nfan_pwm = 23\ntach = 23\n", "must differ")]
#[case("[pwm]\nfrequency_hz = 0.0\n", "frequency_hz must be > 0")]
#[case("[curve]\nbands = []\n", "at least one band")]
#[case("[curve]\nbands = [[90.0, 64], [80.0, 128]]\n", "strictly ascending")]
#[case("[curve]\nbands = [[80.0, 200], [90.0, 100]]\n", "non-decreasing")]
#[case("[sensor]\ncommand = \"  \"\n", "sensor.command")]
#[case("[logging]\nrotation = \"weekly\"\n", "logging.rotation")]
#[case("[sim]\nmax_rpm = -1.0\n", "sim.max_rpm")]
fn rejects_invalid_sections(#[case] toml: &str, #[case] needle: &str) {
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should be rejected");
    let msg = format!("{err}");
    assert!(msg.contains(needle), "{msg:?} does not contain {needle:?}");
}

#[test]
fn rejects_duty_out_of_range_at_parse_time() {
    let toml = "[curve]\nbands = [[80.0, 300]]\n";
    assert!(load_toml(toml).is_err());
}

#[test]
fn load_file_reads_and_validates() {
    let dir = tempdir().unwrap();
    let good = dir.path().join("good.toml");
    fs::write(
        &good,
        "[control]\nsample_interval_ms = 250\n[logging]\nrotation = \"daily\"\n",
    )
    .unwrap();
    let cfg = load_file(&good).expect("valid file");
    assert_eq!(cfg.control.sample_interval_ms, 250);

    let bad = dir.path().join("bad.toml");
    fs::write(&bad, "[control]\nsample_interval_ms = 0\n").unwrap();
    assert!(load_file(&bad).is_err());

    let missing = dir.path().join("missing.toml");
    let err = load_file(&missing).expect_err("missing file");
    assert!(format!("{err}").contains("read config"));
}
