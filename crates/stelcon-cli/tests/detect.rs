use assert_cmd::cargo::cargo_bin_cmd;
use serde::Deserialize;
use std::error::Error;
use std::path::PathBuf;

#[derive(Debug, Deserialize, PartialEq)]
struct Interval {
    start: f64,
    end: f64,
}

fn fixture_path() -> String {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .and_then(|p| p.parent())
        .expect("workspace root")
        .join("test_data/pulse_tiny.csv");
    root.to_string_lossy().to_string()
}

#[test]
fn detect_pulses_finds_both_intervals() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("stelcon");
    cmd.args(["detect-pulses", "--input", &fixture_path(), "--threshold", "10"]);
    let out = cmd.assert().success().get_output().stdout.clone();
    let intervals: Vec<Interval> = serde_json::from_slice(&out)?;
    assert_eq!(
        intervals,
        vec![
            Interval { start: 2.0, end: 4.0 },
            Interval { start: 5.0, end: 6.0 },
        ]
    );
    Ok(())
}

#[test]
fn detect_pulses_with_high_threshold_is_empty() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("stelcon");
    cmd.args(["detect-pulses", "--input", &fixture_path(), "--threshold", "30"]);
    let out = cmd.assert().success().get_output().stdout.clone();
    let intervals: Vec<Interval> = serde_json::from_slice(&out)?;
    assert!(intervals.is_empty());
    Ok(())
}

#[test]
fn pulse_stats_reports_count_and_spacing() -> Result<(), Box<dyn Error>> {
    #[derive(Deserialize)]
    struct Summary {
        count: usize,
        mean_spacing: f64,
        duty_cycle: f64,
    }

    let mut cmd = cargo_bin_cmd!("stelcon");
    cmd.args(["pulse-stats", "--input", &fixture_path(), "--threshold", "10"]);
    let out = cmd.assert().success().get_output().stdout.clone();
    let summary: Summary = serde_json::from_slice(&out)?;
    assert_eq!(summary.count, 2);
    assert!((summary.mean_spacing - 3.0).abs() < 1e-9);
    assert!((summary.duty_cycle - 0.5).abs() < 1e-9);
    Ok(())
}

#[test]
fn pulse_stats_with_no_pulses_fails() {
    let mut cmd = cargo_bin_cmd!("stelcon");
    cmd.args(["pulse-stats", "--input", &fixture_path(), "--threshold", "30"]);
    cmd.assert().failure();
}
