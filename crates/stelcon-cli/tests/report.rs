use assert_cmd::cargo::cargo_bin_cmd;
use std::error::Error;
use std::path::PathBuf;

fn fixture_path() -> String {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .and_then(|p| p.parent())
        .expect("workspace root")
        .join("test_data/pulse_tiny.csv");
    root.to_string_lossy().to_string()
}

#[test]
fn report_writes_image_and_prints_statistics() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let image = dir.path().join("report.png");

    let mut cmd = cargo_bin_cmd!("stelcon");
    cmd.args([
        "report",
        "--input",
        &fixture_path(),
        "--out",
        image.to_str().expect("utf8 path"),
        "--threshold",
        "10",
    ]);
    let out = cmd.assert().success().get_output().stdout.clone();
    let stdout = String::from_utf8(out)?;

    assert!(stdout.contains("control pulses: 2"));
    assert!(stdout.contains("ratio to initial: 3.00x"));
    assert!(stdout.contains("mean pulse spacing: 3.00 s"));

    let metadata = std::fs::metadata(&image)?;
    assert!(metadata.len() > 0);
    Ok(())
}

#[test]
fn report_with_no_pulses_aborts_without_output() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let image = dir.path().join("report.png");

    let mut cmd = cargo_bin_cmd!("stelcon");
    cmd.args([
        "report",
        "--input",
        &fixture_path(),
        "--out",
        image.to_str().expect("utf8 path"),
        "--threshold",
        "30",
    ]);
    cmd.assert().failure();
    assert!(!image.exists());
    Ok(())
}

#[test]
fn report_on_missing_input_fails() {
    let mut cmd = cargo_bin_cmd!("stelcon");
    cmd.args(["report", "--input", "/nonexistent/trace.csv"]);
    cmd.assert().failure();
}
