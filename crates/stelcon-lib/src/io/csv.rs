use crate::signal::SimulationTrace;
use anyhow::{Context, Result};
use csv::{ReaderBuilder, WriterBuilder};
use serde::Deserialize;
use std::fs::File;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct TraceRow {
    time: f64,
    center_impurity: f64,
    edge_impurity: f64,
    turbulence: f64,
}

/// Read a simulation trace from a headered CSV file.
pub fn read_trace(path: &Path) -> Result<SimulationTrace> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(file);

    let mut trace = SimulationTrace::default();
    for (idx, result) in reader.deserialize::<TraceRow>().enumerate() {
        let row = result.with_context(|| format!("row {} of {}", idx + 1, path.display()))?;
        trace.time.push(row.time);
        trace.center_impurity.push(row.center_impurity);
        trace.edge_impurity.push(row.edge_impurity);
        trace.turbulence.push(row.turbulence);
    }
    if trace.is_empty() {
        anyhow::bail!("no rows in {}", path.display());
    }
    Ok(trace)
}

/// Write a simulation trace as CSV. Timestamps keep six decimal places,
/// densities are written in scientific notation.
pub fn write_trace(path: &Path, trace: &SimulationTrace) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = WriterBuilder::new().from_writer(file);
    writer.write_record(["time", "center_impurity", "edge_impurity", "turbulence"])?;
    for i in 0..trace.len() {
        writer.write_record(&[
            format!("{:.6}", trace.time[i]),
            format!("{:.6e}", trace.center_impurity[i]),
            format!("{:.6e}", trace.edge_impurity[i]),
            format!("{:.4}", trace.turbulence[i]),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
