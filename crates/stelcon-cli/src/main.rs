use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand, ValueEnum};
use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use stelcon_lib::{
    detectors::pulse::{detect_intervals_with_policy, TailPolicy},
    io::csv as trace_io,
    metrics::pulse_stats::{impurity_retention, summarize},
    plot::{control_report_figure, Color as PlotColor, Figure, Panel, ReportStyle},
    sim::{load_config, SimConfig, Stellarator},
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "stelcon",
    version,
    about = "Stellarator turbulence-control simulation and reporting tools"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum TailMode {
    /// Close a trailing active run at the last sample
    #[value(name = "close-at-end")]
    CloseAtEnd,
    /// Discard a trailing active run
    #[value(name = "drop")]
    Drop,
}

impl From<TailMode> for TailPolicy {
    fn from(mode: TailMode) -> Self {
        match mode {
            TailMode::CloseAtEnd => TailPolicy::CloseAtEnd,
            TailMode::Drop => TailPolicy::Drop,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run the impurity-transport simulation and write the trace CSV
    Simulate {
        /// TOML config; defaults apply for any field not set
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long, default_value = "w7x_simulation.csv")]
        out: PathBuf,
        #[arg(long)]
        t_max: Option<f64>,
        #[arg(long)]
        dt: Option<f64>,
    },
    /// Detect control pulses in a recorded trace, JSON to stdout
    DetectPulses {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, default_value = "turbulence")]
        column: String,
        #[arg(long, default_value_t = 10.0)]
        threshold: f64,
        #[arg(long, value_enum, default_value = "close-at-end")]
        tail: TailMode,
    },
    /// Detect pulses and print summary statistics, JSON to stdout
    PulseStats {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, default_value = "turbulence")]
        column: String,
        #[arg(long, default_value_t = 10.0)]
        threshold: f64,
        #[arg(long, value_enum, default_value = "close-at-end")]
        tail: TailMode,
    },
    /// Render the control report image and print intervention statistics
    Report {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, default_value = "w7x_control_results.png")]
        out: PathBuf,
        #[arg(long, default_value_t = 10.0)]
        threshold: f64,
        /// Center-impurity limit line, in 1e18 m^-3 units
        #[arg(long, default_value_t = 2.2)]
        impurity_limit: f64,
        #[arg(long, default_value_t = 4.0)]
        turbulence_baseline: f64,
        #[arg(long, default_value_t = 1400)]
        width: u32,
        #[arg(long, default_value_t = 1000)]
        height: u32,
        #[arg(long, value_enum, default_value = "close-at-end")]
        tail: TailMode,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Simulate {
            config,
            out,
            t_max,
            dt,
        } => cmd_simulate(config.as_deref(), &out, t_max, dt)?,
        Commands::DetectPulses {
            input,
            column,
            threshold,
            tail,
        } => cmd_detect_pulses(&input, &column, threshold, tail)?,
        Commands::PulseStats {
            input,
            column,
            threshold,
            tail,
        } => cmd_pulse_stats(&input, &column, threshold, tail)?,
        Commands::Report {
            input,
            out,
            threshold,
            impurity_limit,
            turbulence_baseline,
            width,
            height,
            tail,
        } => cmd_report(
            &input,
            &out,
            threshold,
            impurity_limit,
            turbulence_baseline,
            (width, height),
            tail,
        )?,
    }
    Ok(())
}

fn cmd_simulate(
    config: Option<&Path>,
    out: &Path,
    t_max: Option<f64>,
    dt: Option<f64>,
) -> Result<()> {
    let mut sim_config = match config {
        Some(path) => load_config(path)?,
        None => SimConfig::default(),
    };
    if let Some(t_max) = t_max {
        sim_config.t_max = t_max;
    }
    if let Some(dt) = dt {
        sim_config.dt = dt;
    }

    let trace = Stellarator::new(sim_config).run();
    trace_io::write_trace(out, &trace)?;

    let center = trace.center_impurity.last().copied().unwrap_or(0.0);
    let edge = trace.edge_impurity.last().copied().unwrap_or(0.0);
    println!("simulated {:.3} s in {} steps", trace.duration(), trace.len());
    println!("final center impurity: {:.2e} m^-3", center);
    println!("final edge impurity: {:.2e} m^-3", edge);
    println!("trace written to {}", out.display());
    Ok(())
}

fn load_channel(input: &Path, column: &str) -> Result<stelcon_lib::signal::Series> {
    let trace = trace_io::read_trace(input)?;
    trace
        .channel(column)
        .ok_or_else(|| anyhow!("no channel named {column} in {}", input.display()))
}

fn cmd_detect_pulses(input: &Path, column: &str, threshold: f64, tail: TailMode) -> Result<()> {
    let series = load_channel(input, column)?;
    let intervals = detect_intervals_with_policy(&series, threshold, tail.into())?;
    println!("{}", serde_json::to_string(&intervals)?);
    Ok(())
}

fn cmd_pulse_stats(input: &Path, column: &str, threshold: f64, tail: TailMode) -> Result<()> {
    let series = load_channel(input, column)?;
    let intervals = detect_intervals_with_policy(&series, threshold, tail.into())?;
    let summary = summarize(&intervals, series.duration())?;
    println!("{}", serde_json::to_string(&summary)?);
    Ok(())
}

fn cmd_report(
    input: &Path,
    out: &Path,
    threshold: f64,
    impurity_limit: f64,
    turbulence_baseline: f64,
    size: (u32, u32),
    tail: TailMode,
) -> Result<()> {
    let trace = trace_io::read_trace(input)?;
    let turbulence = trace.turbulence_series();
    let intervals = detect_intervals_with_policy(&turbulence, threshold, tail.into())?;

    // Statistics first: a run with nothing to report aborts before any
    // file is written.
    let summary = summarize(&intervals, trace.duration())?;
    let retention = impurity_retention(&trace.center_impurity_series())?;

    let style = ReportStyle {
        impurity_limit,
        turbulence_baseline,
        ..ReportStyle::default()
    };
    let fig = control_report_figure(&trace, &intervals, &style);
    draw_report(out, &fig, size)?;

    println!("control pulses: {}", summary.count);
    println!("final center impurity: {:.2e} m^-3", retention.last);
    println!("ratio to initial: {:.2}x", retention.ratio);
    println!("mean pulse spacing: {:.2} s", summary.mean_spacing);
    println!("report written to {}", out.display());
    Ok(())
}

fn rgb(color: PlotColor) -> RGBColor {
    RGBColor(
        ((color.0 >> 16) & 0xFF) as u8,
        ((color.0 >> 8) & 0xFF) as u8,
        (color.0 & 0xFF) as u8,
    )
}

fn x_range(fig: &Figure) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for panel in &fig.panels {
        for series in &panel.series {
            for point in &series.points {
                min = min.min(point[0]);
                max = max.max(point[0]);
            }
        }
    }
    if !min.is_finite() || !max.is_finite() {
        (0.0, 1.0)
    } else if min == max {
        (min, min + 1.0)
    } else {
        (min, max)
    }
}

fn y_range(panel: &Panel) -> (f64, f64) {
    let mut max = f64::NEG_INFINITY;
    for series in &panel.series {
        for point in &series.points {
            max = max.max(point[1]);
        }
    }
    for rule in &panel.rules {
        max = max.max(rule.y);
    }
    if !max.is_finite() || max <= 0.0 {
        (0.0, 1.0)
    } else {
        (0.0, max * 1.1)
    }
}

fn draw_report(path: &Path, fig: &Figure, size: (u32, u32)) -> Result<()> {
    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;
    let areas = root.split_evenly((fig.panels.len(), 1));
    let (x_min, x_max) = x_range(fig);

    for (idx, (panel, area)) in fig.panels.iter().zip(areas.iter()).enumerate() {
        let (y_min, y_max) = y_range(panel);

        let mut builder = ChartBuilder::on(area);
        builder
            .margin(10)
            .x_label_area_size(35)
            .y_label_area_size(70);
        if idx == 0 {
            if let Some(title) = &fig.title {
                builder.caption(title.as_str(), ("sans-serif", 24));
            }
        }
        let mut chart = builder.build_cartesian_2d(x_min..x_max, y_min..y_max)?;

        let mut mesh = chart.configure_mesh();
        if let Some(label) = &panel.y.label {
            mesh.y_desc(label.as_str());
        }
        if idx + 1 == fig.panels.len() {
            if let Some(label) = &fig.x.label {
                mesh.x_desc(label.as_str());
            }
        }
        mesh.draw()?;

        chart.draw_series(fig.spans.iter().map(|span| {
            Rectangle::new(
                [(span.start, y_min), (span.end, y_max)],
                rgb(span.color).mix(f64::from(span.alpha)).filled(),
            )
        }))?;

        for line in &panel.series {
            let color = rgb(line.style.color);
            chart
                .draw_series(LineSeries::new(
                    line.points.iter().map(|p| (p[0], p[1])),
                    color.stroke_width(line.style.width as u32),
                ))?
                .label(line.name.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
        }

        for rule in &panel.rules {
            let color = rgb(rule.style.color);
            chart
                .draw_series(DashedLineSeries::new(
                    [(x_min, rule.y), (x_max, rule.y)].into_iter(),
                    5,
                    5,
                    color.stroke_width(1),
                ))?
                .label(rule.name.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .position(SeriesLabelPosition::UpperRight)
            .draw()?;
    }

    root.present()?;
    Ok(())
}
