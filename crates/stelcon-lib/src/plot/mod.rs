use crate::detectors::pulse::ActivityInterval;
use crate::signal::SimulationTrace;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Axis {
    pub label: Option<String>,
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
pub struct Color(pub u32);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Style {
    pub width: f32,
    pub dash: Option<[f32; 2]>,
    pub color: Color,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineSeries {
    pub name: String,
    pub points: Vec<[f64; 2]>,
    pub style: Style,
}

/// Dashed horizontal reference across a panel (threshold, baseline).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefLine {
    pub name: String,
    pub y: f64,
    pub style: Style,
}

/// Shaded vertical band; drawn across every panel of the figure.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Span {
    pub start: f64,
    pub end: f64,
    pub color: Color,
    pub alpha: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Panel {
    pub y: Axis,
    pub series: Vec<LineSeries>,
    pub rules: Vec<RefLine>,
}

/// Stacked panels sharing one time axis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Figure {
    pub title: Option<String>,
    pub x: Axis,
    pub panels: Vec<Panel>,
    pub spans: Vec<Span>,
}

impl Figure {
    pub fn new(title: impl Into<Option<String>>) -> Self {
        Self {
            title: title.into(),
            x: Axis { label: None },
            panels: Vec::new(),
            spans: Vec::new(),
        }
    }

    pub fn add_panel(&mut self, panel: Panel) {
        self.panels.push(panel);
    }
}

pub fn decimate_points(points: &[[f64; 2]], max_points: usize) -> Vec<[f64; 2]> {
    if points.len() <= max_points {
        return points.to_vec();
    }
    let bucket_size = points.len() as f64 / max_points as f64;
    let mut result = Vec::with_capacity(max_points);
    for i in 0..max_points {
        let start = (i as f64 * bucket_size).floor() as usize;
        if start >= points.len() {
            break;
        }
        result.push(points[start]);
    }
    result
}

/// Styling knobs for the control report figure.
#[derive(Debug, Clone, Copy)]
pub struct ReportStyle {
    /// Dashed limit on the center-impurity panel, in 1e18 m^-3 units.
    pub impurity_limit: f64,
    /// Dashed baseline on the turbulence panel.
    pub turbulence_baseline: f64,
    /// Per-series point budget before bucket decimation.
    pub max_points: usize,
}

impl Default for ReportStyle {
    fn default() -> Self {
        Self {
            impurity_limit: 2.2,
            turbulence_baseline: 4.0,
            max_points: 4096,
        }
    }
}

const CENTER_COLOR: Color = Color(0x0000E0);
const EDGE_COLOR: Color = Color(0xD02020);
const TURBULENCE_COLOR: Color = Color(0x108030);
const LIMIT_COLOR: Color = Color(0xD02020);
const BASELINE_COLOR: Color = Color(0x808080);
const SPAN_COLOR: Color = Color(0xF0D000);

/// Density scale for the impurity panels.
const DENSITY_UNIT: f64 = 1e18;

fn solid(color: Color, width: f32) -> Style {
    Style {
        width,
        dash: None,
        color,
    }
}

fn dashed(color: Color) -> Style {
    Style {
        width: 1.0,
        dash: Some([5.0, 5.0]),
        color,
    }
}

fn channel_points(time: &[f64], values: &[f64], scale: f64, max_points: usize) -> Vec<[f64; 2]> {
    let points: Vec<[f64; 2]> = time
        .iter()
        .zip(values.iter())
        .map(|(&t, &v)| [t, v / scale])
        .collect();
    decimate_points(&points, max_points)
}

/// Build the three-panel control report: center impurity with its limit
/// line, edge impurity, turbulence with its baseline, and the detected
/// pulse intervals shaded across every panel.
pub fn control_report_figure(
    trace: &SimulationTrace,
    intervals: &[ActivityInterval],
    style: &ReportStyle,
) -> Figure {
    let mut fig = Figure::new(Some("W7-X Adaptive Turbulence Control".into()));
    fig.x = Axis {
        label: Some("Time (s)".into()),
    };

    fig.add_panel(Panel {
        y: Axis {
            label: Some("Center n_Z (1e18 m^-3)".into()),
        },
        series: vec![LineSeries {
            name: "Center".into(),
            points: channel_points(
                &trace.time,
                &trace.center_impurity,
                DENSITY_UNIT,
                style.max_points,
            ),
            style: solid(CENTER_COLOR, 2.0),
        }],
        rules: vec![RefLine {
            name: "Threshold".into(),
            y: style.impurity_limit,
            style: dashed(LIMIT_COLOR),
        }],
    });

    fig.add_panel(Panel {
        y: Axis {
            label: Some("Edge n_Z (1e18 m^-3)".into()),
        },
        series: vec![LineSeries {
            name: "Edge".into(),
            points: channel_points(
                &trace.time,
                &trace.edge_impurity,
                DENSITY_UNIT,
                style.max_points,
            ),
            style: solid(EDGE_COLOR, 2.0),
        }],
        rules: Vec::new(),
    });

    fig.add_panel(Panel {
        y: Axis {
            label: Some("Turbulence (m^2/s)".into()),
        },
        series: vec![LineSeries {
            name: "Edge Turbulence".into(),
            points: channel_points(&trace.time, &trace.turbulence, 1.0, style.max_points),
            style: solid(TURBULENCE_COLOR, 2.0),
        }],
        rules: vec![RefLine {
            name: "Baseline".into(),
            y: style.turbulence_baseline,
            style: dashed(BASELINE_COLOR),
        }],
    });

    fig.spans = intervals
        .iter()
        .map(|interval| Span {
            start: interval.start,
            end: interval.end,
            color: SPAN_COLOR,
            alpha: 0.2,
        })
        .collect();

    fig
}
