use crate::error::PulseError;
use serde::{Deserialize, Serialize};

/// One timestamped observation of a monitored plasma signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Seconds since simulation start, strictly increasing across a series.
    pub time: f64,
    pub value: f64,
}

/// Time-ordered series of samples.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Series {
    pub samples: Vec<Sample>,
}

impl Series {
    pub fn from_columns(times: &[f64], values: &[f64]) -> Self {
        let samples = times
            .iter()
            .zip(values.iter())
            .map(|(&time, &value)| Sample { time, value })
            .collect();
        Self { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Span between first and last sample.
    pub fn duration(&self) -> f64 {
        match (self.samples.first(), self.samples.last()) {
            (Some(first), Some(last)) => last.time - first.time,
            _ => 0.0,
        }
    }

    /// Verify the series is non-empty with strictly increasing timestamps.
    pub fn ensure_monotonic(&self) -> Result<(), PulseError> {
        if self.samples.is_empty() {
            return Err(PulseError::EmptySeries);
        }
        for (index, pair) in self.samples.windows(2).enumerate() {
            if pair[1].time <= pair[0].time {
                return Err(PulseError::NonMonotonicTime {
                    index: index + 1,
                    prev: pair[0].time,
                    time: pair[1].time,
                });
            }
        }
        Ok(())
    }
}

/// Column-oriented record of one simulation run: the table the simulator
/// writes and the report reads back.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulationTrace {
    pub time: Vec<f64>,
    pub center_impurity: Vec<f64>,
    pub edge_impurity: Vec<f64>,
    pub turbulence: Vec<f64>,
}

impl SimulationTrace {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn duration(&self) -> f64 {
        match (self.time.first(), self.time.last()) {
            (Some(first), Some(last)) => last - first,
            _ => 0.0,
        }
    }

    pub fn center_impurity_series(&self) -> Series {
        Series::from_columns(&self.time, &self.center_impurity)
    }

    pub fn edge_impurity_series(&self) -> Series {
        Series::from_columns(&self.time, &self.edge_impurity)
    }

    pub fn turbulence_series(&self) -> Series {
        Series::from_columns(&self.time, &self.turbulence)
    }

    /// Look up a recorded channel by its CSV column name.
    pub fn channel(&self, name: &str) -> Option<Series> {
        match name {
            "center_impurity" => Some(self.center_impurity_series()),
            "edge_impurity" => Some(self.edge_impurity_series()),
            "turbulence" => Some(self.turbulence_series()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_spans_first_to_last() {
        let series = Series::from_columns(&[0.5, 1.0, 2.5], &[1.0, 2.0, 3.0]);
        assert_eq!(series.duration(), 2.0);
        assert!(series.ensure_monotonic().is_ok());
    }

    #[test]
    fn empty_series_is_rejected() {
        let series = Series { samples: Vec::new() };
        assert_eq!(series.ensure_monotonic(), Err(PulseError::EmptySeries));
    }

    #[test]
    fn non_increasing_time_is_rejected() {
        let series = Series::from_columns(&[0.0, 1.0, 1.0], &[0.0, 0.0, 0.0]);
        assert_eq!(
            series.ensure_monotonic(),
            Err(PulseError::NonMonotonicTime {
                index: 2,
                prev: 1.0,
                time: 1.0
            })
        );
    }

    #[test]
    fn trace_channels_share_the_time_base() {
        let trace = SimulationTrace {
            time: vec![0.0, 1.0],
            center_impurity: vec![1e18, 2e18],
            edge_impurity: vec![3e17, 4e17],
            turbulence: vec![1.5, 7.5],
        };
        let turb = trace.channel("turbulence").unwrap();
        assert_eq!(turb.samples[1].time, 1.0);
        assert_eq!(turb.samples[1].value, 7.5);
        assert!(trace.channel("electron_temp").is_none());
    }
}
