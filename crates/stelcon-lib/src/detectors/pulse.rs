use crate::error::PulseError;
use crate::signal::Series;
use serde::{Deserialize, Serialize};

/// One maximal contiguous stretch of samples whose value exceeds the
/// detection threshold, interpreted as a control pulse. The closing
/// boundary is the first sample after the run, so `start < end` always
/// holds and adjacent intervals never touch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActivityInterval {
    pub start: f64,
    pub end: f64,
}

impl ActivityInterval {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// What to do with a run still active at the last sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TailPolicy {
    /// Close the run at the last sample's time.
    #[default]
    CloseAtEnd,
    /// Discard the unterminated run. An indicator-diff detector that only
    /// reacts to falling edges behaves this way.
    Drop,
}

/// Detect pulse intervals with the default tail policy.
pub fn detect_intervals(
    series: &Series,
    threshold: f64,
) -> Result<Vec<ActivityInterval>, PulseError> {
    detect_intervals_with_policy(series, threshold, TailPolicy::default())
}

/// Walk the samples in time order, opening an interval on each
/// inactive-to-active transition and closing it on the next
/// active-to-inactive transition. The walk starts from an implicit
/// inactive state, so a series that begins above the threshold opens at
/// its first sample. A run that would open at the final sample has no
/// extent and is discarded under either policy.
pub fn detect_intervals_with_policy(
    series: &Series,
    threshold: f64,
    tail: TailPolicy,
) -> Result<Vec<ActivityInterval>, PulseError> {
    series.ensure_monotonic()?;

    let mut intervals = Vec::new();
    let mut open_at: Option<f64> = None;
    for sample in &series.samples {
        let active = sample.value > threshold;
        match (open_at, active) {
            (None, true) => open_at = Some(sample.time),
            (Some(start), false) => {
                intervals.push(ActivityInterval {
                    start,
                    end: sample.time,
                });
                open_at = None;
            }
            _ => {}
        }
    }

    if let (Some(start), TailPolicy::CloseAtEnd) = (open_at, tail) {
        if let Some(last) = series.samples.last() {
            if start < last.time {
                intervals.push(ActivityInterval {
                    start,
                    end: last.time,
                });
            }
        }
    }

    Ok(intervals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::Series;

    fn series(points: &[(f64, f64)]) -> Series {
        let times: Vec<f64> = points.iter().map(|p| p.0).collect();
        let values: Vec<f64> = points.iter().map(|p| p.1).collect();
        Series::from_columns(&times, &values)
    }

    #[test]
    fn two_pulses_with_interior_edges() {
        let s = series(&[
            (0.0, 1.0),
            (1.0, 1.0),
            (2.0, 15.0),
            (3.0, 15.0),
            (4.0, 1.0),
            (5.0, 20.0),
            (6.0, 1.0),
        ]);
        let intervals = detect_intervals(&s, 10.0).unwrap();
        assert_eq!(
            intervals,
            vec![
                ActivityInterval { start: 2.0, end: 4.0 },
                ActivityInterval { start: 5.0, end: 6.0 },
            ]
        );
    }

    #[test]
    fn all_quiet_yields_nothing() {
        let s = series(&[(0.0, 1.0), (1.0, 2.0), (2.0, 3.0)]);
        assert!(detect_intervals(&s, 10.0).unwrap().is_empty());
    }

    #[test]
    fn fully_active_series_spans_the_whole_range() {
        let s = series(&[(0.0, 11.0), (1.0, 12.0), (2.0, 13.0)]);
        let intervals = detect_intervals(&s, 10.0).unwrap();
        assert_eq!(
            intervals,
            vec![ActivityInterval { start: 0.0, end: 2.0 }]
        );
    }

    #[test]
    fn drop_policy_discards_a_trailing_run() {
        let s = series(&[(0.0, 1.0), (1.0, 15.0), (2.0, 15.0)]);
        let closed = detect_intervals_with_policy(&s, 10.0, TailPolicy::CloseAtEnd).unwrap();
        assert_eq!(closed, vec![ActivityInterval { start: 1.0, end: 2.0 }]);
        let dropped = detect_intervals_with_policy(&s, 10.0, TailPolicy::Drop).unwrap();
        assert!(dropped.is_empty());
    }

    #[test]
    fn run_opening_at_the_last_sample_has_no_extent() {
        let s = series(&[(0.0, 1.0), (1.0, 1.0), (2.0, 15.0)]);
        assert!(detect_intervals(&s, 10.0).unwrap().is_empty());
    }

    #[test]
    fn boundary_value_is_not_active() {
        // Activity requires strictly exceeding the threshold.
        let s = series(&[(0.0, 10.0), (1.0, 10.0)]);
        assert!(detect_intervals(&s, 10.0).unwrap().is_empty());
    }

    #[test]
    fn intervals_are_sorted_and_disjoint() {
        let s = series(&[
            (0.0, 20.0),
            (0.5, 1.0),
            (1.0, 20.0),
            (1.5, 1.0),
            (2.0, 20.0),
            (2.5, 1.0),
            (3.0, 20.0),
            (3.5, 1.0),
        ]);
        let intervals = detect_intervals(&s, 10.0).unwrap();
        assert_eq!(intervals.len(), 4);
        for pair in intervals.windows(2) {
            assert!(pair[0].end <= pair[1].start);
        }
        for interval in &intervals {
            assert!(interval.start < interval.end);
        }
    }

    #[test]
    fn detection_is_idempotent() {
        let s = series(&[(0.0, 1.0), (1.0, 15.0), (2.0, 1.0)]);
        let first = detect_intervals(&s, 10.0).unwrap();
        let second = detect_intervals(&s, 10.0).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn empty_and_non_monotonic_input_fail() {
        let empty = Series { samples: Vec::new() };
        assert_eq!(
            detect_intervals(&empty, 10.0),
            Err(PulseError::EmptySeries)
        );

        let backwards = series(&[(0.0, 1.0), (2.0, 1.0), (1.0, 1.0)]);
        assert!(matches!(
            detect_intervals(&backwards, 10.0),
            Err(PulseError::NonMonotonicTime { index: 2, .. })
        ));
    }
}
