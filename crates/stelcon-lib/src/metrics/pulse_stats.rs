use crate::detectors::pulse::ActivityInterval;
use crate::error::PulseError;
use crate::signal::Series;
use serde::{Deserialize, Serialize};

/// Intervention statistics over one analyzed run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PulseSummary {
    pub count: usize,
    /// Average gap between successive pulses: total duration / count.
    pub mean_spacing: f64,
    /// Summed pulse length.
    pub total_active: f64,
    pub duty_cycle: f64,
}

/// Initial/final level of a monitored channel across a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpurityStats {
    pub initial: f64,
    pub last: f64,
    pub ratio: f64,
}

/// Summarize detected pulses over the span they were searched in.
/// `total_duration` comes from the caller (normally the trace's own time
/// span) rather than any fixed constant.
pub fn summarize(
    intervals: &[ActivityInterval],
    total_duration: f64,
) -> Result<PulseSummary, PulseError> {
    if !(total_duration > 0.0) {
        return Err(PulseError::NonPositiveDuration(total_duration));
    }
    if intervals.is_empty() {
        return Err(PulseError::NoPulses);
    }
    let count = intervals.len();
    let total_active: f64 = intervals.iter().map(ActivityInterval::duration).sum();
    Ok(PulseSummary {
        count,
        mean_spacing: total_duration / count as f64,
        total_active,
        duty_cycle: total_active / total_duration,
    })
}

/// Final level of a channel relative to its starting level.
pub fn impurity_retention(series: &Series) -> Result<ImpurityStats, PulseError> {
    let first = series.samples.first().ok_or(PulseError::EmptySeries)?;
    let last = series.samples.last().ok_or(PulseError::EmptySeries)?;
    if first.value == 0.0 {
        return Err(PulseError::ZeroInitialImpurity);
    }
    Ok(ImpurityStats {
        initial: first.value,
        last: last.value,
        ratio: last.value / first.value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_spacing_divides_duration_by_count() {
        let intervals = [
            ActivityInterval { start: 2.0, end: 4.0 },
            ActivityInterval { start: 5.0, end: 6.0 },
        ];
        let summary = summarize(&intervals, 10.0).unwrap();
        assert_eq!(summary.count, 2);
        assert_eq!(summary.mean_spacing, 5.0);
        assert_eq!(summary.total_active, 3.0);
        assert_eq!(summary.duty_cycle, 0.3);
    }

    #[test]
    fn zero_pulses_is_an_explicit_error() {
        assert_eq!(summarize(&[], 10.0), Err(PulseError::NoPulses));
    }

    #[test]
    fn non_positive_duration_is_rejected() {
        let intervals = [ActivityInterval { start: 0.0, end: 1.0 }];
        assert_eq!(
            summarize(&intervals, 0.0),
            Err(PulseError::NonPositiveDuration(0.0))
        );
        assert_eq!(
            summarize(&intervals, -1.0),
            Err(PulseError::NonPositiveDuration(-1.0))
        );
    }

    #[test]
    fn retention_ratio_is_final_over_initial() {
        let series = Series::from_columns(&[0.0, 1.0, 2.0], &[2e17, 5e17, 8e17]);
        let stats = impurity_retention(&series).unwrap();
        assert_eq!(stats.initial, 2e17);
        assert_eq!(stats.last, 8e17);
        assert_eq!(stats.ratio, 4.0);
    }

    #[test]
    fn retention_guards_empty_and_zero_start() {
        let empty = Series { samples: Vec::new() };
        assert_eq!(impurity_retention(&empty), Err(PulseError::EmptySeries));

        let zero = Series::from_columns(&[0.0, 1.0], &[0.0, 1e18]);
        assert_eq!(
            impurity_retention(&zero),
            Err(PulseError::ZeroInitialImpurity)
        );
    }
}
