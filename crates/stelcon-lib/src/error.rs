use thiserror::Error;

/// Failures of the pulse-analysis functions. I/O failures are reported
/// separately by the io module.
#[derive(Debug, Error, PartialEq)]
pub enum PulseError {
    #[error("series is empty")]
    EmptySeries,
    #[error("sample {index}: time {time} does not increase over previous {prev}")]
    NonMonotonicTime { index: usize, prev: f64, time: f64 },
    #[error("total duration must be positive, got {0}")]
    NonPositiveDuration(f64),
    #[error("no pulses detected, mean spacing is undefined")]
    NoPulses,
    #[error("initial center impurity is zero, retention ratio is undefined")]
    ZeroInitialImpurity,
}
