//! Error types shared by every core operation

use core::fmt;

use thiserror_no_std::Error;

/// Which calibration list a configuration error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationKind {
    Dry,
    Wet,
}

impl fmt::Display for CalibrationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dry => f.write_str("dry"),
            Self::Wet => f.write_str("wet"),
        }
    }
}

/// Radio collaborator call that was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioOperation {
    Configure,
    Start,
    Stop,
    UpdateServiceData,
}

impl fmt::Display for RadioOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configure => f.write_str("advertisement configuration"),
            Self::Start => f.write_str("advertisement start"),
            Self::Stop => f.write_str("advertisement stop"),
            Self::UpdateServiceData => f.write_str("service data update"),
        }
    }
}

/// Misconfiguration detected while parsing settings or building the store.
///
/// Sensor numbers in these variants are 1-based, matching how sensors are
/// numbered in the settings and in the logs.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("expected {expected} {kind} calibrations, got {actual}")]
    CalibrationCount {
        kind: CalibrationKind,
        expected: usize,
        actual: usize,
    },
    #[error("sensor {sensor} has identical dry and wet calibration ({value})")]
    IdenticalCalibration { sensor: usize, value: u16 },
    #[error("failed to parse {kind} calibration for sensor {sensor}")]
    InvalidCalibration { kind: CalibrationKind, sensor: usize },
    #[error("failed to parse pin number for sensor {sensor}")]
    InvalidPin { sensor: usize },
    #[error("no sensors configured")]
    NoSensors,
    #[error("{count} sensors configured, at most {max} are supported")]
    TooManySensors { count: usize, max: usize },
    #[error("failed to parse broadcast interval")]
    InvalidDuration,
    #[error("local name is longer than {max} bytes")]
    LocalNameTooLong { max: usize },
    #[error("payload is laid out for {expected} sensors but the store has {actual}")]
    PayloadLayout { expected: usize, actual: usize },
}

/// Error returned by store, encoder and broadcaster operations.
///
/// `Config` and `Radio` are unrecoverable for the current run: the top-level
/// driver logs them and rebuilds everything. `Index` and `NotYetSampled` mean
/// the caller broke an invariant.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorError {
    #[error("configuration error: {0}")]
    Config(ConfigError),
    #[error("sensor index {index} is out of range for {count} sensors")]
    Index { index: usize, count: usize },
    #[error("sensor index {sensor} has not been sampled yet")]
    NotYetSampled { sensor: usize },
    #[error("radio rejected the {operation}")]
    Radio { operation: RadioOperation },
}

impl From<ConfigError> for MonitorError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}
