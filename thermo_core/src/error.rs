use thiserror::Error;

/// Malformed parameters, rejected at construction or reconfiguration.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("configuration error: {0} must be finite")]
    NonFinite(&'static str),
    #[error("configuration error: {min} ({min_value}) must be <= {max} ({max_value})")]
    InvertedRange {
        min: &'static str,
        max: &'static str,
        min_value: f64,
        max_value: f64,
    },
    #[error("configuration error: {0}")]
    OutOfRange(&'static str),
}

/// Inputs to a single evaluation cycle that cannot be used.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InvalidSampleError {
    #[error("invalid sample: room temperature {0} is not finite")]
    NonFiniteTemperature(f64),
    #[error("invalid sample: setpoint {0} is not finite")]
    NonFiniteSetpoint(f64),
    #[error("invalid sample: actuator setpoint {0} is not finite")]
    NonFiniteActuatorSetpoint(f64),
    #[error("invalid sample: sample timestamp {now_ms} ms precedes previous sample at {prev_ms} ms")]
    NonPositiveDt { prev_ms: u64, now_ms: u64 },
    #[error("invalid sample: conflicting readings share timestamp {timestamp_ms} ms")]
    ConflictingDuplicate { timestamp_ms: u64 },
    #[error("invalid sample: evaluation time {now_ms} ms precedes previous cycle at {prev_ms} ms")]
    ClockWentBackwards { prev_ms: u64, now_ms: u64 },
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("persisted state rejected: {0}")]
    PersistedState(String),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
