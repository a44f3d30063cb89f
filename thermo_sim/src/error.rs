use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SimError {
    #[error("actuator quota exceeded: {limit} commands per hour")]
    QuotaExceeded { limit: u32 },
    #[error("simulation state lock poisoned")]
    Poisoned,
    #[error("sensor offline")]
    SensorOffline,
}

pub type Result<T> = std::result::Result<T, SimError>;
