pub mod clock;

pub use clock::{Clock, ManualClock, MonotonicClock};

/// One room temperature reading, stamped with the time it was taken (ms on the host timebase).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoomSample {
    pub temperature_c: f64,
    pub timestamp_ms: u64,
}

impl RoomSample {
    pub fn new(temperature_c: f64, timestamp_ms: u64) -> Self {
        Self {
            temperature_c,
            timestamp_ms,
        }
    }
}

/// Ground-truth room sensor. `Ok(None)` means no fresh sample is available.
pub trait RoomSensor {
    fn latest(&mut self) -> Result<Option<RoomSample>, Box<dyn std::error::Error + Send + Sync>>;
}

/// Heating head whose only input is a target temperature.
pub trait Actuator {
    fn set_target(&mut self, target_c: f64)
    -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Setpoint the actuator currently reports, if known.
    fn current_target(&self) -> Option<f64>;
}

/// Window/door contact.
pub trait ContactSensor {
    fn is_open(&mut self) -> Result<bool, Box<dyn std::error::Error + Send + Sync>>;
}
