use thermo_traits::RoomSample;

/// Room temperature as seen by one cycle. Staleness is decided by the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RoomReading {
    Fresh(RoomSample),
    Unavailable,
}

impl RoomReading {
    pub fn sample(&self) -> Option<RoomSample> {
        match *self {
            Self::Fresh(s) => Some(s),
            Self::Unavailable => None,
        }
    }
}

impl From<Option<RoomSample>> for RoomReading {
    fn from(s: Option<RoomSample>) -> Self {
        s.map_or(Self::Unavailable, Self::Fresh)
    }
}

/// Inputs to one evaluation cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleInputs {
    pub now_ms: u64,
    pub room: RoomReading,
    pub setpoint_c: f64,
    pub hvac_enabled: bool,
    pub window_contact_open: bool,
    /// Setpoint the actuator last reported, if known.
    pub actuator_setpoint_c: Option<f64>,
}

impl CycleInputs {
    /// Heating on, window closed, actuator setpoint unknown.
    pub fn new(now_ms: u64, room: RoomReading, setpoint_c: f64) -> Self {
        Self {
            now_ms,
            room,
            setpoint_c,
            hvac_enabled: true,
            window_contact_open: false,
            actuator_setpoint_c: None,
        }
    }

    pub fn with_window(mut self, open: bool) -> Self {
        self.window_contact_open = open;
        self
    }

    pub fn with_hvac(mut self, enabled: bool) -> Self {
        self.hvac_enabled = enabled;
        self
    }

    pub fn with_actuator(mut self, setpoint_c: Option<f64>) -> Self {
        self.actuator_setpoint_c = setpoint_c;
        self
    }
}
