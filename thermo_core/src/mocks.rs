//! Test and helper mocks for thermo_core

use thermo_traits::{Actuator, ContactSensor, RoomSample, RoomSensor};

/// Sensor fed from a queue; `None` entries mean "no fresh sample".
#[derive(Debug, Default)]
pub struct ScriptedSensor {
    readings: std::collections::VecDeque<Option<RoomSample>>,
}

impl ScriptedSensor {
    pub fn new(readings: impl IntoIterator<Item = Option<RoomSample>>) -> Self {
        Self {
            readings: readings.into_iter().collect(),
        }
    }

    pub fn push(&mut self, reading: Option<RoomSample>) {
        self.readings.push_back(reading);
    }
}

impl RoomSensor for ScriptedSensor {
    fn latest(&mut self) -> Result<Option<RoomSample>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.readings.pop_front().flatten())
    }
}

/// Actuator that records every target it was sent. Optionally fails every send.
#[derive(Debug, Default)]
pub struct RecordingActuator {
    pub sent: Vec<f64>,
    pub fail: bool,
}

impl Actuator for RecordingActuator {
    fn set_target(&mut self, target_c: f64) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if self.fail {
            return Err(Box::new(std::io::Error::other("actuator unreachable")));
        }
        self.sent.push(target_c);
        Ok(())
    }

    fn current_target(&self) -> Option<f64> {
        self.sent.last().copied()
    }
}

/// Contact with a fixed state.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedContact(pub bool);

impl ContactSensor for FixedContact {
    fn is_open(&mut self) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.0)
    }
}
