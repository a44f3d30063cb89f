//! Lumped room/radiator model for exercising the controller without hardware.
//!
//! The heating head regulates its own internal temperature, which reads warmer than
//! the room by a mounting offset plus a share of the radiator heat. Its valve follows
//! with a first-order lag. The room gains heat from the radiator and loses it to the
//! outside, much faster with the window open.

pub mod error;

pub use error::{Result, SimError};

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use thermo_traits::{Actuator, ContactSensor, ManualClock, RoomSample, RoomSensor};

const MS_PER_HOUR: u64 = 3_600_000;
const PHYSICS_STEP_MS: u64 = 1_000;

#[derive(Debug, Clone, PartialEq)]
pub struct SimParams {
    pub initial_room_c: f64,
    pub outside_c: f64,
    /// Head sensor reads this much warmer than the room with the valve closed.
    pub mounting_offset_c: f64,
    /// Extra head warming at a fully open valve.
    pub head_coupling_c: f64,
    /// Head proportional band: valve fully open `band` below its target.
    pub head_band_c: f64,
    pub valve_tau_s: f64,
    /// Room heating rate at a fully open valve (°C/s).
    pub heat_gain_c_per_s: f64,
    /// Loss coefficient toward outside (1/s).
    pub loss_per_s: f64,
    pub window_loss_per_s: f64,
    /// Peak amplitude of deterministic sensor noise.
    pub noise_c: f64,
    pub seed: u64,
    /// Accepted commands per rolling hour; 0 means unlimited.
    pub quota_per_hour: u32,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            initial_room_c: 18.0,
            outside_c: 5.0,
            mounting_offset_c: 1.0,
            head_coupling_c: 1.5,
            head_band_c: 1.0,
            valve_tau_s: 600.0,
            heat_gain_c_per_s: 0.0008,
            loss_per_s: 0.000_04,
            window_loss_per_s: 0.000_4,
            noise_c: 0.0,
            seed: 0,
            quota_per_hour: 0,
        }
    }
}

/// What the room sensor does on the next read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SensorStatus {
    #[default]
    Healthy,
    /// Reads succeed but report no fresh sample.
    NoSample,
    Offline,
}

#[derive(Debug)]
struct RoomModel {
    params: SimParams,
    room_c: f64,
    valve: f64,
    head_target_c: Option<f64>,
    window_open: bool,
    sensor: SensorStatus,
    time_ms: u64,
    last_sample: Option<RoomSample>,
    sample_seq: u64,
    sends: VecDeque<u64>,
    rejected: u64,
    peak_room_c: f64,
}

impl RoomModel {
    fn head_sensed_c(&self) -> f64 {
        self.room_c + self.params.mounting_offset_c + self.params.head_coupling_c * self.valve
    }

    fn step(&mut self, dt_s: f64) {
        let p = &self.params;
        let want = match self.head_target_c {
            Some(t) => ((t - self.head_sensed_c()) / p.head_band_c).clamp(0.0, 1.0),
            None => 0.0,
        };
        self.valve += (want - self.valve) * (dt_s / p.valve_tau_s).min(1.0);
        let mut loss = p.loss_per_s;
        if self.window_open {
            loss += p.window_loss_per_s;
        }
        self.room_c += dt_s * (p.heat_gain_c_per_s * self.valve - loss * (self.room_c - p.outside_c));
        self.peak_room_c = self.peak_room_c.max(self.room_c);
    }

    #[allow(clippy::cast_precision_loss)]
    fn noise(&self) -> f64 {
        if self.params.noise_c == 0.0 {
            return 0.0;
        }
        let x = self.params.seed as f64 * 12.9898 + self.sample_seq as f64 * 78.233;
        x.sin() * self.params.noise_c
    }
}

/// Owner of the shared model and the manual clock that drives it.
#[derive(Debug, Clone)]
pub struct Simulation {
    shared: Arc<Mutex<RoomModel>>,
    clock: ManualClock,
}

fn lock(shared: &Mutex<RoomModel>) -> Result<MutexGuard<'_, RoomModel>> {
    shared.lock().map_err(|_| SimError::Poisoned)
}

impl Simulation {
    /// Simulated time starts at the clock's current position.
    pub fn new(params: SimParams, clock: ManualClock) -> Self {
        let model = RoomModel {
            room_c: params.initial_room_c,
            peak_room_c: params.initial_room_c,
            params,
            valve: 0.0,
            head_target_c: None,
            window_open: false,
            sensor: SensorStatus::Healthy,
            time_ms: 0,
            last_sample: None,
            sample_seq: 0,
            sends: VecDeque::new(),
            rejected: 0,
        };
        Self {
            shared: Arc::new(Mutex::new(model)),
            clock,
        }
    }

    pub fn clock(&self) -> ManualClock {
        self.clock.clone()
    }

    /// Integrate the physics over `d` and move the clock with it.
    pub fn advance(&self, d: Duration) -> Result<()> {
        let mut m = lock(&self.shared)?;
        let total_ms = u64::try_from(d.as_millis()).unwrap_or(u64::MAX);
        let mut done = 0;
        while done < total_ms {
            let step_ms = PHYSICS_STEP_MS.min(total_ms - done);
            #[allow(clippy::cast_precision_loss)]
            m.step(step_ms as f64 / 1000.0);
            done += step_ms;
        }
        m.time_ms = m.time_ms.saturating_add(total_ms);
        self.clock.advance(d);
        Ok(())
    }

    pub fn room_c(&self) -> Result<f64> {
        Ok(lock(&self.shared)?.room_c)
    }

    pub fn peak_room_c(&self) -> Result<f64> {
        Ok(lock(&self.shared)?.peak_room_c)
    }

    pub fn valve(&self) -> Result<f64> {
        Ok(lock(&self.shared)?.valve)
    }

    pub fn head_target_c(&self) -> Result<Option<f64>> {
        Ok(lock(&self.shared)?.head_target_c)
    }

    /// Commands refused by the quota so far.
    pub fn rejected_commands(&self) -> Result<u64> {
        Ok(lock(&self.shared)?.rejected)
    }

    pub fn set_window(&self, open: bool) -> Result<()> {
        let mut m = lock(&self.shared)?;
        if m.window_open != open {
            tracing::debug!(open, time_ms = m.time_ms, "sim window");
        }
        m.window_open = open;
        Ok(())
    }

    pub fn set_sensor(&self, status: SensorStatus) -> Result<()> {
        lock(&self.shared)?.sensor = status;
        Ok(())
    }

    pub fn sensor(&self) -> SimRoomSensor {
        SimRoomSensor {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn actuator(&self) -> SimActuator {
        SimActuator {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn window(&self) -> SimWindow {
        SimWindow {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Milliseconds of simulated time since `new`.
    pub fn time_ms(&self) -> Result<u64> {
        Ok(lock(&self.shared)?.time_ms)
    }
}

/// Room sensor; repeated reads at one instant return the same sample.
#[derive(Debug, Clone)]
pub struct SimRoomSensor {
    shared: Arc<Mutex<RoomModel>>,
}

impl RoomSensor for SimRoomSensor {
    fn latest(&mut self) -> std::result::Result<Option<RoomSample>, Box<dyn std::error::Error + Send + Sync>> {
        let mut m = lock(&self.shared)?;
        match m.sensor {
            SensorStatus::Offline => return Err(Box::new(SimError::SensorOffline)),
            SensorStatus::NoSample => return Ok(None),
            SensorStatus::Healthy => {}
        }
        if let Some(s) = m.last_sample {
            if s.timestamp_ms == m.time_ms {
                return Ok(Some(s));
            }
        }
        m.sample_seq += 1;
        let sample = RoomSample::new(m.room_c + m.noise(), m.time_ms);
        m.last_sample = Some(sample);
        Ok(Some(sample))
    }
}

/// Heating head with a rolling-hour command quota.
#[derive(Debug, Clone)]
pub struct SimActuator {
    shared: Arc<Mutex<RoomModel>>,
}

impl Actuator for SimActuator {
    fn set_target(&mut self, target_c: f64) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut m = lock(&self.shared)?;
        let now = m.time_ms;
        while m.sends.front().is_some_and(|&t| now.saturating_sub(t) >= MS_PER_HOUR) {
            m.sends.pop_front();
        }
        let limit = m.params.quota_per_hour;
        if limit > 0 && m.sends.len() >= limit as usize {
            m.rejected += 1;
            return Err(Box::new(SimError::QuotaExceeded { limit }));
        }
        m.sends.push_back(now);
        m.head_target_c = Some(target_c);
        Ok(())
    }

    fn current_target(&self) -> Option<f64> {
        self.shared.lock().ok().and_then(|m| m.head_target_c)
    }
}

#[derive(Debug, Clone)]
pub struct SimWindow {
    shared: Arc<Mutex<RoomModel>>,
}

impl ContactSensor for SimWindow {
    fn is_open(&mut self) -> std::result::Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        Ok(lock(&self.shared)?.window_open)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_cools_towards_outside_without_heat() {
        let sim = Simulation::new(SimParams::default(), ManualClock::new());
        let start = sim.room_c().unwrap();
        sim.advance(Duration::from_secs(3600)).unwrap();
        let after = sim.room_c().unwrap();
        assert!(after < start);
        assert!(after > SimParams::default().outside_c);
    }

    #[test]
    fn open_window_cools_faster() {
        let closed = Simulation::new(SimParams::default(), ManualClock::new());
        let open = Simulation::new(SimParams::default(), ManualClock::new());
        open.set_window(true).unwrap();
        closed.advance(Duration::from_secs(1800)).unwrap();
        open.advance(Duration::from_secs(1800)).unwrap();
        assert!(open.room_c().unwrap() < closed.room_c().unwrap() - 0.5);
    }

    #[test]
    fn heating_raises_room_with_lag() {
        let sim = Simulation::new(SimParams::default(), ManualClock::new());
        sim.actuator().set_target(25.0).unwrap();
        sim.advance(Duration::from_secs(60)).unwrap();
        assert!(sim.valve().unwrap() < 0.2);
        sim.advance(Duration::from_secs(2 * 3600)).unwrap();
        assert!(sim.room_c().unwrap() > 18.0);
    }

    #[test]
    fn sensor_repeats_sample_within_one_instant() {
        let mut p = SimParams::default();
        p.noise_c = 0.2;
        p.seed = 7;
        let sim = Simulation::new(p, ManualClock::new());
        let mut sensor = sim.sensor();
        sim.advance(Duration::from_secs(30)).unwrap();
        let a = sensor.latest().unwrap().unwrap();
        let b = sensor.latest().unwrap().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.timestamp_ms, 30_000);
    }
}
