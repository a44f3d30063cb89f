//! Reference host: owns a controller plus its I/O and runs one cycle per trigger.
//!
//! Triggers arrive over a `crossbeam-channel` receiver and are handled strictly in
//! order on the calling thread, so controller calls are serialized.

use crate::controller::ZoneController;
use crate::decision::Decision;
use crate::error::Result;
use crate::inputs::{CycleInputs, RoomReading};
use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use thermo_traits::{Actuator, Clock, ContactSensor, RoomSensor};

/// How often `run` wakes up to look at the shutdown flag while idle.
const SHUTDOWN_POLL: Duration = Duration::from_millis(100);

/// Events that cause a cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Trigger {
    Tick,
    SetpointChanged(f64),
    HvacChanged(bool),
    WindowChanged(bool),
    Shutdown,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub cycles: u64,
    pub commands_sent: u64,
    pub send_failures: u64,
    pub rejected_cycles: u64,
}

pub struct ZoneRunner<S, A, C> {
    controller: ZoneController,
    sensor: S,
    actuator: A,
    contact: Option<Box<dyn ContactSensor + Send>>,
    clock: C,
    epoch: Instant,
    setpoint_c: f64,
    hvac_enabled: bool,
    window_open: bool,
    stats: RunStats,
}

impl<S, A, C> ZoneRunner<S, A, C>
where
    S: RoomSensor,
    A: Actuator,
    C: Clock,
{
    /// The controller's timebase starts at `clock.now()`.
    pub fn new(controller: ZoneController, sensor: S, actuator: A, clock: C, setpoint_c: f64) -> Self {
        let epoch = clock.now();
        Self {
            controller,
            sensor,
            actuator,
            contact: None,
            clock,
            epoch,
            setpoint_c,
            hvac_enabled: true,
            window_open: false,
            stats: RunStats::default(),
        }
    }

    /// Poll a contact sensor on every cycle in addition to `WindowChanged` triggers.
    pub fn with_contact(mut self, contact: Box<dyn ContactSensor + Send>) -> Self {
        self.contact = Some(contact);
        self
    }

    pub fn controller(&self) -> &ZoneController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut ZoneController {
        &mut self.controller
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    pub fn stats(&self) -> RunStats {
        self.stats
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.ms_since(self.epoch)
    }

    /// Apply the trigger to the latest inputs and run one cycle.
    /// Returns `Ok(None)` for `Shutdown`.
    pub fn handle(&mut self, trigger: Trigger) -> Result<Option<Decision>> {
        match trigger {
            Trigger::Shutdown => return Ok(None),
            Trigger::Tick => {}
            Trigger::SetpointChanged(c) => self.setpoint_c = c,
            Trigger::HvacChanged(on) => self.hvac_enabled = on,
            Trigger::WindowChanged(open) => self.window_open = open,
        }
        self.cycle().map(Some)
    }

    fn cycle(&mut self) -> Result<Decision> {
        let now_ms = self.now_ms();
        let room = match self.sensor.latest() {
            Ok(s) => RoomReading::from(s),
            Err(e) => {
                tracing::warn!(error = %e, "room sensor read failed");
                RoomReading::Unavailable
            }
        };
        if let Some(contact) = self.contact.as_mut() {
            match contact.is_open() {
                Ok(open) => self.window_open = open,
                Err(e) => tracing::warn!(error = %e, "contact sensor read failed"),
            }
        }
        let inputs = CycleInputs::new(now_ms, room, self.setpoint_c)
            .with_hvac(self.hvac_enabled)
            .with_window(self.window_open)
            .with_actuator(self.actuator.current_target());

        self.stats.cycles += 1;
        let decision = match self.controller.evaluate(&inputs) {
            Ok(d) => d,
            Err(e) => {
                self.stats.rejected_cycles += 1;
                return Err(e);
            }
        };
        if let Some(cmd) = decision.command {
            match self.actuator.set_target(cmd.target_c) {
                Ok(()) => self.stats.commands_sent += 1,
                Err(e) => {
                    self.stats.send_failures += 1;
                    tracing::warn!(target_c = cmd.target_c, error = %e, "actuator command failed");
                }
            }
        }
        Ok(decision)
    }

    /// Drain triggers until `Shutdown`, disconnect, or `shutdown` is set.
    /// Rejected cycles are logged and skipped.
    pub fn run(&mut self, rx: &Receiver<Trigger>, shutdown: &AtomicBool) -> RunStats {
        loop {
            if shutdown.load(Ordering::Relaxed) {
                tracing::info!("shutdown requested");
                break;
            }
            let trigger = match rx.recv_timeout(SHUTDOWN_POLL) {
                Ok(t) => t,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            };
            if trigger == Trigger::Shutdown {
                break;
            }
            if let Err(e) = self.handle(trigger) {
                tracing::warn!(error = %e, "cycle rejected");
            }
        }
        self.stats
    }
}
