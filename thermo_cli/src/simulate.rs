//! Closed-loop run of the controller against the simulated room.

use crate::cli::WindowSpan;
use crate::output::{ModeTally, decision_json};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thermo_core::{PersistedState, RunStats, Trigger, ZoneController, ZoneRunner};
use thermo_sim::{SimParams, Simulation};
use thermo_traits::ManualClock;

/// Noise amplitude used when a non-zero seed is given.
const SEEDED_NOISE_C: f64 = 0.05;

#[derive(Debug, Clone, PartialEq)]
pub struct SimOptions {
    pub hours: f64,
    pub setpoint_c: f64,
    pub windows: Vec<WindowSpan>,
    pub seed: u64,
    pub tick_s: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimSummary {
    pub simulated_s: u64,
    pub setpoint_c: f64,
    pub final_room_c: f64,
    /// Largest excursion above the setpoint after first reaching it.
    pub overshoot_c: f64,
    pub stats: RunStats,
    pub rejected_by_actuator: u64,
    pub modes: ModeTally,
    pub interrupted: bool,
    pub snapshot: PersistedState,
}

impl SimSummary {
    pub fn write(&self, json: bool, out: &mut impl Write) -> std::io::Result<()> {
        if json {
            let v = serde_json::json!({
                "type": "summary",
                "simulated_s": self.simulated_s,
                "setpoint_c": self.setpoint_c,
                "final_room_c": self.final_room_c,
                "overshoot_c": self.overshoot_c,
                "cycles": self.stats.cycles,
                "commands_sent": self.stats.commands_sent,
                "send_failures": self.stats.send_failures,
                "rejected_by_actuator": self.rejected_by_actuator,
                "mode_share": self.modes.to_json(),
                "bias_c": self.snapshot.bias_c,
                "interrupted": self.interrupted,
            });
            return writeln!(out, "{v}");
        }
        let (boost, hold, coast) = self.modes.shares();
        writeln!(out, "simulated:     {:.2} h", self.simulated_s as f64 / 3600.0)?;
        writeln!(out, "final room:    {:.2} °C (setpoint {:.1})", self.final_room_c, self.setpoint_c)?;
        writeln!(out, "overshoot:     {:.2} °C", self.overshoot_c)?;
        writeln!(
            out,
            "commands sent: {} of {} cycles ({} failed)",
            self.stats.commands_sent, self.stats.cycles, self.stats.send_failures
        )?;
        writeln!(
            out,
            "mode share:    boost {:.1}%  hold {:.1}%  coast {:.1}%",
            boost * 100.0,
            hold * 100.0,
            coast * 100.0
        )?;
        writeln!(out, "learned bias:  {:+.2} °C", self.snapshot.bias_c)?;
        if self.interrupted {
            writeln!(out, "(interrupted)")?;
        }
        Ok(())
    }
}

pub fn run(
    ctl: ZoneController,
    opts: &SimOptions,
    json: bool,
    shutdown: &AtomicBool,
    out: &mut impl Write,
) -> eyre::Result<SimSummary> {
    let clock = ManualClock::new();
    let params = SimParams {
        seed: opts.seed,
        noise_c: if opts.seed == 0 { 0.0 } else { SEEDED_NOISE_C },
        ..SimParams::default()
    };
    let sim = Simulation::new(params, clock.clone());
    let mut runner = ZoneRunner::new(ctl, sim.sensor(), sim.actuator(), clock, opts.setpoint_c)
        .with_contact(Box::new(sim.window()));

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let total_ms = (opts.hours * 3_600_000.0).round() as u64;
    let tick = Duration::from_secs(opts.tick_s);
    let tick_ms = opts.tick_s * 1000;
    tracing::info!(hours = opts.hours, setpoint_c = opts.setpoint_c, seed = opts.seed, "simulation start");

    let mut modes = ModeTally::default();
    let mut reached = false;
    let mut overshoot_c: f64 = 0.0;
    let mut interrupted = false;
    let mut t_ms = 0;
    while t_ms < total_ms {
        if shutdown.load(Ordering::Relaxed) {
            tracing::warn!(t_ms, "simulation interrupted");
            interrupted = true;
            break;
        }
        sim.set_window(opts.windows.iter().any(|w| w.contains_ms(t_ms)))?;
        if let Some(d) = runner.handle(Trigger::Tick)? {
            modes.record(d.mode);
            if json {
                writeln!(out, "{}", decision_json(&d))?;
            }
        }
        sim.advance(tick)?;
        t_ms += tick_ms;

        let room = sim.room_c()?;
        reached |= room >= opts.setpoint_c;
        if reached {
            overshoot_c = overshoot_c.max(room - opts.setpoint_c);
        }
    }

    Ok(SimSummary {
        simulated_s: t_ms / 1000,
        setpoint_c: opts.setpoint_c,
        final_room_c: sim.room_c()?,
        overshoot_c,
        stats: runner.stats(),
        rejected_by_actuator: sim.rejected_commands()?,
        modes,
        interrupted,
        snapshot: runner.controller().snapshot(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use thermo_core::Params;

    fn opts(hours: f64) -> SimOptions {
        SimOptions {
            hours,
            setpoint_c: 21.0,
            windows: Vec::new(),
            seed: 0,
            tick_s: 60,
        }
    }

    #[test]
    fn warms_the_room_and_stays_quiet() {
        let ctl = ZoneController::new(Params::default()).unwrap();
        let s = run(ctl, &opts(4.0), false, &AtomicBool::new(false), &mut Vec::new()).unwrap();
        assert_eq!(s.stats.cycles, 240);
        assert!(s.final_room_c > 18.0, "{s:?}");
        assert!(s.stats.commands_sent < s.stats.cycles / 2);
        assert_eq!(s.modes.total(), 240);
    }

    #[test]
    fn json_mode_prints_one_line_per_cycle() {
        let ctl = ZoneController::new(Params::default()).unwrap();
        let mut out = Vec::new();
        run(ctl, &opts(0.5), true, &AtomicBool::new(false), &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 30);
    }

    #[test]
    fn open_window_forces_frost_protection() {
        let mut p = Params::default();
        p.window.open_delay_ms = 0;
        let ctl = ZoneController::new(p).unwrap();
        let mut o = opts(1.0);
        o.windows.push(WindowSpan { start_min: 10, end_min: 30 });
        let mut out = Vec::new();
        run(ctl, &o, true, &AtomicBool::new(false), &mut out).unwrap();
        let forced = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str::<serde_json::Value>(l).unwrap())
            .filter(|v| v["window"]["forced"] == true)
            .count();
        assert!(forced >= 19, "{forced}");
    }
}
