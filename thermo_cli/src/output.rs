//! Rendering of decisions and run summaries, as text or JSON lines.

use serde_json::{Value, json};
use thermo_core::{Decision, Mode};

/// One JSON object per decision; field names are stable for downstream tooling.
pub fn decision_json(d: &Decision) -> Value {
    let g = &d.diagnostics;
    json!({
        "type": "decision",
        "t_ms": g.now_ms,
        "mode": d.mode.as_str(),
        "reasons": d.reasons.tags(),
        "desired_target_c": d.desired_target_c,
        "command_c": d.command.map(|c| c.target_c),
        "setpoint_c": g.setpoint_c,
        "room_c": g.room_c,
        "error_c": g.error_c,
        "trend_c_per_min": g.trend_c_per_min,
        "predicted_c": g.predicted_c,
        "bias_c": g.bias_c,
        "p_term_c": g.p_term_c,
        "i_small_c": g.i_small_c,
        "calculated_target_c": g.calculated_target_c,
        "effective_interval_s": g.effective_interval_s,
        "effective_step_c": g.effective_step_c,
        "step_limited": g.step_limited,
        "fast_recovery": g.fast_recovery_reason.map(|r| r.as_str()),
        "window": {
            "open": g.window_open,
            "pending": g.window_pending,
            "forced": g.window_forced,
            "open_delay_remaining_s": g.open_delay_remaining_s,
            "close_hold_remaining_s": g.close_hold_remaining_s,
        },
        "actuator_setpoint_c": g.actuator_setpoint_c,
        "heating_enabled": g.heating_enabled,
    })
}

fn opt(v: Option<f64>) -> String {
    v.map_or_else(|| "-".to_string(), |c| format!("{c:.2}"))
}

pub fn decision_line(d: &Decision) -> String {
    let g = &d.diagnostics;
    let cmd = d
        .command
        .map_or_else(|| "-".to_string(), |c| format!("{:.1}", c.target_c));
    format!(
        "t={:>8.1}min room={} set={:.1} mode={:<5} desired={:.1} cmd={} bias={:+.2} trend={:+.3}/min [{}]",
        g.now_ms as f64 / 60_000.0,
        opt(g.room_c),
        g.setpoint_c,
        d.mode.as_str(),
        d.desired_target_c,
        cmd,
        g.bias_c,
        g.trend_c_per_min,
        d.reasons,
    )
}

/// Counts decisions per mode for the time-share summary.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ModeTally {
    pub boost: u64,
    pub hold: u64,
    pub coast: u64,
}

impl ModeTally {
    pub fn record(&mut self, mode: Mode) {
        match mode {
            Mode::Boost => self.boost += 1,
            Mode::Hold => self.hold += 1,
            Mode::Coast => self.coast += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.boost + self.hold + self.coast
    }

    /// Share of cycles spent in each mode, as `(boost, hold, coast)`.
    pub fn shares(&self) -> (f64, f64, f64) {
        let n = self.total();
        if n == 0 {
            return (0.0, 0.0, 0.0);
        }
        let n = n as f64;
        (
            self.boost as f64 / n,
            self.hold as f64 / n,
            self.coast as f64 / n,
        )
    }

    pub fn to_json(self) -> Value {
        let (boost, hold, coast) = self.shares();
        json!({ "boost": boost, "hold": hold, "coast": coast })
    }
}
