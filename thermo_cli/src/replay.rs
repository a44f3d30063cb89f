//! Offline replay of a logged signal trace through one controller.

use crate::output::{ModeTally, decision_json, decision_line};
use eyre::WrapErr;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use thermo_config::TraceRow;
use thermo_core::{CycleInputs, RoomReading, RoomSample, ZoneController};

pub fn inputs_for(row: &TraceRow) -> CycleInputs {
    let room = row.room_c.map_or(RoomReading::Unavailable, |t| {
        RoomReading::Fresh(RoomSample::new(t, row.timestamp_ms))
    });
    CycleInputs::new(row.timestamp_ms, room, row.setpoint_c)
        .with_hvac(row.hvac_on)
        .with_window(row.window_open)
        .with_actuator(row.actuator_c)
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct ReplaySummary {
    pub cycles: u64,
    pub commands_sent: u64,
    pub modes: ModeTally,
    /// Stopped early by Ctrl-C.
    pub interrupted: bool,
}

impl ReplaySummary {
    pub fn write(&self, json: bool, out: &mut impl Write) -> std::io::Result<()> {
        if json {
            let v = serde_json::json!({
                "type": "summary",
                "cycles": self.cycles,
                "commands_sent": self.commands_sent,
                "mode_share": self.modes.to_json(),
                "interrupted": self.interrupted,
            });
            return writeln!(out, "{v}");
        }
        let (boost, hold, coast) = self.modes.shares();
        writeln!(out, "cycles:        {}", self.cycles)?;
        writeln!(out, "commands sent: {}", self.commands_sent)?;
        writeln!(
            out,
            "mode share:    boost {:.1}%  hold {:.1}%  coast {:.1}%",
            boost * 100.0,
            hold * 100.0,
            coast * 100.0
        )?;
        if self.interrupted {
            writeln!(out, "(interrupted)")?;
        }
        Ok(())
    }
}

/// Evaluate every row in order. A rejected row aborts the replay with its row number.
pub fn run(
    ctl: &mut ZoneController,
    rows: &[TraceRow],
    json: bool,
    shutdown: &AtomicBool,
    out: &mut impl Write,
) -> eyre::Result<ReplaySummary> {
    let mut summary = ReplaySummary::default();
    for (i, row) in rows.iter().enumerate() {
        if shutdown.load(Ordering::Relaxed) {
            tracing::warn!(row = i + 1, "replay interrupted");
            summary.interrupted = true;
            break;
        }
        // header is line 1
        let d = ctl
            .evaluate(&inputs_for(row))
            .wrap_err_with(|| format!("trace line {}", i + 2))?;
        summary.cycles += 1;
        summary.modes.record(d.mode);
        if d.is_send() {
            summary.commands_sent += 1;
        }
        if json {
            writeln!(out, "{}", decision_json(&d))?;
        } else {
            writeln!(out, "{}", decision_line(&d))?;
        }
    }
    Ok(summary)
}
