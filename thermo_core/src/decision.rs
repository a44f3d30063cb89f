//! Per-cycle output: the command (if any), its reasons and the tuning diagnostics.

use crate::command::{CommandReason, FastRecoveryReason};
use crate::mode::{Mode, ModeReason};
use crate::window::WindowReason;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SendTarget {
    pub target_c: f64,
    pub reason: CommandReason,
}

/// Reason tags attached to every decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reasons {
    pub mode: ModeReason,
    pub command: CommandReason,
    pub fast_recovery: Option<FastRecoveryReason>,
    pub window: Option<WindowReason>,
}

impl Reasons {
    pub fn tags(&self) -> Vec<&'static str> {
        let mut tags = vec![self.mode.as_str(), self.command.as_str()];
        if let Some(r) = self.fast_recovery {
            tags.push(r.as_str());
        }
        if let Some(r) = self.window {
            tags.push(r.as_str());
        }
        tags
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags().contains(&tag)
    }
}

impl fmt::Display for Reasons {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tags().join("|"))
    }
}

/// Everything needed to tune the controller offline from logged cycles.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostics {
    pub now_ms: u64,
    pub setpoint_c: f64,
    pub room_c: Option<f64>,
    pub error_c: Option<f64>,
    pub trend_c_per_s: f64,
    pub trend_c_per_min: f64,
    pub predicted_c: Option<f64>,
    pub bias_c: f64,
    pub p_term_c: f64,
    pub i_small_c: f64,
    pub mode: Mode,
    pub mode_reason: ModeReason,
    /// Target Calculator output, before the window veto.
    pub calculated_target_c: f64,
    pub desired_target_c: f64,
    pub command_target_c: Option<f64>,
    pub effective_interval_s: f64,
    pub effective_step_c: f64,
    pub step_limited: bool,
    pub fast_recovery_active: bool,
    pub fast_recovery_reason: Option<FastRecoveryReason>,
    pub window_open: bool,
    pub window_pending: bool,
    pub window_forced: bool,
    pub open_delay_remaining_s: Option<f64>,
    pub close_hold_remaining_s: Option<f64>,
    pub actuator_setpoint_c: Option<f64>,
    pub heating_enabled: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    /// Post-override desired target handed to the command policy.
    pub desired_target_c: f64,
    pub command: Option<SendTarget>,
    pub mode: Mode,
    pub reasons: Reasons,
    pub diagnostics: Diagnostics,
}

impl Decision {
    pub fn is_send(&self) -> bool {
        self.command.is_some()
    }
}
