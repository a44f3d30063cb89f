//! Command hygiene: min-delta, rate limit, step limit and the fast-recovery path.
//!
//! Decreases are urgent and never rate limited. Increases are spaced by the effective
//! interval and climb in bounded steps.

use crate::config::Params;
use crate::mode::Mode;
use crate::target::Band;
use crate::util::TEMP_EPS;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandReason {
    FirstSend,
    Send,
    UrgentDecrease,
    StepUpLimited,
    WindowForced,
    BelowMinDelta,
    RateLimited,
    StepUpTooSmall,
    WindowForcedHold,
}

impl CommandReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FirstSend => "first_send",
            Self::Send => "send",
            Self::UrgentDecrease => "urgent_decrease",
            Self::StepUpLimited => "step_up_limited",
            Self::WindowForced => "window_forced",
            Self::BelowMinDelta => "below_min_delta",
            Self::RateLimited => "rate_limited",
            Self::StepUpTooSmall => "step_up_too_small",
            Self::WindowForcedHold => "window_forced_hold",
        }
    }
}

impl fmt::Display for CommandReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// First predicate that enabled the relaxed limits, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FastRecoveryReason {
    BoostMode,
    LargeError,
    LargeGap,
    WindowResume,
}

impl FastRecoveryReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BoostMode => "fast_recovery_boost_mode",
            Self::LargeError => "fast_recovery_large_error",
            Self::LargeGap => "fast_recovery_large_gap",
            Self::WindowResume => "fast_recovery_window_resume",
        }
    }
}

impl fmt::Display for FastRecoveryReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the controller remembers about its own transmissions.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SendMemory {
    pub last_sent_c: Option<f64>,
    pub last_sent_at_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommandInputs {
    pub now_ms: u64,
    /// Post-override desired target.
    pub desired_c: f64,
    pub setpoint_c: f64,
    pub error_c: Option<f64>,
    pub mode: Mode,
    pub actuator_setpoint_c: Option<f64>,
    pub window_forced: bool,
    pub window_resume: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    Send { target_c: f64, reason: CommandReason },
    NoOp { reason: CommandReason },
}

impl Action {
    pub fn reason(&self) -> CommandReason {
        match *self {
            Self::Send { reason, .. } | Self::NoOp { reason } => reason,
        }
    }

    pub fn target_c(&self) -> Option<f64> {
        match *self {
            Self::Send { target_c, .. } => Some(target_c),
            Self::NoOp { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommandOutcome {
    pub action: Action,
    pub baseline_c: Option<f64>,
    pub effective_interval_ms: u64,
    pub effective_step_c: f64,
    pub step_limited: bool,
    pub fast_recovery: Option<FastRecoveryReason>,
}

/// Strict per-cycle predicate; no hysteresis.
pub fn fast_recovery(inp: &CommandInputs, p: &Params) -> Option<FastRecoveryReason> {
    let fr = &p.fast_recovery;
    if inp.mode == Mode::Boost {
        Some(FastRecoveryReason::BoostMode)
    } else if inp.error_c.is_some_and(|e| e >= fr.error_threshold_c) {
        Some(FastRecoveryReason::LargeError)
    } else if inp
        .actuator_setpoint_c
        .is_some_and(|a| inp.desired_c - a >= fr.gap_threshold_c)
    {
        Some(FastRecoveryReason::LargeGap)
    } else if inp.window_resume {
        Some(FastRecoveryReason::WindowResume)
    } else {
        None
    }
}

/// Round down to the grid, tolerating float noise just under a grid point.
fn floor_to_step(v: f64, step: f64) -> f64 {
    if step > 0.0 {
        ((v + TEMP_EPS) / step).floor() * step
    } else {
        v
    }
}

/// Decide whether to transmit this cycle. Pure: the caller applies `Send` to its memory.
pub fn decide(inp: &CommandInputs, mem: &SendMemory, p: &Params) -> CommandOutcome {
    let fast = fast_recovery(inp, p);
    let (interval_ms, step_c) = if fast.is_some() {
        (p.fast_recovery.min_interval_ms, p.fast_recovery.max_step_up_c)
    } else {
        (p.command.min_interval_ms, p.command.max_step_up_c)
    };
    let baseline = mem.last_sent_c.or(inp.actuator_setpoint_c);
    let mut step_limited = false;

    let action = if inp.window_forced {
        match baseline {
            Some(b) if (b - inp.desired_c).abs() <= TEMP_EPS => Action::NoOp {
                reason: CommandReason::WindowForcedHold,
            },
            _ => Action::Send {
                target_c: inp.desired_c,
                reason: CommandReason::WindowForced,
            },
        }
    } else {
        match baseline {
            None => Action::Send {
                target_c: inp.desired_c,
                reason: CommandReason::FirstSend,
            },
            Some(base) => {
                let delta = inp.desired_c - base;
                let min_delta = p.command.min_send_delta_c;
                if delta < 0.0 {
                    if -delta + TEMP_EPS >= min_delta {
                        Action::Send {
                            target_c: inp.desired_c,
                            reason: CommandReason::UrgentDecrease,
                        }
                    } else {
                        Action::NoOp {
                            reason: CommandReason::BelowMinDelta,
                        }
                    }
                } else if mem
                    .last_sent_at_ms
                    .is_some_and(|at| inp.now_ms.saturating_sub(at) < interval_ms)
                {
                    Action::NoOp {
                        reason: CommandReason::RateLimited,
                    }
                } else if delta + TEMP_EPS < min_delta {
                    Action::NoOp {
                        reason: CommandReason::BelowMinDelta,
                    }
                } else if delta > step_c + TEMP_EPS {
                    step_limited = true;
                    let band = Band::for_setpoint(inp.setpoint_c, p);
                    let stepped = floor_to_step(base + step_c, p.actuator.resolution_c)
                        .max(band.lo_c)
                        .min(inp.desired_c);
                    if stepped - base + TEMP_EPS < min_delta {
                        Action::NoOp {
                            reason: CommandReason::StepUpTooSmall,
                        }
                    } else {
                        Action::Send {
                            target_c: stepped,
                            reason: CommandReason::StepUpLimited,
                        }
                    }
                } else {
                    Action::Send {
                        target_c: inp.desired_c,
                        reason: CommandReason::Send,
                    }
                }
            }
        }
    };

    tracing::debug!(
        desired_c = inp.desired_c,
        baseline_c = baseline,
        interval_ms,
        step_c,
        fast_recovery = fast.map(FastRecoveryReason::as_str),
        reason = action.reason().as_str(),
        target_c = action.target_c(),
        "command decision"
    );

    CommandOutcome {
        action,
        baseline_c: baseline,
        effective_interval_ms: interval_ms,
        effective_step_c: step_c,
        step_limited,
        fast_recovery: fast,
    }
}
