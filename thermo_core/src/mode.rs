//! Three-mode thermal state machine (BOOST / HOLD / COAST).
//!
//! Level-triggered: the next mode is a pure function of the current mode and this
//! cycle's observations. BOOST wins over COAST when both entry guards hold.

use crate::config::{ModeCfg, TrendCfg};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Boost,
    Hold,
    Coast,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Boost => "boost",
            Self::Hold => "hold",
            Self::Coast => "coast",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why the machine is in its current mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModeReason {
    Startup,
    BoostEnter,
    BoostTrendDrop,
    BoostActive,
    BoostTimeout,
    BoostRecovered,
    CoastEnter,
    CoastPredictedOvershoot,
    CoastActive,
    CoastRecovered,
    HoldNormal,
    HoldNearTargetRising,
    HeatingDisabled,
    SensorUnavailable,
}

impl ModeReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Startup => "startup",
            Self::BoostEnter => "boost_enter",
            Self::BoostTrendDrop => "boost_trend_drop",
            Self::BoostActive => "boost_active",
            Self::BoostTimeout => "boost_timeout",
            Self::BoostRecovered => "boost_recovered",
            Self::CoastEnter => "coast_enter",
            Self::CoastPredictedOvershoot => "coast_predicted_overshoot",
            Self::CoastActive => "coast_active",
            Self::CoastRecovered => "coast_recovered",
            Self::HoldNormal => "hold_normal",
            Self::HoldNearTargetRising => "hold_near_target_rising",
            Self::HeatingDisabled => "heating_disabled",
            Self::SensorUnavailable => "sensor_unavailable",
        }
    }
}

impl fmt::Display for ModeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Observations for one transition step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeInputs {
    /// `setpoint - room`; `None` without a fresh sample.
    pub error_c: Option<f64>,
    pub trend_c_per_min: f64,
    pub predicted_c: Option<f64>,
    pub setpoint_c: f64,
    pub elapsed_in_mode_ms: u64,
    pub heating_enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub mode: Mode,
    pub reason: ModeReason,
}

impl Transition {
    fn to(mode: Mode, reason: ModeReason) -> Self {
        Self { mode, reason }
    }
}

fn boost_entry(error_c: f64, trend_c_per_min: f64, m: &ModeCfg, t: &TrendCfg) -> Option<ModeReason> {
    if error_c >= m.boost_error_on_c {
        Some(ModeReason::BoostEnter)
    } else if trend_c_per_min <= t.drop_threshold_c_per_min {
        Some(ModeReason::BoostTrendDrop)
    } else {
        None
    }
}

fn predicts_overshoot(inp: &ModeInputs, t: &TrendCfg) -> bool {
    inp.predicted_c
        .is_some_and(|p| p >= inp.setpoint_c + t.overshoot_guard_c)
}

fn coast_entry(error_c: f64, inp: &ModeInputs, m: &ModeCfg, t: &TrendCfg) -> Option<ModeReason> {
    if error_c <= m.coast_error_on_c {
        Some(ModeReason::CoastEnter)
    } else if predicts_overshoot(inp, t) {
        Some(ModeReason::CoastPredictedOvershoot)
    } else {
        None
    }
}

fn hold_reason(error_c: f64, trend_c_per_min: f64, m: &ModeCfg, t: &TrendCfg) -> ModeReason {
    if error_c.abs() <= m.hold_deadband_c && trend_c_per_min >= t.rise_threshold_c_per_min {
        ModeReason::HoldNearTargetRising
    } else {
        ModeReason::HoldNormal
    }
}

/// Exhaustive transition function.
pub fn next(current: Mode, current_reason: ModeReason, inp: &ModeInputs, m: &ModeCfg, t: &TrendCfg) -> Transition {
    if !inp.heating_enabled {
        return Transition::to(Mode::Coast, ModeReason::HeatingDisabled);
    }
    let Some(error_c) = inp.error_c else {
        return match current {
            Mode::Boost => Transition::to(Mode::Hold, ModeReason::SensorUnavailable),
            Mode::Hold | Mode::Coast => Transition::to(current, ModeReason::SensorUnavailable),
        };
    };
    let trend = inp.trend_c_per_min;

    match current {
        Mode::Hold => {
            if let Some(r) = boost_entry(error_c, trend, m, t) {
                Transition::to(Mode::Boost, r)
            } else if let Some(r) = coast_entry(error_c, inp, m, t) {
                Transition::to(Mode::Coast, r)
            } else {
                Transition::to(Mode::Hold, hold_reason(error_c, trend, m, t))
            }
        }
        Mode::Boost => {
            if inp.elapsed_in_mode_ms >= m.boost_max_ms {
                Transition::to(Mode::Hold, ModeReason::BoostTimeout)
            } else if boost_entry(error_c, trend, m, t).is_some() {
                Transition::to(Mode::Boost, ModeReason::BoostActive)
            } else if let Some(r) = coast_entry(error_c, inp, m, t) {
                Transition::to(Mode::Coast, r)
            } else if error_c <= m.boost_error_off_c && trend > t.drop_threshold_c_per_min {
                Transition::to(Mode::Hold, ModeReason::BoostRecovered)
            } else {
                Transition::to(Mode::Boost, ModeReason::BoostActive)
            }
        }
        Mode::Coast => {
            if let Some(r) = boost_entry(error_c, trend, m, t) {
                Transition::to(Mode::Boost, r)
            } else if error_c >= m.coast_error_off_c && !predicts_overshoot(inp, t) {
                Transition::to(Mode::Hold, ModeReason::CoastRecovered)
            } else if current_reason == ModeReason::HeatingDisabled {
                // heating came back but the room is still too warm
                Transition::to(Mode::Coast, ModeReason::CoastEnter)
            } else {
                Transition::to(Mode::Coast, ModeReason::CoastActive)
            }
        }
    }
}
