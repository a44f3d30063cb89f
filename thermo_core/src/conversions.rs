//! `From` implementations bridging `thermo_config` types to the runtime `Params`.
//!
//! TOML carries seconds; the engine runs on milliseconds.

use crate::config::{
    ActuatorCfg, BiasCfg, CommandCfg, ComfortCfg, FastRecoveryCfg, ModeCfg, Params, TrendCfg,
    WindowCfg,
};
use crate::util::MILLIS_PER_SEC;

fn s_to_ms(s: u64) -> u64 {
    s.saturating_mul(MILLIS_PER_SEC)
}

// ── ActuatorCfg ──────────────────────────────────────────────────────────────

impl From<&thermo_config::ActuatorCfg> for ActuatorCfg {
    fn from(c: &thermo_config::ActuatorCfg) -> Self {
        Self {
            min_c: c.min_c,
            max_c: c.max_c,
            max_offset_c: c.max_offset_c,
            resolution_c: c.resolution_c,
        }
    }
}

// ── ComfortCfg ───────────────────────────────────────────────────────────────

impl From<&thermo_config::ComfortCfg> for ComfortCfg {
    fn from(c: &thermo_config::ComfortCfg) -> Self {
        Self {
            kp: c.kp,
            ki_small: c.ki_small,
            i_small_min_c: c.i_small_min_c,
            i_small_max_c: c.i_small_max_c,
        }
    }
}

// ── BiasCfg ──────────────────────────────────────────────────────────────────

impl From<&thermo_config::BiasCfg> for BiasCfg {
    fn from(c: &thermo_config::BiasCfg) -> Self {
        Self {
            tau_s: c.tau_s,
            deadband_c: c.deadband_c,
            trend_max_c_per_min: c.trend_max_c_per_min,
            rate_limit_c_per_h: c.rate_limit_c_per_h,
            min_c: c.min_c,
            max_c: c.max_c,
        }
    }
}

// ── TrendCfg ─────────────────────────────────────────────────────────────────

impl From<&thermo_config::TrendCfg> for TrendCfg {
    fn from(c: &thermo_config::TrendCfg) -> Self {
        Self {
            alpha: c.alpha,
            drop_threshold_c_per_min: c.drop_threshold_c_per_min,
            rise_threshold_c_per_min: c.rise_threshold_c_per_min,
            predict_horizon_ms: s_to_ms(c.predict_horizon_s),
            overshoot_guard_c: c.overshoot_guard_c,
        }
    }
}

// ── ModeCfg ──────────────────────────────────────────────────────────────────

impl From<&thermo_config::ModesCfg> for ModeCfg {
    fn from(c: &thermo_config::ModesCfg) -> Self {
        Self {
            hold_deadband_c: c.hold_deadband_c,
            boost_error_on_c: c.boost_error_on_c,
            boost_error_off_c: c.boost_error_off_c,
            boost_target_c: c.boost_target_c,
            boost_max_ms: s_to_ms(c.boost_max_s),
            coast_error_on_c: c.coast_error_on_c,
            coast_error_off_c: c.coast_error_off_c,
            coast_target_c: c.coast_target_c,
            coast_offset_c: c.coast_offset_c,
        }
    }
}

// ── CommandCfg / FastRecoveryCfg ─────────────────────────────────────────────

impl From<&thermo_config::CommandCfg> for CommandCfg {
    fn from(c: &thermo_config::CommandCfg) -> Self {
        Self {
            min_send_delta_c: c.min_send_delta_c,
            min_interval_ms: s_to_ms(c.min_interval_s),
            max_step_up_c: c.max_step_up_c,
        }
    }
}

impl From<&thermo_config::FastRecoveryCfg> for FastRecoveryCfg {
    fn from(c: &thermo_config::FastRecoveryCfg) -> Self {
        Self {
            min_interval_ms: s_to_ms(c.min_interval_s),
            max_step_up_c: c.max_step_up_c,
            error_threshold_c: c.error_threshold_c,
            gap_threshold_c: c.gap_threshold_c,
        }
    }
}

// ── WindowCfg ────────────────────────────────────────────────────────────────

impl From<&thermo_config::WindowCfg> for WindowCfg {
    fn from(c: &thermo_config::WindowCfg) -> Self {
        Self {
            enabled: c.enabled,
            open_delay_ms: s_to_ms(c.open_delay_s),
            close_delay_ms: s_to_ms(c.close_delay_s),
            frost_protection_c: c.frost_protection_c,
        }
    }
}

// ── Params ───────────────────────────────────────────────────────────────────

impl From<&thermo_config::Config> for Params {
    fn from(c: &thermo_config::Config) -> Self {
        Self {
            actuator: (&c.actuator).into(),
            comfort: (&c.comfort).into(),
            bias: (&c.bias).into(),
            trend: (&c.trend).into(),
            modes: (&c.modes).into(),
            command: (&c.command).into(),
            fast_recovery: (&c.fast_recovery).into(),
            window: (&c.window).into(),
        }
    }
}
