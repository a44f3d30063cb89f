//! Slow learner for the persistent sensor/actuator offset.

use crate::config::BiasCfg;
use crate::util::{SECS_PER_HOUR, clamp_f64, per_min_to_per_s};

/// Conditions checked before the bias may move this cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiasGate {
    /// Mode in force before this cycle's transition is not BOOST.
    pub mode_allows: bool,
    pub heating_enabled: bool,
    /// Elapsed time since the previous fresh sample; `None` freezes learning.
    pub dt_s: Option<f64>,
}

/// Advance `bias` by one gated step and return the applied delta.
///
/// `bias += error / tau · dt`, clamped to the bounds, with the delta capped to
/// `rate_limit_c_per_h · dt / 3600`.
pub fn step(bias: &mut f64, error_c: f64, trend_c_per_s: f64, gate: BiasGate, cfg: &BiasCfg) -> f64 {
    let Some(dt_s) = gate.dt_s else {
        return 0.0;
    };
    if !gate.mode_allows || !gate.heating_enabled || dt_s <= 0.0 {
        return 0.0;
    }
    if error_c.abs() > cfg.deadband_c {
        return 0.0;
    }
    if trend_c_per_s.abs() >= per_min_to_per_s(cfg.trend_max_c_per_min) {
        return 0.0;
    }

    let current = clamp_f64(*bias, cfg.min_c, cfg.max_c);
    let candidate = clamp_f64(current + error_c / cfg.tau_s * dt_s, cfg.min_c, cfg.max_c);
    let cap = cfg.rate_limit_c_per_h * dt_s / SECS_PER_HOUR;
    let delta = clamp_f64(candidate - current, -cap, cap);
    *bias = clamp_f64(current + delta, cfg.min_c, cfg.max_c);
    delta
}
