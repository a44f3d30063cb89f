//! Runtime parameter snapshot for `ZoneController`.
//!
//! These are the validated structs the engine runs on. They are separate from the
//! TOML-deserialized config in `thermo_config`; durations are milliseconds here.

use crate::error::ConfigurationError;

/// Absolute actuator limits and the controller's authority around the setpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ActuatorCfg {
    pub min_c: f64,
    pub max_c: f64,
    /// Targets stay within `setpoint ± max_offset_c`.
    pub max_offset_c: f64,
    /// Target quantization step (°C). 0 disables rounding.
    pub resolution_c: f64,
}

impl Default for ActuatorCfg {
    fn default() -> Self {
        Self {
            min_c: 5.0,
            max_c: 25.0,
            max_offset_c: 8.0,
            resolution_c: 0.1,
        }
    }
}

/// Proportional gain and the small HOLD-only integral.
#[derive(Debug, Clone, PartialEq)]
pub struct ComfortCfg {
    pub kp: f64,
    /// Integral gain in °C of target per (°C error · s).
    pub ki_small: f64,
    pub i_small_min_c: f64,
    pub i_small_max_c: f64,
}

impl Default for ComfortCfg {
    fn default() -> Self {
        Self {
            kp: 5.0,
            ki_small: 0.0002,
            i_small_min_c: -2.0,
            i_small_max_c: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BiasCfg {
    /// Time constant of the offset learner (s).
    pub tau_s: f64,
    pub deadband_c: f64,
    /// Learning is gated on |trend| staying below this (°C/min).
    pub trend_max_c_per_min: f64,
    pub rate_limit_c_per_h: f64,
    pub min_c: f64,
    pub max_c: f64,
}

impl Default for BiasCfg {
    fn default() -> Self {
        Self {
            tau_s: 4.0 * 3600.0,
            deadband_c: 0.1,
            trend_max_c_per_min: 0.01,
            rate_limit_c_per_h: 0.5,
            min_c: -5.0,
            max_c: 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendCfg {
    /// EMA factor in (0.0, 1.0].
    pub alpha: f64,
    /// Falling faster than this (°C/min, negative) counts as a drop.
    pub drop_threshold_c_per_min: f64,
    pub rise_threshold_c_per_min: f64,
    /// Overshoot prediction horizon; 0 disables the predictor.
    pub predict_horizon_ms: u64,
    pub overshoot_guard_c: f64,
}

impl Default for TrendCfg {
    fn default() -> Self {
        Self {
            alpha: 0.25,
            drop_threshold_c_per_min: -0.03,
            rise_threshold_c_per_min: 0.03,
            predict_horizon_ms: 15 * 60 * 1000,
            overshoot_guard_c: 0.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModeCfg {
    pub hold_deadband_c: f64,
    pub boost_error_on_c: f64,
    pub boost_error_off_c: f64,
    pub boost_target_c: f64,
    pub boost_max_ms: u64,
    pub coast_error_on_c: f64,
    pub coast_error_off_c: f64,
    pub coast_target_c: f64,
    pub coast_offset_c: Option<f64>,
}

impl Default for ModeCfg {
    fn default() -> Self {
        Self {
            hold_deadband_c: 0.1,
            boost_error_on_c: 0.6,
            boost_error_off_c: 0.2,
            boost_target_c: 25.0,
            boost_max_ms: 30 * 60 * 1000,
            coast_error_on_c: -0.3,
            coast_error_off_c: -0.1,
            coast_target_c: 5.0,
            coast_offset_c: None,
        }
    }
}

/// Normal-path command hygiene.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandCfg {
    pub min_send_delta_c: f64,
    pub min_interval_ms: u64,
    pub max_step_up_c: f64,
}

impl Default for CommandCfg {
    fn default() -> Self {
        Self {
            min_send_delta_c: 0.2,
            min_interval_ms: 60 * 1000,
            max_step_up_c: 0.5,
        }
    }
}

/// Relaxed limits and the predicate thresholds that enable them.
#[derive(Debug, Clone, PartialEq)]
pub struct FastRecoveryCfg {
    pub min_interval_ms: u64,
    pub max_step_up_c: f64,
    pub error_threshold_c: f64,
    pub gap_threshold_c: f64,
}

impl Default for FastRecoveryCfg {
    fn default() -> Self {
        Self {
            min_interval_ms: 0,
            max_step_up_c: 2.0,
            error_threshold_c: 1.0,
            gap_threshold_c: 1.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowCfg {
    pub enabled: bool,
    pub open_delay_ms: u64,
    pub close_delay_ms: u64,
    pub frost_protection_c: f64,
}

impl Default for WindowCfg {
    fn default() -> Self {
        Self {
            enabled: true,
            open_delay_ms: 10 * 60 * 1000,
            close_delay_ms: 5 * 60 * 1000,
            frost_protection_c: 5.0,
        }
    }
}

/// Immutable parameter snapshot; replacing it is how live reconfiguration works.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    pub actuator: ActuatorCfg,
    pub comfort: ComfortCfg,
    pub bias: BiasCfg,
    pub trend: TrendCfg,
    pub modes: ModeCfg,
    pub command: CommandCfg,
    pub fast_recovery: FastRecoveryCfg,
    pub window: WindowCfg,
}

fn finite(name: &'static str, v: f64) -> Result<(), ConfigurationError> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(ConfigurationError::NonFinite(name))
    }
}

fn ordered(
    min: &'static str,
    min_value: f64,
    max: &'static str,
    max_value: f64,
) -> Result<(), ConfigurationError> {
    if min_value <= max_value {
        Ok(())
    } else {
        Err(ConfigurationError::InvertedRange {
            min,
            max,
            min_value,
            max_value,
        })
    }
}

fn require(cond: bool, msg: &'static str) -> Result<(), ConfigurationError> {
    if cond {
        Ok(())
    } else {
        Err(ConfigurationError::OutOfRange(msg))
    }
}

impl Params {
    /// Reject malformed snapshots; nothing is ever substituted silently.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let a = &self.actuator;
        let c = &self.comfort;
        let b = &self.bias;
        let t = &self.trend;
        let m = &self.modes;
        let cmd = &self.command;
        let fr = &self.fast_recovery;
        let w = &self.window;

        for (name, v) in [
            ("actuator.min_c", a.min_c),
            ("actuator.max_c", a.max_c),
            ("actuator.max_offset_c", a.max_offset_c),
            ("actuator.resolution_c", a.resolution_c),
            ("comfort.kp", c.kp),
            ("comfort.ki_small", c.ki_small),
            ("comfort.i_small_min_c", c.i_small_min_c),
            ("comfort.i_small_max_c", c.i_small_max_c),
            ("bias.tau_s", b.tau_s),
            ("bias.deadband_c", b.deadband_c),
            ("bias.trend_max_c_per_min", b.trend_max_c_per_min),
            ("bias.rate_limit_c_per_h", b.rate_limit_c_per_h),
            ("bias.min_c", b.min_c),
            ("bias.max_c", b.max_c),
            ("trend.alpha", t.alpha),
            ("trend.drop_threshold_c_per_min", t.drop_threshold_c_per_min),
            ("trend.rise_threshold_c_per_min", t.rise_threshold_c_per_min),
            ("trend.overshoot_guard_c", t.overshoot_guard_c),
            ("modes.hold_deadband_c", m.hold_deadband_c),
            ("modes.boost_error_on_c", m.boost_error_on_c),
            ("modes.boost_error_off_c", m.boost_error_off_c),
            ("modes.boost_target_c", m.boost_target_c),
            ("modes.coast_error_on_c", m.coast_error_on_c),
            ("modes.coast_error_off_c", m.coast_error_off_c),
            ("modes.coast_target_c", m.coast_target_c),
            ("command.min_send_delta_c", cmd.min_send_delta_c),
            ("command.max_step_up_c", cmd.max_step_up_c),
            ("fast_recovery.max_step_up_c", fr.max_step_up_c),
            ("fast_recovery.error_threshold_c", fr.error_threshold_c),
            ("fast_recovery.gap_threshold_c", fr.gap_threshold_c),
            ("window.frost_protection_c", w.frost_protection_c),
        ] {
            finite(name, v)?;
        }
        if let Some(off) = m.coast_offset_c {
            finite("modes.coast_offset_c", off)?;
            require(off >= 0.0, "modes.coast_offset_c must be >= 0")?;
        }

        ordered("actuator.min_c", a.min_c, "actuator.max_c", a.max_c)?;
        require(a.max_offset_c > 0.0, "actuator.max_offset_c must be > 0")?;
        require(
            (0.0..=1.0).contains(&a.resolution_c),
            "actuator.resolution_c must be in [0.0, 1.0]",
        )?;

        require(c.kp >= 0.0, "comfort.kp must be >= 0")?;
        require(c.ki_small >= 0.0, "comfort.ki_small must be >= 0")?;
        ordered(
            "comfort.i_small_min_c",
            c.i_small_min_c,
            "comfort.i_small_max_c",
            c.i_small_max_c,
        )?;
        require(
            c.i_small_min_c <= 0.0 && c.i_small_max_c >= 0.0,
            "comfort i_small bounds must contain 0",
        )?;

        require(b.tau_s > 0.0, "bias.tau_s must be > 0")?;
        require(b.deadband_c >= 0.0, "bias.deadband_c must be >= 0")?;
        require(
            b.trend_max_c_per_min > 0.0,
            "bias.trend_max_c_per_min must be > 0",
        )?;
        require(
            b.rate_limit_c_per_h >= 0.0,
            "bias.rate_limit_c_per_h must be >= 0",
        )?;
        ordered("bias.min_c", b.min_c, "bias.max_c", b.max_c)?;
        require(
            b.min_c <= 0.0 && b.max_c >= 0.0,
            "bias bounds must contain the neutral bias 0",
        )?;

        require(
            t.alpha > 0.0 && t.alpha <= 1.0,
            "trend.alpha must be in (0.0, 1.0]",
        )?;
        require(
            t.drop_threshold_c_per_min < 0.0,
            "trend.drop_threshold_c_per_min must be < 0",
        )?;
        require(
            t.overshoot_guard_c >= 0.0,
            "trend.overshoot_guard_c must be >= 0",
        )?;

        require(m.hold_deadband_c >= 0.0, "modes.hold_deadband_c must be >= 0")?;
        ordered(
            "modes.boost_error_off_c",
            m.boost_error_off_c,
            "modes.boost_error_on_c",
            m.boost_error_on_c,
        )?;
        ordered(
            "modes.coast_error_on_c",
            m.coast_error_on_c,
            "modes.coast_error_off_c",
            m.coast_error_off_c,
        )?;
        require(
            m.coast_error_off_c < m.boost_error_on_c,
            "modes.coast_error_off_c must be < modes.boost_error_on_c",
        )?;
        require(m.boost_max_ms > 0, "modes.boost_max_ms must be > 0")?;

        require(
            cmd.min_send_delta_c >= 0.0,
            "command.min_send_delta_c must be >= 0",
        )?;
        require(cmd.max_step_up_c > 0.0, "command.max_step_up_c must be > 0")?;
        ordered(
            "command.max_step_up_c",
            cmd.max_step_up_c,
            "fast_recovery.max_step_up_c",
            fr.max_step_up_c,
        )?;
        require(
            fr.min_interval_ms <= cmd.min_interval_ms,
            "fast_recovery.min_interval_ms must be <= command.min_interval_ms",
        )?;
        require(
            fr.error_threshold_c > 0.0,
            "fast_recovery.error_threshold_c must be > 0",
        )?;
        require(
            fr.gap_threshold_c > 0.0,
            "fast_recovery.gap_threshold_c must be > 0",
        )?;

        require(
            w.frost_protection_c >= a.min_c && w.frost_protection_c <= a.max_c,
            "window.frost_protection_c must lie within actuator limits",
        )?;

        Ok(())
    }
}
