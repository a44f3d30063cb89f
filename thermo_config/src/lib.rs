#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema and signal-trace parsing for the zone controller.
//!
//! - `Config` and its sections are deserialized from TOML and validated.
//!   Every section has production defaults, so an empty file is a valid config.
//! - The trace CSV loader enforces exact headers so logged cycles can be
//!   replayed offline for tuning.
use serde::Deserialize;
use serde::de::Deserializer;

/// Absolute actuator limits and the controller's authority around the setpoint.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ActuatorCfg {
    pub min_c: f64,
    pub max_c: f64,
    /// Targets never leave [setpoint - max_offset_c, setpoint + max_offset_c]
    pub max_offset_c: f64,
    /// Command quantization step; 0 disables rounding
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

/// Fast comfort response: proportional gain plus a small bounded integral.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ComfortCfg {
    pub kp: f64,
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

/// Slow offset learning.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BiasCfg {
    pub tau_s: f64,
    pub deadband_c: f64,
    /// Learn only while |trend| stays below this (°C/min)
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

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TrendCfg {
    /// EMA factor for dT/dt, in (0.0, 1.0]
    pub alpha: f64,
    pub drop_threshold_c_per_min: f64,
    pub rise_threshold_c_per_min: f64,
    pub predict_horizon_s: u64,
    pub overshoot_guard_c: f64,
}

impl Default for TrendCfg {
    fn default() -> Self {
        Self {
            alpha: 0.25,
            drop_threshold_c_per_min: -0.03,
            rise_threshold_c_per_min: 0.03,
            predict_horizon_s: 900,
            overshoot_guard_c: 0.2,
        }
    }
}

/// BOOST / HOLD / COAST thresholds.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ModesCfg {
    pub hold_deadband_c: f64,
    pub boost_error_on_c: f64,
    pub boost_error_off_c: f64,
    pub boost_target_c: f64,
    pub boost_max_s: u64,
    pub coast_error_on_c: f64,
    pub coast_error_off_c: f64,
    pub coast_target_c: f64,
    /// When set, COAST targets max(actuator min, setpoint - coast_offset_c) instead of coast_target_c
    pub coast_offset_c: Option<f64>,
}

impl Default for ModesCfg {
    fn default() -> Self {
        Self {
            hold_deadband_c: 0.1,
            boost_error_on_c: 0.6,
            boost_error_off_c: 0.2,
            boost_target_c: 25.0,
            boost_max_s: 30 * 60,
            coast_error_on_c: -0.3,
            coast_error_off_c: -0.1,
            coast_target_c: 5.0,
            coast_offset_c: None,
        }
    }
}

/// Command hygiene toward the actuator channel.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CommandCfg {
    pub min_send_delta_c: f64,
    pub min_interval_s: u64,
    pub max_step_up_c: f64,
}

impl Default for CommandCfg {
    fn default() -> Self {
        Self {
            min_send_delta_c: 0.2,
            min_interval_s: 60,
            max_step_up_c: 0.5,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FastRecoveryCfg {
    pub min_interval_s: u64,
    pub max_step_up_c: f64,
    pub error_threshold_c: f64,
    pub gap_threshold_c: f64,
}

impl Default for FastRecoveryCfg {
    fn default() -> Self {
        Self {
            min_interval_s: 0,
            max_step_up_c: 2.0,
            error_threshold_c: 1.0,
            gap_threshold_c: 1.5,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct WindowCfg {
    pub enabled: bool,
    pub open_delay_s: u64,
    pub close_delay_s: u64,
    pub frost_protection_c: f64,
}

impl Default for WindowCfg {
    fn default() -> Self {
        Self {
            enabled: true,
            open_delay_s: 10 * 60,
            close_delay_s: 5 * 60,
            frost_protection_c: 5.0,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Persistence {
    /// Where bias and last-sent command survive restarts; unset disables persistence
    pub state_file: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Config {
    pub actuator: ActuatorCfg,
    pub comfort: ComfortCfg,
    pub bias: BiasCfg,
    pub trend: TrendCfg,
    pub modes: ModesCfg,
    pub command: CommandCfg,
    pub fast_recovery: FastRecoveryCfg,
    pub window: WindowCfg,
    pub logging: Logging,
    pub persistence: Persistence,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

fn ensure_finite(name: &str, v: f64) -> eyre::Result<()> {
    if !v.is_finite() {
        eyre::bail!("{name} must be a finite number");
    }
    Ok(())
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        let floats = [
            ("actuator.min_c", self.actuator.min_c),
            ("actuator.max_c", self.actuator.max_c),
            ("actuator.max_offset_c", self.actuator.max_offset_c),
            ("actuator.resolution_c", self.actuator.resolution_c),
            ("comfort.kp", self.comfort.kp),
            ("comfort.ki_small", self.comfort.ki_small),
            ("comfort.i_small_min_c", self.comfort.i_small_min_c),
            ("comfort.i_small_max_c", self.comfort.i_small_max_c),
            ("bias.tau_s", self.bias.tau_s),
            ("bias.deadband_c", self.bias.deadband_c),
            ("bias.trend_max_c_per_min", self.bias.trend_max_c_per_min),
            ("bias.rate_limit_c_per_h", self.bias.rate_limit_c_per_h),
            ("bias.min_c", self.bias.min_c),
            ("bias.max_c", self.bias.max_c),
            ("trend.alpha", self.trend.alpha),
            (
                "trend.drop_threshold_c_per_min",
                self.trend.drop_threshold_c_per_min,
            ),
            (
                "trend.rise_threshold_c_per_min",
                self.trend.rise_threshold_c_per_min,
            ),
            ("trend.overshoot_guard_c", self.trend.overshoot_guard_c),
            ("modes.hold_deadband_c", self.modes.hold_deadband_c),
            ("modes.boost_error_on_c", self.modes.boost_error_on_c),
            ("modes.boost_error_off_c", self.modes.boost_error_off_c),
            ("modes.boost_target_c", self.modes.boost_target_c),
            ("modes.coast_error_on_c", self.modes.coast_error_on_c),
            ("modes.coast_error_off_c", self.modes.coast_error_off_c),
            ("modes.coast_target_c", self.modes.coast_target_c),
            ("command.min_send_delta_c", self.command.min_send_delta_c),
            ("command.max_step_up_c", self.command.max_step_up_c),
            ("fast_recovery.max_step_up_c", self.fast_recovery.max_step_up_c),
            (
                "fast_recovery.error_threshold_c",
                self.fast_recovery.error_threshold_c,
            ),
            (
                "fast_recovery.gap_threshold_c",
                self.fast_recovery.gap_threshold_c,
            ),
            ("window.frost_protection_c", self.window.frost_protection_c),
        ];
        for (name, v) in floats {
            ensure_finite(name, v)?;
        }
        if let Some(off) = self.modes.coast_offset_c {
            ensure_finite("modes.coast_offset_c", off)?;
            if off < 0.0 {
                eyre::bail!("modes.coast_offset_c must be >= 0");
            }
        }

        // Actuator
        if self.actuator.min_c > self.actuator.max_c {
            eyre::bail!("actuator.min_c must be <= actuator.max_c");
        }
        if self.actuator.max_offset_c <= 0.0 {
            eyre::bail!("actuator.max_offset_c must be > 0");
        }
        if self.actuator.resolution_c < 0.0 || self.actuator.resolution_c > 1.0 {
            eyre::bail!("actuator.resolution_c must be in [0.0, 1.0]");
        }

        // Comfort
        if self.comfort.kp < 0.0 {
            eyre::bail!("comfort.kp must be >= 0");
        }
        if self.comfort.ki_small < 0.0 {
            eyre::bail!("comfort.ki_small must be >= 0");
        }
        if self.comfort.i_small_min_c > self.comfort.i_small_max_c {
            eyre::bail!("comfort.i_small_min_c must be <= comfort.i_small_max_c");
        }

        // Bias
        if self.bias.tau_s <= 0.0 {
            eyre::bail!("bias.tau_s must be > 0");
        }
        if self.bias.deadband_c < 0.0 {
            eyre::bail!("bias.deadband_c must be >= 0");
        }
        if self.bias.trend_max_c_per_min <= 0.0 {
            eyre::bail!("bias.trend_max_c_per_min must be > 0");
        }
        if self.bias.rate_limit_c_per_h < 0.0 {
            eyre::bail!("bias.rate_limit_c_per_h must be >= 0");
        }
        if self.bias.min_c > self.bias.max_c {
            eyre::bail!("bias.min_c must be <= bias.max_c");
        }

        // Trend
        if !(self.trend.alpha > 0.0 && self.trend.alpha <= 1.0) {
            eyre::bail!("trend.alpha must be in (0.0, 1.0]");
        }
        if self.trend.drop_threshold_c_per_min >= 0.0 {
            eyre::bail!("trend.drop_threshold_c_per_min must be < 0");
        }
        if self.trend.predict_horizon_s > 24 * 60 * 60 {
            eyre::bail!("trend.predict_horizon_s is unreasonably large (>24h)");
        }

        // Modes
        if self.modes.boost_error_off_c > self.modes.boost_error_on_c {
            eyre::bail!("modes.boost_error_off_c must be <= modes.boost_error_on_c");
        }
        if self.modes.coast_error_on_c > self.modes.coast_error_off_c {
            eyre::bail!("modes.coast_error_on_c must be <= modes.coast_error_off_c");
        }
        if self.modes.coast_error_off_c >= self.modes.boost_error_on_c {
            eyre::bail!("modes.coast_error_off_c must be < modes.boost_error_on_c");
        }
        if self.modes.boost_max_s == 0 {
            eyre::bail!("modes.boost_max_s must be >= 1");
        }

        // Command hygiene
        if self.command.min_send_delta_c < 0.0 {
            eyre::bail!("command.min_send_delta_c must be >= 0");
        }
        if self.command.max_step_up_c <= 0.0 {
            eyre::bail!("command.max_step_up_c must be > 0");
        }
        if self.fast_recovery.max_step_up_c < self.command.max_step_up_c {
            eyre::bail!("fast_recovery.max_step_up_c must be >= command.max_step_up_c");
        }
        if self.fast_recovery.min_interval_s > self.command.min_interval_s {
            eyre::bail!("fast_recovery.min_interval_s must be <= command.min_interval_s");
        }
        if self.fast_recovery.error_threshold_c <= 0.0 {
            eyre::bail!("fast_recovery.error_threshold_c must be > 0");
        }
        if self.fast_recovery.gap_threshold_c <= 0.0 {
            eyre::bail!("fast_recovery.gap_threshold_c must be > 0");
        }

        // Window
        if self.window.frost_protection_c < self.actuator.min_c
            || self.window.frost_protection_c > self.actuator.max_c
        {
            eyre::bail!("window.frost_protection_c must lie within [actuator.min_c, actuator.max_c]");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly, got {rot:?}");
        }

        // Persistence
        if let Some(path) = self.persistence.state_file.as_deref()
            && path.trim().is_empty()
        {
            eyre::bail!("persistence.state_file must not be empty when set");
        }

        Ok(())
    }
}

/// One logged evaluation cycle.
///
/// Expected headers:
/// timestamp_ms,room_c,setpoint_c,hvac_on,window_open,actuator_c
///
/// Example:
/// timestamp_ms,room_c,setpoint_c,hvac_on,window_open,actuator_c
/// 0,19.4,21.0,on,off,
/// 60000,,21.0,on,off,22.5
///
/// An empty `room_c` means no fresh sample for that cycle; an empty
/// `actuator_c` means the actuator setpoint was unknown.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct TraceRow {
    pub timestamp_ms: u64,
    pub room_c: Option<f64>,
    pub setpoint_c: f64,
    #[serde(deserialize_with = "de_flag")]
    pub hvac_on: bool,
    #[serde(deserialize_with = "de_flag")]
    pub window_open: bool,
    pub actuator_c: Option<f64>,
}

pub const TRACE_HEADERS: [&str; 6] = [
    "timestamp_ms",
    "room_c",
    "setpoint_c",
    "hvac_on",
    "window_open",
    "actuator_c",
];

/// Accepts true/false, 1/0 and on/off (contact sensors commonly log on/off).
fn de_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "on" => Ok(true),
        "false" | "0" | "off" => Ok(false),
        other => Err(serde::de::Error::custom(format!(
            "expected true/false, 1/0 or on/off, got {other:?}"
        ))),
    }
}

pub fn parse_trace_csv<R: std::io::Read>(reader: R) -> eyre::Result<Vec<TraceRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read trace CSV headers: {}", e))?
        .clone();
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != TRACE_HEADERS {
        eyre::bail!(
            "trace CSV must have headers '{}', got: {}",
            TRACE_HEADERS.join(","),
            actual.join(",")
        );
    }

    let mut rows = Vec::new();
    for (idx, rec) in rdr.deserialize::<TraceRow>().enumerate() {
        match rec {
            Ok(row) => rows.push(row),
            Err(e) => {
                eyre::bail!("invalid trace row {}: {}", idx + 2, e);
            }
        }
    }
    if rows.is_empty() {
        eyre::bail!("trace CSV contains no cycles");
    }
    Ok(rows)
}

pub fn load_trace_csv(path: &std::path::Path) -> eyre::Result<Vec<TraceRow>> {
    let file = std::fs::File::open(path)
        .map_err(|e| eyre::eyre!("open trace CSV {:?}: {}", path, e))?;
    parse_trace_csv(file)
}
