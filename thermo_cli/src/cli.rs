//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "thermo", version, about = "Zone heating controller CLI")]
pub struct Cli {
    /// Path to config TOML; built-in defaults when omitted
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Emit JSON lines (decisions, summaries, logs and errors)
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load and validate the config, then print the effective parameters
    CheckConfig,

    /// Feed a logged signal trace (CSV) through a fresh controller
    Replay {
        /// Trace CSV: timestamp_ms,room_c,setpoint_c,hvac_on,window_open,actuator_c
        #[arg(long, value_name = "FILE")]
        trace: PathBuf,

        /// State file to restore from and write back; overrides [persistence]
        #[arg(long, value_name = "FILE")]
        state: Option<PathBuf>,
    },

    /// Drive the controller against the simulated room on a manual clock
    Simulate {
        /// Simulated duration
        #[arg(long, default_value_t = 6.0, value_parser = parse_hours)]
        hours: f64,

        /// Room setpoint in °C
        #[arg(long, default_value_t = 21.0)]
        setpoint: f64,

        /// Window open interval in minutes, e.g. 30:40 (repeatable)
        #[arg(long = "window", value_name = "START_MIN:END_MIN")]
        windows: Vec<WindowSpan>,

        /// Seed for the sensor noise; 0 disables noise
        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// Seconds between evaluation cycles
        #[arg(long = "tick-s", default_value_t = 60, value_parser = clap::value_parser!(u64).range(1..=3600))]
        tick_s: u64,
    },
}

fn parse_hours(s: &str) -> Result<f64, String> {
    let h: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if !(h.is_finite() && h > 0.0 && h <= 24.0 * 31.0) {
        return Err("hours must be in (0, 744]".into());
    }
    Ok(h)
}

/// Half-open window-open interval `[start, end)` in simulated minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSpan {
    pub start_min: u64,
    pub end_min: u64,
}

impl WindowSpan {
    pub fn contains_ms(&self, t_ms: u64) -> bool {
        let minute = t_ms / 60_000;
        minute >= self.start_min && minute < self.end_min
    }
}

impl FromStr for WindowSpan {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (a, b) = s
            .split_once(':')
            .ok_or_else(|| format!("expected START_MIN:END_MIN, got {s:?}"))?;
        let start_min: u64 = a.trim().parse().map_err(|e| format!("start minute: {e}"))?;
        let end_min: u64 = b.trim().parse().map_err(|e| format!("end minute: {e}"))?;
        if end_min <= start_min {
            return Err(format!("window end ({end_min}) must be after start ({start_min})"));
        }
        Ok(Self { start_min, end_min })
    }
}
