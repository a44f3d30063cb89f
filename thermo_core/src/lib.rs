#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cast_precision_loss
)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Decision engine for a lag-prone heating actuator (hardware-agnostic).
//!
//! Each cycle takes a room reading, the user setpoint and a few flags, and produces
//! a desired actuator target plus, at most, one command. The actuator is reached only
//! through the `thermo_traits` seams; this crate never does I/O on its own except for
//! the optional state file.
//!
//! ## Pipeline
//!
//! - **Trend**: EMA of `dT/dt` (`trend` module), plus the overshoot predictor
//! - **Bias**: gated, rate-limited offset learner (`bias`)
//! - **Mode**: BOOST / HOLD / COAST with hysteresis and a boost timeout (`mode`)
//! - **Target**: per-mode target, clamp band and quantization (`target`)
//! - **Window**: debounced frost-protection override (`window`)
//! - **Command**: min-delta, rate and step limits, fast recovery (`command`)
//!
//! Time is a `u64` millisecond timebase supplied by the host; timers are deadlines.

pub mod bias;
pub mod builder;
pub mod command;
pub mod config;
pub mod controller;
pub mod conversions;
pub mod decision;
pub mod error;
pub mod inputs;
pub mod mocks;
pub mod mode;
pub mod persist;
pub mod runner;
pub mod state;
pub mod target;
pub mod trend;
pub mod util;
pub mod window;

pub use builder::ZoneControllerBuilder;
pub use command::{CommandReason, FastRecoveryReason};
pub use config::Params;
pub use controller::ZoneController;
pub use decision::{Decision, Diagnostics, Reasons, SendTarget};
pub use error::{BuildError, ConfigurationError, InvalidSampleError, Report, Result};
pub use inputs::{CycleInputs, RoomReading};
pub use mode::{Mode, ModeReason};
pub use persist::PersistedState;
pub use runner::{RunStats, Trigger, ZoneRunner};
pub use state::ControllerState;
pub use window::WindowReason;
pub use thermo_traits::RoomSample;
