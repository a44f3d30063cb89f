use crate::command::{FastRecoveryReason, SendMemory};
use crate::mode::{Mode, ModeReason};
use crate::trend::TrendEstimator;
use crate::window::WindowState;

/// Mutable per-zone state, owned by exactly one `ZoneController`.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerState {
    pub bias_c: f64,
    pub i_small_c: f64,
    pub trend: TrendEstimator,
    pub mode: Mode,
    /// Set on the first cycle and on every mode change.
    pub mode_since_ms: Option<u64>,
    pub mode_reason: ModeReason,
    pub sent: SendMemory,
    pub fast_recovery: Option<FastRecoveryReason>,
    pub window: WindowState,
    pub last_eval_ms: Option<u64>,
}

impl Default for ControllerState {
    fn default() -> Self {
        Self {
            bias_c: 0.0,
            i_small_c: 0.0,
            trend: TrendEstimator::default(),
            mode: Mode::Hold,
            mode_since_ms: None,
            mode_reason: ModeReason::Startup,
            sent: SendMemory::default(),
            fast_recovery: None,
            window: WindowState::default(),
            last_eval_ms: None,
        }
    }
}

impl ControllerState {
    /// Drop transient state; keep what describes the hardware and the channel.
    pub(crate) fn reset_transient(&mut self) {
        *self = Self {
            bias_c: self.bias_c,
            sent: self.sent,
            last_eval_ms: self.last_eval_ms,
            ..Self::default()
        };
    }
}
