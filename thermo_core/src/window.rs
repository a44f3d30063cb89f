//! Debounced window-open override.
//!
//! Both debounce timers are stored deadlines compared against `now` every cycle.

use crate::config::WindowCfg;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowReason {
    OpenPending,
    OpenForced,
    CloseHold,
    Resume,
}

impl WindowReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenPending => "window_open_pending",
            Self::OpenForced => "window_open_forced",
            Self::CloseHold => "window_close_hold",
            Self::Resume => "window_resume",
        }
    }
}

impl fmt::Display for WindowReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowState {
    /// Last contact state seen.
    pub open: bool,
    /// Open, waiting for the open delay to elapse.
    pub pending: bool,
    /// Override active; targets are replaced by frost protection.
    pub forced: bool,
    pub open_since_ms: Option<u64>,
    pub close_since_ms: Option<u64>,
    open_deadline_ms: Option<u64>,
    close_deadline_ms: Option<u64>,
}

/// Result of folding one contact reading into the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowStatus {
    pub open: bool,
    pub pending: bool,
    pub forced: bool,
    /// The override lifted on this cycle.
    pub resume: bool,
    /// The override engaged on this cycle.
    pub engaged: bool,
    pub open_delay_remaining_ms: Option<u64>,
    pub close_hold_remaining_ms: Option<u64>,
    pub reason: Option<WindowReason>,
}

impl WindowState {
    pub fn update(&mut self, contact_open: bool, now_ms: u64, cfg: &WindowCfg) -> WindowStatus {
        if !cfg.enabled {
            *self = Self::default();
            return self.status(now_ms, false, false);
        }

        if contact_open && !self.open {
            self.open = true;
            self.open_since_ms = Some(now_ms);
            if self.forced {
                // re-opened during close hold: keep the override
                self.close_deadline_ms = None;
                self.close_since_ms = None;
            } else {
                self.pending = true;
                self.open_deadline_ms = Some(now_ms.saturating_add(cfg.open_delay_ms));
            }
        } else if !contact_open && self.open {
            self.open = false;
            self.open_since_ms = None;
            if self.pending {
                self.pending = false;
                self.open_deadline_ms = None;
            }
            if self.forced {
                self.close_since_ms = Some(now_ms);
                self.close_deadline_ms = Some(now_ms.saturating_add(cfg.close_delay_ms));
            }
        }

        let mut engaged = false;
        if self.pending && self.open_deadline_ms.is_some_and(|d| now_ms >= d) {
            self.pending = false;
            self.forced = true;
            self.open_deadline_ms = None;
            engaged = true;
            tracing::info!(now_ms, "window override engaged");
        }

        let mut resume = false;
        if self.forced && self.close_deadline_ms.is_some_and(|d| now_ms >= d) {
            self.forced = false;
            self.close_deadline_ms = None;
            self.close_since_ms = None;
            resume = true;
            tracing::info!(now_ms, "window override lifted");
        }

        self.status(now_ms, engaged, resume)
    }

    fn status(&self, now_ms: u64, engaged: bool, resume: bool) -> WindowStatus {
        let reason = if resume {
            Some(WindowReason::Resume)
        } else if self.pending {
            Some(WindowReason::OpenPending)
        } else if self.forced && self.close_deadline_ms.is_some() {
            Some(WindowReason::CloseHold)
        } else if self.forced {
            Some(WindowReason::OpenForced)
        } else {
            None
        };
        WindowStatus {
            open: self.open,
            pending: self.pending,
            forced: self.forced,
            resume,
            engaged,
            open_delay_remaining_ms: self.open_deadline_ms.map(|d| d.saturating_sub(now_ms)),
            close_hold_remaining_ms: self.close_deadline_ms.map(|d| d.saturating_sub(now_ms)),
            reason,
        }
    }
}
