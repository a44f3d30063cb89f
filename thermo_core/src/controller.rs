//! `ZoneController`: one decision engine instance per regulated zone.

use crate::bias::{self, BiasGate};
use crate::command::{self, Action, CommandInputs};
use crate::config::Params;
use crate::decision::{Decision, Diagnostics, Reasons, SendTarget};
use crate::error::{InvalidSampleError, Result};
use crate::inputs::CycleInputs;
use crate::mode::{self, Mode, ModeInputs};
use crate::persist::PersistedState;
use crate::state::ControllerState;
use crate::target::{self, TargetInputs};
use crate::trend::{self, Observation};
use crate::util::{clamp_f64, ms_to_s};

#[derive(Debug, Clone)]
pub struct ZoneController {
    params: Params,
    state: ControllerState,
}

impl ZoneController {
    /// Validate `params` and start from a fresh state.
    pub fn new(params: Params) -> Result<Self> {
        params.validate().map_err(eyre::Report::new)?;
        Ok(Self {
            params,
            state: ControllerState::default(),
        })
    }

    pub fn builder() -> crate::builder::ZoneControllerBuilder {
        crate::builder::ZoneControllerBuilder::default()
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    /// Swap in a new parameter snapshot. Transient state restarts; the bias is kept,
    /// clamped into the new bounds.
    pub fn reconfigure(&mut self, params: Params) -> Result<()> {
        params.validate().map_err(eyre::Report::new)?;
        self.state.reset_transient();
        self.state.bias_c = clamp_f64(self.state.bias_c, params.bias.min_c, params.bias.max_c);
        self.params = params;
        tracing::info!(bias_c = self.state.bias_c, "controller reconfigured");
        Ok(())
    }

    pub fn reset_bias(&mut self) {
        self.state.bias_c = 0.0;
        tracing::info!("bias reset");
    }

    pub fn snapshot(&self) -> PersistedState {
        PersistedState {
            bias_c: self.state.bias_c,
            last_sent_c: self.state.sent.last_sent_c,
            last_sent_at_ms: self.state.sent.last_sent_at_ms,
        }
    }

    pub(crate) fn restore(&mut self, persisted: &PersistedState) {
        let p = &self.params;
        self.state.bias_c = clamp_f64(persisted.bias_c, p.bias.min_c, p.bias.max_c);
        self.state.sent.last_sent_c = persisted
            .last_sent_c
            .map(|c| clamp_f64(c, p.actuator.min_c, p.actuator.max_c));
        self.state.sent.last_sent_at_ms = persisted.last_sent_at_ms;
    }

    /// Reject unusable inputs before any state is touched.
    fn check(&self, inp: &CycleInputs) -> std::result::Result<Observation, InvalidSampleError> {
        if !inp.setpoint_c.is_finite() {
            return Err(InvalidSampleError::NonFiniteSetpoint(inp.setpoint_c));
        }
        if let Some(a) = inp.actuator_setpoint_c {
            if !a.is_finite() {
                return Err(InvalidSampleError::NonFiniteActuatorSetpoint(a));
            }
        }
        if let Some(prev_ms) = self.state.last_eval_ms {
            if inp.now_ms < prev_ms {
                return Err(InvalidSampleError::ClockWentBackwards {
                    prev_ms,
                    now_ms: inp.now_ms,
                });
            }
        }
        match inp.room.sample() {
            Some(s) if !s.temperature_c.is_finite() => {
                Err(InvalidSampleError::NonFiniteTemperature(s.temperature_c))
            }
            Some(s) => self.state.trend.classify(s),
            // no sample: nothing to fold in
            None => Ok(Observation::Repeat),
        }
    }

    /// Run one cycle: trend, bias, predictor, mode, target, window veto, command.
    pub fn evaluate(&mut self, inp: &CycleInputs) -> Result<Decision> {
        let obs = self.check(inp).map_err(eyre::Report::new)?;
        let p = &self.params;
        let st = &mut self.state;
        let now_ms = inp.now_ms;

        let window = st.window.update(inp.window_contact_open, now_ms, &p.window);
        let heating_enabled = inp.hvac_enabled && !window.forced;

        let sample = inp.room.sample();
        if let Some(s) = sample {
            st.trend.apply(s, obs, p.trend.alpha);
        }
        let dt_s = sample.and(obs.dt_s());
        let trend_c_per_s = st.trend.trend_c_per_s();
        let error_c = sample.map(|s| inp.setpoint_c - s.temperature_c);

        if let Some(e) = error_c {
            let gate = BiasGate {
                mode_allows: st.mode != Mode::Boost,
                heating_enabled,
                dt_s,
            };
            bias::step(&mut st.bias_c, e, trend_c_per_s, gate, &p.bias);
        }

        let predicted_c =
            sample.and_then(|s| trend::predict(s.temperature_c, trend_c_per_s, p.trend.predict_horizon_ms));

        let mode_since = *st.mode_since_ms.get_or_insert(now_ms);
        let transition = mode::next(
            st.mode,
            st.mode_reason,
            &ModeInputs {
                error_c,
                trend_c_per_min: st.trend.trend_c_per_min(),
                predicted_c,
                setpoint_c: inp.setpoint_c,
                elapsed_in_mode_ms: now_ms.saturating_sub(mode_since),
                heating_enabled,
            },
            &p.modes,
            &p.trend,
        );
        if transition.mode != st.mode {
            tracing::info!(
                from = st.mode.as_str(),
                to = transition.mode.as_str(),
                reason = transition.reason.as_str(),
                now_ms,
                "mode transition"
            );
            st.mode = transition.mode;
            st.mode_since_ms = Some(now_ms);
        }
        st.mode_reason = transition.reason;

        let calc = target::compute(
            &TargetInputs {
                mode: st.mode,
                setpoint_c: inp.setpoint_c,
                error_c,
                bias_c: st.bias_c,
                dt_s,
                heating_enabled,
            },
            &mut st.i_small_c,
            p,
        );
        let desired_c = if window.forced {
            p.window.frost_protection_c
        } else {
            calc.desired_c
        };

        let outcome = command::decide(
            &CommandInputs {
                now_ms,
                desired_c,
                setpoint_c: inp.setpoint_c,
                error_c,
                mode: st.mode,
                actuator_setpoint_c: inp.actuator_setpoint_c,
                window_forced: window.forced,
                window_resume: window.resume,
            },
            &st.sent,
            p,
        );
        if outcome.fast_recovery != st.fast_recovery {
            match outcome.fast_recovery {
                Some(r) => tracing::info!(reason = r.as_str(), now_ms, "fast recovery active"),
                None => tracing::info!(now_ms, "fast recovery released"),
            }
            st.fast_recovery = outcome.fast_recovery;
        }
        let command = match outcome.action {
            Action::Send { target_c, reason } => {
                st.sent.last_sent_c = Some(target_c);
                st.sent.last_sent_at_ms = Some(now_ms);
                Some(SendTarget { target_c, reason })
            }
            Action::NoOp { .. } => None,
        };
        st.last_eval_ms = Some(now_ms);

        let reasons = Reasons {
            mode: st.mode_reason,
            command: outcome.action.reason(),
            fast_recovery: outcome.fast_recovery,
            window: window.reason,
        };
        let diagnostics = Diagnostics {
            now_ms,
            setpoint_c: inp.setpoint_c,
            room_c: sample.map(|s| s.temperature_c),
            error_c,
            trend_c_per_s,
            trend_c_per_min: st.trend.trend_c_per_min(),
            predicted_c,
            bias_c: st.bias_c,
            p_term_c: calc.p_term_c,
            i_small_c: calc.i_small_c,
            mode: st.mode,
            mode_reason: st.mode_reason,
            calculated_target_c: calc.desired_c,
            desired_target_c: desired_c,
            command_target_c: command.map(|c| c.target_c),
            effective_interval_s: ms_to_s(outcome.effective_interval_ms),
            effective_step_c: outcome.effective_step_c,
            step_limited: outcome.step_limited,
            fast_recovery_active: outcome.fast_recovery.is_some(),
            fast_recovery_reason: outcome.fast_recovery,
            window_open: window.open,
            window_pending: window.pending,
            window_forced: window.forced,
            open_delay_remaining_s: window.open_delay_remaining_ms.map(ms_to_s),
            close_hold_remaining_s: window.close_hold_remaining_ms.map(ms_to_s),
            actuator_setpoint_c: inp.actuator_setpoint_c,
            heating_enabled,
        };

        Ok(Decision {
            desired_target_c: desired_c,
            command,
            mode: st.mode,
            reasons,
            diagnostics,
        })
    }
}
