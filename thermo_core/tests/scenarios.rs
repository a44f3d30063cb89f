use rstest::rstest;
use thermo_core::{
    CommandReason, ConfigurationError, CycleInputs, FastRecoveryReason, InvalidSampleError, Mode,
    ModeReason, Params, RoomReading, RoomSample, WindowReason, ZoneController,
};

const MIN_MS: u64 = 60_000;

fn fresh(now_ms: u64, room_c: f64) -> RoomReading {
    RoomReading::Fresh(RoomSample::new(room_c, now_ms))
}

fn at(now_ms: u64, room_c: f64, setpoint_c: f64) -> CycleInputs {
    CycleInputs::new(now_ms, fresh(now_ms, room_c), setpoint_c)
}

#[test]
fn cold_room_in_hold_scenario() {
    let mut p = Params::default();
    p.actuator.max_c = 30.0;
    // keep the machine in HOLD to look at the raw proportional path
    p.modes.boost_error_on_c = 5.0;
    p.modes.boost_error_off_c = 4.0;
    let mut ctl = ZoneController::new(p).unwrap();
    let d = ctl.evaluate(&at(0, 19.0, 21.0)).unwrap();
    assert_eq!(d.mode, Mode::Hold);
    assert!((d.diagnostics.p_term_c - 10.0).abs() < 1e-9);
    // 21 + 10 = 31 clamps to 21 + 8
    assert!((d.desired_target_c - 29.0).abs() < 1e-9);
    assert_eq!(d.command.unwrap().reason, CommandReason::FirstSend);
}

#[test]
fn window_open_delay_scenario() {
    let mut ctl = ZoneController::new(Params::default()).unwrap();
    ctl.evaluate(&at(0, 21.0, 21.0)).unwrap();

    let mut t = MIN_MS;
    let d = ctl.evaluate(&at(t, 21.0, 21.0).with_window(true)).unwrap();
    assert!(d.diagnostics.window_pending && !d.diagnostics.window_forced);
    assert!(d.reasons.contains(WindowReason::OpenPending.as_str()));

    // room drops while pending; normal policy still applies
    t += 9 * MIN_MS;
    let d = ctl.evaluate(&at(t, 20.4, 21.0).with_window(true)).unwrap();
    assert!(d.diagnostics.window_pending);
    assert!((d.diagnostics.open_delay_remaining_s.unwrap() - 60.0).abs() < 1e-9);
    assert_ne!(d.desired_target_c, 5.0);

    // exactly ten minutes after the open edge
    t += MIN_MS;
    let d = ctl.evaluate(&at(t, 20.2, 21.0).with_window(true)).unwrap();
    assert!(d.diagnostics.window_forced && !d.diagnostics.window_pending);
    let cmd = d.command.unwrap();
    assert_eq!(cmd.target_c, 5.0);
    assert_eq!(cmd.reason, CommandReason::WindowForced);

    t += MIN_MS;
    let d = ctl.evaluate(&at(t, 19.0, 21.0).with_window(true)).unwrap();
    assert!(d.command.is_none());
    assert_eq!(d.reasons.command, CommandReason::WindowForcedHold);
    assert_eq!(d.mode, Mode::Coast);
    assert_eq!(d.reasons.mode, ModeReason::HeatingDisabled);
}

#[test]
fn window_resume_takes_fast_path_back_into_band() {
    let mut p = Params::default();
    p.window.open_delay_ms = 0;
    p.window.close_delay_ms = 2 * MIN_MS;
    let mut ctl = ZoneController::new(p).unwrap();
    ctl.evaluate(&at(0, 20.9, 21.0)).unwrap();
    let d = ctl.evaluate(&at(MIN_MS, 20.5, 21.0).with_window(true)).unwrap();
    assert_eq!(d.command.unwrap().target_c, 5.0);

    let d = ctl.evaluate(&at(2 * MIN_MS, 20.0, 21.0)).unwrap();
    assert!(d.diagnostics.window_forced);
    assert_eq!(d.reasons.window, Some(WindowReason::CloseHold));

    let d = ctl.evaluate(&at(4 * MIN_MS, 20.0, 21.0)).unwrap();
    assert!(!d.diagnostics.window_forced);
    assert_eq!(d.reasons.window, Some(WindowReason::Resume));
    assert!(d.diagnostics.fast_recovery_active);
    let cmd = d.command.unwrap();
    // lifted straight to the bottom of the setpoint band at least
    assert!(cmd.target_c >= 13.0 - 1e-9);
}

#[test]
fn fast_recovery_step_scenario() {
    let mut p = Params::default();
    // stay out of BOOST so the large-error predicate is what enables fast recovery
    p.modes.boost_error_on_c = 3.0;
    p.modes.boost_error_off_c = 2.5;
    p.modes.coast_error_on_c = -3.0;
    p.trend.drop_threshold_c_per_min = -10.0;
    p.trend.predict_horizon_ms = 0;
    let mut ctl = ZoneController::new(p).unwrap();

    let d = ctl.evaluate(&at(0, 21.0, 21.0).with_actuator(Some(21.0))).unwrap();
    assert!(d.command.is_none());

    // setpoint jumps by 1.5 °C: error crosses the fast recovery threshold
    let d = ctl
        .evaluate(&at(10_000, 21.0, 22.5).with_actuator(Some(21.0)))
        .unwrap();
    assert_eq!(d.diagnostics.fast_recovery_reason, Some(FastRecoveryReason::LargeError));
    let cmd = d.command.unwrap();
    assert_eq!(cmd.reason, CommandReason::StepUpLimited);
    // 21 + fast step 2.0, not the normal 0.5
    assert!((cmd.target_c - 23.0).abs() < 1e-9);
    assert!((d.diagnostics.effective_step_c - 2.0).abs() < 1e-12);
}

#[test]
fn urgent_decrease_ignores_rate_limit() {
    let mut ctl = ZoneController::new(Params::default()).unwrap();
    let first = ctl.evaluate(&at(0, 21.0, 21.0)).unwrap();
    let sent = first.command.unwrap().target_c;

    // setpoint lowered 5 s later
    let d = ctl.evaluate(&at(5_000, 21.0, 19.0)).unwrap();
    let cmd = d.command.unwrap();
    assert_eq!(cmd.reason, CommandReason::UrgentDecrease);
    assert!(cmd.target_c < sent);
}

#[test]
fn increase_within_interval_is_rate_limited() {
    let mut ctl = ZoneController::new(Params::default()).unwrap();
    ctl.evaluate(&at(0, 21.0, 21.0)).unwrap();
    let d = ctl.evaluate(&at(10_000, 21.0, 21.1)).unwrap();
    assert!(d.command.is_none());
    assert_eq!(d.reasons.command, CommandReason::RateLimited);
}

#[test]
fn boost_times_out_under_persistent_error() {
    let p = Params::default();
    let max = p.modes.boost_max_ms;
    let mut ctl = ZoneController::new(p).unwrap();
    let d = ctl.evaluate(&at(0, 19.0, 21.0)).unwrap();
    assert_eq!(d.mode, Mode::Boost);

    let mut t = 0;
    let mut left_at = None;
    while t <= max {
        t += MIN_MS;
        let d = ctl.evaluate(&at(t, 19.0, 21.0)).unwrap();
        if d.mode == Mode::Hold {
            assert_eq!(d.reasons.mode, ModeReason::BoostTimeout);
            left_at = Some(t);
            break;
        }
    }
    assert!(left_at.is_some_and(|t| t <= max));
}

#[test]
fn missing_sample_freezes_learning_and_leaves_boost() {
    let mut ctl = ZoneController::new(Params::default()).unwrap();
    ctl.evaluate(&at(0, 19.0, 21.0)).unwrap();
    assert_eq!(ctl.state().mode, Mode::Boost);
    let before = ctl.state().clone();

    let d = ctl
        .evaluate(&CycleInputs::new(MIN_MS, RoomReading::Unavailable, 21.0))
        .unwrap();
    assert_eq!(d.mode, Mode::Hold);
    assert_eq!(d.reasons.mode, ModeReason::SensorUnavailable);
    assert_eq!(d.diagnostics.error_c, None);
    assert_eq!(ctl.state().bias_c, before.bias_c);
    assert_eq!(ctl.state().i_small_c, before.i_small_c);
    assert_eq!(ctl.state().trend, before.trend);
}

#[rstest]
#[case(at(MIN_MS, f64::NAN, 21.0))]
#[case(at(MIN_MS, 20.0, f64::INFINITY))]
#[case(at(MIN_MS, 20.0, 21.0).with_actuator(Some(f64::NAN)))]
#[case(CycleInputs::new(MIN_MS, fresh(1_000, 20.0), 21.0))]
#[case(CycleInputs::new(MIN_MS, fresh(30_000, 20.7), 21.0))]
#[case(at(1_000, 20.0, 21.0))]
fn invalid_inputs_are_rejected_without_side_effects(#[case] bad: CycleInputs) {
    let mut ctl = ZoneController::new(Params::default()).unwrap();
    ctl.evaluate(&at(30_000, 20.5, 21.0)).unwrap();
    let before = ctl.state().clone();
    let err = ctl.evaluate(&bad).unwrap_err();
    assert!(err.downcast_ref::<InvalidSampleError>().is_some(), "{err}");
    assert_eq!(ctl.state(), &before);
}

#[test]
fn repeated_sample_is_a_reevaluation() {
    let mut ctl = ZoneController::new(Params::default()).unwrap();
    ctl.evaluate(&at(0, 20.0, 21.0)).unwrap();
    ctl.evaluate(&at(MIN_MS, 20.2, 21.0)).unwrap();
    let trend = ctl.state().trend.clone();
    // setpoint change re-evaluates with the same sample
    let d = ctl
        .evaluate(&CycleInputs::new(MIN_MS + 500, fresh(MIN_MS, 20.2), 21.5))
        .unwrap();
    assert_eq!(ctl.state().trend, trend);
    assert!((d.diagnostics.error_c.unwrap() - 1.3).abs() < 1e-9);
}

#[test]
fn reconfigure_keeps_bias_and_resets_transients() {
    let mut ctl = ZoneController::builder()
        .restore(thermo_core::PersistedState {
            bias_c: 1.5,
            last_sent_c: Some(21.0),
            last_sent_at_ms: Some(0),
        })
        .try_build()
        .unwrap();
    ctl.evaluate(&at(0, 19.0, 21.0)).unwrap();
    assert_eq!(ctl.state().mode, Mode::Boost);

    let mut p = Params::default();
    p.bias.max_c = 1.0;
    ctl.reconfigure(p).unwrap();
    assert_eq!(ctl.state().bias_c, 1.0);
    assert_eq!(ctl.state().mode, Mode::Hold);
    assert_eq!(ctl.state().mode_reason, ModeReason::Startup);
    assert!(ctl.state().trend.previous().is_none());
    assert_eq!(ctl.snapshot().last_sent_c, ctl.state().sent.last_sent_c);

    ctl.reset_bias();
    assert_eq!(ctl.snapshot().bias_c, 0.0);
}

#[rstest]
#[case::inverted_bias(|p: &mut Params| { p.bias.min_c = 2.0; p.bias.max_c = 1.0; })]
#[case::zero_tau(|p: &mut Params| p.bias.tau_s = 0.0)]
#[case::alpha(|p: &mut Params| p.trend.alpha = 1.5)]
#[case::nan_kp(|p: &mut Params| p.comfort.kp = f64::NAN)]
#[case::boost_hysteresis(|p: &mut Params| p.modes.boost_error_off_c = 1.0)]
#[case::coast_hysteresis(|p: &mut Params| p.modes.coast_error_off_c = -0.5)]
fn malformed_params_are_rejected(#[case] mutate: fn(&mut Params)) {
    let mut p = Params::default();
    mutate(&mut p);
    let err = ZoneController::new(p.clone()).unwrap_err();
    assert!(err.downcast_ref::<ConfigurationError>().is_some(), "{err}");

    let mut ctl = ZoneController::new(Params::default()).unwrap();
    assert!(ctl.reconfigure(p).is_err());
    assert_eq!(ctl.params(), &Params::default());
}

#[test]
fn heating_disabled_coasts() {
    let mut ctl = ZoneController::new(Params::default()).unwrap();
    let d = ctl.evaluate(&at(0, 18.0, 21.0).with_hvac(false)).unwrap();
    assert_eq!(d.mode, Mode::Coast);
    assert_eq!(d.reasons.mode, ModeReason::HeatingDisabled);
    assert!(!d.diagnostics.heating_enabled);
    let p = Params::default();
    let cmd = d.command.unwrap();
    assert!((cmd.target_c - p.modes.coast_target_c).abs() < 1e-9, "{}", cmd.target_c);
    assert!(cmd.target_c <= p.modes.coast_target_c);

    // switching off mid-run drops the actuator straight to the coast target
    let mut ctl = ZoneController::new(Params::default()).unwrap();
    ctl.evaluate(&at(0, 20.8, 21.0)).unwrap();
    let d = ctl.evaluate(&at(MIN_MS, 20.8, 21.0).with_hvac(false)).unwrap();
    let cmd = d.command.unwrap();
    assert_eq!(cmd.reason, CommandReason::UrgentDecrease);
    assert!((cmd.target_c - p.modes.coast_target_c).abs() < 1e-9);
}
