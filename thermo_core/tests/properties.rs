use proptest::prelude::*;
use thermo_core::target::Band;
use thermo_core::{CommandReason, CycleInputs, Params, RoomReading, RoomSample, ZoneController};

const EPS: f64 = 1e-6;

#[derive(Debug, Clone)]
struct Step {
    dt_s: u64,
    room_c: Option<f64>,
    setpoint_c: f64,
    hvac: bool,
    window: bool,
    actuator_known: bool,
}

prop_compose! {
    fn step_strategy()(
        dt_s in 5u64..900,
        room_c in proptest::option::weighted(0.9, 10.0f64..30.0),
        setpoint_c in 16.0f64..24.0,
        hvac in proptest::bool::weighted(0.9),
        window in proptest::bool::weighted(0.15),
        actuator_known in any::<bool>(),
    ) -> Step {
        Step { dt_s, room_c, setpoint_c, hvac, window, actuator_known }
    }
}

prop_compose! {
    /// Slowly drifting room and a mostly constant setpoint, closer to real traces.
    fn drifting_strategy()(
        start in 15.0f64..23.0,
        drifts in proptest::collection::vec(-0.4f64..0.4, 20..200),
        dt_s in 30u64..300,
        setpoint_c in 18.0f64..23.0,
    ) -> Vec<Step> {
        let mut room = start;
        drifts
            .into_iter()
            .map(|d| {
                room += d;
                Step { dt_s, room_c: Some(room), setpoint_c, hvac: true, window: false, actuator_known: true }
            })
            .collect()
    }
}

struct Trace {
    now_ms: u64,
    last_sent: Option<f64>,
}

impl Trace {
    fn inputs(&mut self, s: &Step) -> CycleInputs {
        self.now_ms += s.dt_s * 1000;
        let room = match s.room_c {
            Some(t) => RoomReading::Fresh(RoomSample::new(t, self.now_ms)),
            None => RoomReading::Unavailable,
        };
        CycleInputs::new(self.now_ms, room, s.setpoint_c)
            .with_hvac(s.hvac)
            .with_window(s.window)
            .with_actuator(if s.actuator_known { self.last_sent } else { None })
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn commands_stay_in_band_and_override_dominates(steps in proptest::collection::vec(step_strategy(), 1..150)) {
        let p = Params::default();
        let mut ctl = ZoneController::new(p.clone()).unwrap();
        let mut tr = Trace { now_ms: 0, last_sent: None };
        for s in &steps {
            let d = ctl.evaluate(&tr.inputs(s)).unwrap();
            if let Some(cmd) = d.command {
                tr.last_sent = Some(cmd.target_c);
                if d.diagnostics.window_forced {
                    prop_assert_eq!(cmd.target_c, p.window.frost_protection_c);
                } else if !d.diagnostics.heating_enabled {
                    prop_assert!(cmd.target_c <= p.modes.coast_target_c + EPS,
                        "{} above coast target ({})", cmd.target_c, d.reasons);
                } else {
                    let band = Band::for_setpoint(s.setpoint_c, &p);
                    prop_assert!(band.contains(cmd.target_c),
                        "{} outside [{}, {}] ({})", cmd.target_c, band.lo_c, band.hi_c, d.reasons);
                }
            }
        }
    }

    #[test]
    fn increases_respect_rate_limit(steps in proptest::collection::vec(step_strategy(), 1..150)) {
        let p = Params::default();
        let mut ctl = ZoneController::new(p.clone()).unwrap();
        let mut tr = Trace { now_ms: 0, last_sent: None };
        let mut prev: Option<(f64, u64)> = None;
        for s in &steps {
            let inp = tr.inputs(s);
            let d = ctl.evaluate(&inp).unwrap();
            if let Some(cmd) = d.command {
                if let Some((prev_c, prev_at)) = prev {
                    if cmd.reason == CommandReason::WindowForced {
                        prop_assert_eq!(cmd.target_c, p.window.frost_protection_c);
                    }
                    let exempt = matches!(cmd.reason, CommandReason::WindowForced | CommandReason::FirstSend);
                    if cmd.target_c > prev_c + EPS && !exempt {
                        let interval_ms = (d.diagnostics.effective_interval_s * 1000.0).round() as u64;
                        prop_assert!(inp.now_ms - prev_at >= interval_ms);
                    }
                }
                prev = Some((cmd.target_c, inp.now_ms));
                tr.last_sent = Some(cmd.target_c);
            }
        }
    }

    #[test]
    fn bias_bounded_and_hourly_rate_capped(steps in drifting_strategy()) {
        let mut p = Params::default();
        // speed learning up so the cap actually binds
        p.bias.tau_s = 60.0;
        p.bias.deadband_c = 0.5;
        p.bias.trend_max_c_per_min = 1.0;
        let mut ctl = ZoneController::new(p.clone()).unwrap();
        let mut tr = Trace { now_ms: 0, last_sent: None };
        let mut history = vec![(0u64, 0.0f64)];
        for s in &steps {
            let inp = tr.inputs(s);
            let d = ctl.evaluate(&inp).unwrap();
            prop_assert!(d.diagnostics.bias_c >= p.bias.min_c - EPS);
            prop_assert!(d.diagnostics.bias_c <= p.bias.max_c + EPS);
            history.push((inp.now_ms, d.diagnostics.bias_c));
        }
        for (i, &(t0, _)) in history.iter().enumerate() {
            let mut applied = 0.0;
            for w in history[i..].windows(2) {
                if w[1].0 > t0 + 3_600_000 {
                    break;
                }
                applied += (w[1].1 - w[0].1).abs();
            }
            prop_assert!(applied <= p.bias.rate_limit_c_per_h + EPS, "{} in one hour", applied);
        }
    }
}
