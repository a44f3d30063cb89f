//! Mode-specific desired target, clamp band and quantization.

use crate::config::Params;
use crate::mode::Mode;
use crate::util::{TEMP_EPS, clamp_f64, quantize_within};

/// Inclusive band every emitted target stays inside: the setpoint authority window
/// intersected with the actuator limits. Actuator limits win when they do not overlap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub lo_c: f64,
    pub hi_c: f64,
}

impl Band {
    pub fn for_setpoint(setpoint_c: f64, p: &Params) -> Self {
        let a = &p.actuator;
        Self {
            lo_c: clamp_f64(setpoint_c - a.max_offset_c, a.min_c, a.max_c),
            hi_c: clamp_f64(setpoint_c + a.max_offset_c, a.min_c, a.max_c),
        }
    }

    /// Relative clamp first, then absolute.
    pub fn clamp(&self, v: f64, setpoint_c: f64, p: &Params) -> f64 {
        let a = &p.actuator;
        let rel = clamp_f64(v, setpoint_c - a.max_offset_c, setpoint_c + a.max_offset_c);
        clamp_f64(rel, a.min_c, a.max_c)
    }

    pub fn contains(&self, v: f64) -> bool {
        v >= self.lo_c - TEMP_EPS && v <= self.hi_c + TEMP_EPS
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetInputs {
    pub mode: Mode,
    pub setpoint_c: f64,
    /// `None` without a fresh sample; the proportional term is then zero.
    pub error_c: Option<f64>,
    pub bias_c: f64,
    /// Time since the previous fresh sample; `None` freezes the integral.
    pub dt_s: Option<f64>,
    pub heating_enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetOutput {
    /// Clamped and quantized.
    pub desired_c: f64,
    /// Before clamping.
    pub raw_c: f64,
    pub p_term_c: f64,
    pub i_small_c: f64,
    pub saturated: bool,
}

/// Compute the desired target for `inp.mode`, advancing `i_small` when HOLD allows it.
pub fn compute(inp: &TargetInputs, i_small: &mut f64, p: &Params) -> TargetOutput {
    let c = &p.comfort;
    let band = Band::for_setpoint(inp.setpoint_c, p);
    let error_c = inp.error_c.unwrap_or(0.0);
    let p_term_c = c.kp * error_c;
    let base = inp.setpoint_c + inp.bias_c + p_term_c;
    *i_small = clamp_f64(*i_small, c.i_small_min_c, c.i_small_max_c);

    let raw_c = match inp.mode {
        Mode::Boost => p.modes.boost_target_c.max(base),
        Mode::Coast => match p.modes.coast_offset_c {
            Some(off) => p.actuator.min_c.max(inp.setpoint_c - off),
            None => p.modes.coast_target_c,
        },
        Mode::Hold => {
            if let (Some(dt_s), true) = (inp.dt_s, inp.heating_enabled) {
                let step = c.ki_small * error_c * dt_s;
                let candidate = clamp_f64(*i_small + step, c.i_small_min_c, c.i_small_max_c);
                let unclamped = base + candidate;
                let clamped = band.clamp(unclamped, inp.setpoint_c, p);
                // integrate while unsaturated, or when the step pulls back into the band
                let at_boundary = (clamped - unclamped).abs() > TEMP_EPS;
                let unwinding = (unclamped > clamped && step < 0.0) || (unclamped < clamped && step > 0.0);
                if !at_boundary || unwinding {
                    *i_small = candidate;
                }
            }
            base + *i_small
        }
    };

    // heating off: the setpoint window does not apply, only the actuator limits
    let (clamped, lo_c, hi_c) = if inp.mode == Mode::Coast && !inp.heating_enabled {
        let a = &p.actuator;
        (clamp_f64(raw_c, a.min_c, a.max_c), a.min_c, a.max_c)
    } else {
        (band.clamp(raw_c, inp.setpoint_c, p), band.lo_c, band.hi_c)
    };
    let desired_c = quantize_within(clamped, p.actuator.resolution_c, lo_c, hi_c);
    TargetOutput {
        desired_c,
        raw_c,
        p_term_c,
        i_small_c: *i_small,
        saturated: (clamped - raw_c).abs() > TEMP_EPS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn hold(setpoint_c: f64, room_c: f64) -> TargetInputs {
        TargetInputs {
            mode: Mode::Hold,
            setpoint_c,
            error_c: Some(setpoint_c - room_c),
            bias_c: 0.0,
            dt_s: None,
            heating_enabled: true,
        }
    }

    #[test]
    fn hold_scenario_clamps_to_authority_window() {
        let mut p = Params::default();
        p.actuator.max_c = 30.0;
        let mut i = 0.0;
        let out = compute(&hold(21.0, 19.0), &mut i, &p);
        assert!((out.p_term_c - 10.0).abs() < 1e-12);
        assert!((out.raw_c - 31.0).abs() < 1e-12);
        assert!((out.desired_c - 29.0).abs() < 1e-9);
        assert!(out.saturated);
    }

    #[test]
    fn actuator_limit_wins_over_offset_window() {
        let p = Params::default();
        let mut i = 0.0;
        let out = compute(&hold(21.0, 19.0), &mut i, &p);
        assert!((out.desired_c - 25.0).abs() < 1e-9);
    }

    #[rstest]
    #[case(Mode::Boost, 25.0)]
    #[case(Mode::Coast, 13.0)]
    fn mode_targets(#[case] mode: Mode, #[case] expected: f64) {
        let mut p = Params::default();
        p.actuator.max_c = 30.0;
        let mut i = 0.0;
        let mut inp = hold(21.0, 20.9);
        inp.mode = mode;
        // coast target 5 sits below setpoint - max_offset
        let out = compute(&inp, &mut i, &p);
        assert!((out.desired_c - expected).abs() < 1e-9, "{mode}: {}", out.desired_c);
    }

    #[rstest]
    #[case(None, 5.0)]
    #[case(Some(2.0), 19.0)]
    fn heating_off_coast_ignores_setpoint_window(#[case] offset: Option<f64>, #[case] expected: f64) {
        let mut p = Params::default();
        p.modes.coast_offset_c = offset;
        let mut i = 0.0;
        let mut inp = hold(21.0, 18.0);
        inp.mode = Mode::Coast;
        inp.heating_enabled = false;
        let out = compute(&inp, &mut i, &p);
        assert!((out.desired_c - expected).abs() < 1e-9, "{}", out.desired_c);
    }

    #[test]
    fn coast_offset_replaces_fixed_target() {
        let mut p = Params::default();
        p.modes.coast_offset_c = Some(2.0);
        let mut i = 0.0;
        let mut inp = hold(21.0, 21.5);
        inp.mode = Mode::Coast;
        assert!((compute(&inp, &mut i, &p).desired_c - 19.0).abs() < 1e-9);
    }

    #[test]
    fn integral_freezes_when_saturated() {
        let mut p = Params::default();
        p.comfort.ki_small = 0.01;
        let mut i = 0.0;
        let mut inp = hold(21.0, 19.0);
        inp.dt_s = Some(60.0);
        compute(&inp, &mut i, &p);
        assert_eq!(i, 0.0);

        let mut inp = hold(21.0, 20.95);
        inp.dt_s = Some(60.0);
        compute(&inp, &mut i, &p);
        assert!(i > 0.0 && i <= p.comfort.i_small_max_c);
    }

    #[test]
    fn integral_only_moves_in_hold() {
        let mut p = Params::default();
        p.comfort.ki_small = 0.01;
        let mut i = 0.5;
        let mut inp = hold(21.0, 20.95);
        inp.dt_s = Some(60.0);
        inp.mode = Mode::Boost;
        compute(&inp, &mut i, &p);
        assert_eq!(i, 0.5);
    }
}
