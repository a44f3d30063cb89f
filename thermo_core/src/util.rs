//! Numeric and time helpers shared by the estimator, the state machine and the command policy.

/// Number of milliseconds in one second.
pub const MILLIS_PER_SEC: u64 = 1_000;
/// Number of seconds in one hour.
pub const SECS_PER_HOUR: f64 = 3_600.0;

/// Clamp without panicking on inverted bounds; `hi` wins when `lo > hi`.
#[inline]
pub fn clamp_f64(v: f64, lo: f64, hi: f64) -> f64 {
    v.max(lo).min(hi)
}

/// Convert a rate configured per minute into per second.
#[inline]
pub fn per_min_to_per_s(v: f64) -> f64 {
    v / 60.0
}

#[inline]
pub fn ms_to_s(ms: u64) -> f64 {
    ms as f64 / MILLIS_PER_SEC as f64
}

/// Elapsed seconds between two millisecond timestamps, 0 when `now_ms <= then_ms`.
#[inline]
pub fn secs_between(then_ms: u64, now_ms: u64) -> f64 {
    ms_to_s(now_ms.saturating_sub(then_ms))
}

/// Round to the nearest multiple of `step`, then pull the result back inside `[lo, hi]`.
/// A non-positive step disables rounding.
#[inline]
pub fn quantize_within(v: f64, step: f64, lo: f64, hi: f64) -> f64 {
    let rounded = if step > 0.0 {
        (v / step).round() * step
    } else {
        v
    };
    clamp_f64(rounded, lo, hi)
}

/// Tolerance for comparing temperatures that went through quantization.
pub const TEMP_EPS: f64 = 1e-6;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_prefers_upper_bound_when_inverted() {
        assert_eq!(clamp_f64(10.0, 12.0, 8.0), 8.0);
        assert_eq!(clamp_f64(10.0, 5.0, 25.0), 10.0);
    }

    #[test]
    fn ms_to_s_keeps_fractions() {
        assert!((ms_to_s(1_500) - 1.5).abs() < f64::EPSILON);
        assert_eq!(ms_to_s(0), 0.0);
    }

    #[test]
    fn quantize_stays_inside_bounds() {
        // 29.05 would round up to 29.1 and leave the band
        let v = quantize_within(29.06, 0.1, 5.0, 29.05);
        assert!(v <= 29.05);
        assert!((quantize_within(21.04, 0.1, 5.0, 30.0) - 21.0).abs() < 1e-9);
        assert_eq!(quantize_within(21.04, 0.0, 5.0, 30.0), 21.04);
    }

    #[test]
    fn secs_between_saturates() {
        assert_eq!(secs_between(5_000, 2_000), 0.0);
        assert_eq!(secs_between(2_000, 5_000), 3.0);
    }
}
