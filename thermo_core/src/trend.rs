//! Smoothed room temperature rate and the short-horizon overshoot predictor.

use crate::error::InvalidSampleError;
use crate::util::{MILLIS_PER_SEC, TEMP_EPS};
use thermo_traits::RoomSample;

/// How a new sample relates to the previous one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Observation {
    /// No previous sample; the rate is reset to zero.
    First,
    /// Strictly newer sample, `dt_s > 0`.
    Advance { dt_s: f64 },
    /// The same sample seen again by a re-evaluation.
    Repeat,
}

impl Observation {
    /// Elapsed time usable by integrators, only for a strictly newer sample.
    pub fn dt_s(self) -> Option<f64> {
        match self {
            Self::Advance { dt_s } => Some(dt_s),
            Self::First | Self::Repeat => None,
        }
    }
}

/// Exponential moving average of `dT/dt`, in °C/s.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrendEstimator {
    trend_c_per_s: f64,
    prev: Option<RoomSample>,
}

impl TrendEstimator {
    /// Classify `sample` against the previous one without mutating anything.
    pub fn classify(&self, sample: RoomSample) -> Result<Observation, InvalidSampleError> {
        let Some(prev) = self.prev else {
            return Ok(Observation::First);
        };
        if sample.timestamp_ms < prev.timestamp_ms {
            return Err(InvalidSampleError::NonPositiveDt {
                prev_ms: prev.timestamp_ms,
                now_ms: sample.timestamp_ms,
            });
        }
        if sample.timestamp_ms == prev.timestamp_ms {
            if (sample.temperature_c - prev.temperature_c).abs() <= TEMP_EPS {
                return Ok(Observation::Repeat);
            }
            return Err(InvalidSampleError::ConflictingDuplicate {
                timestamp_ms: sample.timestamp_ms,
            });
        }
        let dt_s = (sample.timestamp_ms - prev.timestamp_ms) as f64 / MILLIS_PER_SEC as f64;
        Ok(Observation::Advance { dt_s })
    }

    /// Fold a classified sample into the average.
    pub fn apply(&mut self, sample: RoomSample, obs: Observation, alpha: f64) {
        match obs {
            Observation::First => {
                self.trend_c_per_s = 0.0;
                self.prev = Some(sample);
            }
            Observation::Advance { dt_s } => {
                if let Some(prev) = self.prev {
                    let rate = (sample.temperature_c - prev.temperature_c) / dt_s;
                    self.trend_c_per_s = alpha * rate + (1.0 - alpha) * self.trend_c_per_s;
                }
                self.prev = Some(sample);
            }
            Observation::Repeat => {}
        }
    }

    pub fn trend_c_per_s(&self) -> f64 {
        self.trend_c_per_s
    }

    pub fn trend_c_per_min(&self) -> f64 {
        self.trend_c_per_s * 60.0
    }

    pub fn previous(&self) -> Option<RoomSample> {
        self.prev
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Linear extrapolation `T + trend · horizon`; `None` when the horizon is zero.
pub fn predict(temperature_c: f64, trend_c_per_s: f64, horizon_ms: u64) -> Option<f64> {
    if horizon_ms == 0 {
        return None;
    }
    let horizon_s = horizon_ms as f64 / MILLIS_PER_SEC as f64;
    Some(temperature_c + trend_c_per_s * horizon_s)
}
