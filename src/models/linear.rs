//! Linear trend model: `value = slope·days + intercept`.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::domain::ModelKind;
use crate::error::{FitError, PredictError};
use crate::math::timestamp_after;
use crate::models::{TrendModel, check_target_value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    slope: f64,
    intercept: f64,
    r2: f64,
    start_time: i64,
    sample_count: usize,
}

impl LinearModel {
    /// Build a model from fitted coefficients. `r2` is clamped to `[0, 1]`.
    pub fn new(slope: f64, intercept: f64, r2: f64, start_time: i64, sample_count: usize) -> Self {
        Self {
            slope,
            intercept,
            r2: r2.clamp(0.0, 1.0),
            start_time,
            sample_count,
        }
    }

    /// Re-apply the invariants of `new`, e.g. after deserializing.
    pub fn checked(self) -> Result<Self, FitError> {
        if !(self.slope.is_finite() && self.intercept.is_finite() && self.r2.is_finite()) {
            return Err(FitError::InvalidParameters(format!(
                "non-finite linear coefficients (slope={}, intercept={}, r2={})",
                self.slope, self.intercept, self.r2
            )));
        }
        Ok(Self::new(
            self.slope,
            self.intercept,
            self.r2,
            self.start_time,
            self.sample_count,
        ))
    }

    /// Change in value per day.
    pub fn slope(&self) -> f64 {
        self.slope
    }

    /// Value at the origin.
    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }
}

impl TrendModel for LinearModel {
    fn kind(&self) -> ModelKind {
        ModelKind::Linear
    }

    fn start_time(&self) -> i64 {
        self.start_time
    }

    fn r2(&self) -> f64 {
        self.r2
    }

    fn value_at_days(&self, days: f64) -> f64 {
        self.slope * days + self.intercept
    }

    fn inverse_predict(&self, target: f64) -> Result<i64, PredictError> {
        check_target_value(target)?;
        if self.slope == 0.0 {
            return Err(PredictError::OutOfRange(
                "flat line never reaches a different value".to_string(),
            ));
        }
        let days = (target - self.intercept) / self.slope;
        timestamp_after(self.start_time, days).ok_or_else(|| {
            PredictError::OutOfRange(format!("solved time is not representable (days={days})"))
        })
    }
}

impl Display for LinearModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.intercept.is_sign_negative() { '-' } else { '+' };
        write!(
            f,
            "y = {:.6}x {sign} {:.2}",
            self.slope,
            self.intercept.abs()
        )
    }
}
