//! Fitted model value types.
//!
//! Models are immutable values: a refit produces new ones. Each model owns the
//! time origin it was fitted against, so `predict` and `inverse_predict` convert
//! timestamps exactly the way the fitter did.

pub mod exponential;
pub mod linear;

pub use exponential::*;
pub use linear::*;

use crate::domain::ModelKind;
use crate::error::PredictError;
use crate::math::elapsed_days;

/// Forward and inverse prediction over a fitted curve.
pub trait TrendModel {
    fn kind(&self) -> ModelKind;

    /// Epoch-ms origin of the elapsed-days axis (first observation of the fit).
    fn start_time(&self) -> i64;

    /// Goodness of fit, in `[0, 1]`.
    fn r2(&self) -> f64;

    /// Raw curve value at `days` after the origin, without clamping.
    fn value_at_days(&self, days: f64) -> f64;

    /// Predicted value at `timestamp` (epoch ms), clamped to `>= 0`.
    fn predict(&self, timestamp: i64) -> Result<f64, PredictError> {
        let value = self.value_at_days(elapsed_days(timestamp, self.start_time()));
        if !value.is_finite() {
            return Err(PredictError::OutOfRange(format!(
                "{} prediction is not finite at t={timestamp}",
                self.kind().display_name()
            )));
        }
        Ok(value.max(0.0))
    }

    /// Timestamp (epoch ms) at which the curve reaches `target`.
    fn inverse_predict(&self, target: f64) -> Result<i64, PredictError>;
}

/// Shared input check for inverse solves.
pub(crate) fn check_target_value(target: f64) -> Result<(), PredictError> {
    if !target.is_finite() || target <= 0.0 {
        return Err(PredictError::PastOrInvalidTarget(format!(
            "target value must be finite and > 0 (got {target})"
        )));
    }
    Ok(())
}
