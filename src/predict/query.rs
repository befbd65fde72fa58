//! Forward and inverse queries against a fitted outcome.
//!
//! Both queries pick the preferred model kind. When it was not produced, the
//! other kind is used instead and the result is flagged as a fallback. A model
//! that exists but cannot answer the query is an error, never a silent switch.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{FitConfig, ModelKind, SeriesStats};
use crate::error::PredictError;
use crate::fit::FitOutcome;
use crate::models::{TrendModel, check_target_value};
use crate::predict::confidence::confidence;

/// Value predicted at a future time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub kind: ModelKind,
    /// The preferred model was unavailable and `kind` was used instead.
    pub fallback: bool,
    /// Epoch ms.
    pub target: i64,
    pub value: f64,
    pub confidence: u8,
}

/// Time at which a target value is reached.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reach {
    pub kind: ModelKind,
    pub fallback: bool,
    pub target_value: f64,
    /// Epoch ms.
    pub timestamp: i64,
}

/// Preferred model if present, else the other one.
pub fn choose_model(
    outcome: &FitOutcome,
    preference: ModelKind,
) -> Result<(&dyn TrendModel, bool), PredictError> {
    if let Some(model) = outcome.model(preference) {
        return Ok((model, false));
    }
    let other = preference.other();
    match outcome.model(other) {
        Some(model) => {
            debug!(
                preferred = preference.display_name(),
                used = other.display_name(),
                "preferred model unavailable, falling back"
            );
            Ok((model, true))
        }
        None => Err(PredictError::ModelUnavailable),
    }
}

/// Query times are epoch ms after 1970, like the observations themselves.
fn check_now(now_ms: i64) -> Result<(), PredictError> {
    if now_ms <= 0 {
        return Err(PredictError::PastOrInvalidTarget(format!(
            "reference time must be a positive epoch-ms timestamp (got {now_ms})"
        )));
    }
    Ok(())
}

/// Predict the value at `target_ms`, which must lie strictly after `now_ms`.
pub fn predict_at(
    outcome: &FitOutcome,
    preference: ModelKind,
    target_ms: i64,
    now_ms: i64,
    stats: &SeriesStats,
    config: &FitConfig,
) -> Result<Prediction, PredictError> {
    check_now(now_ms)?;
    if target_ms <= now_ms {
        return Err(PredictError::PastOrInvalidTarget(
            "target time must be in the future".to_string(),
        ));
    }

    let (model, fallback) = choose_model(outcome, preference)?;
    let value = model.predict(target_ms)?;

    Ok(Prediction {
        kind: model.kind(),
        fallback,
        target: target_ms,
        value,
        confidence: confidence(target_ms, stats, config),
    })
}

/// Solve for the time at which the curve reaches `target_value`.
///
/// A solution at or before `now_ms` means the value was already reached and is
/// reported as `PastOrInvalidTarget`.
pub fn reach_value(
    outcome: &FitOutcome,
    preference: ModelKind,
    target_value: f64,
    now_ms: i64,
) -> Result<Reach, PredictError> {
    check_now(now_ms)?;
    check_target_value(target_value)?;

    let (model, fallback) = choose_model(outcome, preference)?;
    let timestamp = model.inverse_predict(target_value)?;
    if timestamp <= now_ms {
        return Err(PredictError::PastOrInvalidTarget(format!(
            "{target_value} is reached at t={timestamp}, which is not in the future (already reached?)"
        )));
    }

    Ok(Reach {
        kind: model.kind(),
        fallback,
        target_value,
        timestamp,
    })
}
