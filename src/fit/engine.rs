//! Fit both models on a validated series.
//!
//! `fit_all` is a pure function from a `TimeSeries` to the pair of optional
//! models. A model that cannot be fitted is not an error: it is recorded in
//! `skipped` with its reason and the other model is still attempted. The only
//! fatal condition is a series shorter than `FitConfig::min_points`.

use tracing::{debug, warn};

use crate::domain::{FitConfig, ModelKind, TimeSeries};
use crate::error::FitError;
use crate::fit::exponential::fit_exponential;
use crate::fit::linear::fit_linear;
use crate::models::{ExponentialModel, LinearModel, TrendModel};

/// Output of one full fit.
#[derive(Debug, Clone, PartialEq)]
pub struct FitOutcome {
    pub linear: Option<LinearModel>,
    pub exponential: Option<ExponentialModel>,
    /// Models that were not produced and why.
    pub skipped: Vec<(ModelKind, FitError)>,
}

impl FitOutcome {
    pub fn model(&self, kind: ModelKind) -> Option<&dyn TrendModel> {
        match kind {
            ModelKind::Linear => self.linear.as_ref().map(|m| m as &dyn TrendModel),
            ModelKind::Exponential => self.exponential.as_ref().map(|m| m as &dyn TrendModel),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.linear.is_none() && self.exponential.is_none()
    }
}

/// Fit the linear and exponential models.
pub fn fit_all(series: &TimeSeries, config: &FitConfig) -> Result<FitOutcome, FitError> {
    series.require(config.min_points)?;

    let mut skipped = Vec::new();

    let linear = match fit_linear(series) {
        Ok(model) => Some(model),
        Err(err) => {
            warn!(%err, "linear model not produced");
            skipped.push((ModelKind::Linear, err));
            None
        }
    };

    let exponential = match fit_exponential(series, config) {
        Ok(model) => Some(model),
        Err(err) => {
            warn!(%err, "exponential model not produced");
            skipped.push((ModelKind::Exponential, err));
            None
        }
    };

    debug!(
        points = series.len(),
        linear = linear.is_some(),
        exponential = exponential.is_some(),
        "fit complete"
    );

    Ok(FitOutcome {
        linear,
        exponential,
        skipped,
    })
}
