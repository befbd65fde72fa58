//! Shared configuration types.
//!
//! Every numeric policy the fitting engine applies is a field of `FitConfig`, so
//! callers can tune thresholds without touching the algorithms. The defaults are
//! the values the engine has always used.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Which fitted model a prediction should use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// `value = a·e^(-λt) + c` (or the offset-free form).
    #[default]
    Exponential,
    /// Ordinary least squares line.
    Linear,
}

impl ModelKind {
    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            ModelKind::Exponential => "exponential decay",
            ModelKind::Linear => "linear regression",
        }
    }

    /// The other model kind, used when the preferred one is unavailable.
    pub fn other(self) -> ModelKind {
        match self {
            ModelKind::Exponential => ModelKind::Linear,
            ModelKind::Linear => ModelKind::Exponential,
        }
    }
}

/// Tunable constants of the fitting engine and the prediction boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitConfig {
    /// Minimum number of valid points for the pipeline to run at all.
    pub min_points: usize,
    /// Minimum r² for an exponential candidate to be accepted.
    pub r2_floor: f64,
    /// Z-score above which a value is treated as an outlier.
    pub outlier_z: f64,
    /// Outlier removal is discarded if it would keep fewer points than this.
    pub outlier_min_kept: usize,
    /// Try the offset form `a·e^(-λt) + c` before the offset-free one.
    pub offset_model: bool,
    /// Asymptote estimate for the offset model, as a fraction of the observed minimum.
    pub offset_factor: f64,
    /// Inverse solves reject `value - c` above `inverse_scale_limit · a`.
    pub inverse_scale_limit: f64,
    /// Lower clamp of the confidence heuristic.
    pub confidence_floor: u8,
    /// Upper clamp of the confidence heuristic.
    pub confidence_ceiling: u8,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            min_points: 10,
            r2_floor: 0.1,
            outlier_z: 4.0,
            outlier_min_kept: 10,
            offset_model: true,
            offset_factor: 0.9,
            inverse_scale_limit: 2.0,
            confidence_floor: 30,
            confidence_ceiling: 95,
        }
    }
}

impl FitConfig {
    /// Reject settings the algorithms cannot work with.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.min_points < 3 {
            return Err(AppError::new(2, "min_points must be >= 3."));
        }
        if !(self.r2_floor.is_finite() && (0.0..=1.0).contains(&self.r2_floor)) {
            return Err(AppError::new(2, "r2_floor must be within [0, 1]."));
        }
        if !(self.outlier_z.is_finite() && self.outlier_z > 0.0) {
            return Err(AppError::new(2, "outlier_z must be finite and > 0."));
        }
        if !(self.offset_factor.is_finite() && (0.0..1.0).contains(&self.offset_factor)) {
            return Err(AppError::new(2, "offset_factor must be within [0, 1)."));
        }
        if !(self.inverse_scale_limit.is_finite() && self.inverse_scale_limit > 0.0) {
            return Err(AppError::new(2, "inverse_scale_limit must be finite and > 0."));
        }
        if self.confidence_floor > self.confidence_ceiling || self.confidence_ceiling > 100 {
            return Err(AppError::new(
                2,
                "confidence bounds must satisfy floor <= ceiling <= 100.",
            ));
        }
        Ok(())
    }
}
