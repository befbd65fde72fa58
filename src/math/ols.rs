//! Closed-form simple least squares.
//!
//! Both models reduce to fitting a straight line `y = slope·x + intercept`:
//! the linear model directly, the exponential model after log-linearization.
//! With a single predictor the normal equations have a closed form:
//!
//! ```text
//! slope     = (nΣxy - ΣxΣy) / (nΣx² - (Σx)²)
//! intercept = (Σy - slope·Σx) / n
//! ```
//!
//! The denominator is `n²·Var(x)`; it vanishes when every `x` is equal (all
//! timestamps identical), which we report as a degenerate fit.

use crate::error::FitError;

/// Below this absolute value the OLS denominator is treated as zero.
pub const DENOMINATOR_EPS: f64 = 1e-10;

/// Slope and intercept of a fitted line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LineFit {
    pub fn eval(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Fit `y = slope·x + intercept` by ordinary least squares.
///
/// Fails with `InsufficientData` for fewer than two points, `DegenerateFit` when
/// the denominator is near zero and `InvalidParameters` if either coefficient is
/// not finite. `x` and `y` must have the same length.
pub fn simple_ols(x: &[f64], y: &[f64]) -> Result<LineFit, FitError> {
    debug_assert_eq!(x.len(), y.len(), "x and y must have the same length");
    let n = x.len().min(y.len());
    if n < 2 {
        return Err(FitError::InsufficientData { needed: 2, found: n });
    }

    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    let mut sum_xy = 0.0;
    let mut sum_xx = 0.0;
    for (&xi, &yi) in x.iter().zip(y) {
        sum_x += xi;
        sum_y += yi;
        sum_xy += xi * yi;
        sum_xx += xi * xi;
    }

    let n_f = n as f64;
    let denominator = n_f * sum_xx - sum_x * sum_x;
    if denominator.abs() < DENOMINATOR_EPS {
        return Err(FitError::DegenerateFit { denominator });
    }

    let slope = (n_f * sum_xy - sum_x * sum_y) / denominator;
    let intercept = (sum_y - slope * sum_x) / n_f;

    if !(slope.is_finite() && intercept.is_finite()) {
        return Err(FitError::InvalidParameters(format!(
            "non-finite coefficients (slope={slope}, intercept={intercept})"
        )));
    }

    Ok(LineFit { slope, intercept })
}
