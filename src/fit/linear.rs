//! Linear fitter: ordinary least squares of value against elapsed days.

use tracing::debug;

use crate::domain::TimeSeries;
use crate::error::FitError;
use crate::math::{r_squared, simple_ols};
use crate::models::LinearModel;

/// Fewest points a line can be fitted through.
pub const MIN_LINEAR_POINTS: usize = 2;

/// Fit `value = slope·days + intercept` over the whole series.
///
/// `r2` is clamped to be non-negative: a fit worse than the mean is reported as 0.
pub fn fit_linear(series: &TimeSeries) -> Result<LinearModel, FitError> {
    series.require(MIN_LINEAR_POINTS)?;

    let x = series.elapsed_days();
    let y = series.values();
    let line = simple_ols(&x, &y)?;

    let predicted: Vec<f64> = x.iter().map(|&xi| line.eval(xi)).collect();
    let r2 = r_squared(&y, &predicted).max(0.0);

    debug!(
        slope = line.slope,
        intercept = line.intercept,
        r2,
        n = x.len(),
        "linear fit accepted"
    );

    Ok(LinearModel::new(
        line.slope,
        line.intercept,
        r2,
        series.start_time(),
        x.len(),
    ))
}
