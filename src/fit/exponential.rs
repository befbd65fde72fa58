//! Exponential fitter.
//!
//! There is no nonlinear optimizer here. Each form is log-linearized and solved
//! with closed-form OLS:
//!
//! ```text
//! value = a·e^(-λt) + c   =>   ln(value - c) = ln(a) - λt
//! ```
//!
//! The offset form estimates `c` up front as a fixed fraction of the observed
//! minimum. Forms are tried in a fixed order (`fallback_chain`) and the first
//! accepted candidate wins.

use tracing::{debug, warn};

use crate::domain::{FitConfig, TimeSeries};
use crate::error::FitError;
use crate::fit::outlier::reject_outliers;
use crate::math::{r_squared, simple_ols};
use crate::models::{ExpForm, ExpParams, ExponentialModel};

/// Fewest points an exponential curve is fitted through.
pub const MIN_EXPONENTIAL_POINTS: usize = 3;

/// Forms to attempt, in order.
pub fn fallback_chain(config: &FitConfig) -> Vec<ExpForm> {
    if config.offset_model {
        vec![ExpForm::Offset, ExpForm::OffsetFree]
    } else {
        vec![ExpForm::OffsetFree]
    }
}

/// Fit the exponential model on a series (outlier rejection included).
pub fn fit_exponential(series: &TimeSeries, config: &FitConfig) -> Result<ExponentialModel, FitError> {
    series.require(MIN_EXPONENTIAL_POINTS)?;

    let sample = reject_outliers(
        &series.elapsed_days(),
        &series.values(),
        config.outlier_z,
        config.outlier_min_kept,
    );
    if sample.outlier_count > 0 {
        debug!(
            removed = sample.outlier_count,
            kept = sample.values.len(),
            "exponential fit uses outlier-filtered sample"
        );
    }

    let params = fit_with_fallback(&sample.days, &sample.values, config)?;
    let last_days = sample.days.last().copied().unwrap_or(0.0);

    ExponentialModel::new(
        params,
        series.start_time(),
        last_days,
        sample.values.len(),
        sample.outlier_count,
        config.inverse_scale_limit,
    )
}

/// Walk the fallback chain and return the first accepted candidate.
///
/// When every form is rejected, the error of the last attempt is returned.
pub fn fit_with_fallback(x: &[f64], y: &[f64], config: &FitConfig) -> Result<ExpParams, FitError> {
    let mut last_err = FitError::InvalidParameters("no exponential form attempted".to_string());

    for form in fallback_chain(config) {
        match fit_form(form, x, y, config) {
            Ok(params) => {
                debug!(
                    form = form.display_name(),
                    a = params.a,
                    lambda = params.lambda,
                    c = params.c,
                    r2 = params.r2,
                    "exponential fit accepted"
                );
                return Ok(params);
            }
            Err(err) => {
                warn!(form = form.display_name(), %err, "exponential candidate rejected");
                last_err = err;
            }
        }
    }

    Err(last_err)
}

/// Fit a single exponential form.
///
/// `r2` is scored against the untransformed values. A candidate is rejected when
/// `a <= 0`, `λ <= 0`, anything is non-finite, or `r2 < config.r2_floor`.
pub fn fit_form(form: ExpForm, x: &[f64], y: &[f64], config: &FitConfig) -> Result<ExpParams, FitError> {
    if y.len() < MIN_EXPONENTIAL_POINTS {
        return Err(FitError::InsufficientData {
            needed: MIN_EXPONENTIAL_POINTS,
            found: y.len(),
        });
    }

    let c = match form {
        ExpForm::Offset => config.offset_factor * y.iter().copied().fold(f64::INFINITY, f64::min),
        ExpForm::OffsetFree => 0.0,
    };

    let mut log_y = Vec::with_capacity(y.len());
    for &v in y {
        let adjusted = v - c;
        if adjusted <= 0.0 {
            return Err(FitError::Infeasible(format!(
                "value {v} minus offset {c} is not positive"
            )));
        }
        log_y.push(adjusted.ln());
    }

    let line = simple_ols(x, &log_y)?;
    let a = line.intercept.exp();
    let lambda = -line.slope;

    let predicted: Vec<f64> = x.iter().map(|&xi| a * (-lambda * xi).exp() + c).collect();
    let r2 = r_squared(y, &predicted);

    if !(a.is_finite() && lambda.is_finite() && r2.is_finite()) {
        return Err(FitError::InvalidParameters(format!(
            "non-finite result (a={a}, lambda={lambda}, r2={r2})"
        )));
    }
    if a <= 0.0 || lambda <= 0.0 {
        return Err(FitError::InvalidParameters(format!(
            "expected a > 0 and lambda > 0 (a={a}, lambda={lambda})"
        )));
    }
    if r2 < config.r2_floor {
        return Err(FitError::InvalidParameters(format!(
            "r2 {r2:.4} below acceptance floor {}",
            config.r2_floor
        )));
    }

    Ok(ExpParams { form, a, lambda, c, r2 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::MS_PER_DAY;
    use crate::models::TrendModel;

    const T0: i64 = 1_700_000_000_000;
    const DAY: i64 = MS_PER_DAY as i64;

    fn decay_series(a: f64, lambda: f64, c: f64, n: i64) -> TimeSeries {
        let pairs: Vec<(i64, f64)> = (0..n)
            .map(|i| (T0 + i * DAY, a * (-lambda * i as f64).exp() + c))
            .collect();
        TimeSeries::from_pairs(&pairs).unwrap()
    }

    #[test]
    fn offset_free_form_recovers_parameters() {
        let series = decay_series(500.0, 0.1, 0.0, 10);
        let params = fit_form(
            ExpForm::OffsetFree,
            &series.elapsed_days(),
            &series.values(),
            &FitConfig::default(),
        )
        .unwrap();

        assert!((params.a - 500.0).abs() / 500.0 < 0.05);
        assert!((params.lambda - 0.1).abs() / 0.1 < 0.05);
        assert!((params.r2 - 1.0).abs() < 1e-9);
        assert_eq!(params.c, 0.0);
    }

    #[test]
    fn decay_scenario_without_offset_tier() {
        let config = FitConfig {
            offset_model: false,
            ..FitConfig::default()
        };
        let model = fit_exponential(&decay_series(500.0, 0.1, 0.0, 10), &config).unwrap();

        assert_eq!(model.form(), ExpForm::OffsetFree);
        assert!((model.a() - 500.0).abs() < 1e-6);
        assert!((model.lambda() - 0.1).abs() < 1e-9);
        assert!((model.r2() - 1.0).abs() < 1e-9);
        assert!((model.half_life() - 6.93).abs() < 0.01);
        assert_eq!(model.sample_count(), 10);
        assert_eq!(model.outlier_count(), 0);
    }

    #[test]
    fn default_chain_tries_offset_form_first() {
        let model =
            fit_exponential(&decay_series(500.0, 0.1, 0.0, 10), &FitConfig::default()).unwrap();
        assert_eq!(model.form(), ExpForm::Offset);
        let min = 500.0 * (-0.9_f64).exp();
        assert!((model.c() - 0.9 * min).abs() < 1e-9);
        assert!(model.r2() >= 0.1 && model.r2() <= 1.0);
    }

    #[test]
    fn weak_offset_fit_falls_back_to_offset_free_form() {
        // Noisy, slowly decaying values: subtracting 0.9·min leaves r2 just
        // under the floor, while the plain log fit clears it.
        let values = [
            108.10, 101.90, 108.99, 101.05, 93.03, 115.55, 110.22, 108.85, 86.09, 99.34, 97.07,
            68.23,
        ];
        let pairs: Vec<(i64, f64)> = values
            .iter()
            .enumerate()
            .map(|(i, &v)| (T0 + i as i64 * DAY, v))
            .collect();
        let series = TimeSeries::from_pairs(&pairs).unwrap();
        let config = FitConfig::default();

        let offset = fit_form(ExpForm::Offset, &series.elapsed_days(), &series.values(), &config);
        assert!(matches!(offset, Err(FitError::InvalidParameters(_))));

        let params = fit_with_fallback(&series.elapsed_days(), &series.values(), &config).unwrap();
        assert_eq!(params.form, ExpForm::OffsetFree);
        assert_eq!(params.c, 0.0);
        assert!(params.r2 > 0.25 && params.r2 < 0.35);

        let model = fit_exponential(&series, &config).unwrap();
        assert_eq!(model.form(), ExpForm::OffsetFree);
        assert_eq!(model.outlier_count(), 0);
    }

    #[test]
    fn offset_form_recovers_shifted_decay() {
        // The offset estimate sits below the true asymptote, so the fit is
        // approximate but still accepted.
        let model =
            fit_exponential(&decay_series(300.0, 0.2, 1_000.0, 20), &FitConfig::default()).unwrap();
        assert_eq!(model.form(), ExpForm::Offset);
        assert!(model.r2() > 0.85);
        assert!(model.c() > 0.0);
    }

    #[test]
    fn growth_is_rejected_by_both_forms() {
        let pairs: Vec<(i64, f64)> = (0..10)
            .map(|i| (T0 + i * DAY, 100.0 * (0.2 * i as f64).exp()))
            .collect();
        let series = TimeSeries::from_pairs(&pairs).unwrap();
        let err = fit_exponential(&series, &FitConfig::default()).unwrap_err();
        assert!(matches!(err, FitError::InvalidParameters(_)));
    }

    #[test]
    fn identical_timestamps_fail_without_panicking() {
        let pairs: Vec<(i64, f64)> = (0..12).map(|i| (T0, 10.0 + i as f64)).collect();
        let series = TimeSeries::from_pairs(&pairs).unwrap();
        assert!(matches!(
            fit_exponential(&series, &FitConfig::default()),
            Err(FitError::DegenerateFit { .. })
        ));
    }

    #[test]
    fn offset_form_is_infeasible_for_non_positive_adjusted_values() {
        let config = FitConfig {
            offset_factor: 0.0,
            ..FitConfig::default()
        };
        let x = [0.0, 1.0, 2.0];
        let y = [3.0, 2.0, 1.0];
        assert!(fit_form(ExpForm::Offset, &x, &y, &config).is_ok());

        let err = fit_form(ExpForm::Offset, &x, &[3.0, 2.0, 0.0], &config).unwrap_err();
        assert!(matches!(err, FitError::Infeasible(_)));
    }

    #[test]
    fn too_few_points_are_insufficient() {
        let series = decay_series(10.0, 0.1, 0.0, 2);
        assert_eq!(
            fit_exponential(&series, &FitConfig::default()).unwrap_err(),
            FitError::InsufficientData { needed: 3, found: 2 }
        );
    }

    #[test]
    fn current_decay_rate_uses_last_filtered_day() {
        let config = FitConfig {
            offset_model: false,
            ..FitConfig::default()
        };
        let model = fit_exponential(&decay_series(500.0, 0.1, 0.0, 10), &config).unwrap();
        let expected = -500.0 * 0.1 * (-0.1_f64 * 9.0).exp();
        assert!((model.current_decay_rate() - expected).abs() < 1e-6);
        assert_eq!(model.start_time(), T0);
    }
}
