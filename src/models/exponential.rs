//! Exponential decay/growth model: `value = a·e^(-λ·days) + c`.
//!
//! `c` is the asymptote. It is zero when the fitter had to fall back to the
//! offset-free form. Half-life and the current decay rate are derived from the
//! stored parameters on demand and never stored on their own.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::domain::ModelKind;
use crate::error::{FitError, PredictError};
use crate::math::timestamp_after;
use crate::models::{TrendModel, check_target_value};

/// Which exponential form produced the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExpForm {
    /// `a·e^(-λt) + c` with `c` estimated from the data.
    Offset,
    /// `a·e^(-λt)`.
    OffsetFree,
}

impl ExpForm {
    pub fn display_name(self) -> &'static str {
        match self {
            ExpForm::Offset => "with offset",
            ExpForm::OffsetFree => "offset-free",
        }
    }
}

/// Fitted parameters before they are checked and turned into a model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpParams {
    pub form: ExpForm,
    pub a: f64,
    pub lambda: f64,
    pub c: f64,
    pub r2: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExponentialModel {
    form: ExpForm,
    a: f64,
    lambda: f64,
    c: f64,
    r2: f64,
    start_time: i64,
    /// Elapsed days of the last point used by the fit (after outlier removal).
    last_elapsed_days: f64,
    sample_count: usize,
    outlier_count: usize,
    /// Inverse solves reject `value - c` above this multiple of `a`.
    inverse_limit: f64,
}

impl ExponentialModel {
    /// Check parameters and build the model.
    ///
    /// Requires `a > 0`, `λ > 0`, `c >= 0`, a positive inverse limit and every
    /// value finite.
    pub fn new(
        params: ExpParams,
        start_time: i64,
        last_elapsed_days: f64,
        sample_count: usize,
        outlier_count: usize,
        inverse_limit: f64,
    ) -> Result<Self, FitError> {
        let ExpParams { form, a, lambda, c, r2 } = params;
        if ![a, lambda, c, r2, last_elapsed_days].iter().all(|v| v.is_finite()) {
            return Err(FitError::InvalidParameters(format!(
                "non-finite exponential parameters (a={a}, lambda={lambda}, c={c}, r2={r2})"
            )));
        }
        if a <= 0.0 || lambda <= 0.0 || c < 0.0 {
            return Err(FitError::InvalidParameters(format!(
                "exponential parameters out of domain (a={a}, lambda={lambda}, c={c})"
            )));
        }
        if !(inverse_limit.is_finite() && inverse_limit > 0.0) {
            return Err(FitError::InvalidParameters(format!(
                "inverse scale limit must be finite and > 0 (got {inverse_limit})"
            )));
        }
        Ok(Self {
            form,
            a,
            lambda,
            c,
            r2: r2.clamp(0.0, 1.0),
            start_time,
            last_elapsed_days,
            sample_count,
            outlier_count,
            inverse_limit,
        })
    }

    /// Re-run the parameter checks of `new`, e.g. after deserializing.
    pub fn checked(self) -> Result<Self, FitError> {
        let params = ExpParams {
            form: self.form,
            a: self.a,
            lambda: self.lambda,
            c: self.c,
            r2: self.r2,
        };
        Self::new(
            params,
            self.start_time,
            self.last_elapsed_days,
            self.sample_count,
            self.outlier_count,
            self.inverse_limit,
        )
    }

    /// Same curve with a different inverse-solve limit.
    pub fn with_inverse_limit(self, inverse_limit: f64) -> Result<Self, FitError> {
        Self {
            inverse_limit,
            ..self
        }
        .checked()
    }

    pub fn form(&self) -> ExpForm {
        self.form
    }

    /// Scale: distance between the curve and its asymptote at the origin.
    pub fn a(&self) -> f64 {
        self.a
    }

    /// Decay rate per day.
    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    /// Asymptote.
    pub fn c(&self) -> f64 {
        self.c
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    pub fn outlier_count(&self) -> usize {
        self.outlier_count
    }

    /// Days for the distance to the asymptote to halve: `ln(2) / λ`.
    pub fn half_life(&self) -> f64 {
        std::f64::consts::LN_2 / self.lambda
    }

    /// Slope of the curve (value per day) at the last fitted observation.
    pub fn current_decay_rate(&self) -> f64 {
        -self.a * self.lambda * (-self.lambda * self.last_elapsed_days).exp()
    }
}

impl TrendModel for ExponentialModel {
    fn kind(&self) -> ModelKind {
        ModelKind::Exponential
    }

    fn start_time(&self) -> i64 {
        self.start_time
    }

    fn r2(&self) -> f64 {
        self.r2
    }

    fn value_at_days(&self, days: f64) -> f64 {
        self.a * (-self.lambda * days).exp() + self.c
    }

    fn inverse_predict(&self, target: f64) -> Result<i64, PredictError> {
        check_target_value(target)?;
        if self.lambda <= 0.0 {
            return Err(PredictError::OutOfRange("decay rate is not positive".to_string()));
        }
        let u = target - self.c;
        if u <= 0.0 {
            return Err(PredictError::OutOfRange(format!(
                "target {target} is not above the asymptote {:.4}",
                self.c
            )));
        }
        if u > self.inverse_limit * self.a {
            return Err(PredictError::OutOfRange(format!(
                "target {target} is more than {}x the fitted scale above the asymptote",
                self.inverse_limit
            )));
        }
        let days = -(u / self.a).ln() / self.lambda;
        timestamp_after(self.start_time, days).ok_or_else(|| {
            PredictError::OutOfRange(format!("solved time is not representable (days={days})"))
        })
    }
}

impl Display for ExponentialModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "y = {:.3} * e^(-{:.6} * t)", self.a, self.lambda)?;
        if self.form == ExpForm::Offset {
            write!(f, " + {:.3}", self.c)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: i64 = 1_700_000_000_000;

    fn model(form: ExpForm, a: f64, lambda: f64, c: f64) -> ExponentialModel {
        let params = ExpParams { form, a, lambda, c, r2: 0.95 };
        ExponentialModel::new(params, T0, 9.0, 10, 0, 2.0).unwrap()
    }

    #[test]
    fn derived_fields_follow_parameters() {
        let m = model(ExpForm::OffsetFree, 500.0, 0.1, 0.0);
        assert!((m.half_life() - 6.931_471_805_599_453).abs() < 1e-9);
        let expected_rate = -500.0 * 0.1 * (-0.9_f64).exp();
        assert!((m.current_decay_rate() - expected_rate).abs() < 1e-9);
    }

    #[test]
    fn inverse_round_trips_inside_range() {
        let m = model(ExpForm::Offset, 200.0, 0.05, 1_000.0);
        for target in [1_000.5, 1_050.0, 1_200.0, 1_399.0, 1_400.0] {
            let ts = m.inverse_predict(target).unwrap();
            let back = m.predict(ts).unwrap();
            assert!((back - target).abs() < 1e-4, "target={target} back={back}");
        }
    }

    #[test]
    fn inverse_rejects_values_at_or_below_asymptote() {
        let m = model(ExpForm::Offset, 200.0, 0.05, 1_000.0);
        let before = m.clone();
        for target in [999.0, 1_000.0] {
            assert!(matches!(
                m.inverse_predict(target),
                Err(PredictError::OutOfRange(_))
            ));
        }
        assert_eq!(m, before);
    }

    #[test]
    fn inverse_rejects_values_beyond_twice_the_scale() {
        let m = model(ExpForm::Offset, 200.0, 0.05, 1_000.0);
        assert!(matches!(
            m.inverse_predict(1_400.01),
            Err(PredictError::OutOfRange(_))
        ));
    }

    #[test]
    fn new_rejects_out_of_domain_parameters() {
        for (a, lambda, c) in [(0.0, 0.1, 0.0), (1.0, -0.1, 0.0), (1.0, 0.1, -1.0), (f64::NAN, 0.1, 0.0)] {
            let params = ExpParams { form: ExpForm::Offset, a, lambda, c, r2: 0.5 };
            assert!(ExponentialModel::new(params, T0, 1.0, 10, 0, 2.0).is_err());
        }
    }

    #[test]
    fn display_omits_offset_for_offset_free_form() {
        let free = model(ExpForm::OffsetFree, 500.0, 0.1, 0.0);
        assert_eq!(free.to_string(), "y = 500.000 * e^(-0.100000 * t)");
        let offset = model(ExpForm::Offset, 5.0, 0.25, 2.0);
        assert_eq!(offset.to_string(), "y = 5.000 * e^(-0.250000 * t) + 2.000");
    }
}
