//! Synthetic observation series for demos and tests.
//!
//! Values follow `a·e^(-λt) + c` with multiplicative log-normal noise and rare
//! spikes, so the outlier filter has something to do:
//!
//! ```text
//! value = curve(t) · exp(σ·(z + jump) - correction)
//! ```
//!
//! `jump` is `+spike_k` with probability `spike_prob_up`, `-spike_k` with
//! probability `spike_prob_down`, and 0 otherwise. The correction keeps the
//! noise mean-one so the series stays centred on the curve.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::TimeSeries;
use crate::error::AppError;
use crate::math::MS_PER_DAY;

#[derive(Debug, Clone, PartialEq)]
pub struct SampleParams {
    pub count: usize,
    /// Epoch ms of the first observation.
    pub start_time: i64,
    /// Spacing between observations, in hours.
    pub step_hours: f64,
    pub a: f64,
    pub lambda: f64,
    pub c: f64,
    /// Log-volatility of the noise.
    pub sigma: f64,
    pub spike_prob_up: f64,
    pub spike_prob_down: f64,
    /// Spike size in units of `sigma`.
    pub spike_k: f64,
    pub seed: u64,
}

impl Default for SampleParams {
    fn default() -> Self {
        Self {
            count: 120,
            start_time: 1_704_067_200_000,
            step_hours: 6.0,
            a: 400.0,
            lambda: 0.08,
            c: 1_500.0,
            sigma: 0.002,
            spike_prob_up: 0.01,
            spike_prob_down: 0.01,
            spike_k: 25.0,
            seed: 42,
        }
    }
}

impl SampleParams {
    fn validate(&self) -> Result<(), AppError> {
        if self.count == 0 {
            return Err(AppError::new(2, "Sample count must be > 0."));
        }
        if !(self.step_hours.is_finite() && self.step_hours > 0.0) {
            return Err(AppError::new(2, "Sample step must be finite and > 0."));
        }
        if !(self.a.is_finite() && self.lambda.is_finite() && self.c.is_finite()) {
            return Err(AppError::new(2, "Sample curve parameters must be finite."));
        }
        if self.a <= 0.0 || self.c < 0.0 {
            return Err(AppError::new(2, "Sample curve needs a > 0 and c >= 0."));
        }
        if !(self.sigma.is_finite() && self.sigma >= 0.0) {
            return Err(AppError::new(2, "Sample noise sigma must be finite and >= 0."));
        }
        if self.spike_prob_up < 0.0
            || self.spike_prob_down < 0.0
            || (self.spike_prob_up + self.spike_prob_down) >= 1.0
        {
            return Err(AppError::new(2, "Invalid spike probability settings."));
        }
        if !(self.spike_k.is_finite() && self.spike_k >= 0.0) {
            return Err(AppError::new(2, "Invalid spike magnitude."));
        }
        Ok(())
    }
}

/// Generate a deterministic synthetic series.
pub fn generate_series(params: &SampleParams) -> Result<TimeSeries, AppError> {
    params.validate()?;

    let mut rng = StdRng::seed_from_u64(sample_seed(params));
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| AppError::new(2, format!("Noise distribution error: {e}")))?;

    let step_ms = params.step_hours * 3_600_000.0;
    let correction = noise_mean_correction(params);

    let mut pairs = Vec::with_capacity(params.count);
    for i in 0..params.count {
        let offset_ms = i as f64 * step_ms;
        let timestamp = params.start_time + offset_ms.round() as i64;
        let days = offset_ms / MS_PER_DAY;
        let curve = params.a * (-params.lambda * days).exp() + params.c;

        let z = normal.sample(&mut rng);
        let jump = sample_jump(&mut rng, params);
        let value = curve * (params.sigma * (z + jump) - correction).exp();

        pairs.push((timestamp, value));
    }

    TimeSeries::from_pairs(&pairs)
        .map_err(|e| AppError::new(2, format!("Generated sample is invalid: {e}")))
}

fn sample_seed(params: &SampleParams) -> u64 {
    let mut hasher = DefaultHasher::new();
    params.seed.hash(&mut hasher);
    params.count.hash(&mut hasher);
    params.start_time.hash(&mut hasher);
    params.step_hours.to_bits().hash(&mut hasher);
    params.sigma.to_bits().hash(&mut hasher);
    params.spike_prob_up.to_bits().hash(&mut hasher);
    params.spike_prob_down.to_bits().hash(&mut hasher);
    params.spike_k.to_bits().hash(&mut hasher);
    hasher.finish()
}

// E[exp(σ·(z + jump))] = exp(σ²/2) · E[exp(σ·jump)].
fn noise_mean_correction(params: &SampleParams) -> f64 {
    let s = params.sigma;
    let p_none = 1.0 - params.spike_prob_up - params.spike_prob_down;
    let m1 = p_none
        + params.spike_prob_up * (s * params.spike_k).exp()
        + params.spike_prob_down * (-s * params.spike_k).exp();
    0.5 * s * s + m1.ln()
}

fn sample_jump(rng: &mut StdRng, params: &SampleParams) -> f64 {
    let roll: f64 = rng.r#gen();
    if roll < params.spike_prob_up {
        params.spike_k
    } else if roll < params.spike_prob_up + params.spike_prob_down {
        -params.spike_k
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FitConfig, ModelKind};
    use crate::fit::{fit_all, reject_outliers};
    use crate::models::TrendModel;

    #[test]
    fn same_seed_same_series() {
        let params = SampleParams::default();
        assert_eq!(generate_series(&params).unwrap(), generate_series(&params).unwrap());

        let other = SampleParams { seed: 7, ..params.clone() };
        assert_ne!(generate_series(&params).unwrap(), generate_series(&other).unwrap());
    }

    #[test]
    fn noiseless_sample_follows_the_curve() {
        let params = SampleParams {
            count: 10,
            step_hours: 24.0,
            a: 500.0,
            lambda: 0.1,
            c: 0.0,
            sigma: 0.0,
            ..SampleParams::default()
        };
        let series = generate_series(&params).unwrap();
        for (i, v) in series.values().iter().enumerate() {
            let expected = 500.0 * (-0.1 * i as f64).exp();
            assert!((v - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn spikes_are_caught_by_the_outlier_filter() {
        let params = SampleParams {
            count: 1_000,
            spike_prob_up: 0.01,
            spike_prob_down: 0.0,
            spike_k: 400.0,
            sigma: 0.001,
            lambda: 0.0,
            ..SampleParams::default()
        };
        let series = generate_series(&params).unwrap();
        let filtered = reject_outliers(&series.elapsed_days(), &series.values(), 4.0, 10);
        assert!(filtered.outlier_count > 0);
        assert!(filtered.values.len() >= 10);
    }

    #[test]
    fn noisy_sample_fits_with_bounded_r2() {
        let series = generate_series(&SampleParams::default()).unwrap();
        let outcome = fit_all(&series, &FitConfig::default()).unwrap();
        assert!(outcome.linear.is_some());
        for kind in [ModelKind::Linear, ModelKind::Exponential] {
            if let Some(model) = outcome.model(kind) {
                assert!((0.0..=1.0).contains(&model.r2()));
            }
        }
    }

    #[test]
    fn rejects_bad_parameters() {
        let params = SampleParams { count: 0, ..SampleParams::default() };
        assert_eq!(generate_series(&params).unwrap_err().exit_code(), 2);
        let params = SampleParams {
            spike_prob_up: 0.6,
            spike_prob_down: 0.5,
            ..SampleParams::default()
        };
        assert!(generate_series(&params).is_err());
    }
}
