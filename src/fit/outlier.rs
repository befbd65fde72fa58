//! Z-score outlier rejection for the exponential fit.
//!
//! The exponential fit is sensitive to a handful of spurious points, but series
//! are usually short. So the threshold is conservative and the filter refuses to
//! run if it would leave too few points: in that case the original sample is
//! returned untouched and no outliers are reported.

use tracing::debug;

use crate::math::population_std_dev;

/// Sample left after outlier rejection. `days` and `values` stay parallel.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredSample {
    pub days: Vec<f64>,
    pub values: Vec<f64>,
    pub outlier_count: usize,
}

impl FilteredSample {
    fn unfiltered(days: &[f64], values: &[f64]) -> Self {
        Self {
            days: days.to_vec(),
            values: values.to_vec(),
            outlier_count: 0,
        }
    }
}

/// Drop points whose `|value - mean| / stddev` exceeds `z_threshold`.
///
/// Falls back to the unfiltered sample if fewer than `min_kept` points would
/// remain, or if the values have no spread at all.
pub fn reject_outliers(
    days: &[f64],
    values: &[f64],
    z_threshold: f64,
    min_kept: usize,
) -> FilteredSample {
    debug_assert_eq!(days.len(), values.len());

    let Some((mean, std_dev)) = population_std_dev(values) else {
        return FilteredSample::unfiltered(days, values);
    };
    if !(std_dev.is_finite() && std_dev > 0.0) {
        return FilteredSample::unfiltered(days, values);
    }

    let mut kept_days = Vec::with_capacity(days.len());
    let mut kept_values = Vec::with_capacity(values.len());
    let mut outlier_count = 0usize;

    for (idx, (&x, &y)) in days.iter().zip(values).enumerate() {
        let z = ((y - mean) / std_dev).abs();
        if z <= z_threshold {
            kept_days.push(x);
            kept_values.push(y);
        } else {
            outlier_count += 1;
            debug!(idx, value = y, z, "outlier removed");
        }
    }

    if kept_values.len() < min_kept {
        debug!(
            kept = kept_values.len(),
            min_kept, "too few points after outlier removal, using unfiltered sample"
        );
        return FilteredSample::unfiltered(days, values);
    }

    FilteredSample {
        days: kept_days,
        values: kept_values,
        outlier_count,
    }
}
