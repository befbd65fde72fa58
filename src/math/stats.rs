//! Summary statistics used by the outlier filter and by goodness-of-fit scoring.

/// Arithmetic mean. `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation (divides by `n`). The mean is returned too,
/// because it is needed to compute it.
pub fn population_std_dev(values: &[f64]) -> Option<(f64, f64)> {
    let m = mean(values)?;
    let variance = values
        .iter()
        .map(|v| {
            let d = v - m;
            d * d
        })
        .sum::<f64>()
        / values.len() as f64;
    Some((m, variance.sqrt()))
}

/// Coefficient of determination `1 - SS_res / SS_tot`.
///
/// Returns `0.0` when `SS_tot` is zero (constant observations). The raw value
/// can be negative for fits worse than the mean; callers decide whether to clamp.
pub fn r_squared(observed: &[f64], predicted: &[f64]) -> f64 {
    let Some(observed_mean) = mean(observed) else {
        return 0.0;
    };
    let ss_tot: f64 = observed
        .iter()
        .map(|y| (y - observed_mean).powi(2))
        .sum();
    let ss_res: f64 = observed
        .iter()
        .zip(predicted)
        .map(|(y, y_hat)| (y - y_hat).powi(2))
        .sum();

    if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn population_std_dev_divides_by_n() {
        let (m, sd) = population_std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((m - 5.0).abs() < 1e-12);
        assert!((sd - 2.0).abs() < 1e-12);
    }

    #[test]
    fn r_squared_perfect_and_constant() {
        let y = [1.0, 2.0, 3.0];
        assert!((r_squared(&y, &y) - 1.0).abs() < 1e-12);
        assert_eq!(r_squared(&[4.0, 4.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn r_squared_can_go_negative_unclamped() {
        let r2 = r_squared(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]);
        assert!(r2 < 0.0);
    }
}
