//! Time-axis conversion.
//!
//! Models are fitted on elapsed days since a per-model origin (the first
//! observation). The same origin must be used when predicting.

pub const MS_PER_DAY: f64 = 86_400_000.0;

/// Days elapsed from `origin` to `timestamp` (both epoch milliseconds).
///
/// Computed in `f64` so that far-apart timestamps cannot overflow.
pub fn elapsed_days(timestamp: i64, origin: i64) -> f64 {
    (timestamp as f64 - origin as f64) / MS_PER_DAY
}

/// Absolute epoch-ms timestamp `days` after `origin`.
///
/// Returns `None` if the result is not finite or does not fit in an `i64`.
pub fn timestamp_after(origin: i64, days: f64) -> Option<i64> {
    let ts = origin as f64 + days * MS_PER_DAY;
    if !ts.is_finite() || ts >= i64::MAX as f64 || ts <= i64::MIN as f64 {
        return None;
    }
    Some(ts.round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_conversion_is_invertible() {
        let origin = 1_700_000_000_000;
        let ts = timestamp_after(origin, 2.5).unwrap();
        assert_eq!(ts - origin, 216_000_000);
        assert!((elapsed_days(ts, origin) - 2.5).abs() < 1e-12);
    }

    #[test]
    fn extreme_timestamps_do_not_overflow() {
        let days = elapsed_days(i64::MIN + 1, 1_700_000_000_000);
        assert!(days.is_finite());
        assert!(days < 0.0);
        assert!(elapsed_days(i64::MAX, i64::MIN) > 0.0);
    }

    #[test]
    fn non_finite_days_have_no_timestamp() {
        assert_eq!(timestamp_after(0, f64::INFINITY), None);
        assert_eq!(timestamp_after(0, f64::NAN), None);
        assert_eq!(timestamp_after(0, 1e300), None);
    }
}
