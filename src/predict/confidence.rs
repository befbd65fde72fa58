//! Extrapolation confidence heuristic.
//!
//! Not a statistical interval: the score only penalizes how far past the last
//! observation a prediction reaches, relative to how much history exists.
//!
//! ```text
//! confidence = round(100 - (target - last) / (last - first) · 50)
//! ```
//!
//! clamped to `[confidence_floor, confidence_ceiling]`.

use crate::domain::{FitConfig, SeriesStats};

pub fn confidence(target_ms: i64, stats: &SeriesStats, config: &FitConfig) -> u8 {
    let floor = f64::from(config.confidence_floor);
    let ceiling = f64::from(config.confidence_ceiling);

    let data_range = stats.last_time as f64 - stats.first_time as f64;
    if data_range <= 0.0 {
        return config.confidence_floor;
    }

    let extrapolation = target_ms as f64 - stats.last_time as f64;
    let raw = (100.0 - extrapolation / data_range * 50.0).round();
    if raw.is_nan() {
        return config.confidence_floor;
    }

    raw.max(floor).min(ceiling) as u8
}
