//! Formatted terminal output.
//!
//! We keep formatting code in one place so the fitting and prediction code
//! never deals with units, dates or layout.

use chrono::{DateTime, FixedOffset};

use crate::domain::{ModelKind, SeriesStats, ValidationReport};
use crate::fit::FitOutcome;
use crate::math::MS_PER_DAY;
use crate::models::TrendModel;
use crate::predict::{Prediction, Reach};

const MS_PER_HOUR: i64 = 3_600_000;

/// Epoch ms as `YYYY-MM-DD HH:MM:SS` at `offset`.
pub fn format_time(ts: i64, offset: FixedOffset) -> String {
    match DateTime::from_timestamp_millis(ts) {
        Some(dt) => dt.with_timezone(&offset).format("%Y-%m-%d %H:%M:%S").to_string(),
        None => format!("{ts} ms"),
    }
}

/// Distance from `now` to a future `target`, in whole days and hours.
pub fn format_time_from_now(target: i64, now: i64) -> String {
    let diff = target.saturating_sub(now).max(0);
    let day_ms = MS_PER_DAY as i64;
    let days = diff / day_ms;
    let hours = (diff % day_ms) / MS_PER_HOUR;
    if days > 0 {
        format!("in {days} days {hours} hours")
    } else {
        format!("in {hours} hours")
    }
}

/// Series statistics block.
pub fn format_stats(stats: &SeriesStats, offset: FixedOffset) -> String {
    let mut out = String::new();
    out.push_str(&format!("Points: {}\n", stats.count));
    out.push_str(&format!(
        "Range : {} .. {} ({} days)\n",
        format_time(stats.first_time, offset),
        format_time(stats.last_time, offset),
        stats.span_days_ceil()
    ));
    out.push_str(&format!(
        "Values: min={:.1} max={:.1}\n",
        stats.min_value, stats.max_value
    ));
    out
}

/// One line per input-validation outcome; empty when nothing was dropped.
pub fn format_validation(report: &ValidationReport, row_errors: usize) -> String {
    if report.rejected == 0 && row_errors == 0 {
        return String::new();
    }
    format!(
        "Input : read={} kept={} rejected={} unparsed={}\n",
        report.read, report.kept, report.rejected, row_errors
    )
}

/// Model diagnostics: equation, fit quality and derived fields.
pub fn format_models(outcome: &FitOutcome) -> String {
    let mut out = String::new();
    out.push_str("Models:\n");

    if let Some(m) = &outcome.linear {
        out.push_str(&format!(
            "- {:<18} {}  (r2={:.4}, n={})\n",
            ModelKind::Linear.display_name(),
            m,
            m.r2(),
            m.sample_count()
        ));
    }
    if let Some(m) = &outcome.exponential {
        out.push_str(&format!(
            "- {:<18} {}  (r2={:.4}, n={}, {})\n",
            ModelKind::Exponential.display_name(),
            m,
            m.r2(),
            m.sample_count(),
            m.form().display_name()
        ));
        out.push_str(&format!(
            "  half-life={:.2} days | current rate={:.4}/day | outliers removed={}\n",
            m.half_life(),
            m.current_decay_rate(),
            m.outlier_count()
        ));
    }
    for (kind, err) in &outcome.skipped {
        out.push_str(&format!("  (skipped {}) {err}\n", kind.display_name()));
    }
    if outcome.is_empty() {
        out.push_str("  no model could be fitted\n");
    }

    out
}

/// Full `fit` summary.
pub fn format_fit_summary(
    title: &str,
    stats: &SeriesStats,
    validation: Option<(&ValidationReport, usize)>,
    outcome: &FitOutcome,
    offset: FixedOffset,
) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== forecast - {title} ===\n"));
    out.push_str(&format_stats(stats, offset));
    if let Some((report, row_errors)) = validation {
        out.push_str(&format_validation(report, row_errors));
    }
    out.push('\n');
    out.push_str(&format_models(outcome));
    out
}

pub fn format_prediction(p: &Prediction, now: i64, offset: FixedOffset) -> String {
    format!(
        "{:.1}\n{}\n{}\n{}{} | confidence: {}%\n",
        p.value,
        format_time(p.target, offset),
        format_time_from_now(p.target, now),
        p.kind.display_name(),
        fallback_note(p.fallback),
        p.confidence
    )
}

pub fn format_reach(r: &Reach, now: i64, offset: FixedOffset) -> String {
    format!(
        "{}\n{}\n{}{} reaches {}\n",
        format_time(r.timestamp, offset),
        format_time_from_now(r.timestamp, now),
        r.kind.display_name(),
        fallback_note(r.fallback),
        r.target_value
    )
}

fn fallback_note(fallback: bool) -> &'static str {
    if fallback { " (fallback)" } else { "" }
}
