//! Validated observation series.
//!
//! The loader hands us `RawRecord`s straight from a file. `TimeSeries::from_records`
//! is the validation step: it re-checks every value (the loader is not trusted),
//! drops anything non-finite or non-positive, and sorts by timestamp.

use serde::{Deserialize, Serialize};

use crate::error::FitError;
use crate::math::{MS_PER_DAY, elapsed_days};

/// One unvalidated `(timestamp, value)` record as produced by a loader.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawRecord {
    /// Epoch milliseconds (numeric, not yet checked).
    pub timestamp: f64,
    pub value: f64,
}

impl RawRecord {
    pub fn new(timestamp: f64, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// A single validated observation.
///
/// Invariant: `timestamp > 0`, `value > 0`, `value` finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    /// Epoch milliseconds.
    pub timestamp: i64,
    pub value: f64,
}

/// What validation did with the raw input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub read: usize,
    pub kept: usize,
    pub rejected: usize,
}

/// Summary of a validated series. Pure read, no fitting involved.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesStats {
    pub count: usize,
    pub first_time: i64,
    pub last_time: i64,
    /// `last_time - first_time`, in days.
    pub span_days: f64,
    pub min_value: f64,
    pub max_value: f64,
}

impl SeriesStats {
    /// Span rounded up to whole days, as shown in summaries.
    pub fn span_days_ceil(&self) -> i64 {
        self.span_days.ceil() as i64
    }
}

/// Observations sorted by timestamp (ties allowed, input order kept for ties).
///
/// Never empty. Read-only once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    points: Vec<DataPoint>,
}

impl TimeSeries {
    /// Validate and sort raw records.
    ///
    /// Fails with `InsufficientData` only when nothing survives validation; the
    /// stricter pipeline minimum is enforced by the fitting engine.
    pub fn from_records<I>(records: I) -> Result<(TimeSeries, ValidationReport), FitError>
    where
        I: IntoIterator<Item = RawRecord>,
    {
        let mut report = ValidationReport::default();
        let mut points = Vec::new();

        for record in records {
            report.read += 1;
            match validate_record(record) {
                Some(point) => points.push(point),
                None => report.rejected += 1,
            }
        }
        report.kept = points.len();

        if points.is_empty() {
            return Err(FitError::InsufficientData { needed: 1, found: 0 });
        }

        // Stable sort keeps input order for identical timestamps.
        points.sort_by_key(|p| p.timestamp);

        Ok((TimeSeries { points }, report))
    }

    /// Convenience constructor from `(epoch_ms, value)` pairs.
    pub fn from_pairs(pairs: &[(i64, f64)]) -> Result<TimeSeries, FitError> {
        let records = pairs
            .iter()
            .map(|&(t, v)| RawRecord::new(t as f64, v));
        TimeSeries::from_records(records).map(|(series, _)| series)
    }

    pub fn points(&self) -> &[DataPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Time origin shared by every model fitted on this series.
    pub fn start_time(&self) -> i64 {
        self.points[0].timestamp
    }

    pub fn end_time(&self) -> i64 {
        self.points[self.points.len() - 1].timestamp
    }

    /// Elapsed days of each point since `start_time`.
    pub fn elapsed_days(&self) -> Vec<f64> {
        let origin = self.start_time();
        self.points
            .iter()
            .map(|p| elapsed_days(p.timestamp, origin))
            .collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// Fail with `InsufficientData` unless at least `needed` points exist.
    pub fn require(&self, needed: usize) -> Result<(), FitError> {
        if self.points.len() < needed {
            return Err(FitError::InsufficientData {
                needed,
                found: self.points.len(),
            });
        }
        Ok(())
    }

    pub fn stats(&self) -> SeriesStats {
        let mut min_value = f64::INFINITY;
        let mut max_value = f64::NEG_INFINITY;
        for p in &self.points {
            min_value = min_value.min(p.value);
            max_value = max_value.max(p.value);
        }
        let first_time = self.start_time();
        let last_time = self.end_time();

        SeriesStats {
            count: self.points.len(),
            first_time,
            last_time,
            span_days: (last_time - first_time) as f64 / MS_PER_DAY,
            min_value,
            max_value,
        }
    }
}

fn validate_record(record: RawRecord) -> Option<DataPoint> {
    let RawRecord { timestamp, value } = record;
    if !(timestamp.is_finite() && value.is_finite()) {
        return None;
    }
    if value <= 0.0 || timestamp >= i64::MAX as f64 {
        return None;
    }
    let timestamp = timestamp.trunc() as i64;
    if timestamp <= 0 {
        return None;
    }
    Some(DataPoint { timestamp, value })
}
