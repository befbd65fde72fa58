//! Read/write fit JSON files.
//!
//! A fit file is the portable form of one `fit` run:
//! - series statistics (observed range, extremes)
//! - both model parameter sets plus their equations and derived fields
//! - a precomputed prediction grid over the observed range and a horizon after it
//!
//! `predict` and `reach` can run from a fit file without the raw data.
//!
//! Series can also be written back out as delimited text in the format the
//! ingest layer reads.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{ModelKind, SeriesStats, TimeSeries};
use crate::error::AppError;
use crate::fit::FitOutcome;
use crate::io::ingest::IngestOptions;
use crate::models::{ExponentialModel, LinearModel, TrendModel};
use crate::report::format_time;

pub const TOOL_NAME: &str = "forecast";

/// Number of grid samples written by default.
pub const GRID_POINTS: usize = 101;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitFile {
    pub tool: String,
    /// Input file the fit was computed from, if any.
    pub source: Option<String>,
    pub stats: SeriesStats,
    pub linear: Option<LinearModel>,
    pub exponential: Option<ExponentialModel>,
    pub summaries: Vec<ModelSummary>,
    pub skipped: Vec<SkippedModel>,
    pub grid: PredictionGrid,
}

/// Human-facing description of one fitted model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSummary {
    pub kind: ModelKind,
    pub equation: String,
    pub r2: f64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub half_life_days: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub current_decay_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedModel {
    pub kind: ModelKind,
    pub reason: String,
}

/// Model values sampled on a shared time grid. `None` where a model is absent
/// or cannot be evaluated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionGrid {
    pub timestamps: Vec<i64>,
    pub linear: Vec<Option<f64>>,
    pub exponential: Vec<Option<f64>>,
}

impl FitFile {
    pub fn build(source: Option<&Path>, stats: &SeriesStats, outcome: &FitOutcome) -> Self {
        let mut summaries = Vec::new();
        if let Some(m) = &outcome.linear {
            summaries.push(ModelSummary {
                kind: ModelKind::Linear,
                equation: m.to_string(),
                r2: m.r2(),
                half_life_days: None,
                current_decay_rate: None,
            });
        }
        if let Some(m) = &outcome.exponential {
            summaries.push(ModelSummary {
                kind: ModelKind::Exponential,
                equation: m.to_string(),
                r2: m.r2(),
                half_life_days: Some(m.half_life()),
                current_decay_rate: Some(m.current_decay_rate()),
            });
        }

        let skipped = outcome
            .skipped
            .iter()
            .map(|(kind, err)| SkippedModel {
                kind: *kind,
                reason: err.to_string(),
            })
            .collect();

        Self {
            tool: TOOL_NAME.to_string(),
            source: source.map(|p| p.display().to_string()),
            stats: *stats,
            linear: outcome.linear.clone(),
            exponential: outcome.exponential.clone(),
            summaries,
            skipped,
            grid: build_grid(outcome, stats, GRID_POINTS),
        }
    }

    /// Models stored in the file, ready for prediction.
    ///
    /// Skip reasons are kept as text in the file only.
    pub fn outcome(&self) -> FitOutcome {
        FitOutcome {
            linear: self.linear.clone(),
            exponential: self.exponential.clone(),
            skipped: Vec::new(),
        }
    }
}

/// Write a fit JSON file.
pub fn write_fit_json(
    path: &Path,
    source: Option<&Path>,
    stats: &SeriesStats,
    outcome: &FitOutcome,
) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(4, format!("Failed to create fit JSON '{}': {e}", path.display())))?;

    let fit = FitFile::build(source, stats, outcome);
    serde_json::to_writer_pretty(file, &fit)
        .map_err(|e| AppError::new(4, format!("Failed to write fit JSON: {e}")))?;

    Ok(())
}

/// Read a fit JSON file. Stored model parameters are re-checked.
pub fn read_fit_json(path: &Path) -> Result<FitFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open fit JSON '{}': {e}", path.display())))?;
    let mut fit: FitFile =
        serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid fit JSON: {e}")))?;

    if let Some(model) = fit.linear.take() {
        let model = model
            .checked()
            .map_err(|e| AppError::new(2, format!("Invalid linear model in fit JSON: {e}")))?;
        fit.linear = Some(model);
    }
    if let Some(model) = fit.exponential.take() {
        let model = model
            .checked()
            .map_err(|e| AppError::new(2, format!("Invalid exponential model in fit JSON: {e}")))?;
        fit.exponential = Some(model);
    }

    Ok(fit)
}

/// Write `<local time><delim><value>` lines.
pub fn write_series_text<W: Write>(
    writer: W,
    series: &TimeSeries,
    options: &IngestOptions,
) -> Result<(), AppError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .delimiter(options.delimiter)
        .from_writer(writer);

    for p in series.points() {
        writer
            .write_record([format_time(p.timestamp, options.utc_offset), format!("{:.4}", p.value)])
            .map_err(|e| AppError::new(4, format!("Failed to write series: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(4, format!("Failed to write series: {e}")))?;

    Ok(())
}

/// Sample both models from the first observation to one observed span past
/// the last one.
fn build_grid(outcome: &FitOutcome, stats: &SeriesStats, n: usize) -> PredictionGrid {
    let n = n.max(2);
    let t0 = stats.first_time;
    let mut span = stats.last_time - stats.first_time;
    if span <= 0 {
        span = crate::math::MS_PER_DAY as i64;
    }
    let t1 = stats.last_time.saturating_add(span);

    let mut timestamps = Vec::with_capacity(n);
    let mut linear = Vec::with_capacity(n);
    let mut exponential = Vec::with_capacity(n);

    for i in 0..n {
        let u = i as f64 / (n as f64 - 1.0);
        let t = t0 + (u * (t1 - t0) as f64).round() as i64;
        timestamps.push(t);
        linear.push(sample(outcome.linear.as_ref(), t));
        exponential.push(sample(outcome.exponential.as_ref(), t));
    }

    PredictionGrid {
        timestamps,
        linear,
        exponential,
    }
}

fn sample<M: TrendModel>(model: Option<&M>, t: i64) -> Option<f64> {
    model.and_then(|m| m.predict(t).ok())
}
