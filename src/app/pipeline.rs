//! Shared "load -> fit" logic used by every subcommand that needs models.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! ingest -> validate -> fit both models. `predict` and `reach` may instead
//! reload models from a fit JSON written by `fit --export`.

use std::path::{Path, PathBuf};

use crate::domain::{FitConfig, SeriesStats};
use crate::error::AppError;
use crate::fit::{FitOutcome, fit_all};
use crate::io::{IngestOptions, IngestedData, load_series, read_fit_json};

/// All computed outputs of a single fit run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub ingest: IngestedData,
    pub outcome: FitOutcome,
}

/// Where `predict` / `reach` get their models from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    /// Fit the raw observations now.
    Input(PathBuf),
    /// Reuse a saved fit.
    FitFile(PathBuf),
}

/// Models plus the observed range they were fitted on.
#[derive(Debug, Clone)]
pub struct FittedModels {
    pub stats: SeriesStats,
    pub outcome: FitOutcome,
}

/// Load, validate and fit an observation file.
pub fn run_fit(path: &Path, options: &IngestOptions, config: &FitConfig) -> Result<RunOutput, AppError> {
    config.validate()?;
    let ingest = load_series(path, options)?;
    let outcome = fit_all(&ingest.series, config)?;
    Ok(RunOutput { ingest, outcome })
}

pub fn load_models(
    source: &ModelSource,
    options: &IngestOptions,
    config: &FitConfig,
) -> Result<FittedModels, AppError> {
    match source {
        ModelSource::Input(path) => {
            let run = run_fit(path, options, config)?;
            Ok(FittedModels {
                stats: run.ingest.series.stats(),
                outcome: run.outcome,
            })
        }
        ModelSource::FitFile(path) => {
            let fit = read_fit_json(path)?;
            let mut outcome = fit.outcome();
            // The query's limit wins over the one saved with the fit.
            if let Some(model) = outcome.exponential.take() {
                let model = model
                    .with_inverse_limit(config.inverse_scale_limit)
                    .map_err(|e| AppError::new(2, format!("Invalid inverse scale limit: {e}")))?;
                outcome.exponential = Some(model);
            }
            Ok(FittedModels {
                stats: fit.stats,
                outcome,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::io::write_fit_json;
    use crate::models::TrendModel;

    fn decay_file(n: usize) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        for i in 0..n {
            let ts = 1_704_067_200_000_i64 + i as i64 * 86_400_000;
            let value = 500.0 * (-0.1 * i as f64).exp() + 20.0;
            writeln!(file, "{ts}\t{value}").unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn run_fit_produces_both_models() {
        let file = decay_file(15);
        let run = run_fit(file.path(), &IngestOptions::default(), &FitConfig::default()).unwrap();
        assert_eq!(run.ingest.series.len(), 15);
        assert!(run.outcome.linear.is_some());
        assert!(run.outcome.exponential.is_some());
    }

    #[test]
    fn short_input_is_a_fit_error() {
        let file = decay_file(5);
        let err = run_fit(file.path(), &IngestOptions::default(), &FitConfig::default()).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn invalid_config_is_rejected_before_loading() {
        let config = FitConfig {
            r2_floor: 2.0,
            ..FitConfig::default()
        };
        let err = run_fit(Path::new("does-not-exist.tsv"), &IngestOptions::default(), &config).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn fit_file_source_matches_fresh_fit() {
        let file = decay_file(15);
        let config = FitConfig::default();
        let options = IngestOptions::default();
        let fresh = load_models(&ModelSource::Input(file.path().to_path_buf()), &options, &config).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("fit.json");
        write_fit_json(&json, Some(file.path()), &fresh.stats, &fresh.outcome).unwrap();
        let saved = load_models(&ModelSource::FitFile(json), &options, &config).unwrap();

        assert_eq!(saved.stats.count, fresh.stats.count);
        assert_eq!(saved.outcome.linear.is_some(), fresh.outcome.linear.is_some());
        assert_eq!(saved.outcome.exponential.is_some(), fresh.outcome.exponential.is_some());
    }

    #[test]
    fn fit_file_uses_the_query_inverse_limit() {
        let file = decay_file(15);
        let options = IngestOptions::default();
        let fresh =
            load_models(&ModelSource::Input(file.path().to_path_buf()), &options, &FitConfig::default())
                .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("fit.json");
        write_fit_json(&json, Some(file.path()), &fresh.stats, &fresh.outcome).unwrap();

        let model = fresh.outcome.exponential.as_ref().unwrap();
        // Three times the scale above the asymptote: outside the default 2x limit.
        let target = model.c() + 3.0 * model.a();
        assert!(model.inverse_predict(target).is_err());

        let wide = FitConfig {
            inverse_scale_limit: 4.0,
            ..FitConfig::default()
        };
        let saved = load_models(&ModelSource::FitFile(json), &options, &wide).unwrap();
        assert!(saved.outcome.exponential.unwrap().inverse_predict(target).is_ok());
    }
}
