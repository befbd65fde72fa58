//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - sets up logging
//! - runs the fit pipeline or a prediction query
//! - prints reports and writes optional exports

use std::fs::File;
use std::io;
use std::path::PathBuf;

use chrono::{FixedOffset, Utc};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Command, EngineArgs, FitArgs, InputArgs, PredictArgs, QueryArgs, ReachArgs, SampleArgs};
use crate::data::{SampleParams, generate_series};
use crate::domain::FitConfig;
use crate::error::AppError;
use crate::io::{IngestOptions, load_series, parse_timestamp, utc_offset, write_fit_json, write_series_text};
use crate::predict::{predict_at, reach_value};

pub mod pipeline;

use pipeline::{FittedModels, ModelSource};

/// Entry point for the `forecast` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Fit(args) => handle_fit(args),
        Command::Predict(args) => handle_predict(args),
        Command::Reach(args) => handle_reach(args),
        Command::Stats(args) => handle_stats(args),
        Command::Sample(args) => handle_sample(args),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose { "debug" } else { "warn" };
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new(filter)
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into())
    };
    // Ignore a second initialization.
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .try_init();
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let options = ingest_options(&args.input)?;
    let config = fit_config_from_args(&args.engine);
    let path = resolve_input(&args.input)?;
    let run = pipeline::run_fit(&path, &options, &config)?;

    let stats = run.ingest.series.stats();
    println!(
        "{}",
        crate::report::format_fit_summary(
            &path.display().to_string(),
            &stats,
            Some((&run.ingest.report, run.ingest.row_errors.len())),
            &run.outcome,
            options.utc_offset,
        )
    );

    if let Some(export) = &args.export {
        write_fit_json(export, Some(&path), &stats, &run.outcome)?;
        println!("Fit written to {}", export.display());
    }

    Ok(())
}

fn handle_predict(args: PredictArgs) -> Result<(), AppError> {
    let (models, config, offset) = load_query_models(&args.query)?;
    let now = resolve_now(args.query.now.as_deref(), offset)?;
    let target = parse_time_arg(&args.at, offset, "--at")?;

    let prediction = predict_at(
        &models.outcome,
        args.query.method,
        target,
        now,
        &models.stats,
        &config,
    )?;
    print!("{}", crate::report::format_prediction(&prediction, now, offset));
    Ok(())
}

fn handle_reach(args: ReachArgs) -> Result<(), AppError> {
    let (models, _, offset) = load_query_models(&args.query)?;
    let now = resolve_now(args.query.now.as_deref(), offset)?;

    let reach = reach_value(&models.outcome, args.query.method, args.value, now)?;
    print!("{}", crate::report::format_reach(&reach, now, offset));
    Ok(())
}

fn handle_stats(args: InputArgs) -> Result<(), AppError> {
    let options = ingest_options(&args)?;
    let path = resolve_input(&args)?;
    let ingest = load_series(&path, &options)?;

    print!("{}", crate::report::format_stats(&ingest.series.stats(), options.utc_offset));
    print!(
        "{}",
        crate::report::format_validation(&ingest.report, ingest.row_errors.len())
    );
    Ok(())
}

fn handle_sample(args: SampleArgs) -> Result<(), AppError> {
    let offset = utc_offset(args.utc_offset_hours)?;
    let params = SampleParams {
        count: args.count,
        start_time: parse_time_arg(&args.start, offset, "--start")?,
        step_hours: args.step_hours,
        a: args.a,
        lambda: args.lambda,
        c: args.c,
        sigma: args.sigma,
        spike_prob_up: args.spike_prob,
        spike_prob_down: args.spike_prob,
        spike_k: args.spike_k,
        seed: args.seed,
    };
    let series = generate_series(&params)?;
    let options = IngestOptions {
        utc_offset: offset,
        ..IngestOptions::default()
    };

    match &args.output {
        Some(path) => {
            let file = File::create(path).map_err(|e| {
                AppError::new(4, format!("Failed to create '{}': {e}", path.display()))
            })?;
            write_series_text(file, &series, &options)?;
        }
        None => write_series_text(io::stdout().lock(), &series, &options)?,
    }
    Ok(())
}

fn load_query_models(query: &QueryArgs) -> Result<(FittedModels, FitConfig, FixedOffset), AppError> {
    let options = ingest_options(&query.input)?;
    let config = fit_config_from_args(&query.engine);
    config.validate()?;

    let source = match &query.fit_file {
        Some(path) => ModelSource::FitFile(path.clone()),
        None => ModelSource::Input(resolve_input(&query.input)?),
    };
    let models = pipeline::load_models(&source, &options, &config)?;
    Ok((models, config, options.utc_offset))
}

pub fn fit_config_from_args(args: &EngineArgs) -> FitConfig {
    FitConfig {
        min_points: args.min_points,
        r2_floor: args.r2_floor,
        outlier_z: args.outlier_z,
        outlier_min_kept: args.outlier_min_kept,
        offset_model: !args.no_offset_model,
        offset_factor: args.offset_factor,
        inverse_scale_limit: args.inverse_scale_limit,
        confidence_floor: args.confidence_floor,
        confidence_ceiling: args.confidence_ceiling,
    }
}

fn ingest_options(args: &InputArgs) -> Result<IngestOptions, AppError> {
    IngestOptions::new(args.delimiter, args.utc_offset_hours)
}

/// `--input` if given, otherwise ask interactively.
fn resolve_input(args: &InputArgs) -> Result<PathBuf, AppError> {
    match &args.input {
        Some(path) => crate::cli::picker::validate_data_path(path),
        None => crate::cli::picker::prompt_for_data_path(),
    }
}

fn resolve_now(now: Option<&str>, offset: FixedOffset) -> Result<i64, AppError> {
    match now {
        Some(s) => parse_time_arg(s, offset, "--now"),
        None => Ok(Utc::now().timestamp_millis()),
    }
}

/// Parse a CLI time argument to epoch ms.
pub fn parse_time_arg(s: &str, offset: FixedOffset, flag: &str) -> Result<i64, AppError> {
    let ms = parse_timestamp(s, offset).map_err(|e| AppError::new(2, format!("Invalid {flag}: {e}")))?;
    if !ms.is_finite() || ms.abs() >= i64::MAX as f64 {
        return Err(AppError::new(2, format!("Invalid {flag}: `{s}` is out of range.")));
    }
    Ok(ms.round() as i64)
}

#[cfg(test)]
mod tests {
    use chrono::Offset;

    use super::*;

    #[test]
    fn engine_flags_map_to_config() {
        let cli = Cli::try_parse_from([
            "forecast",
            "fit",
            "--no-offset-model",
            "--outlier-z",
            "3.5",
            "--confidence-floor",
            "20",
        ])
        .unwrap();
        let Command::Fit(args) = cli.command else {
            panic!("expected fit");
        };
        let config = fit_config_from_args(&args.engine);
        assert!(!config.offset_model);
        assert_eq!(config.outlier_z, 3.5);
        assert_eq!(config.confidence_floor, 20);
        assert_eq!(config.min_points, FitConfig::default().min_points);
    }

    #[test]
    fn defaults_match_fit_config_defaults() {
        let cli = Cli::try_parse_from(["forecast", "fit"]).unwrap();
        let Command::Fit(args) = cli.command else {
            panic!("expected fit");
        };
        assert_eq!(fit_config_from_args(&args.engine), FitConfig::default());
    }

    #[test]
    fn time_args_accept_dates_and_epoch_ms() {
        let utc = Utc.fix();
        assert_eq!(parse_time_arg("2024-01-01", utc, "--at").unwrap(), 1_704_067_200_000);
        assert_eq!(parse_time_arg("1704067200000", utc, "--at").unwrap(), 1_704_067_200_000);
        assert_eq!(parse_time_arg("tomorrow", utc, "--at").unwrap_err().exit_code(), 2);
        assert!(parse_time_arg("1e300", utc, "--at").is_err());
    }
}
