//! Command-line parsing for the metric forecaster.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! fitting and prediction code. Every tunable can also be set through a
//! `FORECAST_*` environment variable (a `.env` file is loaded first).

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::ModelKind;

pub mod picker;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "forecast",
    version,
    about = "Fit linear and exponential trends to a metric time series and predict ahead"
)]
pub struct Cli {
    /// Log fitting decisions to stderr (same as RUST_LOG=debug).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit both models, print diagnostics, and optionally export a fit JSON.
    Fit(FitArgs),
    /// Predict the value at a future time.
    Predict(PredictArgs),
    /// Predict when a target value will be reached.
    Reach(ReachArgs),
    /// Print series statistics only (no fitting).
    Stats(InputArgs),
    /// Generate a synthetic decay series.
    Sample(SampleArgs),
}

/// Where observations come from and how to read them.
#[derive(Debug, Args, Clone)]
pub struct InputArgs {
    /// Observation file (.txt/.tsv/.csv or .json). Prompts when omitted.
    #[arg(short = 'i', long, env = "FORECAST_INPUT")]
    pub input: Option<PathBuf>,

    /// Field delimiter for text input.
    #[arg(long, env = "FORECAST_DELIMITER", default_value_t = '\t')]
    pub delimiter: char,

    /// Hours east of UTC used for date-time strings without an offset.
    #[arg(
        long,
        env = "FORECAST_UTC_OFFSET_HOURS",
        default_value_t = 0,
        allow_hyphen_values = true
    )]
    pub utc_offset_hours: i32,
}

/// Fitting thresholds.
#[derive(Debug, Args, Clone)]
pub struct EngineArgs {
    /// Minimum valid points required to fit at all.
    #[arg(long, env = "FORECAST_MIN_POINTS", default_value_t = 10)]
    pub min_points: usize,

    /// Minimum r² for an exponential candidate.
    #[arg(long, env = "FORECAST_R2_FLOOR", default_value_t = 0.1)]
    pub r2_floor: f64,

    /// Z-score above which a value is an outlier.
    #[arg(long, env = "FORECAST_OUTLIER_Z", default_value_t = 4.0)]
    pub outlier_z: f64,

    /// Skip outlier removal if it would keep fewer points than this.
    #[arg(long, env = "FORECAST_OUTLIER_MIN_KEPT", default_value_t = 10)]
    pub outlier_min_kept: usize,

    /// Only fit the offset-free exponential form `a·e^(-λt)`.
    #[arg(long, env = "FORECAST_NO_OFFSET_MODEL")]
    pub no_offset_model: bool,

    /// Asymptote estimate as a fraction of the observed minimum.
    #[arg(long, env = "FORECAST_OFFSET_FACTOR", default_value_t = 0.9)]
    pub offset_factor: f64,

    /// Inverse solves reject targets more than this multiple of the scale above the asymptote.
    /// Also applied to models loaded with `--fit-file`.
    #[arg(long, env = "FORECAST_INVERSE_SCALE_LIMIT", default_value_t = 2.0)]
    pub inverse_scale_limit: f64,

    /// Lowest reported confidence (percent).
    #[arg(long, env = "FORECAST_CONFIDENCE_FLOOR", default_value_t = 30)]
    pub confidence_floor: u8,

    /// Highest reported confidence (percent).
    #[arg(long, env = "FORECAST_CONFIDENCE_CEILING", default_value_t = 95)]
    pub confidence_ceiling: u8,
}

#[derive(Debug, Args, Clone)]
pub struct FitArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub engine: EngineArgs,

    /// Export stats, models and a prediction grid to JSON.
    #[arg(long, value_name = "JSON")]
    pub export: Option<PathBuf>,
}

/// Options shared by `predict` and `reach`.
#[derive(Debug, Args, Clone)]
pub struct QueryArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub engine: EngineArgs,

    /// Use models from a fit JSON instead of fitting `--input`.
    #[arg(long, value_name = "JSON", conflicts_with = "input")]
    pub fit_file: Option<PathBuf>,

    /// Preferred model; the other one is used if it is unavailable.
    #[arg(short, long, value_enum, env = "FORECAST_METHOD", default_value_t = ModelKind::Exponential)]
    pub method: ModelKind,

    /// Reference "now" (epoch ms or YYYY-MM-DD[ HH:MM:SS]). Defaults to the system clock.
    #[arg(long, env = "FORECAST_NOW")]
    pub now: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct PredictArgs {
    #[command(flatten)]
    pub query: QueryArgs,

    /// Target time (epoch ms or YYYY-MM-DD[ HH:MM:SS]).
    #[arg(long, value_name = "TIME")]
    pub at: String,
}

#[derive(Debug, Args, Clone)]
pub struct ReachArgs {
    #[command(flatten)]
    pub query: QueryArgs,

    /// Target metric value.
    #[arg(long, value_name = "VALUE", allow_hyphen_values = true)]
    pub value: f64,
}

#[derive(Debug, Args, Clone)]
pub struct SampleArgs {
    /// Number of observations.
    #[arg(short = 'n', long, default_value_t = 120)]
    pub count: usize,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// First timestamp (epoch ms or YYYY-MM-DD[ HH:MM:SS]).
    #[arg(long, default_value = "2024-01-01")]
    pub start: String,

    /// Hours between observations.
    #[arg(long, default_value_t = 6.0)]
    pub step_hours: f64,

    /// Curve scale.
    #[arg(long, default_value_t = 400.0)]
    pub a: f64,

    /// Decay rate per day.
    #[arg(long, default_value_t = 0.08)]
    pub lambda: f64,

    /// Asymptote.
    #[arg(long, default_value_t = 1_500.0)]
    pub c: f64,

    /// Log-volatility of the noise.
    #[arg(long, default_value_t = 0.002)]
    pub sigma: f64,

    /// Probability of an upward spike (same for downward).
    #[arg(long, default_value_t = 0.01)]
    pub spike_prob: f64,

    /// Spike size in units of sigma.
    #[arg(long, default_value_t = 25.0)]
    pub spike_k: f64,

    /// Hours east of UTC for written timestamps.
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    pub utc_offset_hours: i32,

    /// Write to a file instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
