//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - validated observations (`DataPoint`, `TimeSeries`) and their summary (`SeriesStats`)
//! - raw loader output (`RawRecord`) and what validation did with it (`ValidationReport`)
//! - fit configuration and the model-kind selector (`FitConfig`, `ModelKind`)

pub mod series;
pub mod types;

pub use series::*;
pub use types::*;
