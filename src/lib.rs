//! `metric-forecast` library crate.
//!
//! The binary (`forecast`) is a thin wrapper around this library so that:
//!
//! - the fitting engine is testable without spawning processes
//! - fit and predict stay pure functions over validated series and model values
//! - ingest, reporting and the CLI stay out of the numerical code

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod predict;
pub mod report;
