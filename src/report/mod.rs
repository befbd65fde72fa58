//! Reporting utilities: formatted terminal output for fits and predictions.

pub mod format;

pub use format::*;
