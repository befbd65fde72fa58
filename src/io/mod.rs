//! Input/output helpers.
//!
//! - observation ingest + parse errors (`ingest`)
//! - fit JSON read/write (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
