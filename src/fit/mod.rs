//! Curve fitting.
//!
//! - `linear`: OLS line over elapsed days
//! - `outlier`: z-score filter applied before the exponential fit
//! - `exponential`: log-linearized decay with an explicit form fallback chain
//! - `engine`: fits both models and records the ones that were skipped

pub mod engine;
pub mod exponential;
pub mod linear;
pub mod outlier;

pub use engine::*;
pub use exponential::*;
pub use linear::*;
pub use outlier::*;
