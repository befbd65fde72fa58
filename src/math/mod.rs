//! Mathematical utilities: closed-form least squares, goodness of fit, summary
//! statistics and the day/millisecond time conversion shared by fit and predict.

pub mod ols;
pub mod stats;
pub mod time;

pub use ols::*;
pub use stats::*;
pub use time::*;
