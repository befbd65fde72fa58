//! Prediction boundary: query validation, model choice and the confidence score.

pub mod confidence;
pub mod query;

pub use confidence::*;
pub use query::*;
