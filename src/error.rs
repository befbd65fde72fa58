//! Error types.
//!
//! Two layers:
//!
//! - `FitError` / `PredictError` are typed engine errors. Fitting failures are
//!   expected steady states (a model may simply not exist for a given series),
//!   prediction failures carry a user-facing reason.
//! - `AppError` is what the binary reports: a message plus a process exit code.

use thiserror::Error;

/// Why a model could not be produced.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    #[error("insufficient data: need at least {needed} valid points, found {found}")]
    InsufficientData { needed: usize, found: usize },

    #[error("degenerate fit: regression denominator {denominator:e} is too close to zero")]
    DegenerateFit { denominator: f64 },

    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// Log-linearization is impossible (some adjusted value is not strictly positive).
    #[error("infeasible transform: {0}")]
    Infeasible(String),
}

/// Why a forward or inverse prediction failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictError {
    #[error("out of range: {0}")]
    OutOfRange(String),

    #[error("invalid target: {0}")]
    PastOrInvalidTarget(String),

    #[error("no fitted model is available for this series")]
    ModelUnavailable,
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

impl From<FitError> for AppError {
    fn from(err: FitError) -> Self {
        AppError::new(3, format!("Fit failed: {err}"))
    }
}

impl From<PredictError> for AppError {
    fn from(err: PredictError) -> Self {
        AppError::new(5, format!("Prediction failed: {err}"))
    }
}
