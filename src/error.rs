//! Error types for the stockcast library.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for forecast operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Errors that can occur during forecasting operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// Input data is empty.
    #[error("empty input data")]
    EmptyInput,

    /// Insufficient data points for the operation.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Train/test split fraction outside (0, 1) or producing an empty side.
    #[error("invalid split fraction: {0}")]
    InvalidFraction(f64),

    /// Forecast horizon must be at least one step.
    #[error("invalid forecast horizon: {0}")]
    InvalidHorizon(usize),

    /// Two inputs that must have equal length do not.
    #[error("length mismatch: expected {expected}, got {got}")]
    LengthMismatch { expected: usize, got: usize },

    /// Two series of equal length are stamped differently.
    #[error("timestamps are not aligned at index {index}")]
    MisalignedTimestamps { index: usize },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Timestamp-related error.
    #[error("timestamp error: {0}")]
    TimestampError(String),

    /// Missing values detected when not allowed.
    #[error("missing values detected in data")]
    MissingValues,

    /// A standalone model fit failed.
    #[error("model fit failed: {0}")]
    FitFailure(#[from] FitFailure),

    /// Every candidate of a parameter search failed to fit.
    #[error("no viable model among {candidates} candidates")]
    NoViableModel { candidates: usize },

    /// Computation error (e.g., numerical issues).
    #[error("computation error: {0}")]
    ComputationError(String),
}

/// Reasons a single model estimation can fail.
///
/// These are expected outcomes while searching a parameter grid: the searcher
/// skips the candidate and moves on.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FitFailure {
    /// The order cannot describe a model (e.g. seasonal terms with period 1).
    #[error("invalid order: {0}")]
    InvalidOrder(String),

    /// More parameters than the series can identify.
    #[error("insufficient observations: need at least {needed}, got {got}")]
    InsufficientObservations { needed: usize, got: usize },

    /// The optimizer exhausted its iteration budget.
    #[error("optimizer did not converge after {iterations} iterations")]
    NonConvergence { iterations: usize },

    /// The objective or the resulting statistics are not finite.
    #[error("ill-conditioned estimation: {0}")]
    IllConditioned(String),

    /// The model reproduces the data exactly; the likelihood is unbounded.
    #[error("zero residual variance")]
    Degenerate,

    /// The fit exceeded its time budget.
    #[error("fit timed out after {elapsed:?}")]
    TimedOut { elapsed: Duration },
}
