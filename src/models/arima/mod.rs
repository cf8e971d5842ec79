//! ARIMA and SARIMA (Autoregressive Integrated Moving Average) models.
//!
//! This module provides:
//! - Order types for (p, d, q) and seasonal (P, D, Q)\[s\] orders
//! - Conditional sum of squares estimation ([`CssEstimator`], [`SarimaFit`])
//! - Single fits through [`ModelFitter`]
//! - Grid search over orders through [`ParameterSearcher`]

mod diff;
mod fitter;
mod model;
mod order;
mod polynomial;
mod search;

pub use diff::{difference, differencing_polynomial, integrate, seasonal_difference};
pub use fitter::{FitOptions, ModelFitter, Verbosity};
pub use model::{CssEstimator, SarimaFit};
pub use order::{Order, SeasonalOrder};
pub use polynomial::{ar_lags, ma_lags, polymul, psi_weights};
pub use search::{
    CandidateFailure, LeaderboardEntry, ParameterSearcher, SearchConfig, SearchOutcome,
    SearchResult, SearchSpace,
};
