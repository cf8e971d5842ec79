//! Forecasting models.

mod forecaster;
mod traits;

pub mod arima;

pub use forecaster::{Forecaster, ForecasterConfig};
pub use traits::{Estimator, FittedModel, StepPrediction};
