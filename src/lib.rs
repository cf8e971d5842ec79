//! # stockcast
//!
//! ARIMA and seasonal ARIMA model selection and forecasting for univariate
//! time series such as monthly product sales.
//!
//! The crate tests a series for stationarity, searches (p,d,q)x(P,D,Q)\[s\]
//! orders by AIC, forecasts with normal confidence intervals and scores
//! forecasts against held-out data. [`pipeline::Pipeline`] runs all of these
//! steps in order.
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use stockcast::prelude::*;
//!
//! let values: Vec<f64> = (0..60)
//!     .map(|i| 200.0 + 3.0 * i as f64 + ((i * 7) % 5) as f64)
//!     .collect();
//! let start = Utc.with_ymd_and_hms(2019, 1, 1, 0, 0, 0).unwrap();
//! let series = TimeSeries::monthly(start, values).unwrap();
//! let (train, test) = series.split(0.8).unwrap();
//!
//! let outcome = ParameterSearcher::new(SearchConfig::default())
//!     .search(&train, &SearchSpace::non_seasonal())
//!     .unwrap();
//! let best = outcome.into_result().unwrap();
//!
//! let forecast = Forecaster::new().forecast(&best.model, test.len()).unwrap();
//! let metrics = Evaluator::new().evaluate_forecast(&test, &forecast).unwrap();
//! assert!(metrics.mae.is_finite());
//! ```

// Allow some clippy warnings for cleaner code in specific cases
#![allow(clippy::upper_case_acronyms)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::type_complexity)]
#![allow(clippy::needless_range_loop)]

pub mod core;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod utils;
pub mod validation;

pub use error::{FitFailure, ForecastError, Result};

pub mod prelude {
    pub use crate::core::{ForecastResult, Frequency, TimeSeries};
    pub use crate::error::{FitFailure, ForecastError, Result};
    pub use crate::models::arima::{
        ModelFitter, Order, ParameterSearcher, SearchConfig, SearchOutcome, SearchSpace,
        SeasonalOrder,
    };
    pub use crate::models::{FittedModel, Forecaster};
    pub use crate::pipeline::{Pipeline, PipelineConfig};
    pub use crate::utils::{Evaluator, Metrics};
    pub use crate::validation::StationarityTester;
}
