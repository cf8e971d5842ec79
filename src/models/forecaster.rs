//! Horizon forecasts with confidence intervals from a fitted model.

use crate::core::ForecastResult;
use crate::error::{ForecastError, Result};
use crate::models::traits::FittedModel;
use crate::utils::stats::quantile_normal;

/// Configuration for [`Forecaster`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecasterConfig {
    /// Coverage of the prediction intervals, in (0, 1).
    pub level: f64,
}

impl Default for ForecasterConfig {
    fn default() -> Self {
        Self { level: 0.95 }
    }
}

impl ForecasterConfig {
    /// Set the interval coverage.
    pub fn with_level(mut self, level: f64) -> Self {
        self.level = level;
        self
    }
}

/// Produces point forecasts and symmetric normal intervals.
///
/// # Example
/// ```
/// use chrono::{TimeZone, Utc};
/// use stockcast::core::TimeSeries;
/// use stockcast::models::arima::{ModelFitter, Order};
/// use stockcast::models::Forecaster;
///
/// let values: Vec<f64> = (0..36).map(|i| 10.0 + ((i * 5) % 7) as f64).collect();
/// let start = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();
/// let series = TimeSeries::monthly(start, values).unwrap();
/// let model = ModelFitter::new().fit(&series, Order::new(1, 0, 0), None).unwrap();
///
/// let forecast = Forecaster::new().forecast(&model, 3).unwrap();
/// assert_eq!(forecast.horizon(), 3);
/// assert_eq!(
///     forecast.points()[0].timestamp,
///     Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
/// );
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Forecaster {
    config: ForecasterConfig,
}

impl Forecaster {
    /// Forecaster with 95% intervals.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ForecasterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ForecasterConfig {
        &self.config
    }

    /// Forecast `horizon` steps past the end of the model's training series.
    pub fn forecast<M: FittedModel + ?Sized>(
        &self,
        model: &M,
        horizon: usize,
    ) -> Result<ForecastResult> {
        let level = self.config.level;
        if !(level > 0.0 && level < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "confidence level must be in (0, 1), got {}",
                level
            )));
        }
        if horizon == 0 {
            return Err(ForecastError::InvalidHorizon(horizon));
        }

        let timestamps = model.training_span().following(horizon)?;
        let steps = model.predict_steps(horizon);
        if steps.len() != horizon {
            return Err(ForecastError::LengthMismatch {
                expected: horizon,
                got: steps.len(),
            });
        }

        let z = quantile_normal((1.0 + level) / 2.0);
        let mut values = Vec::with_capacity(horizon);
        let mut lower = Vec::with_capacity(horizon);
        let mut upper = Vec::with_capacity(horizon);
        for step in steps {
            let half_width = z * step.variance.max(0.0).sqrt();
            values.push(step.mean);
            lower.push(step.mean - half_width);
            upper.push(step.mean + half_width);
        }

        ForecastResult::new(timestamps, values, lower, upper, level)
    }
}
