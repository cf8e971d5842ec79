//! Estimator and fitted-model traits shared by fitting, search and forecasting.

use crate::core::{SeriesSpan, TimeSeries};
use crate::error::FitFailure;
use crate::models::arima::{FitOptions, Order, SeasonalOrder};
use std::fmt::Debug;

/// Predictive distribution of one forecast step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepPrediction {
    /// Point prediction on the original scale.
    pub mean: f64,
    /// Forecast error variance.
    pub variance: f64,
}

/// Immutable result of estimating a model on a training series.
///
/// Everything a forecast needs is carried by the model itself, so a fitted
/// model can outlive the series it was trained on.
pub trait FittedModel: Debug + Send + Sync {
    /// Non-seasonal order the model was fitted with.
    fn order(&self) -> Order;

    /// Seasonal order, [`SeasonalOrder::none`] for plain ARIMA.
    fn seasonal_order(&self) -> SeasonalOrder;

    /// Akaike information criterion.
    fn aic(&self) -> f64;

    /// In-sample residuals (observed - fitted), initialization losses dropped.
    fn residuals(&self) -> &[f64];

    /// Extent and frequency grid of the training series.
    fn training_span(&self) -> &SeriesSpan;

    /// Predictive mean and variance for steps `1..=horizon`.
    fn predict_steps(&self, horizon: usize) -> Vec<StepPrediction>;
}

/// Estimation procedure producing a [`FittedModel`].
///
/// Implementations must be shareable across threads: the parameter search
/// fits candidates concurrently with a single estimator.
pub trait Estimator: Send + Sync {
    type Model: FittedModel;

    /// Fit `series` with the given orders.
    ///
    /// `seasonal_order` is already validated and normalized by the caller.
    fn estimate(
        &self,
        series: &TimeSeries,
        order: Order,
        seasonal_order: SeasonalOrder,
        options: &FitOptions,
    ) -> std::result::Result<Self::Model, FitFailure>;
}
