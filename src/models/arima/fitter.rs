//! Single-model fitting with validated orders and configurable diagnostics.

use crate::core::TimeSeries;
use crate::error::FitFailure;
use crate::models::arima::model::CssEstimator;
use crate::models::arima::order::{Order, SeasonalOrder};
use crate::models::traits::{Estimator, FittedModel};
use std::time::Duration;
use tracing::{debug, warn};

/// How much a fit reports about itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// No log events.
    Silent,
    /// Failures at `warn`.
    #[default]
    Normal,
    /// Failures at `warn` and fit summaries at `debug`.
    Verbose,
}

/// Options for a single estimation.
#[derive(Debug, Clone, PartialEq)]
pub struct FitOptions {
    /// Diagnostic output level.
    pub verbosity: Verbosity,
    /// Optimizer iteration budget.
    pub max_iterations: usize,
    /// Relative convergence tolerance of the objective.
    pub tolerance: f64,
    /// Wall-clock budget per fit.
    pub timeout: Option<Duration>,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            verbosity: Verbosity::Normal,
            max_iterations: 5000,
            tolerance: 1e-8,
            timeout: None,
        }
    }
}

impl FitOptions {
    /// Set the diagnostic output level.
    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set the optimizer iteration budget.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the convergence tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Abort fits that run longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Same options with diagnostics turned off.
    pub fn silent(&self) -> Self {
        self.clone().with_verbosity(Verbosity::Silent)
    }
}

/// Fits one model of a given order through an [`Estimator`].
///
/// # Example
/// ```
/// use chrono::{TimeZone, Utc};
/// use stockcast::core::TimeSeries;
/// use stockcast::models::arima::{ModelFitter, Order};
/// use stockcast::models::FittedModel;
///
/// let values: Vec<f64> = (0..48)
///     .map(|i| 100.0 + 2.0 * i as f64 + ((i * 7) % 5) as f64)
///     .collect();
/// let start = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
/// let series = TimeSeries::monthly(start, values).unwrap();
///
/// let model = ModelFitter::new().fit(&series, Order::new(1, 1, 0), None).unwrap();
/// assert_eq!(model.order(), Order::new(1, 1, 0));
/// assert!(model.aic().is_finite());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ModelFitter<E = CssEstimator> {
    estimator: E,
    options: FitOptions,
}

impl ModelFitter<CssEstimator> {
    /// Fitter using the bundled conditional sum of squares estimator.
    pub fn new() -> Self {
        Self::with_estimator(CssEstimator::new())
    }
}

impl<E: Estimator> ModelFitter<E> {
    pub fn with_estimator(estimator: E) -> Self {
        Self {
            estimator,
            options: FitOptions::default(),
        }
    }

    /// Set the fit options.
    pub fn with_options(mut self, options: FitOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &FitOptions {
        &self.options
    }

    pub fn estimator(&self) -> &E {
        &self.estimator
    }

    /// Fit `series` with the given orders.
    ///
    /// A missing seasonal order, or one with period 0, fits plain
    /// ARIMA(p,d,q). Seasonal terms at period 1 are rejected.
    pub fn fit(
        &self,
        series: &TimeSeries,
        order: Order,
        seasonal_order: Option<SeasonalOrder>,
    ) -> std::result::Result<E::Model, FitFailure> {
        self.fit_with(series, order, seasonal_order, &self.options)
    }

    /// Fit with options overriding the fitter's own.
    pub fn fit_with(
        &self,
        series: &TimeSeries,
        order: Order,
        seasonal_order: Option<SeasonalOrder>,
        options: &FitOptions,
    ) -> std::result::Result<E::Model, FitFailure> {
        let seasonal = seasonal_order.unwrap_or_default();
        let result = validate_seasonal(seasonal)
            .and_then(|seasonal| self.estimator.estimate(series, order, seasonal, options));

        match (&result, options.verbosity) {
            (_, Verbosity::Silent) => {}
            (Err(failure), _) => {
                warn!(%order, seasonal = %seasonal, %failure, "model fit failed");
            }
            (Ok(model), Verbosity::Verbose) => {
                debug!(
                    %order,
                    seasonal = %model.seasonal_order(),
                    aic = model.aic(),
                    residuals = model.residuals().len(),
                    "model fitted"
                );
            }
            (Ok(_), Verbosity::Normal) => {}
        }

        result
    }
}

/// Reject seasonal terms without a usable period and normalize the rest.
fn validate_seasonal(seasonal: SeasonalOrder) -> std::result::Result<SeasonalOrder, FitFailure> {
    if seasonal.period == 1 && seasonal.has_terms() {
        return Err(FitFailure::InvalidOrder(format!(
            "seasonal terms {} need a period of at least 2",
            seasonal
        )));
    }
    Ok(seasonal.normalized())
}
