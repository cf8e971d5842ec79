//! End-to-end model selection and evaluation.
//!
//! Splits a series into train and test, analyses stationarity, searches
//! ARIMA/SARIMA orders on the training part and scores the selected model's
//! forecast against the held-out part.

use crate::core::{ForecastResult, TimeSeries};
use crate::error::{FitFailure, ForecastError, Result};
use crate::models::arima::{
    ModelFitter, Order, ParameterSearcher, SarimaFit, SearchConfig, SearchResult,
    SearchSpace,
};
use crate::models::{FittedModel, Forecaster, ForecasterConfig};
use crate::utils::metrics::{Evaluator, Metrics};
use crate::validation::{
    ljung_box, DifferencingAnalysis, LjungBoxResult, StationarityConfig, StationarityTester,
};
use tracing::{info, warn};

/// Configuration for [`Pipeline`].
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Fraction of the series used for training, in (0, 1).
    pub train_fraction: f64,
    /// Largest differencing order the stationarity analysis tries.
    pub max_d: usize,
    /// Restrict the searched d to the order the stationarity analysis found.
    pub pin_differencing: bool,
    /// Reference model fitted and scored next to the search.
    pub baseline: Option<Order>,
    /// Orders to search.
    pub search_space: SearchSpace,
    /// Search execution and per-fit options.
    pub search: SearchConfig,
    /// Stationarity test settings.
    pub stationarity: StationarityConfig,
    /// Forecast interval coverage.
    pub level: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            train_fraction: 0.8,
            max_d: 2,
            pin_differencing: false,
            baseline: Some(Order::default()),
            search_space: SearchSpace::default(),
            search: SearchConfig::default(),
            stationarity: StationarityConfig::default(),
            level: 0.95,
        }
    }
}

impl PipelineConfig {
    /// Set the training fraction.
    pub fn with_train_fraction(mut self, train_fraction: f64) -> Self {
        self.train_fraction = train_fraction;
        self
    }

    /// Set the largest differencing order to analyse.
    pub fn with_max_d(mut self, max_d: usize) -> Self {
        self.max_d = max_d;
        self
    }

    /// Search only the differencing order suggested by the stationarity test.
    pub fn with_pin_differencing(mut self, pin: bool) -> Self {
        self.pin_differencing = pin;
        self
    }

    /// Set or disable the baseline model.
    pub fn with_baseline(mut self, baseline: Option<Order>) -> Self {
        self.baseline = baseline;
        self
    }

    /// Set the search space.
    pub fn with_search_space(mut self, space: SearchSpace) -> Self {
        self.search_space = space;
        self
    }

    /// Set the search configuration.
    pub fn with_search(mut self, search: SearchConfig) -> Self {
        self.search = search;
        self
    }

    /// Set the stationarity test configuration.
    pub fn with_stationarity(mut self, stationarity: StationarityConfig) -> Self {
        self.stationarity = stationarity;
        self
    }

    /// Set the forecast interval coverage.
    pub fn with_level(mut self, level: f64) -> Self {
        self.level = level;
        self
    }

    /// Fit candidates in parallel.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.search.parallel = parallel;
        self
    }
}

/// How the baseline model fared.
#[derive(Debug, Clone)]
pub enum BaselineOutcome {
    /// The baseline fitted and its forecast was scored.
    Evaluated {
        order: Order,
        aic: f64,
        metrics: Metrics,
    },
    /// The baseline could not be fitted.
    Failed { order: Order, failure: FitFailure },
}

/// Every intermediate result of a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    /// Training observations.
    pub train_len: usize,
    /// Held-out observations, also the forecast horizon.
    pub test_len: usize,
    /// Stationarity analysis of the training part. A failed analysis only
    /// aborts the run when the differencing order is pinned.
    pub stationarity: std::result::Result<DifferencingAnalysis, ForecastError>,
    /// Baseline result, when a baseline is configured.
    pub baseline: Option<BaselineOutcome>,
    /// Search result with the selected model.
    pub search: SearchResult<SarimaFit>,
    /// Forecast of the selected model over the test horizon.
    pub forecast: ForecastResult,
    /// Accuracy of that forecast on the held-out part.
    pub metrics: Metrics,
    /// Ljung-Box test on the selected model's residuals, when there are enough.
    pub residual_diagnostics: Option<LjungBoxResult>,
}

/// Split, analyse, search, forecast and evaluate in one call.
///
/// # Example
/// ```
/// use chrono::{TimeZone, Utc};
/// use stockcast::core::TimeSeries;
/// use stockcast::pipeline::{Pipeline, PipelineConfig};
///
/// let values: Vec<f64> = (0..72).map(|i| 100.0 + 2.5 * i as f64).collect();
/// let start = Utc.with_ymd_and_hms(2018, 1, 1, 0, 0, 0).unwrap();
/// let series = TimeSeries::monthly(start, values).unwrap();
///
/// let report = Pipeline::new(PipelineConfig::default()).run(&series).unwrap();
/// match &report.stationarity {
///     Ok(analysis) => println!("suggested d = {}", analysis.order),
///     Err(error) => println!("stationarity analysis failed: {}", error),
/// }
/// println!("best {} {} with MAE {:.2}", report.search.order, report.search.seasonal_order, report.metrics.mae);
/// assert_eq!(report.forecast.horizon(), report.test_len);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the pipeline on `series`.
    ///
    /// Baseline fit failures are recorded in the report, as are stationarity
    /// failures unless the differencing order is pinned. Every other failure,
    /// including a search where no candidate fits, is returned.
    pub fn run(&self, series: &TimeSeries) -> Result<PipelineReport> {
        let config = &self.config;
        validate_config(config)?;
        let (train, test) = series.split(config.train_fraction)?;
        info!(train = train.len(), test = test.len(), "series split");

        let stationarity = StationarityTester::with_config(config.stationarity)
            .differencing_order(&train, config.max_d);
        match &stationarity {
            Ok(analysis) => info!(
                d = analysis.order,
                stationary = analysis.stationary,
                "stationarity analysed"
            ),
            Err(error) => warn!(%error, "stationarity analysis failed"),
        }

        let space = if config.pin_differencing {
            let analysis = stationarity.as_ref().map_err(Clone::clone)?;
            config.search_space.clone().with_d([analysis.order])
        } else {
            config.search_space.clone()
        };

        let forecaster = Forecaster::with_config(ForecasterConfig::default().with_level(config.level));
        let evaluator = Evaluator::new();
        let horizon = test.len();

        let baseline = match config.baseline {
            Some(order) => Some(self.run_baseline(
                &train,
                &test,
                order,
                &forecaster,
                &evaluator,
            )?),
            None => None,
        };

        let search = ParameterSearcher::new(config.search.clone())
            .search(&train, &space)?
            .into_result()?;

        let forecast = forecaster.forecast(&search.model, horizon)?;
        let metrics = evaluator.evaluate_forecast(&test, &forecast)?;

        let fitted_params = search.order.p
            + search.order.q
            + search.seasonal_order.p
            + search.seasonal_order.q;
        let residual_diagnostics = ljung_box(search.model.residuals(), None, fitted_params).ok();

        info!(
            order = %search.order,
            seasonal = %search.seasonal_order,
            aic = search.aic,
            mae = metrics.mae,
            rmse = metrics.rmse,
            white_noise = residual_diagnostics.as_ref().map(|lb| lb.is_white_noise(0.05)),
            "pipeline finished"
        );

        Ok(PipelineReport {
            train_len: train.len(),
            test_len: horizon,
            stationarity,
            baseline,
            search,
            forecast,
            metrics,
            residual_diagnostics,
        })
    }

    fn run_baseline(
        &self,
        train: &TimeSeries,
        test: &TimeSeries,
        order: Order,
        forecaster: &Forecaster,
        evaluator: &Evaluator,
    ) -> Result<BaselineOutcome> {
        let options = self.config.search.fit_options.clone();
        let model = match ModelFitter::new().with_options(options).fit(train, order, None) {
            Ok(model) => model,
            Err(failure) => {
                info!(%order, %failure, "baseline could not be fitted");
                return Ok(BaselineOutcome::Failed { order, failure });
            }
        };

        let forecast = forecaster.forecast(&model, test.len())?;
        let metrics = evaluator.evaluate_forecast(test, &forecast)?;
        info!(%order, aic = model.aic(), mae = metrics.mae, "baseline evaluated");

        Ok(BaselineOutcome::Evaluated {
            order,
            aic: model.aic(),
            metrics,
        })
    }
}

impl From<PipelineConfig> for Pipeline {
    fn from(config: PipelineConfig) -> Self {
        Self::new(config)
    }
}

/// Check that a configuration can run before handing it a series.
pub fn validate_config(config: &PipelineConfig) -> Result<()> {
    if !(config.train_fraction > 0.0 && config.train_fraction < 1.0) {
        return Err(ForecastError::InvalidFraction(config.train_fraction));
    }
    if !(config.level > 0.0 && config.level < 1.0) {
        return Err(ForecastError::InvalidParameter(format!(
            "confidence level must be in (0, 1), got {}",
            config.level
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::arima::{FitOptions, Verbosity};
    use chrono::{TimeZone, Utc};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn trending(n: usize, seed: u64) -> TimeSeries {
        let mut rng = StdRng::seed_from_u64(seed);
        let values = (0..n)
            .map(|i| 100.0 + 2.5 * i as f64 + rng.gen_range(-0.3..0.3))
            .collect();
        TimeSeries::monthly(Utc.with_ymd_and_hms(2018, 1, 1, 0, 0, 0).unwrap(), values).unwrap()
    }

    fn quiet() -> SearchConfig {
        SearchConfig::default()
            .with_fit_options(FitOptions::default().with_verbosity(Verbosity::Silent))
    }

    #[test]
    fn runs_on_trending_series() {
        let series = trending(72, 1);
        let report = Pipeline::new(PipelineConfig::default().with_search(quiet()))
            .run(&series)
            .unwrap();

        assert_eq!(report.train_len, 57);
        assert_eq!(report.test_len, 15);
        assert_eq!(report.forecast.horizon(), 15);
        assert_eq!(report.search.candidates, 64);
        assert_eq!(
            report.forecast.points()[0].timestamp,
            series.timestamps()[57]
        );
        assert!(report.metrics.mae.is_finite());
        assert!(matches!(
            report.baseline,
            Some(BaselineOutcome::Evaluated { .. })
        ));
    }

    #[test]
    fn pinned_differencing_restricts_search() {
        let series = trending(72, 2);
        let config = PipelineConfig::default()
            .with_search(quiet())
            .with_search_space(SearchSpace::non_seasonal())
            .with_pin_differencing(true)
            .with_baseline(None);

        let report = Pipeline::new(config).run(&series).unwrap();

        let d = report.stationarity.as_ref().unwrap().order;
        assert_eq!(report.search.candidates, 4);
        assert!(report.search.leaderboard.iter().all(|e| e.order.d == d));
        assert!(report.baseline.is_none());
    }

    #[test]
    fn best_model_forecast_is_evaluated() {
        let series = trending(60, 3);
        let config = PipelineConfig::default()
            .with_search(quiet())
            .with_search_space(SearchSpace::non_seasonal());
        let report = Pipeline::new(config).run(&series).unwrap();

        let (_, test) = series.split(0.8).unwrap();
        let expected = Evaluator::new()
            .evaluate_forecast(&test, &report.forecast)
            .unwrap();
        assert_eq!(report.metrics, expected);
    }

    #[test]
    fn baseline_failure_is_recorded() {
        let series = trending(30, 4);
        let config = PipelineConfig::default()
            .with_search(quiet())
            .with_search_space(SearchSpace::non_seasonal())
            .with_baseline(Some(Order::new(8, 1, 8)));

        let report = Pipeline::new(config).run(&series).unwrap();

        assert!(matches!(
            report.baseline,
            Some(BaselineOutcome::Failed {
                failure: FitFailure::InsufficientObservations { .. },
                ..
            })
        ));
    }

    #[test]
    fn no_viable_model_is_an_error() {
        let series = trending(20, 5);
        let config = PipelineConfig::default()
            .with_search(quiet())
            .with_baseline(None)
            .with_search_space(SearchSpace::non_seasonal().with_p([5]).with_q([5]));

        assert!(matches!(
            Pipeline::new(config).run(&series),
            Err(ForecastError::NoViableModel { candidates: 2 })
        ));
    }

    fn linear(n: usize) -> TimeSeries {
        let values = (0..n).map(|i| 100.0 + 2.5 * i as f64).collect();
        TimeSeries::monthly(Utc.with_ymd_and_hms(2018, 1, 1, 0, 0, 0).unwrap(), values).unwrap()
    }

    #[test]
    fn failed_stationarity_analysis_is_recorded() {
        // Differencing a noiseless trend leaves a constant, so every ADF regression is singular
        let series = linear(72);
        let report = Pipeline::new(PipelineConfig::default().with_search(quiet()))
            .run(&series)
            .unwrap();

        assert!(matches!(
            report.stationarity,
            Err(ForecastError::ComputationError(_))
        ));
        assert_eq!(report.forecast.horizon(), report.test_len);
        assert!(report.metrics.mae.is_finite());
    }

    #[test]
    fn failed_stationarity_analysis_blocks_pinned_differencing() {
        let config = PipelineConfig::default()
            .with_search(quiet())
            .with_pin_differencing(true);

        assert!(matches!(
            Pipeline::new(config).run(&linear(72)),
            Err(ForecastError::ComputationError(_))
        ));
    }

    #[test]
    fn invalid_fraction_is_rejected() {
        let config = PipelineConfig::default().with_train_fraction(1.0);
        assert!(matches!(
            validate_config(&config),
            Err(ForecastError::InvalidFraction(_))
        ));
        assert!(matches!(
            Pipeline::from(config).run(&trending(30, 6)),
            Err(ForecastError::InvalidFraction(_))
        ));
        assert!(validate_config(&PipelineConfig::default()).is_ok());
    }
}
