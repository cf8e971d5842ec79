//! Stationarity tests for time series.
//!
//! Provides the Augmented Dickey-Fuller unit-root test and a helper that
//! finds how many differences make a series stationary.

use crate::core::TimeSeries;
use crate::error::{ForecastError, Result};
use crate::utils::ols::{ols_fit, OLSResult};
use crate::utils::stats::normal_cdf;
use tracing::debug;

/// |b| below this counts as zero when the ADF regression fits exactly.
const ZERO_COEFFICIENT: f64 = 1e-8;

/// Critical values for stationarity tests.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CriticalValues {
    /// Critical value at 1% significance
    pub cv_1pct: f64,
    /// Critical value at 5% significance
    pub cv_5pct: f64,
    /// Critical value at 10% significance
    pub cv_10pct: f64,
}

impl CriticalValues {
    /// MacKinnon (2010) finite-sample critical values for the ADF test with a
    /// constant, evaluated at `nobs` observations.
    pub fn adf_constant(nobs: usize) -> Self {
        const TAU_C_1PCT: [f64; 4] = [-3.43035, -6.5393, -16.786, -79.433];
        const TAU_C_5PCT: [f64; 4] = [-2.86154, -2.8903, -4.234, -40.040];
        const TAU_C_10PCT: [f64; 4] = [-2.56677, -1.5384, -2.809, 0.0];

        let inv = 1.0 / nobs.max(1) as f64;
        let surface =
            |b: [f64; 4]| b[0] + b[1] * inv + b[2] * inv.powi(2) + b[3] * inv.powi(3);
        Self {
            cv_1pct: surface(TAU_C_1PCT),
            cv_5pct: surface(TAU_C_5PCT),
            cv_10pct: surface(TAU_C_10PCT),
        }
    }
}

/// Result of an Augmented Dickey-Fuller test.
#[derive(Debug, Clone, PartialEq)]
pub struct StationarityReport {
    /// t-ratio of the lagged level coefficient
    pub statistic: f64,
    /// MacKinnon approximate p-value
    pub p_value: f64,
    /// Whether the unit-root null is rejected at the configured significance
    pub is_stationary: bool,
    /// Number of lagged differences in the regression
    pub lags_used: usize,
    /// Observations in the regression
    pub nobs: usize,
    /// Critical values at common significance levels
    pub critical_values: CriticalValues,
}

/// How the number of lagged differences is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LagSelection {
    /// Minimise AIC over `0..=max`; `None` uses `12 * (n/100)^(1/4)`.
    Aic { max_lags: Option<usize> },
    /// Always use this many lags.
    Fixed(usize),
}

impl Default for LagSelection {
    fn default() -> Self {
        LagSelection::Aic { max_lags: None }
    }
}

/// Configuration for [`StationarityTester`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StationarityConfig {
    /// p-values below this reject the unit root.
    pub significance: f64,
    /// Lag order selection.
    pub lags: LagSelection,
}

impl Default for StationarityConfig {
    fn default() -> Self {
        Self {
            significance: 0.05,
            lags: LagSelection::default(),
        }
    }
}

impl StationarityConfig {
    /// Set the significance level.
    pub fn with_significance(mut self, significance: f64) -> Self {
        self.significance = significance;
        self
    }

    /// Choose lags by AIC up to `max_lags`.
    pub fn with_max_lags(mut self, max_lags: usize) -> Self {
        self.lags = LagSelection::Aic {
            max_lags: Some(max_lags),
        };
        self
    }

    /// Use a fixed number of lags.
    pub fn with_fixed_lags(mut self, lags: usize) -> Self {
        self.lags = LagSelection::Fixed(lags);
        self
    }
}

/// Differencing needed to make a series stationary.
#[derive(Debug, Clone, PartialEq)]
pub struct DifferencingAnalysis {
    /// First d at which the series tested stationary, or the maximum tried.
    pub order: usize,
    /// Whether the series differenced `order` times tested stationary.
    pub stationary: bool,
    /// One report per differencing order tried, starting at d = 0.
    pub reports: Vec<StationarityReport>,
}

/// Augmented Dickey-Fuller unit-root tester.
///
/// # Example
/// ```
/// use stockcast::validation::StationarityTester;
///
/// let noise: Vec<f64> = (0..120).map(|i| ((i * 37 + 11) % 23) as f64 - 11.0).collect();
/// let report = StationarityTester::new().test_values(&noise).unwrap();
/// assert!(report.is_stationary);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct StationarityTester {
    config: StationarityConfig,
}

impl StationarityTester {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: StationarityConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StationarityConfig {
        &self.config
    }

    /// Test a series for a unit root.
    pub fn test(&self, series: &TimeSeries) -> Result<StationarityReport> {
        self.test_values(series.values())
    }

    /// Test raw values for a unit root.
    pub fn test_values(&self, values: &[f64]) -> Result<StationarityReport> {
        let significance = self.config.significance;
        if !(significance > 0.0 && significance < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "significance must be in (0, 1), got {}",
                significance
            )));
        }

        let mut report = adf_test(values, self.config.lags)?;
        report.is_stationary = report.p_value < significance;
        Ok(report)
    }

    /// Test the series and its successive differences up to `max_d` and
    /// report the first order at which it is stationary.
    pub fn differencing_order(
        &self,
        series: &TimeSeries,
        max_d: usize,
    ) -> Result<DifferencingAnalysis> {
        let mut reports = Vec::with_capacity(max_d + 1);
        for d in 0..=max_d {
            let report = self.test(&series.difference(d))?;
            let stationary = report.is_stationary;
            debug!(
                d,
                statistic = report.statistic,
                p_value = report.p_value,
                stationary,
                "stationarity test"
            );
            reports.push(report);
            if stationary {
                return Ok(DifferencingAnalysis {
                    order: d,
                    stationary,
                    reports,
                });
            }
        }
        Ok(DifferencingAnalysis {
            order: max_d,
            stationary: false,
            reports,
        })
    }
}

/// Augmented Dickey-Fuller test with a constant.
///
/// Regresses `dy_t` on a constant, `y_{t-1}` and `k` lagged differences; the
/// statistic is the t-ratio of the `y_{t-1}` coefficient. With
/// [`LagSelection::Aic`] every `k` is fitted on the same sample and the
/// minimum-AIC `k` is refitted on all usable observations.
///
/// `is_stationary` is decided at the 5% level; [`StationarityTester`]
/// applies its own significance.
pub fn adf_test(series: &[f64], lags: LagSelection) -> Result<StationarityReport> {
    let n = series.len();
    let lag_cap = (n / 2).saturating_sub(2);

    let (lags_used, nobs, regression) = match lags {
        LagSelection::Fixed(k) => {
            let needed = 2 * k + 4;
            if n < needed {
                return Err(ForecastError::InsufficientData { needed, got: n });
            }
            let (nobs, regression) = adf_regression(series, k, k)?;
            (k, nobs, regression)
        }
        LagSelection::Aic { max_lags } => {
            if n < 4 {
                return Err(ForecastError::InsufficientData { needed: 4, got: n });
            }
            let default_max = (12.0 * (n as f64 / 100.0).powf(0.25)).floor() as usize;
            let max_lags = max_lags.unwrap_or(default_max).min(lag_cap);
            let k = select_lag_aic(series, max_lags)?;
            let (nobs, regression) = adf_regression(series, k, k)?;
            (k, nobs, regression)
        }
    };

    let statistic = adf_statistic(series, &regression, lags_used);
    let p_value = mackinnon_p_value(statistic);

    Ok(StationarityReport {
        statistic,
        p_value,
        is_stationary: p_value < 0.05,
        lags_used,
        nobs,
        critical_values: CriticalValues::adf_constant(nobs),
    })
}

/// Fit the ADF regression with `lags` lagged differences on the sample that
/// starts after `skip` differences.
fn adf_regression(series: &[f64], lags: usize, skip: usize) -> Result<(usize, OLSResult)> {
    let dy: Vec<f64> = series.windows(2).map(|w| w[1] - w[0]).collect();
    let rows = skip..dy.len();

    let target: Vec<f64> = dy[rows.clone()].to_vec();
    let mut columns = Vec::with_capacity(lags + 1);
    columns.push(rows.clone().map(|j| series[j]).collect::<Vec<f64>>());
    for i in 1..=lags {
        columns.push(rows.clone().map(|j| dy[j - i]).collect());
    }

    let regression = ols_fit(&target, &columns)?;
    Ok((target.len(), regression))
}

/// Pick the lag count with minimum AIC on a common sample. Lags whose
/// regression is singular are skipped.
fn select_lag_aic(series: &[f64], max_lags: usize) -> Result<usize> {
    let mut best: Option<(usize, f64)> = None;
    for k in 0..=max_lags {
        let aic = match adf_regression(series, k, max_lags) {
            Ok((_, regression)) => regression.aic(),
            Err(_) => continue,
        };
        if aic.is_nan() {
            continue;
        }
        if best.map_or(true, |(_, best_aic)| aic < best_aic) {
            best = Some((k, aic));
        }
    }
    best.map(|(k, _)| k).ok_or_else(|| {
        ForecastError::ComputationError("every ADF regression is singular".to_string())
    })
}

fn adf_statistic(series: &[f64], regression: &OLSResult, lags: usize) -> f64 {
    let b = regression.coefficients[0];
    let dy_power: f64 = series
        .windows(2)
        .skip(lags)
        .map(|w| (w[1] - w[0]).powi(2))
        .sum();

    // Exact fit: the t-ratio is 0/0 or b/0
    if regression.rss <= f64::EPSILON * dy_power {
        return if b.abs() < ZERO_COEFFICIENT {
            0.0
        } else if b < 0.0 {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }

    regression.t_statistic(0).unwrap_or(f64::NAN)
}

/// MacKinnon (1994) approximate p-value for the ADF statistic with a
/// constant and a single integrated variable.
pub fn mackinnon_p_value(statistic: f64) -> f64 {
    const TAU_MAX: f64 = 2.74;
    const TAU_MIN: f64 = -18.83;
    const TAU_STAR: f64 = -1.61;
    const SMALL_P: [f64; 3] = [2.1659, 1.4412, 0.038269];
    const LARGE_P: [f64; 4] = [1.7339, 0.93202, -0.12745, -0.010368];

    if statistic.is_nan() {
        return f64::NAN;
    }
    if statistic > TAU_MAX {
        return 1.0;
    }
    if statistic < TAU_MIN {
        return 0.0;
    }

    let coefficients: &[f64] = if statistic <= TAU_STAR {
        &SMALL_P
    } else {
        &LARGE_P
    };
    let x = coefficients
        .iter()
        .rev()
        .fold(0.0, |acc, c| acc * statistic + c);
    normal_cdf(x)
}
