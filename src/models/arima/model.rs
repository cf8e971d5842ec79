//! Seasonal ARIMA estimated by conditional sum of squares.

use crate::core::{SeriesSpan, TimeSeries};
use crate::error::FitFailure;
use crate::models::arima::diff::{
    difference, differencing_polynomial, integrate, integrated_ar_lags, seasonal_difference,
};
use crate::models::arima::fitter::FitOptions;
use crate::models::arima::order::{Order, SeasonalOrder};
use crate::models::arima::polynomial::{ar_lags, ma_lags, psi_weights};
use crate::models::traits::{Estimator, FittedModel, StepPrediction};
use crate::utils::optimization::{nelder_mead, NelderMeadConfig};
use crate::utils::stats::mean;
use chrono::{DateTime, Utc};
use std::f64::consts::PI;
use std::time::Instant;

/// Extra effective observations required beyond the parameter count.
const MIN_EXTRA_OBSERVATIONS: usize = 5;

/// Coefficients are kept inside this bound during optimization.
const COEFFICIENT_BOUND: f64 = 0.99;

/// Residual variance at or below this fraction of the signal power is zero.
const DEGENERATE_VARIANCE: f64 = 1e-12;

/// Conditional sum of squares estimator for SARIMA(p,d,q)(P,D,Q)\[s\].
///
/// The series is differenced `d` times and seasonally differenced `D` times;
/// the ARMA part is then fitted to the differenced series by minimising the
/// sum of squared one-step errors with bounded Nelder-Mead. A mean (a drift
/// after one difference) is estimated when `d + D <= 1`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CssEstimator;

impl CssEstimator {
    pub fn new() -> Self {
        Self
    }
}

/// Free parameters in optimizer order: `[mean?, ar, ma, sar, sma]`.
#[derive(Debug, Clone, Copy)]
struct Layout {
    include_mean: bool,
    p: usize,
    q: usize,
    cap_p: usize,
    cap_q: usize,
    period: usize,
}

#[derive(Debug, Clone, Default)]
struct Coefficients {
    mean: Option<f64>,
    ar: Vec<f64>,
    ma: Vec<f64>,
    seasonal_ar: Vec<f64>,
    seasonal_ma: Vec<f64>,
}

impl Layout {
    fn new(order: Order, seasonal: SeasonalOrder) -> Self {
        Self {
            include_mean: order.d + seasonal.d <= 1,
            p: order.p,
            q: order.q,
            cap_p: seasonal.p,
            cap_q: seasonal.q,
            period: seasonal.period,
        }
    }

    fn num_coefficients(&self) -> usize {
        self.p + self.q + self.cap_p + self.cap_q
    }

    fn num_params(&self) -> usize {
        self.num_coefficients() + usize::from(self.include_mean)
    }

    /// Largest AR lag of the expanded polynomial.
    fn ar_span(&self) -> usize {
        self.p + self.cap_p * self.period
    }

    fn unpack(&self, params: &[f64]) -> Coefficients {
        let offset = usize::from(self.include_mean);
        let mut rest = &params[offset..];
        let mut take = |n: usize| {
            let (head, tail) = rest.split_at(n);
            rest = tail;
            head.to_vec()
        };
        Coefficients {
            mean: self.include_mean.then(|| params[0]),
            ar: take(self.p),
            ma: take(self.q),
            seasonal_ar: take(self.cap_p),
            seasonal_ma: take(self.cap_q),
        }
    }

    fn initial(&self, mean: f64) -> Vec<f64> {
        let mut initial = Vec::with_capacity(self.num_params());
        if self.include_mean {
            initial.push(mean);
        }
        for n in [self.p, self.q, self.cap_p, self.cap_q] {
            initial.extend((0..n).map(|i| 0.1 / (i + 1) as f64));
        }
        initial
    }

    fn bounds(&self) -> Vec<(f64, f64)> {
        let mut bounds = Vec::with_capacity(self.num_params());
        if self.include_mean {
            bounds.push((f64::NEG_INFINITY, f64::INFINITY));
        }
        bounds.extend(
            (0..self.num_coefficients()).map(|_| (-COEFFICIENT_BOUND, COEFFICIENT_BOUND)),
        );
        bounds
    }
}

impl Coefficients {
    fn ar_lags(&self, period: usize) -> Vec<f64> {
        ar_lags(&self.ar, &self.seasonal_ar, period)
    }

    fn ma_lags(&self, period: usize) -> Vec<f64> {
        ma_lags(&self.ma, &self.seasonal_ma, period)
    }
}

/// One-step prediction of `w[t]` from its past and past innovations.
fn one_step(w: &[f64], innovations: &[f64], t: usize, mean: f64, ar: &[f64], ma: &[f64]) -> f64 {
    let mut pred = mean;
    for (i, a) in ar.iter().enumerate().take(t) {
        pred += a * (w[t - 1 - i] - mean);
    }
    for (j, b) in ma.iter().enumerate().take(t) {
        pred += b * innovations[t - 1 - j];
    }
    pred
}

/// Conditional innovations of the ARMA recursion. The first `ar.len()`
/// entries are conditioned to zero.
fn innovations(w: &[f64], mean: f64, ar: &[f64], ma: &[f64]) -> Vec<f64> {
    let mut e = vec![0.0; w.len()];
    for t in ar.len()..w.len() {
        e[t] = w[t] - one_step(w, &e, t, mean, ar, ma);
    }
    e
}

fn conditional_sum_of_squares(w: &[f64], mean: f64, ar: &[f64], ma: &[f64]) -> f64 {
    innovations(w, mean, ar, ma)
        .iter()
        .skip(ar.len())
        .map(|e| e * e)
        .sum()
}

impl Estimator for CssEstimator {
    type Model = SarimaFit;

    fn estimate(
        &self,
        series: &TimeSeries,
        order: Order,
        seasonal_order: SeasonalOrder,
        options: &FitOptions,
    ) -> std::result::Result<SarimaFit, FitFailure> {
        let started = Instant::now();
        let values = series.values();
        let layout = Layout::new(order, seasonal_order);
        let period = seasonal_order.period;

        let diff_loss = order.d + seasonal_order.d * period;
        let conditioning = diff_loss + layout.ar_span();
        let needed = conditioning + layout.num_params() + MIN_EXTRA_OBSERVATIONS;
        if values.len() < needed {
            return Err(FitFailure::InsufficientObservations {
                needed,
                got: values.len(),
            });
        }

        let w = seasonal_difference(&difference(values, order.d), seasonal_order.d, period);
        let w_mean = mean(&w);
        if !w_mean.is_finite() {
            return Err(FitFailure::IllConditioned(
                "differenced series is not finite".to_string(),
            ));
        }

        let (coefficients, iterations, converged) = if layout.num_coefficients() == 0 {
            // Nothing to optimize: the mean is the least squares solution
            let coefficients = Coefficients {
                mean: layout.include_mean.then_some(w_mean),
                ..Default::default()
            };
            (coefficients, 0, true)
        } else {
            let config = NelderMeadConfig {
                max_iter: options.max_iterations,
                tolerance: options.tolerance,
                max_duration: options.timeout,
                ..Default::default()
            };
            let result = nelder_mead(
                |params| {
                    let c = layout.unpack(params);
                    conditional_sum_of_squares(
                        &w,
                        c.mean.unwrap_or(0.0),
                        &c.ar_lags(period),
                        &c.ma_lags(period),
                    )
                },
                &layout.initial(w_mean),
                Some(&layout.bounds()),
                config,
            );

            if result.timed_out {
                return Err(FitFailure::TimedOut {
                    elapsed: started.elapsed(),
                });
            }
            if !result.converged {
                return Err(FitFailure::NonConvergence {
                    iterations: result.iterations,
                });
            }
            if !result.optimal_value.is_finite() {
                return Err(FitFailure::IllConditioned(
                    "conditional sum of squares is not finite".to_string(),
                ));
            }
            (
                layout.unpack(&result.optimal_point),
                result.iterations,
                result.converged,
            )
        };

        SarimaFit::assemble(
            series,
            order,
            seasonal_order,
            layout,
            coefficients,
            w,
            iterations,
            converged,
        )
    }
}

/// A fitted SARIMA(p,d,q)(P,D,Q)\[s\] model.
#[derive(Debug, Clone)]
pub struct SarimaFit {
    order: Order,
    seasonal_order: SeasonalOrder,
    span: SeriesSpan,
    coefficients: Coefficients,
    sigma2: f64,
    log_likelihood: f64,
    aic: f64,
    bic: f64,
    aicc: f64,
    residuals: Vec<f64>,
    fitted: Vec<f64>,
    residual_timestamps: Vec<DateTime<Utc>>,
    iterations: usize,
    converged: bool,
    // Forecast state
    history: Vec<f64>,
    differenced: Vec<f64>,
    innovations: Vec<f64>,
    ar_lags: Vec<f64>,
    ma_lags: Vec<f64>,
    deltas: Vec<f64>,
}

impl SarimaFit {
    fn assemble(
        series: &TimeSeries,
        order: Order,
        seasonal_order: SeasonalOrder,
        layout: Layout,
        coefficients: Coefficients,
        differenced: Vec<f64>,
        iterations: usize,
        converged: bool,
    ) -> std::result::Result<Self, FitFailure> {
        let period = seasonal_order.period;
        let ar_lags = coefficients.ar_lags(period);
        let ma_lags = coefficients.ma_lags(period);
        let mean = coefficients.mean.unwrap_or(0.0);

        let innovations = innovations(&differenced, mean, &ar_lags, &ma_lags);
        let residuals = innovations[ar_lags.len()..].to_vec();
        let n_eff = residuals.len() as f64;
        let css: f64 = residuals.iter().map(|e| e * e).sum();
        let sigma2 = css / n_eff;

        if !sigma2.is_finite() {
            return Err(FitFailure::IllConditioned(
                "residual variance is not finite".to_string(),
            ));
        }
        let power = differenced.iter().map(|w| w * w).sum::<f64>() / differenced.len() as f64;
        if sigma2 <= DEGENERATE_VARIANCE * power {
            return Err(FitFailure::Degenerate);
        }

        let log_likelihood = -0.5 * n_eff * ((2.0 * PI * sigma2).ln() + 1.0);
        // Coefficients, mean and the innovation variance
        let k = (layout.num_params() + 1) as f64;
        let aic = -2.0 * log_likelihood + 2.0 * k;
        let bic = -2.0 * log_likelihood + k * n_eff.ln();
        let aicc = if n_eff - k - 1.0 > 0.0 {
            aic + 2.0 * k * (k + 1.0) / (n_eff - k - 1.0)
        } else {
            f64::INFINITY
        };
        if !aic.is_finite() {
            return Err(FitFailure::IllConditioned("AIC is not finite".to_string()));
        }

        let start = series.len() - residuals.len();
        let fitted = series.values()[start..]
            .iter()
            .zip(&residuals)
            .map(|(y, e)| y - e)
            .collect();

        Ok(Self {
            order,
            seasonal_order,
            span: series.span(),
            coefficients,
            sigma2,
            log_likelihood,
            aic,
            bic,
            aicc,
            residuals,
            fitted,
            residual_timestamps: series.timestamps()[start..].to_vec(),
            iterations,
            converged,
            history: series.values().to_vec(),
            differenced,
            innovations,
            ar_lags,
            ma_lags,
            deltas: differencing_polynomial(order.d, seasonal_order.d, period),
        })
    }

    /// Non-seasonal AR coefficients.
    pub fn ar_coefficients(&self) -> &[f64] {
        &self.coefficients.ar
    }

    /// Non-seasonal MA coefficients.
    pub fn ma_coefficients(&self) -> &[f64] {
        &self.coefficients.ma
    }

    pub fn seasonal_ar_coefficients(&self) -> &[f64] {
        &self.coefficients.seasonal_ar
    }

    pub fn seasonal_ma_coefficients(&self) -> &[f64] {
        &self.coefficients.seasonal_ma
    }

    /// Mean of the differenced series, `None` when `d + D > 1`.
    pub fn intercept(&self) -> Option<f64> {
        self.coefficients.mean
    }

    /// Innovation variance.
    pub fn sigma2(&self) -> f64 {
        self.sigma2
    }

    pub fn log_likelihood(&self) -> f64 {
        self.log_likelihood
    }

    pub fn bic(&self) -> f64 {
        self.bic
    }

    /// Small-sample corrected AIC.
    pub fn aicc(&self) -> f64 {
        self.aicc
    }

    /// In-sample one-step predictions aligned with [`FittedModel::residuals`].
    pub fn fitted_values(&self) -> &[f64] {
        &self.fitted
    }

    pub fn residual_timestamps(&self) -> &[DateTime<Utc>] {
        &self.residual_timestamps
    }

    /// Optimizer iterations used.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn converged(&self) -> bool {
        self.converged
    }
}

impl FittedModel for SarimaFit {
    fn order(&self) -> Order {
        self.order
    }

    fn seasonal_order(&self) -> SeasonalOrder {
        self.seasonal_order
    }

    fn aic(&self) -> f64 {
        self.aic
    }

    fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    fn training_span(&self) -> &SeriesSpan {
        &self.span
    }

    fn predict_steps(&self, horizon: usize) -> Vec<StepPrediction> {
        if horizon == 0 {
            return vec![];
        }
        let mean = self.coefficients.mean.unwrap_or(0.0);

        // Recurse on the differenced scale; future innovations are zero
        let mut w = self.differenced.clone();
        let mut e = self.innovations.clone();
        for _ in 0..horizon {
            let t = w.len();
            let pred = one_step(&w, &e, t, mean, &self.ar_lags, &self.ma_lags);
            w.push(pred);
            e.push(0.0);
        }
        let means = integrate(&w[self.differenced.len()..], &self.history, &self.deltas);

        let full_ar = integrated_ar_lags(&self.ar_lags, &self.deltas);
        let psi = psi_weights(&full_ar, &self.ma_lags, horizon);

        let mut cumulative = 0.0;
        means
            .into_iter()
            .zip(psi)
            .map(|(mean, weight)| {
                cumulative += weight * weight;
                StepPrediction {
                    mean,
                    variance: self.sigma2 * cumulative,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn monthly(values: Vec<f64>) -> TimeSeries {
        let start = Utc.with_ymd_and_hms(2015, 1, 1, 0, 0, 0).unwrap();
        TimeSeries::monthly(start, values).unwrap()
    }

    fn noise(n: usize, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n).map(|_| rng.gen_range(-1.0..1.0)).collect()
    }

    fn ar1(n: usize, phi: f64, seed: u64) -> Vec<f64> {
        let e = noise(n, seed);
        let mut values = vec![10.0];
        for t in 1..n {
            values.push(10.0 + phi * (values[t - 1] - 10.0) + e[t]);
        }
        values
    }

    fn fit(
        values: Vec<f64>,
        order: Order,
        seasonal: SeasonalOrder,
    ) -> std::result::Result<SarimaFit, FitFailure> {
        CssEstimator::new().estimate(&monthly(values), order, seasonal, &FitOptions::default())
    }

    #[test]
    fn recovers_ar1_coefficient_and_mean() {
        let model = fit(ar1(300, 0.7, 7), Order::new(1, 0, 0), SeasonalOrder::none()).unwrap();

        assert_relative_eq!(model.ar_coefficients()[0], 0.7, epsilon = 0.1);
        assert_relative_eq!(model.intercept().unwrap(), 10.0, epsilon = 0.5);
        // Uniform(-1, 1) innovations have variance 1/3
        assert_relative_eq!(model.sigma2(), 1.0 / 3.0, epsilon = 0.08);
        assert!(model.converged());
    }

    #[test]
    fn single_ar_coefficient_matches_least_squares() {
        // d = 2 drops the mean, leaving a quadratic objective in one coefficient
        for seed in [3, 11, 18, 42] {
            let values = ar1(150, 0.7, seed);
            let w = difference(&values, 2);
            let cross: f64 = w.windows(2).map(|pair| pair[0] * pair[1]).sum();
            let lagged: f64 = w[..w.len() - 1].iter().map(|x| x * x).sum();

            let model = fit(values, Order::new(1, 2, 0), SeasonalOrder::none()).unwrap();

            assert!(model.intercept().is_none());
            assert_relative_eq!(model.ar_coefficients()[0], cross / lagged, epsilon = 1e-5);
        }
    }

    #[test]
    fn residuals_drop_initialization_losses() {
        let model = fit(ar1(120, 0.5, 3), Order::new(2, 1, 1), SeasonalOrder::none()).unwrap();

        // d = 1 plus two AR lags
        assert_eq!(model.residuals().len(), 117);
        assert_eq!(model.fitted_values().len(), 117);
        assert_eq!(model.residual_timestamps().len(), 117);
        assert_eq!(
            model.residual_timestamps()[0],
            Utc.with_ymd_and_hms(2015, 4, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn residuals_are_observed_minus_fitted() {
        let values = ar1(80, 0.4, 11);
        let model = fit(values.clone(), Order::new(1, 0, 1), SeasonalOrder::none()).unwrap();

        let offset = values.len() - model.residuals().len();
        for (i, (r, f)) in model
            .residuals()
            .iter()
            .zip(model.fitted_values())
            .enumerate()
        {
            assert_relative_eq!(values[offset + i] - f, *r, epsilon = 1e-9);
        }
    }

    #[test]
    fn information_criteria_are_consistent() {
        let model = fit(ar1(100, 0.6, 5), Order::new(1, 0, 0), SeasonalOrder::none()).unwrap();

        let n = model.residuals().len() as f64;
        // phi, mean and sigma2
        let k = 3.0;
        assert_relative_eq!(
            model.aic(),
            -2.0 * model.log_likelihood() + 2.0 * k,
            epsilon = 1e-9
        );
        assert_relative_eq!(
            model.bic(),
            -2.0 * model.log_likelihood() + k * n.ln(),
            epsilon = 1e-9
        );
        assert!(model.aicc() > model.aic());
    }

    #[test]
    fn mean_is_dropped_after_two_differences() {
        let e = noise(60, 9);
        let values: Vec<f64> = (0..60).map(|t| (t * t) as f64 * 0.1 + e[t]).collect();
        let model = fit(values, Order::new(0, 2, 1), SeasonalOrder::none()).unwrap();
        assert!(model.intercept().is_none());

        let values: Vec<f64> = (0..60).map(|t| t as f64 + e[t]).collect();
        let model = fit(values, Order::new(0, 1, 1), SeasonalOrder::none()).unwrap();
        assert!(model.intercept().is_some());
    }

    #[test]
    fn white_noise_mean_model_is_closed_form() {
        let values: Vec<f64> = noise(50, 21).iter().map(|e| 5.0 + e).collect();
        let expected = mean(&values);

        let model = fit(values, Order::new(0, 0, 0), SeasonalOrder::none()).unwrap();

        assert_relative_eq!(model.intercept().unwrap(), expected, epsilon = 1e-12);
        assert_eq!(model.iterations(), 0);
        let steps = model.predict_steps(3);
        for step in &steps {
            assert_relative_eq!(step.mean, expected, epsilon = 1e-12);
            assert_relative_eq!(step.variance, model.sigma2(), epsilon = 1e-12);
        }
    }

    #[test]
    fn rejects_too_short_series() {
        let result = fit(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], Order::new(2, 1, 2), SeasonalOrder::none());
        assert!(matches!(
            result,
            Err(FitFailure::InsufficientObservations { needed: 13, got: 6 })
        ));
    }

    #[test]
    fn exact_linear_series_is_degenerate() {
        let values: Vec<f64> = (0..40).map(|t| 3.0 + 2.0 * t as f64).collect();
        let result = fit(values, Order::new(0, 1, 0), SeasonalOrder::none());
        assert!(matches!(result, Err(FitFailure::Degenerate)));
    }

    #[test]
    fn iteration_budget_exhaustion_is_non_convergence() {
        let options = FitOptions::default().with_max_iterations(2);
        let result = CssEstimator::new().estimate(
            &monthly(ar1(100, 0.5, 1)),
            Order::new(2, 0, 2),
            SeasonalOrder::none(),
            &options,
        );
        assert!(matches!(
            result,
            Err(FitFailure::NonConvergence { iterations: 2 })
        ));
    }

    #[test]
    fn random_walk_forecast_is_flat_with_linear_variance() {
        let e = noise(200, 17);
        let mut values = vec![50.0];
        for t in 1..200 {
            values.push(values[t - 1] + e[t]);
        }
        let model = fit(values.clone(), Order::new(0, 1, 0), SeasonalOrder::none()).unwrap();
        let drift = model.intercept().unwrap();
        let last = *values.last().unwrap();

        let steps = model.predict_steps(4);
        for (h, step) in steps.iter().enumerate() {
            let h = (h + 1) as f64;
            assert_relative_eq!(step.mean, last + h * drift, epsilon = 1e-9);
            assert_relative_eq!(step.variance, h * model.sigma2(), epsilon = 1e-9);
        }
    }

    #[test]
    fn seasonal_model_forecasts_the_seasonal_pattern() {
        let pattern = [10.0, 14.0, 9.0, 20.0];
        let e = noise(80, 29);
        let values: Vec<f64> = (0..80)
            .map(|t| 100.0 + pattern[t % 4] + 0.2 * e[t])
            .collect();

        let model = fit(
            values,
            Order::new(0, 0, 0),
            SeasonalOrder::new(0, 1, 1, 4),
        )
        .unwrap();

        assert_eq!(model.seasonal_ma_coefficients().len(), 1);
        let steps = model.predict_steps(8);
        for (h, step) in steps.iter().enumerate() {
            assert_relative_eq!(step.mean, 100.0 + pattern[(80 + h) % 4], epsilon = 0.5);
        }
        // Variance steps up once per seasonal cycle
        assert!(steps[4].variance > steps[3].variance);
        assert_relative_eq!(steps[0].variance, steps[3].variance, epsilon = 1e-12);
    }

    #[test]
    fn forecast_variance_grows_with_horizon() {
        let e = noise(100, 31);
        let mut values = vec![0.0];
        for t in 1..100 {
            values.push(values[t - 1] + 0.5 + e[t]);
        }
        let model = fit(values, Order::new(1, 1, 1), SeasonalOrder::none()).unwrap();

        let steps = model.predict_steps(10);
        assert_eq!(steps.len(), 10);
        assert_relative_eq!(steps[0].variance, model.sigma2(), epsilon = 1e-12);
        for pair in steps.windows(2) {
            assert!(pair[1].variance >= pair[0].variance);
        }
        assert!(model.predict_steps(0).is_empty());
    }
}
