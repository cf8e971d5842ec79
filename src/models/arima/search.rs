//! Exhaustive ARIMA and SARIMA order selection by AIC.

use crate::core::TimeSeries;
use crate::error::{FitFailure, ForecastError, Result};
use crate::models::arima::fitter::{FitOptions, ModelFitter, Verbosity};
use crate::models::arima::model::CssEstimator;
use crate::models::arima::order::{Order, SeasonalOrder};
use crate::models::traits::{Estimator, FittedModel};
use rayon::prelude::*;
use tracing::{debug, info};

/// Candidate values for every order component.
///
/// Value sets are kept sorted and free of duplicates, so enumeration order
/// only depends on the values themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSpace {
    p: Vec<usize>,
    d: Vec<usize>,
    q: Vec<usize>,
    seasonal_p: Vec<usize>,
    seasonal_d: Vec<usize>,
    seasonal_q: Vec<usize>,
    seasonal_period: usize,
}

impl Default for SearchSpace {
    fn default() -> Self {
        Self {
            p: vec![0, 1],
            d: vec![0, 1],
            q: vec![0, 1],
            seasonal_p: vec![0, 1],
            seasonal_d: vec![0, 1],
            seasonal_q: vec![0, 1],
            seasonal_period: 12,
        }
    }
}

fn value_set(values: impl IntoIterator<Item = usize>) -> Vec<usize> {
    let mut values: Vec<usize> = values.into_iter().collect();
    values.sort_unstable();
    values.dedup();
    values
}

impl SearchSpace {
    /// Non-seasonal space: p, d, q in `{0, 1}` and no seasonal component.
    pub fn non_seasonal() -> Self {
        Self::default().with_seasonal_period(0)
    }

    /// Set the AR orders (p) to try.
    pub fn with_p(mut self, values: impl IntoIterator<Item = usize>) -> Self {
        self.p = value_set(values);
        self
    }

    /// Set the differencing orders (d) to try.
    pub fn with_d(mut self, values: impl IntoIterator<Item = usize>) -> Self {
        self.d = value_set(values);
        self
    }

    /// Set the MA orders (q) to try.
    pub fn with_q(mut self, values: impl IntoIterator<Item = usize>) -> Self {
        self.q = value_set(values);
        self
    }

    /// Set the seasonal AR orders (P) to try.
    pub fn with_seasonal_p(mut self, values: impl IntoIterator<Item = usize>) -> Self {
        self.seasonal_p = value_set(values);
        self
    }

    /// Set the seasonal differencing orders (D) to try.
    pub fn with_seasonal_d(mut self, values: impl IntoIterator<Item = usize>) -> Self {
        self.seasonal_d = value_set(values);
        self
    }

    /// Set the seasonal MA orders (Q) to try.
    pub fn with_seasonal_q(mut self, values: impl IntoIterator<Item = usize>) -> Self {
        self.seasonal_q = value_set(values);
        self
    }

    /// Set the seasonal period; 0 disables the seasonal component.
    pub fn with_seasonal_period(mut self, period: usize) -> Self {
        self.seasonal_period = period;
        self
    }

    pub fn seasonal_period(&self) -> usize {
        self.seasonal_period
    }

    pub fn d_values(&self) -> &[usize] {
        &self.d
    }

    fn validate(&self) -> Result<()> {
        let sets = [
            ("p", &self.p),
            ("d", &self.d),
            ("q", &self.q),
            ("P", &self.seasonal_p),
            ("D", &self.seasonal_d),
            ("Q", &self.seasonal_q),
        ];
        for (name, values) in sets {
            if values.is_empty() {
                return Err(ForecastError::InvalidParameter(format!(
                    "search space has no values for {}",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Candidates in canonical order: (p,d,q) ascending lexicographically,
    /// then (P,D,Q) ascending lexicographically within each.
    pub fn candidates(&self) -> Vec<(Order, SeasonalOrder)> {
        let seasonal = if self.seasonal_period == 0 {
            vec![SeasonalOrder::none()]
        } else {
            let mut seasonal = Vec::new();
            for &cap_p in &self.seasonal_p {
                for &cap_d in &self.seasonal_d {
                    for &cap_q in &self.seasonal_q {
                        seasonal.push(SeasonalOrder::new(
                            cap_p,
                            cap_d,
                            cap_q,
                            self.seasonal_period,
                        ));
                    }
                }
            }
            seasonal
        };

        let mut candidates = Vec::new();
        for &p in &self.p {
            for &d in &self.d {
                for &q in &self.q {
                    for &s in &seasonal {
                        candidates.push((Order::new(p, d, q), s));
                    }
                }
            }
        }
        candidates
    }
}

/// Configuration for the parameter search.
#[derive(Debug, Clone, Default)]
pub struct SearchConfig {
    /// Fit candidates on the rayon thread pool.
    pub parallel: bool,
    /// Options for every candidate fit.
    pub fit_options: FitOptions,
}

impl SearchConfig {
    /// Fit candidates concurrently.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Set the options used for each candidate fit.
    pub fn with_fit_options(mut self, fit_options: FitOptions) -> Self {
        self.fit_options = fit_options;
        self
    }
}

/// A successfully scored candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeaderboardEntry {
    pub order: Order,
    pub seasonal_order: SeasonalOrder,
    pub aic: f64,
}

/// A candidate that could not be fitted.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateFailure {
    pub order: Order,
    pub seasonal_order: SeasonalOrder,
    pub failure: FitFailure,
}

/// The selected model and how it was chosen.
#[derive(Debug, Clone)]
pub struct SearchResult<M> {
    /// Order of the selected model.
    pub order: Order,
    /// Seasonal order of the selected model.
    pub seasonal_order: SeasonalOrder,
    /// AIC of the selected model.
    pub aic: f64,
    /// The selected model.
    pub model: M,
    /// Every scored candidate, ascending AIC; ties keep enumeration order.
    pub leaderboard: Vec<LeaderboardEntry>,
    /// Candidates skipped because their fit failed.
    pub failures: Vec<CandidateFailure>,
    /// Number of candidates enumerated.
    pub candidates: usize,
}

/// Outcome of a search: a selection, or the evidence that nothing fitted.
#[derive(Debug, Clone)]
pub enum SearchOutcome<M> {
    Selected(SearchResult<M>),
    NoViableModel {
        candidates: usize,
        failures: Vec<CandidateFailure>,
    },
}

impl<M> SearchOutcome<M> {
    pub fn is_selected(&self) -> bool {
        matches!(self, SearchOutcome::Selected(_))
    }

    pub fn selected(&self) -> Option<&SearchResult<M>> {
        match self {
            SearchOutcome::Selected(result) => Some(result),
            SearchOutcome::NoViableModel { .. } => None,
        }
    }

    /// Convert "nothing fitted" into [`ForecastError::NoViableModel`].
    pub fn into_result(self) -> Result<SearchResult<M>> {
        match self {
            SearchOutcome::Selected(result) => Ok(result),
            SearchOutcome::NoViableModel { candidates, .. } => {
                Err(ForecastError::NoViableModel { candidates })
            }
        }
    }
}

/// Grid search over ARIMA/SARIMA orders.
///
/// Every candidate of the [`SearchSpace`] is fitted; candidates whose fit
/// fails are skipped. The candidate with the lowest AIC wins and ties go to
/// the candidate enumerated first, whether or not the fits ran in parallel.
#[derive(Debug, Clone, Default)]
pub struct ParameterSearcher<E = CssEstimator> {
    fitter: ModelFitter<E>,
    config: SearchConfig,
}

impl ParameterSearcher<CssEstimator> {
    pub fn new(config: SearchConfig) -> Self {
        Self::with_estimator(CssEstimator::new(), config)
    }
}

impl<E: Estimator> ParameterSearcher<E> {
    pub fn with_estimator(estimator: E, config: SearchConfig) -> Self {
        Self {
            fitter: ModelFitter::with_estimator(estimator),
            config,
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Fit every candidate of `space` on `train` and select the best.
    pub fn search(&self, train: &TimeSeries, space: &SearchSpace) -> Result<SearchOutcome<E::Model>> {
        space.validate()?;
        let candidates = space.candidates();

        // Skipped candidates are routine here, not worth a warning each
        let options = match self.config.fit_options.verbosity {
            Verbosity::Verbose => self.config.fit_options.clone(),
            _ => self.config.fit_options.silent(),
        };
        let fit = |index: usize, &(order, seasonal): &(Order, SeasonalOrder)| {
            let result = self
                .fitter
                .fit_with(train, order, Some(seasonal), &options)
                .and_then(|model| {
                    if model.aic().is_finite() {
                        Ok(model)
                    } else {
                        Err(FitFailure::IllConditioned("AIC is not finite".to_string()))
                    }
                });
            Scored {
                index,
                order,
                seasonal_order: seasonal,
                result,
            }
        };

        // Only the running best model is kept; the rest are dropped once scored
        let tally = if self.config.parallel {
            candidates
                .par_iter()
                .enumerate()
                .map(|(index, candidate)| fit(index, candidate))
                .fold(Tally::default, Tally::record)
                .reduce(Tally::default, Tally::merge)
        } else {
            candidates
                .iter()
                .enumerate()
                .map(|(index, candidate)| fit(index, candidate))
                .fold(Tally::default(), Tally::record)
        };
        let (best, leaderboard, failures) = tally.finish();

        let Some((order, seasonal_order, model)) = best else {
            info!(
                candidates = candidates.len(),
                failed = failures.len(),
                "no candidate could be fitted"
            );
            return Ok(SearchOutcome::NoViableModel {
                candidates: candidates.len(),
                failures,
            });
        };

        let aic = model.aic();

        info!(
            candidates = candidates.len(),
            fitted = leaderboard.len(),
            failed = failures.len(),
            %order,
            seasonal = %seasonal_order,
            aic,
            "parameter search finished"
        );

        Ok(SearchOutcome::Selected(SearchResult {
            order,
            seasonal_order,
            aic,
            model,
            leaderboard,
            failures,
            candidates: candidates.len(),
        }))
    }
}

/// One fitted candidate with its position in enumeration order.
struct Scored<M> {
    index: usize,
    order: Order,
    seasonal_order: SeasonalOrder,
    result: std::result::Result<M, FitFailure>,
}

/// Running reduction of scored candidates. Entries carry their enumeration
/// index so partial tallies can be merged in any order.
struct Tally<M> {
    best: Option<(usize, Order, SeasonalOrder, M)>,
    leaderboard: Vec<(usize, LeaderboardEntry)>,
    failures: Vec<(usize, CandidateFailure)>,
}

impl<M> Default for Tally<M> {
    fn default() -> Self {
        Self {
            best: None,
            leaderboard: Vec::new(),
            failures: Vec::new(),
        }
    }
}

impl<M: FittedModel> Tally<M> {
    fn record(mut self, scored: Scored<M>) -> Self {
        let Scored {
            index,
            order,
            seasonal_order,
            result,
        } = scored;
        match result {
            Ok(model) => {
                let aic = model.aic();
                debug!(%order, seasonal = %seasonal_order, aic, "candidate scored");
                self.leaderboard.push((
                    index,
                    LeaderboardEntry {
                        order,
                        seasonal_order,
                        aic,
                    },
                ));
                self.best = Self::better(self.best, Some((index, order, seasonal_order, model)));
            }
            Err(failure) => {
                debug!(%order, seasonal = %seasonal_order, %failure, "candidate skipped");
                self.failures.push((
                    index,
                    CandidateFailure {
                        order,
                        seasonal_order,
                        failure,
                    },
                ));
            }
        }
        self
    }

    fn merge(mut self, other: Self) -> Self {
        self.best = Self::better(self.best, other.best);
        self.leaderboard.extend(other.leaderboard);
        self.failures.extend(other.failures);
        self
    }

    /// Lower AIC wins; equal AICs go to the earlier candidate.
    fn better(
        a: Option<(usize, Order, SeasonalOrder, M)>,
        b: Option<(usize, Order, SeasonalOrder, M)>,
    ) -> Option<(usize, Order, SeasonalOrder, M)> {
        match (a, b) {
            (Some(a), Some(b)) => {
                let a_wins = match a.3.aic().total_cmp(&b.3.aic()) {
                    std::cmp::Ordering::Less => true,
                    std::cmp::Ordering::Greater => false,
                    std::cmp::Ordering::Equal => a.0 < b.0,
                };
                Some(if a_wins { a } else { b })
            }
            (a, None) => a,
            (None, b) => b,
        }
    }

    /// Best model, leaderboard by ascending AIC then enumeration order, and
    /// failures in enumeration order.
    fn finish(
        mut self,
    ) -> (
        Option<(Order, SeasonalOrder, M)>,
        Vec<LeaderboardEntry>,
        Vec<CandidateFailure>,
    ) {
        self.leaderboard
            .sort_by(|(i, a), (j, b)| a.aic.total_cmp(&b.aic).then(i.cmp(j)));
        self.failures.sort_by_key(|(index, _)| *index);
        (
            self.best.map(|(_, order, seasonal, model)| (order, seasonal, model)),
            self.leaderboard.into_iter().map(|(_, entry)| entry).collect(),
            self.failures.into_iter().map(|(_, failure)| failure).collect(),
        )
    }
}
