//! Differencing and its inverse for (seasonal) ARIMA models.

use crate::models::arima::polynomial::{combine_lags, polymul};

/// Difference `series` `d` times: `w_t = y_t - y_{t-1}`.
///
/// Each pass drops one observation; once the series is exhausted the
/// result is empty.
pub fn difference(series: &[f64], d: usize) -> Vec<f64> {
    lagged_difference(series, d, 1)
}

/// Seasonally difference `series` `d` times: `w_t = y_t - y_{t-period}`.
/// Period 0 leaves the series unchanged.
pub fn seasonal_difference(series: &[f64], d: usize, period: usize) -> Vec<f64> {
    if period == 0 {
        return series.to_vec();
    }
    lagged_difference(series, d, period)
}

fn lagged_difference(series: &[f64], d: usize, lag: usize) -> Vec<f64> {
    let mut out = series.to_vec();
    for _ in 0..d {
        if out.len() <= lag {
            return Vec::new();
        }
        out = (lag..out.len()).map(|t| out[t] - out[t - lag]).collect();
    }
    out
}

/// Lag coefficients `[delta_1, delta_2, ...]` of `(1 - B)^d (1 - B^s)^D`
/// written as `1 - sum delta_k B^k`.
///
/// A differenced value is `w_t = y_t - sum delta_k y_{t-k}`.
pub fn differencing_polynomial(d: usize, seasonal_d: usize, period: usize) -> Vec<f64> {
    let mut poly = vec![1.0];
    for _ in 0..d {
        poly = polymul(&poly, &[1.0, -1.0]);
    }
    if period > 0 {
        let mut seasonal = vec![0.0; period + 1];
        seasonal[0] = 1.0;
        seasonal[period] = -1.0;
        for _ in 0..seasonal_d {
            poly = polymul(&poly, &seasonal);
        }
    }
    poly.iter().skip(1).map(|c| -c).collect()
}

/// Undo differencing for values `w` that continue `history`:
/// `y_t = w_t + sum delta_k y_{t-k}` with `deltas` from
/// [`differencing_polynomial`].
pub fn integrate(differenced: &[f64], history: &[f64], deltas: &[f64]) -> Vec<f64> {
    if deltas.is_empty() {
        return differenced.to_vec();
    }

    let mut extended = history.to_vec();
    for &w in differenced {
        let t = extended.len();
        let value = deltas
            .iter()
            .enumerate()
            .filter(|(k, _)| t > *k)
            .fold(w, |acc, (k, delta)| acc + delta * extended[t - 1 - k]);
        extended.push(value);
    }
    extended.split_off(history.len())
}

/// Lag coefficients of the AR polynomial of the integrated model,
/// `phi(B) Phi(B^s) (1 - B)^d (1 - B^s)^D`.
pub fn integrated_ar_lags(ar_lags: &[f64], deltas: &[f64]) -> Vec<f64> {
    combine_lags(ar_lags, deltas)
}
