//! Residual diagnostics for fitted models.

use crate::error::{ForecastError, Result};
use crate::utils::stats::chi_squared_sf;

/// Ljung-Box portmanteau test result.
#[derive(Debug, Clone, PartialEq)]
pub struct LjungBoxResult {
    /// Test statistic Q
    pub statistic: f64,
    /// Chi-squared upper tail probability of Q
    pub p_value: f64,
    /// Number of autocorrelation lags in Q
    pub lags: usize,
    /// Degrees of freedom, lags minus fitted parameters (at least 1)
    pub df: usize,
}

impl LjungBoxResult {
    /// True when the no-autocorrelation null survives at level `alpha`.
    pub fn is_white_noise(&self, alpha: f64) -> bool {
        self.p_value > alpha
    }
}

/// Ljung-Box test for autocorrelation in model residuals.
///
/// `lags` defaults to `min(10, n/5)` and is capped at `n - 1`;
/// `fitted_params` (p + q + P + Q for a SARIMA fit) reduces the degrees of
/// freedom. Constant residuals report Q = 0 and p = 1.
///
/// # Example
/// ```
/// use stockcast::validation::ljung_box;
///
/// let residuals = vec![0.1, -0.2, 0.15, -0.1, 0.05, -0.08, 0.12, -0.15, 0.1, -0.05];
/// let result = ljung_box(&residuals, Some(3), 0).unwrap();
/// assert_eq!(result.lags, 3);
/// assert!(result.p_value >= 0.0 && result.p_value <= 1.0);
/// ```
pub fn ljung_box(
    residuals: &[f64],
    lags: Option<usize>,
    fitted_params: usize,
) -> Result<LjungBoxResult> {
    let n = residuals.len();
    if n < 3 {
        return Err(ForecastError::InsufficientData { needed: 3, got: n });
    }
    if residuals.iter().any(|r| !r.is_finite()) {
        return Err(ForecastError::MissingValues);
    }

    let lags = lags
        .unwrap_or_else(|| 10.min(n / 5))
        .clamp(1, n - 1);
    let df = lags.saturating_sub(fitted_params).max(1);

    let mean = residuals.iter().sum::<f64>() / n as f64;
    let centered: Vec<f64> = residuals.iter().map(|&x| x - mean).collect();
    let power: f64 = centered.iter().map(|&x| x * x).sum();
    if power == 0.0 {
        return Ok(LjungBoxResult {
            statistic: 0.0,
            p_value: 1.0,
            lags,
            df,
        });
    }

    let q = (1..=lags)
        .map(|k| {
            let acf_k = centered
                .iter()
                .skip(k)
                .zip(&centered)
                .map(|(a, b)| a * b)
                .sum::<f64>()
                / power;
            acf_k * acf_k / (n - k) as f64
        })
        .sum::<f64>()
        * (n * (n + 2)) as f64;

    Ok(LjungBoxResult {
        statistic: q,
        p_value: chi_squared_sf(q, df),
        lags,
        df,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn white_noise_passes() {
        let mut rng = StdRng::seed_from_u64(7);
        let residuals: Vec<f64> = (0..300).map(|_| rng.gen_range(-1.0..1.0)).collect();

        let result = ljung_box(&residuals, Some(10), 0).unwrap();

        assert_eq!(result.df, 10);
        assert!(result.is_white_noise(0.01));
    }

    #[test]
    fn autocorrelated_residuals_fail() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut residuals = vec![0.0];
        for i in 1..200 {
            residuals.push(0.9 * residuals[i - 1] + rng.gen_range(-1.0..1.0));
        }

        let result = ljung_box(&residuals, Some(10), 0).unwrap();

        assert!(result.statistic > 100.0);
        assert!(!result.is_white_noise(0.05));
    }

    #[test]
    fn alternating_series_statistic() {
        // acf_k = (-1)^k * (n - k) / n for a zero-mean alternating series
        let residuals: Vec<f64> = (0..20).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();

        let result = ljung_box(&residuals, Some(1), 0).unwrap();

        let acf_1 = 19.0 / 20.0;
        assert_relative_eq!(result.statistic, 20.0 * 22.0 * acf_1 * acf_1 / 19.0, epsilon = 1e-10);
    }

    #[test]
    fn fitted_params_reduce_degrees_of_freedom() {
        let residuals: Vec<f64> = (0..50).map(|i| ((i * 7) % 11) as f64 - 5.0).collect();

        assert_eq!(ljung_box(&residuals, Some(10), 3).unwrap().df, 7);
        assert_eq!(ljung_box(&residuals, Some(2), 5).unwrap().df, 1);
    }

    #[test]
    fn default_and_capped_lags() {
        let residuals: Vec<f64> = (0..30).map(|i| ((i * 3) % 7) as f64).collect();

        assert_eq!(ljung_box(&residuals, None, 0).unwrap().lags, 6);
        assert_eq!(ljung_box(&residuals, Some(100), 0).unwrap().lags, 29);
        assert_eq!(ljung_box(&residuals[..4], None, 0).unwrap().lags, 1);
    }

    #[test]
    fn constant_residuals_are_white_noise() {
        let result = ljung_box(&[2.0; 12], None, 0).unwrap();
        assert_eq!(result.statistic, 0.0);
        assert_eq!(result.p_value, 1.0);
    }

    #[test]
    fn rejects_short_or_non_finite_input() {
        assert!(matches!(
            ljung_box(&[1.0, 2.0], None, 0),
            Err(ForecastError::InsufficientData { needed: 3, got: 2 })
        ));
        assert!(matches!(
            ljung_box(&[1.0, f64::NAN, 2.0, 0.5], None, 0),
            Err(ForecastError::MissingValues)
        ));
    }
}
