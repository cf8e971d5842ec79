//! Ordinary Least Squares (OLS) regression used by the unit-root tests.
//!
//! The design matrix is passed column by column and always gets an intercept
//! prepended. Standard errors come from the diagonal of `(X'X)^-1`.

use crate::error::{ForecastError, Result};

/// Relative pivot size below which the normal equations are treated as singular.
const PIVOT_TOLERANCE: f64 = 1e-10;

/// Fitted OLS regression `y = intercept + X @ coefficients`.
#[derive(Debug, Clone)]
pub struct OLSResult {
    /// Regression coefficients (one per column).
    pub coefficients: Vec<f64>,
    /// Intercept term.
    pub intercept: f64,
    /// Standard errors in the order `[intercept, coefficients...]`.
    pub std_errors: Vec<f64>,
    /// Residual sum of squares.
    pub rss: f64,
    /// Number of observations used.
    pub nobs: usize,
}

impl OLSResult {
    /// Number of estimated parameters including the intercept.
    pub fn num_params(&self) -> usize {
        self.coefficients.len() + 1
    }

    /// Standard error of the coefficient on column `i`.
    pub fn coefficient_std_error(&self, i: usize) -> Option<f64> {
        self.std_errors.get(i + 1).copied()
    }

    /// t-statistic of the coefficient on column `i`.
    pub fn t_statistic(&self, i: usize) -> Option<f64> {
        let coef = *self.coefficients.get(i)?;
        let se = self.coefficient_std_error(i)?;
        Some(coef / se)
    }

    /// Gaussian AIC in the regression convention `n ln(rss/n) + 2k`.
    pub fn aic(&self) -> f64 {
        let n = self.nobs as f64;
        n * (self.rss / n).ln() + 2.0 * self.num_params() as f64
    }
}

fn check_columns(columns: &[Vec<f64>], n: usize) -> Result<()> {
    for column in columns {
        if column.len() != n {
            return Err(ForecastError::LengthMismatch {
                expected: n,
                got: column.len(),
            });
        }
    }
    Ok(())
}

/// Fit OLS regression of `y` on an intercept plus `columns`.
///
/// Uses Cholesky decomposition to solve the normal equations. A design whose
/// normal matrix is (numerically) singular is reported as a
/// [`ForecastError::ComputationError`] instead of being regularized.
pub fn ols_fit(y: &[f64], columns: &[Vec<f64>]) -> Result<OLSResult> {
    let n = y.len();
    let k = columns.len() + 1;

    if n < k {
        return Err(ForecastError::InsufficientData { needed: k, got: n });
    }
    check_columns(columns, n)?;

    // X'X and X'y with the intercept column first
    let mut xtx = vec![vec![0.0; k]; k];
    let mut xty = vec![0.0; k];
    let column = |j: usize, obs: usize| if j == 0 { 1.0 } else { columns[j - 1][obs] };

    for (obs, &y_obs) in y.iter().enumerate() {
        for i in 0..k {
            let xi = column(i, obs);
            xty[i] += xi * y_obs;
            for j in 0..=i {
                xtx[i][j] += xi * column(j, obs);
            }
        }
    }
    for i in 0..k {
        for j in 0..i {
            xtx[j][i] = xtx[i][j];
        }
    }

    let factor = cholesky(&xtx).ok_or_else(|| {
        ForecastError::ComputationError("OLS design matrix is singular".into())
    })?;
    let beta = cholesky_solve(&factor, &xty);

    let rss: f64 = y
        .iter()
        .enumerate()
        .map(|(obs, &y_obs)| {
            let fitted: f64 = (0..k).map(|j| beta[j] * column(j, obs)).sum();
            (y_obs - fitted).powi(2)
        })
        .sum();

    let dof = n.saturating_sub(k);
    let sigma2 = if dof > 0 { rss / dof as f64 } else { f64::NAN };
    let std_errors = (0..k)
        .map(|j| {
            let mut unit = vec![0.0; k];
            unit[j] = 1.0;
            let inv_col = cholesky_solve(&factor, &unit);
            (sigma2 * inv_col[j]).sqrt()
        })
        .collect();

    Ok(OLSResult {
        intercept: beta[0],
        coefficients: beta[1..].to_vec(),
        std_errors,
        rss,
        nobs: n,
    })
}

/// Lower-triangular Cholesky factor of a symmetric positive definite matrix.
fn cholesky(a: &[Vec<f64>]) -> Option<Vec<Vec<f64>>> {
    let n = a.len();
    if n == 0 {
        return None;
    }
    let mut l = vec![vec![0.0; n]; n];

    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i][j];
            for k in 0..j {
                sum -= l[i][k] * l[j][k];
            }

            if i == j {
                if !(sum > PIVOT_TOLERANCE * a[i][i].abs()) || !sum.is_finite() {
                    return None;
                }
                l[i][j] = sum.sqrt();
            } else {
                l[i][j] = sum / l[j][j];
            }
        }
    }
    Some(l)
}

/// Solve `L L' x = b` given the Cholesky factor `L`.
fn cholesky_solve(l: &[Vec<f64>], b: &[f64]) -> Vec<f64> {
    let n = b.len();

    // Forward substitution: L @ y = b
    let mut y = vec![0.0; n];
    for i in 0..n {
        let mut sum = b[i];
        for j in 0..i {
            sum -= l[i][j] * y[j];
        }
        y[i] = sum / l[i][i];
    }

    // Backward substitution: L' @ x = y
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = y[i];
        for j in (i + 1)..n {
            sum -= l[j][i] * x[j];
        }
        x[i] = sum / l[i][i];
    }
    x
}
