//! Lag polynomial algebra for multiplicative seasonal models.
//!
//! Polynomials are stored as coefficient vectors starting at `B^0`. The
//! "lag coefficients" of a polynomial `1 - a_1 B - a_2 B^2 - ...` are
//! `[a_1, a_2, ...]`, which is the form the recursions consume.

/// Multiply two polynomials.
pub fn polymul(a: &[f64], b: &[f64]) -> Vec<f64> {
    if a.is_empty() || b.is_empty() {
        return vec![];
    }
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, &x) in a.iter().enumerate() {
        if x == 0.0 {
            continue;
        }
        for (j, &y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

/// `1 + sign * (c_1 B^stride + c_2 B^(2 stride) + ...)`.
fn lag_polynomial(coefficients: &[f64], sign: f64, stride: usize) -> Vec<f64> {
    let mut poly = vec![0.0; coefficients.len() * stride + 1];
    poly[0] = 1.0;
    for (i, &c) in coefficients.iter().enumerate() {
        poly[(i + 1) * stride] = sign * c;
    }
    poly
}

/// Lag coefficients of `phi(B) Phi(B^s)` with
/// `phi(B) = 1 - sum ar_i B^i` and `Phi(B^s) = 1 - sum sar_j B^(js)`.
pub fn ar_lags(ar: &[f64], sar: &[f64], period: usize) -> Vec<f64> {
    let poly = polymul(
        &lag_polynomial(ar, -1.0, 1),
        &lag_polynomial(sar, -1.0, period.max(1)),
    );
    to_lags(&poly)
}

/// Coefficients `[b_1, b_2, ...]` of `theta(B) Theta(B^s) = 1 + sum b_k B^k`.
pub fn ma_lags(ma: &[f64], sma: &[f64], period: usize) -> Vec<f64> {
    let poly = polymul(
        &lag_polynomial(ma, 1.0, 1),
        &lag_polynomial(sma, 1.0, period.max(1)),
    );
    poly[1..].to_vec()
}

/// Lag coefficients of `1 - sum a_k B^k` times another polynomial in lag form.
pub fn combine_lags(a: &[f64], b: &[f64]) -> Vec<f64> {
    to_lags(&polymul(&from_lags(a), &from_lags(b)))
}

fn from_lags(lags: &[f64]) -> Vec<f64> {
    lag_polynomial(lags, -1.0, 1)
}

fn to_lags(poly: &[f64]) -> Vec<f64> {
    poly.iter().skip(1).map(|c| -c).collect()
}

/// First `n` weights of the infinite MA representation of
/// `(1 - sum a_i B^i) y_t = (1 + sum b_j B^j) e_t`.
///
/// `psi_0 = 1` and `psi_j = b_j + sum_{i=1..min(j,p)} a_i psi_{j-i}`.
pub fn psi_weights(ar: &[f64], ma: &[f64], n: usize) -> Vec<f64> {
    let mut psi = Vec::with_capacity(n);
    for j in 0..n {
        if j == 0 {
            psi.push(1.0);
            continue;
        }
        let mut value = ma.get(j - 1).copied().unwrap_or(0.0);
        for (i, &a) in ar.iter().enumerate().take(j) {
            value += a * psi[j - 1 - i];
        }
        psi.push(value);
    }
    psi
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn polymul_expands_products() {
        // (1 + x)(1 - x) = 1 - x^2
        assert_eq!(polymul(&[1.0, 1.0], &[1.0, -1.0]), vec![1.0, 0.0, -1.0]);
        assert!(polymul(&[], &[1.0]).is_empty());
    }

    #[test]
    fn seasonal_ar_lags_are_multiplicative() {
        // (1 - 0.5B)(1 - 0.3B^4) = 1 - 0.5B - 0.3B^4 + 0.15B^5
        let lags = ar_lags(&[0.5], &[0.3], 4);
        assert_eq!(lags.len(), 5);
        assert_relative_eq!(lags[0], 0.5, epsilon = 1e-12);
        assert_relative_eq!(lags[1], 0.0, epsilon = 1e-12);
        assert_relative_eq!(lags[3], 0.3, epsilon = 1e-12);
        assert_relative_eq!(lags[4], -0.15, epsilon = 1e-12);
    }

    #[test]
    fn seasonal_ma_lags_are_multiplicative() {
        // (1 + 0.4B)(1 + 0.2B^3) = 1 + 0.4B + 0.2B^3 + 0.08B^4
        let lags = ma_lags(&[0.4], &[0.2], 3);
        assert_eq!(lags, vec![0.4, 0.0, 0.2, 0.4 * 0.2]);
    }

    #[test]
    fn empty_polynomials_have_no_lags() {
        assert!(ar_lags(&[], &[], 12).is_empty());
        assert!(ma_lags(&[], &[], 0).is_empty());
    }

    #[test]
    fn psi_weights_of_ar1_decay_geometrically() {
        let psi = psi_weights(&[0.5], &[], 4);
        assert_eq!(psi, vec![1.0, 0.5, 0.25, 0.125]);
    }

    #[test]
    fn psi_weights_of_random_walk_are_ones() {
        // (1 - B) y_t = e_t
        let psi = psi_weights(&[1.0], &[], 5);
        assert_eq!(psi, vec![1.0; 5]);
    }

    #[test]
    fn psi_weights_of_ima11() {
        // (1 - B) y_t = (1 - 0.4B) e_t -> psi = 1, 0.6, 0.6, ...
        let psi = psi_weights(&[1.0], &[-0.4], 4);
        assert_relative_eq!(psi[1], 0.6, epsilon = 1e-12);
        assert_relative_eq!(psi[3], 0.6, epsilon = 1e-12);
    }

    #[test]
    fn combined_lags_multiply_polynomials() {
        // (1 - 0.5B)(1 - B) = 1 - 1.5B + 0.5B^2
        let lags = combine_lags(&[0.5], &[1.0]);
        assert_relative_eq!(lags[0], 1.5, epsilon = 1e-12);
        assert_relative_eq!(lags[1], -0.5, epsilon = 1e-12);
    }
}
