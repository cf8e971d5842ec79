//! Accuracy metrics for forecast evaluation.

use crate::core::{ForecastResult, TimeSeries};
use crate::error::{ForecastError, Result};

/// Accuracy metrics for evaluating forecast performance.
#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    /// Mean Absolute Error
    pub mae: f64,
    /// Mean Squared Error
    pub mse: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Percentage Error (None if zeros in actual)
    pub mape: Option<f64>,
    /// Symmetric Mean Absolute Percentage Error
    pub smape: f64,
}

/// Scores forecasts against held-out observations.
///
/// Series are compared point by point; both must cover exactly the same
/// timestamps.
#[derive(Debug, Clone, Copy, Default)]
pub struct Evaluator;

impl Evaluator {
    pub fn new() -> Self {
        Self
    }

    /// Compare an actual series with a forecast series on the same timestamps.
    pub fn evaluate(&self, actual: &TimeSeries, forecast: &TimeSeries) -> Result<Metrics> {
        check_alignment(actual.timestamps(), forecast.timestamps())?;
        calculate_metrics(actual.values(), forecast.values())
    }

    /// Compare an actual series with the point predictions of a forecast.
    pub fn evaluate_forecast(
        &self,
        actual: &TimeSeries,
        forecast: &ForecastResult,
    ) -> Result<Metrics> {
        check_alignment(actual.timestamps(), &forecast.timestamps())?;
        calculate_metrics(actual.values(), &forecast.values())
    }
}

fn check_alignment<T: PartialEq>(actual: &[T], forecast: &[T]) -> Result<()> {
    if actual.is_empty() || forecast.is_empty() {
        return Err(ForecastError::EmptyInput);
    }
    if actual.len() != forecast.len() {
        return Err(ForecastError::LengthMismatch {
            expected: actual.len(),
            got: forecast.len(),
        });
    }
    match actual.iter().zip(forecast).position(|(a, f)| a != f) {
        Some(index) => Err(ForecastError::MisalignedTimestamps { index }),
        None => Ok(()),
    }
}

/// Score point predictions against actual values.
///
/// MAPE is `None` when any actual value is zero. SMAPE terms where both
/// values are zero count as no error.
pub fn calculate_metrics(actual: &[f64], predicted: &[f64]) -> Result<Metrics> {
    if actual.is_empty() || predicted.is_empty() {
        return Err(ForecastError::EmptyInput);
    }
    if actual.len() != predicted.len() {
        return Err(ForecastError::LengthMismatch {
            expected: actual.len(),
            got: predicted.len(),
        });
    }

    let mut abs_sum = 0.0;
    let mut sq_sum = 0.0;
    let mut pct_sum = Some(0.0);
    let mut sym_sum = 0.0;
    for (&a, &p) in actual.iter().zip(predicted) {
        let error = a - p;
        abs_sum += error.abs();
        sq_sum += error * error;
        pct_sum = pct_sum.filter(|_| a != 0.0).map(|sum| sum + (error / a).abs());
        let scale = a.abs() + p.abs();
        if scale > 0.0 {
            sym_sum += 2.0 * error.abs() / scale;
        }
    }

    let n = actual.len() as f64;
    let mse = sq_sum / n;
    Ok(Metrics {
        mae: abs_sum / n,
        mse,
        rmse: mse.sqrt(),
        mape: pct_sum.map(|sum| 100.0 * sum / n),
        smape: 100.0 * sym_sum / n,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{TimeZone, Utc};

    fn monthly(values: Vec<f64>) -> TimeSeries {
        TimeSeries::monthly(Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(), values).unwrap()
    }

    #[test]
    fn calculate_metrics_perfect_prediction() {
        let actual = vec![1.0, 2.0, 3.0, 4.0, 5.0];

        let metrics = calculate_metrics(&actual, &actual).unwrap();

        assert_relative_eq!(metrics.mae, 0.0, epsilon = 1e-10);
        assert_relative_eq!(metrics.mse, 0.0, epsilon = 1e-10);
        assert_relative_eq!(metrics.rmse, 0.0, epsilon = 1e-10);
        assert_relative_eq!(metrics.smape, 0.0, epsilon = 1e-10);
        assert_eq!(metrics.mape, Some(0.0));
    }

    #[test]
    fn calculate_metrics_known_values() {
        let actual = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let predicted = vec![1.5, 2.5, 2.5, 4.5, 4.5];
        // Errors: 0.5, 0.5, 0.5, 0.5, 0.5

        let metrics = calculate_metrics(&actual, &predicted).unwrap();

        assert_relative_eq!(metrics.mae, 0.5, epsilon = 1e-10);
        assert_relative_eq!(metrics.mse, 0.25, epsilon = 1e-10);
        assert_relative_eq!(metrics.rmse, 0.5, epsilon = 1e-10);
    }

    #[test]
    fn mae_and_mse_weigh_errors_differently() {
        // Errors: 0, 0, 3
        let metrics = calculate_metrics(&[1.0, 2.0, 3.0], &[1.0, 2.0, 6.0]).unwrap();

        assert_relative_eq!(metrics.mae, 1.0, epsilon = 1e-10);
        assert_relative_eq!(metrics.mse, 3.0, epsilon = 1e-10);
        assert_relative_eq!(metrics.mape.unwrap(), 100.0 / 3.0, epsilon = 1e-10);
    }

    #[test]
    fn calculate_metrics_mape_with_zeros() {
        let actual = vec![0.0, 1.0, 2.0];
        let predicted = vec![0.1, 1.1, 2.1];

        let metrics = calculate_metrics(&actual, &predicted).unwrap();

        assert!(metrics.mape.is_none());
        assert!(metrics.smape.is_finite());
    }

    #[test]
    fn calculate_metrics_dimension_mismatch() {
        let result = calculate_metrics(&[1.0, 2.0, 3.0], &[1.0, 2.0]);
        assert!(matches!(
            result,
            Err(ForecastError::LengthMismatch {
                expected: 3,
                got: 2
            })
        ));
    }

    #[test]
    fn calculate_metrics_empty_data() {
        let result = calculate_metrics(&[], &[]);
        assert!(matches!(result, Err(ForecastError::EmptyInput)));
    }

    #[test]
    fn evaluate_identical_series_is_zero() {
        let series = monthly(vec![10.0, 12.0, 11.0, 13.0]);

        let metrics = Evaluator::new().evaluate(&series, &series).unwrap();

        assert_eq!(metrics.mae, 0.0);
        assert_eq!(metrics.mse, 0.0);
    }

    #[test]
    fn evaluate_rejects_length_mismatch() {
        let actual = monthly(vec![1.0, 2.0, 3.0]);
        let forecast = monthly(vec![1.0, 2.0]);

        assert!(matches!(
            Evaluator::new().evaluate(&actual, &forecast),
            Err(ForecastError::LengthMismatch {
                expected: 3,
                got: 2
            })
        ));
    }

    #[test]
    fn evaluate_rejects_misaligned_timestamps() {
        let actual = monthly(vec![1.0, 2.0, 3.0]);
        let forecast = TimeSeries::monthly(
            Utc.with_ymd_and_hms(2023, 2, 1, 0, 0, 0).unwrap(),
            vec![1.0, 2.0, 3.0],
        )
        .unwrap();

        assert!(matches!(
            Evaluator::new().evaluate(&actual, &forecast),
            Err(ForecastError::MisalignedTimestamps { index: 0 })
        ));
    }

    #[test]
    fn evaluate_forecast_uses_point_predictions() {
        let actual = monthly(vec![10.0, 20.0]);
        let forecast = ForecastResult::new(
            actual.timestamps().to_vec(),
            vec![11.0, 18.0],
            vec![0.0, 0.0],
            vec![30.0, 30.0],
            0.95,
        )
        .unwrap();

        let metrics = Evaluator::new()
            .evaluate_forecast(&actual, &forecast)
            .unwrap();

        assert_relative_eq!(metrics.mae, 1.5, epsilon = 1e-10);
        assert_relative_eq!(metrics.mse, 2.5, epsilon = 1e-10);
    }

    #[test]
    fn smape_of_symmetric_errors() {
        // |a - p| / ((|a| + |p|) / 2) = 2/3 and 2/5
        let metrics = calculate_metrics(&[1.0, 2.0], &[2.0, 3.0]).unwrap();
        assert_relative_eq!(metrics.smape, 100.0 * (2.0 / 3.0 + 2.0 / 5.0) / 2.0, epsilon = 1e-10);

        let zeros = calculate_metrics(&[0.0, 0.0], &[0.0, 0.0]).unwrap();
        assert_eq!(zeros.smape, 0.0);
        assert!(zeros.mape.is_none());
    }
}
