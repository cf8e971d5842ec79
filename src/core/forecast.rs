//! Forecast result structure for holding predictions.

use crate::core::TimeSeries;
use crate::error::{ForecastError, Result};
use chrono::{DateTime, Utc};

/// One forecast step: point prediction and interval bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Point forecasts with confidence intervals, one entry per step of the
/// horizon, contiguous with the end of the training series.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastResult {
    points: Vec<ForecastPoint>,
    level: f64,
}

impl ForecastResult {
    /// Assemble a forecast from parallel columns.
    pub fn new(
        timestamps: Vec<DateTime<Utc>>,
        values: Vec<f64>,
        lower: Vec<f64>,
        upper: Vec<f64>,
        level: f64,
    ) -> Result<Self> {
        let n = timestamps.len();
        for len in [values.len(), lower.len(), upper.len()] {
            if len != n {
                return Err(ForecastError::LengthMismatch {
                    expected: n,
                    got: len,
                });
            }
        }

        let points = timestamps
            .into_iter()
            .zip(values)
            .zip(lower.into_iter().zip(upper))
            .map(|((timestamp, value), (lower, upper))| ForecastPoint {
                timestamp,
                value,
                lower,
                upper,
            })
            .collect();

        Ok(Self { points, level })
    }

    /// Get the forecast horizon (number of steps).
    pub fn horizon(&self) -> usize {
        self.points.len()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Confidence level of the interval bounds.
    pub fn level(&self) -> f64 {
        self.level
    }

    pub fn points(&self) -> &[ForecastPoint] {
        &self.points
    }

    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.points.iter().map(|p| p.timestamp).collect()
    }

    /// Point predictions.
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn lower(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.lower).collect()
    }

    pub fn upper(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.upper).collect()
    }

    /// Point predictions as a series on the forecast timestamps.
    pub fn to_series(&self) -> Result<TimeSeries> {
        TimeSeries::new(self.timestamps(), self.values())
    }
}
