//! TimeSeries data structure for representing temporal data.

use crate::core::frequency::{Frequency, Grid, SeriesSpan};
use crate::error::{ForecastError, Result};
use chrono::{DateTime, Utc};

/// A univariate time series with strictly increasing, regularly spaced
/// timestamps.
///
/// Every transform (slice, split, difference) returns a new series; a
/// `TimeSeries` is never mutated after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    timestamps: Vec<DateTime<Utc>>,
    values: Vec<f64>,
    grid: Option<Grid>,
    name: Option<String>,
}

/// Builder for constructing TimeSeries.
#[derive(Debug, Clone, Default)]
pub struct TimeSeriesBuilder {
    timestamps: Vec<DateTime<Utc>>,
    values: Vec<f64>,
    frequency: Option<Frequency>,
    name: Option<String>,
}

impl TimeSeriesBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timestamps(mut self, timestamps: Vec<DateTime<Utc>>) -> Self {
        self.timestamps = timestamps;
        self
    }

    pub fn values(mut self, values: Vec<f64>) -> Self {
        self.values = values;
        self
    }

    /// Declare the frequency instead of inferring it from the timestamps.
    pub fn frequency(mut self, frequency: Frequency) -> Self {
        self.frequency = Some(frequency);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn build(self) -> Result<TimeSeries> {
        let mut series = TimeSeries::create(self.timestamps, self.values, self.frequency)?;
        series.name = self.name;
        Ok(series)
    }
}

impl TimeSeries {
    /// Create a series, inferring the frequency from the timestamps.
    ///
    /// Series with fewer than two points carry no frequency and cannot be
    /// extended into the future; use [`TimeSeries::with_frequency`] for those.
    pub fn new(timestamps: Vec<DateTime<Utc>>, values: Vec<f64>) -> Result<Self> {
        Self::create(timestamps, values, None)
    }

    /// Create a series with a declared frequency.
    pub fn with_frequency(
        timestamps: Vec<DateTime<Utc>>,
        values: Vec<f64>,
        frequency: Frequency,
    ) -> Result<Self> {
        Self::create(timestamps, values, Some(frequency))
    }

    /// Create a regular series of `values` starting at `start`.
    pub fn regular(start: DateTime<Utc>, frequency: Frequency, values: Vec<f64>) -> Result<Self> {
        let grid = Grid::new(start, frequency);
        let timestamps = (0..values.len())
            .map(|i| grid.timestamp(i))
            .collect::<Result<Vec<_>>>()?;
        Self::create(timestamps, values, Some(frequency))
    }

    /// Create a monthly series of `values` starting at `start`.
    pub fn monthly(start: DateTime<Utc>, values: Vec<f64>) -> Result<Self> {
        Self::regular(start, Frequency::monthly(), values)
    }

    pub fn builder() -> TimeSeriesBuilder {
        TimeSeriesBuilder::new()
    }

    fn create(
        timestamps: Vec<DateTime<Utc>>,
        values: Vec<f64>,
        frequency: Option<Frequency>,
    ) -> Result<Self> {
        if timestamps.len() != values.len() {
            return Err(ForecastError::LengthMismatch {
                expected: timestamps.len(),
                got: values.len(),
            });
        }

        // Validate timestamps are strictly increasing
        for i in 1..timestamps.len() {
            if timestamps[i] <= timestamps[i - 1] {
                return Err(ForecastError::TimestampError(
                    "timestamps must be strictly increasing".to_string(),
                ));
            }
        }

        if values.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::MissingValues);
        }

        let frequency = match frequency {
            Some(freq) => {
                if !freq.conforms(&timestamps) {
                    return Err(ForecastError::TimestampError(format!(
                        "timestamps do not follow the declared frequency {:?}",
                        freq
                    )));
                }
                Some(freq)
            }
            None if timestamps.len() >= 2 => Some(Frequency::infer(&timestamps)?),
            None => None,
        };

        let grid = match (frequency, timestamps.first()) {
            (Some(freq), Some(&origin)) => Some(Grid::new(origin, freq)),
            _ => None,
        };

        Ok(Self {
            timestamps,
            values,
            grid,
            name: None,
        })
    }

    /// Get the number of observations.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Check if the series is empty.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Get timestamps.
    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    /// Get values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Iterate over (timestamp, value) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (DateTime<Utc>, f64)> + '_ {
        self.timestamps.iter().copied().zip(self.values.iter().copied())
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn frequency(&self) -> Option<Frequency> {
        self.grid.map(|g| g.frequency)
    }

    pub fn first_timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamps.first().copied()
    }

    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamps.last().copied()
    }

    /// The extent of this series, used to stamp forecasts that follow it.
    pub fn span(&self) -> SeriesSpan {
        SeriesSpan::new(self.grid, self.len())
    }

    /// The `horizon` timestamps following the last observation.
    pub fn future_timestamps(&self, horizon: usize) -> Result<Vec<DateTime<Utc>>> {
        self.span().following(horizon)
    }

    /// Extract a slice of the time series.
    pub fn slice(&self, start: usize, end: usize) -> Result<TimeSeries> {
        if start > end {
            return Err(ForecastError::InvalidParameter(
                "start must be <= end".to_string(),
            ));
        }
        if end > self.len() {
            return Err(ForecastError::InsufficientData {
                needed: end,
                got: self.len(),
            });
        }

        Ok(self.derive(
            self.timestamps[start..end].to_vec(),
            self.values[start..end].to_vec(),
            start,
        ))
    }

    /// Split into a training head and a test tail.
    ///
    /// The split index is `floor(len * fraction)`; train is `[0, split)` and
    /// test is `[split, len)`.
    pub fn split(&self, fraction: f64) -> Result<(TimeSeries, TimeSeries)> {
        if !(fraction > 0.0 && fraction < 1.0) {
            return Err(ForecastError::InvalidFraction(fraction));
        }

        let split = (self.len() as f64 * fraction).floor() as usize;
        if split == 0 || split >= self.len() {
            return Err(ForecastError::InvalidFraction(fraction));
        }

        Ok((self.slice(0, split)?, self.slice(split, self.len())?))
    }

    /// Difference the series `order` times.
    ///
    /// Each pass drops the first observation; the difference `v[i+1] - v[i]`
    /// is stamped with the later timestamp. Order 0 returns a copy.
    pub fn difference(&self, order: usize) -> TimeSeries {
        self.lagged_difference(order, 1)
    }

    /// Seasonally difference the series `order` times at `period`.
    pub fn seasonal_difference(&self, order: usize, period: usize) -> TimeSeries {
        if period == 0 {
            return self.clone();
        }
        self.lagged_difference(order, period)
    }

    fn lagged_difference(&self, order: usize, lag: usize) -> TimeSeries {
        let dropped = (order * lag).min(self.len());
        let mut values = self.values.clone();
        for _ in 0..order {
            if values.len() <= lag {
                values.clear();
                break;
            }
            values = values
                .iter()
                .skip(lag)
                .zip(values.iter())
                .map(|(curr, prev)| curr - prev)
                .collect();
        }

        self.derive(self.timestamps[dropped..].to_vec(), values, dropped)
    }

    fn derive(&self, timestamps: Vec<DateTime<Utc>>, values: Vec<f64>, shift: usize) -> TimeSeries {
        TimeSeries {
            timestamps,
            values,
            grid: self.grid.map(|g| g.shifted(shift)),
            name: self.name.clone(),
        }
    }
}
