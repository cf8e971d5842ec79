//! Sampling frequency and the timestamp grid a series lives on.

use crate::error::{ForecastError, Result};
use chrono::{DateTime, Datelike, Duration, Months, Utc};

/// Spacing between consecutive observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    /// Clock spacing (hourly, daily, weekly, ...).
    Fixed(Duration),
    /// Calendar spacing in whole months (monthly = 1, quarterly = 3, yearly = 12).
    Months(u32),
}

impl Frequency {
    pub fn hourly() -> Self {
        Self::Fixed(Duration::hours(1))
    }

    pub fn daily() -> Self {
        Self::Fixed(Duration::days(1))
    }

    pub fn weekly() -> Self {
        Self::Fixed(Duration::weeks(1))
    }

    pub fn monthly() -> Self {
        Self::Months(1)
    }

    pub fn quarterly() -> Self {
        Self::Months(3)
    }

    pub fn yearly() -> Self {
        Self::Months(12)
    }

    /// Timestamp `steps` periods after `origin`.
    ///
    /// Calendar steps are always taken from the origin so month-end anchors
    /// survive short months (Jan 31 -> Feb 29 -> Mar 31).
    pub fn at(&self, origin: DateTime<Utc>, steps: usize) -> Option<DateTime<Utc>> {
        match *self {
            Frequency::Fixed(step) => {
                let steps = i32::try_from(steps).ok()?;
                origin.checked_add_signed(step.checked_mul(steps)?)
            }
            Frequency::Months(n) => {
                let months = n.checked_mul(u32::try_from(steps).ok()?)?;
                origin.checked_add_months(Months::new(months))
            }
        }
    }

    /// Check that `timestamps` sit exactly on this frequency's grid.
    pub fn conforms(&self, timestamps: &[DateTime<Utc>]) -> bool {
        let Some(&origin) = timestamps.first() else {
            return true;
        };
        if let Frequency::Fixed(step) = *self {
            if step <= Duration::zero() {
                return false;
            }
        }
        if *self == Frequency::Months(0) {
            return false;
        }
        timestamps
            .iter()
            .enumerate()
            .all(|(i, ts)| self.at(origin, i) == Some(*ts))
    }

    /// Infer the frequency of a regular series.
    ///
    /// Calendar-month spacing is preferred when both interpretations fit, so a
    /// two-point series on the first of consecutive months is monthly rather
    /// than "every 31 days".
    pub fn infer(timestamps: &[DateTime<Utc>]) -> Result<Frequency> {
        if timestamps.len() < 2 {
            return Err(ForecastError::InsufficientData {
                needed: 2,
                got: timestamps.len(),
            });
        }

        let months = month_index(&timestamps[1]) - month_index(&timestamps[0]);
        if months > 0 {
            let candidate = Frequency::Months(months as u32);
            if candidate.conforms(timestamps) {
                return Ok(candidate);
            }
        }

        let candidate = Frequency::Fixed(timestamps[1] - timestamps[0]);
        if candidate.conforms(timestamps) {
            return Ok(candidate);
        }

        Err(ForecastError::TimestampError(
            "timestamps are not regularly spaced".to_string(),
        ))
    }
}

fn month_index(ts: &DateTime<Utc>) -> i64 {
    ts.year() as i64 * 12 + ts.month0() as i64
}

/// Position of a series on its frequency grid.
///
/// `offset` is the grid index of the series' first observation. Derived
/// series (slices, differences) keep the origin of the series they came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    pub origin: DateTime<Utc>,
    pub offset: usize,
    pub frequency: Frequency,
}

impl Grid {
    pub fn new(origin: DateTime<Utc>, frequency: Frequency) -> Self {
        Self {
            origin,
            offset: 0,
            frequency,
        }
    }

    /// Same grid, shifted so that index 0 is `by` observations later.
    pub fn shifted(&self, by: usize) -> Self {
        Self {
            offset: self.offset + by,
            ..*self
        }
    }

    /// Timestamp of the observation at `index` relative to this grid's offset.
    pub fn timestamp(&self, index: usize) -> Result<DateTime<Utc>> {
        self.frequency
            .at(self.origin, self.offset + index)
            .ok_or_else(|| {
                ForecastError::TimestampError(format!("timestamp {} is out of range", index))
            })
    }
}

/// The extent of a training series: what a fitted model needs to stamp its
/// forecasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesSpan {
    grid: Option<Grid>,
    len: usize,
}

impl SeriesSpan {
    pub fn new(grid: Option<Grid>, len: usize) -> Self {
        Self { grid, len }
    }

    /// Number of observations in the span.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the span is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Grid the span lives on, if its frequency is known.
    pub fn grid(&self) -> Option<Grid> {
        self.grid
    }

    /// Timestamp of the last observation.
    pub fn end(&self) -> Option<DateTime<Utc>> {
        let grid = self.grid?;
        self.len.checked_sub(1).and_then(|i| grid.timestamp(i).ok())
    }

    /// The `horizon` timestamps immediately following the span.
    pub fn following(&self, horizon: usize) -> Result<Vec<DateTime<Utc>>> {
        let grid = self.grid.ok_or_else(|| {
            ForecastError::TimestampError("series frequency is unknown".to_string())
        })?;
        (0..horizon).map(|k| grid.timestamp(self.len + k)).collect()
    }
}
