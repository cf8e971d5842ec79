//! Core data structures for time series forecasting.

mod forecast;
mod frequency;
mod time_series;

pub use forecast::{ForecastPoint, ForecastResult};
pub use frequency::{Frequency, Grid, SeriesSpan};
pub use time_series::{TimeSeries, TimeSeriesBuilder};
