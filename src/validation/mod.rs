//! Statistical validation of series and fitted models.
//!
//! Provides the Augmented Dickey-Fuller stationarity test used to pick the
//! differencing order and the Ljung-Box test for residual autocorrelation.
//!
//! # Example
//!
//! ```
//! use stockcast::validation::{ljung_box, StationarityTester};
//!
//! let series: Vec<f64> = (0..100).map(|i| 10.0 + ((i * 13) % 7) as f64).collect();
//! let report = StationarityTester::new().test_values(&series).unwrap();
//! println!("ADF statistic {:.3}, p = {:.3}", report.statistic, report.p_value);
//!
//! let residuals = vec![0.1, -0.2, 0.15, -0.1, 0.05, -0.08, 0.12, -0.15, 0.1, -0.05];
//! if ljung_box(&residuals, Some(5), 0).unwrap().is_white_noise(0.05) {
//!     println!("Residuals pass Ljung-Box test");
//! }
//! ```

pub mod residual_tests;
pub mod stationarity;

pub use residual_tests::{ljung_box, LjungBoxResult};
pub use stationarity::{
    adf_test, mackinnon_p_value, CriticalValues, DifferencingAnalysis, LagSelection,
    StationarityConfig, StationarityReport, StationarityTester,
};
