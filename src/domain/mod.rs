//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - month keys and the historical/future split (`MonthKey`, `PeriodWindow`)
//! - survey inputs (`DriverQuestion`, `Submission`, `ScoreSettings`)
//! - forecast outputs (`ForecastMethod`, `ForecastResult`, `StackFile`)

pub mod period;
pub mod types;

pub use period::*;
pub use types::*;
