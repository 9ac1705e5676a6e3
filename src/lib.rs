//! `race-forecast` library crate.
//!
//! The binary (`race`) is a thin wrapper around this library so that:
//!
//! - the forecast core is testable without spawning processes
//! - collaborators (HTTP API, synthetic data) can be swapped behind one trait
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod math;
pub mod models;
pub mod report;
pub mod scores;

pub use app::pipeline::{ForecastRequest, compute_forecast_stack};
pub use error::ForecastError;
