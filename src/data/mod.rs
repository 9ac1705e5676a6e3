//! Data-fetch collaborators.
//!
//! The forecast core never talks to storage directly. Everything it needs is
//! pulled through [`ReportSource`], which is implemented by:
//!
//! - [`HttpSource`]: the RACE API (questions, submissions, score settings, ...)
//! - [`SampleSource`]: deterministic synthetic data for offline runs

pub mod http;
pub mod sample;

pub use http::HttpSource;
pub use sample::SampleSource;

use crate::domain::{DriverQuestion, HistoricalPoint, MonthKey, ReportConfig, ScoreSettings, Submission};
use crate::error::ForecastError;

/// Everything the forecast stack fetches for one request.
///
/// Implementations must be safe to call from several threads at once; the
/// orchestrator issues the fetches concurrently.
pub trait ReportSource: Sync {
    /// Submissions for a report and base month, optionally only one user's.
    fn fetch_submissions(
        &self,
        graph_id: u64,
        base_month: MonthKey,
        user_id: Option<&str>,
    ) -> Result<Vec<Submission>, ForecastError>;

    fn fetch_questions(&self, graph_id: u64) -> Result<Vec<DriverQuestion>, ForecastError>;

    /// Score axis (`year_names`) and label scale.
    fn fetch_score_settings(
        &self,
        base_month: MonthKey,
        horizon: usize,
    ) -> Result<ScoreSettings, ForecastError>;

    /// Enabled methods and pre-computed AI / curated values.
    fn fetch_report_config(&self, graph_id: u64) -> Result<ReportConfig, ForecastError>;

    fn fetch_historical_series(
        &self,
        category: &str,
        base_month: MonthKey,
        horizon: usize,
    ) -> Result<Vec<HistoricalPoint>, ForecastError>;
}
