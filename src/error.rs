//! Error type shared by the pipeline, collaborators and CLI.
//!
//! Math-level edge cases (short history, no submissions) never produce an
//! error; they degrade to empty or zero results. Only boundary validation and
//! infrastructure failures end up here.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ForecastError {
    /// A period string failed the `YYYY-MM` check.
    #[error("Invalid period key '{value}': expected YYYY-MM")]
    InvalidPeriodKey { value: String },

    /// Fewer historical points than a trend needs.
    #[error("Insufficient history: need at least {required} points, got {actual}")]
    InsufficientHistory { required: usize, actual: usize },

    /// One or more collaborator fetches failed. The whole run is discarded.
    #[error("Upstream fetch failed: {}", .failures.join("; "))]
    UpstreamFetch { failures: Vec<String> },

    /// Bad CLI flags or environment.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ForecastError {
    pub fn upstream(failure: impl Into<String>) -> Self {
        Self::UpstreamFetch {
            failures: vec![failure.into()],
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) | Self::Io(_) | Self::Json(_) => 2,
            Self::InvalidPeriodKey { .. } | Self::InsufficientHistory { .. } => 3,
            Self::UpstreamFetch { .. } => 4,
        }
    }
}

pub type Result<T> = std::result::Result<T, ForecastError>;
