//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - decoded straight from collaborator JSON
//! - passed through the pure forecasting functions
//! - exported to JSON/CSV and reloaded by `race show`

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::MonthKey;

/// Number of future periods projected when the caller does not say otherwise.
pub const DEFAULT_HORIZON: usize = 6;

/// Longest horizon the CLI accepts (ten years of months).
pub const MAX_HORIZON: usize = 120;

/// Upper bound of the ordinal analyst score scale.
pub const SCORE_MAX: f64 = 10.0;

/// One observed actual for a series (e.g. a category's monthly sales).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalPoint {
    pub period: MonthKey,
    pub value: Option<f64>,
}

/// Whether a question pushes the forecast up (driver) or down (barrier).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Positive,
    Negative,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverQuestion {
    pub id: u64,
    pub text: String,
    pub weight: f64,
    pub polarity: Polarity,
}

impl DriverQuestion {
    /// Weight used in aggregation. Negative or non-finite weights count as 0.
    pub fn effective_weight(&self) -> f64 {
        if self.weight.is_finite() && self.weight > 0.0 {
            self.weight
        } else {
            0.0
        }
    }
}

/// One question's answer inside a submission.
///
/// `scores[i]` is the score for period index `i` on the score axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub question_id: u64,
    #[serde(default)]
    pub scores: Vec<Option<f64>>,
    #[serde(default)]
    pub skipped: bool,
}

/// One analyst's full response for a report/category/base month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: u64,
    pub user_id: String,
    pub answers: Vec<Answer>,
}

/// The competing forecast curves. Declaration order is the output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ForecastMethod {
    #[serde(rename = "linear")]
    Linear,
    #[serde(rename = "score")]
    Score,
    #[serde(rename = "byof")]
    BuildYourOwnForecast,
    #[serde(rename = "ai")]
    Ai,
    #[serde(rename = "curated_insight")]
    CuratedInsight,
}

impl ForecastMethod {
    pub const ALL: [ForecastMethod; 5] = [
        ForecastMethod::Linear,
        ForecastMethod::Score,
        ForecastMethod::BuildYourOwnForecast,
        ForecastMethod::Ai,
        ForecastMethod::CuratedInsight,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            ForecastMethod::Linear => "Linear",
            ForecastMethod::Score => "Score",
            ForecastMethod::BuildYourOwnForecast => "Build Your Own",
            ForecastMethod::Ai => "AI",
            ForecastMethod::CuratedInsight => "Curated Insight",
        }
    }

    pub fn wire_name(self) -> &'static str {
        match self {
            ForecastMethod::Linear => "linear",
            ForecastMethod::Score => "score",
            ForecastMethod::BuildYourOwnForecast => "byof",
            ForecastMethod::Ai => "ai",
            ForecastMethod::CuratedInsight => "curated_insight",
        }
    }
}

/// Per-report forecast configuration as served by the report collaborator.
///
/// `ai` and `curated_insight` are opaque blobs computed elsewhere.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportConfig {
    #[serde(default)]
    pub enabled: BTreeSet<ForecastMethod>,
    #[serde(default)]
    pub ai: Option<Value>,
    #[serde(default)]
    pub curated_insight: Option<Value>,
}

/// Score axis and label scale for a base month.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSettings {
    /// Periods the score-based forecasts are laid out on.
    pub year_names: Vec<MonthKey>,
    /// Ordinal labels of the 0..=10 scale (e.g. "Very low" .. "Very high").
    #[serde(default)]
    pub score_labels: Vec<String>,
}

/// One forecast curve.
///
/// Disabled methods are absent from the output; enabled methods with nothing
/// to show carry an empty `by_period`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub method: ForecastMethod,
    pub by_period: BTreeMap<MonthKey, f64>,
    /// Opaque pass-through payload (AI / curated insight only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<Value>,
}

impl ForecastResult {
    pub fn empty(method: ForecastMethod) -> Self {
        Self {
            method,
            by_period: BTreeMap::new(),
            raw: None,
        }
    }
}

/// Which collaborator implementation backs a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// The RACE HTTP API (`RACE_API_URL`).
    Http,
    /// Deterministic synthetic data; no network.
    Sample,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub graph_id: u64,
    pub category: String,
    pub base_month: MonthKey,
    pub horizon: usize,
    pub user_id: Option<String>,

    pub source: SourceKind,
    /// Seed for `SourceKind::Sample`.
    pub sample_seed: u64,
    /// Number of synthetic submissions for `SourceKind::Sample`.
    pub sample_submissions: usize,

    pub export_csv: Option<PathBuf>,
    pub export_json: Option<PathBuf>,
}

/// A saved forecast stack (JSON).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackFile {
    pub tool: String,
    pub generated_at: String,
    pub graph_id: u64,
    pub category: String,
    pub base_month: MonthKey,
    pub horizon: usize,
    pub results: Vec<ForecastResult>,
}
