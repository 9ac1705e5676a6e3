//! RACE API integration (questions, submissions, score settings, report config, volumes).

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::data::ReportSource;
use crate::domain::{
    DriverQuestion, HistoricalPoint, MonthKey, ReportConfig, ScoreSettings, Submission,
};
use crate::error::ForecastError;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub struct HttpSource {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>, token: Option<String>, timeout: Duration) -> Result<Self, ForecastError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ForecastError::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Build from `RACE_API_URL`, `RACE_API_TOKEN` and `RACE_HTTP_TIMEOUT_SECS` (`.env` honored).
    pub fn from_env() -> Result<Self, ForecastError> {
        dotenvy::dotenv().ok();
        let base_url = std::env::var("RACE_API_URL")
            .map_err(|_| ForecastError::Config("Missing RACE_API_URL in environment (.env).".to_string()))?;
        let token = std::env::var("RACE_API_TOKEN").ok().filter(|t| !t.is_empty());
        let timeout_secs = match std::env::var("RACE_HTTP_TIMEOUT_SECS") {
            Ok(raw) => raw.trim().parse::<u64>().map_err(|e| {
                ForecastError::Config(format!("Invalid RACE_HTTP_TIMEOUT_SECS '{raw}': {e}"))
            })?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };
        Self::new(base_url, token, Duration::from_secs(timeout_secs))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        what: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ForecastError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(what, %url, "fetching");

        let mut req = self.client.get(&url).query(query);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        let resp = req
            .send()
            .map_err(|e| ForecastError::upstream(format!("{what} request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(ForecastError::upstream(format!(
                "{what} request failed with status {}",
                resp.status()
            )));
        }

        resp.json()
            .map_err(|e| ForecastError::upstream(format!("Failed to parse {what} response: {e}")))
    }
}

impl ReportSource for HttpSource {
    fn fetch_submissions(
        &self,
        graph_id: u64,
        base_month: MonthKey,
        user_id: Option<&str>,
    ) -> Result<Vec<Submission>, ForecastError> {
        let mut query = vec![
            ("graphId", graph_id.to_string()),
            ("baseMonth", base_month.to_string()),
        ];
        if let Some(user) = user_id {
            query.push(("userId", user.to_string()));
        }
        let body: SubmissionsResponse = self.get_json("submissions", "/api/submissions", &query)?;
        Ok(body.submissions)
    }

    fn fetch_questions(&self, graph_id: u64) -> Result<Vec<DriverQuestion>, ForecastError> {
        let body: QuestionsResponse =
            self.get_json("questions", "/api/questions", &[("graphId", graph_id.to_string())])?;
        Ok(body.questions)
    }

    fn fetch_score_settings(
        &self,
        base_month: MonthKey,
        horizon: usize,
    ) -> Result<ScoreSettings, ForecastError> {
        let body: ScoreSettingsResponse = self.get_json(
            "score settings",
            "/api/score-settings",
            &[
                ("baseMonth", base_month.to_string()),
                ("horizon", horizon.to_string()),
            ],
        )?;
        body.into_settings()
    }

    fn fetch_report_config(&self, graph_id: u64) -> Result<ReportConfig, ForecastError> {
        self.get_json(
            "report config",
            &format!("/api/graphs/{graph_id}/forecast-config"),
            &[],
        )
    }

    fn fetch_historical_series(
        &self,
        category: &str,
        base_month: MonthKey,
        horizon: usize,
    ) -> Result<Vec<HistoricalPoint>, ForecastError> {
        let body: VolumeResponse = self.get_json(
            "volume data",
            "/api/volume-data",
            &[
                ("category", category.to_string()),
                ("baseMonth", base_month.to_string()),
                ("horizon", horizon.to_string()),
            ],
        )?;
        body.into_points()
    }
}

#[derive(Debug, Deserialize)]
struct SubmissionsResponse {
    submissions: Vec<Submission>,
}

#[derive(Debug, Deserialize)]
struct QuestionsResponse {
    questions: Vec<DriverQuestion>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScoreSettingsResponse {
    year_names: Vec<String>,
    #[serde(default)]
    score_labels: Vec<String>,
}

impl ScoreSettingsResponse {
    fn into_settings(self) -> Result<ScoreSettings, ForecastError> {
        let year_names = self
            .year_names
            .iter()
            .map(|s| s.trim().parse::<MonthKey>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ScoreSettings {
            year_names,
            score_labels: self.score_labels,
        })
    }
}

#[derive(Debug, Deserialize)]
struct VolumeResponse {
    data: Vec<VolumeRow>,
}

#[derive(Debug, Deserialize)]
struct VolumeRow {
    month: String,
    #[serde(default)]
    value: Value,
}

impl VolumeResponse {
    fn into_points(self) -> Result<Vec<HistoricalPoint>, ForecastError> {
        self.data
            .into_iter()
            .map(|row| -> Result<HistoricalPoint, ForecastError> {
                Ok(HistoricalPoint {
                    period: row.month.trim().parse()?,
                    value: parse_value(&row.value),
                })
            })
            .collect()
    }
}

/// Volumes come back as numbers, numeric strings, or null.
fn parse_value(raw: &Value) -> Option<f64> {
    let v = match raw {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok()?
        }
        _ => return None,
    };
    if v.is_finite() { Some(v) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_value_accepts_numbers_and_numeric_strings() {
        assert_eq!(parse_value(&json!(1250)), Some(1250.0));
        assert_eq!(parse_value(&json!(" 98.5 ")), Some(98.5));
        assert_eq!(parse_value(&json!("")), None);
        assert_eq!(parse_value(&json!("n/a")), None);
        assert_eq!(parse_value(&json!(null)), None);
        assert_eq!(parse_value(&json!("NaN")), None);
    }

    #[test]
    fn volume_rows_reject_bad_months() {
        let body: VolumeResponse = serde_json::from_value(json!({
            "data": [
                {"month": "2024-01", "value": "10"},
                {"month": "2024-02"},
            ]
        }))
        .unwrap();
        let points = body.into_points().unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].value, Some(10.0));
        assert_eq!(points[1].value, None);

        let bad: VolumeResponse = serde_json::from_value(json!({
            "data": [{"month": "Jan 2024", "value": 1}]
        }))
        .unwrap();
        let err = bad.into_points().unwrap_err();
        assert!(matches!(err, ForecastError::InvalidPeriodKey { .. }));
    }

    #[test]
    fn score_settings_parse_year_names() {
        let body: ScoreSettingsResponse = serde_json::from_value(json!({
            "yearNames": ["2025-01", "2025-02"],
            "scoreLabels": ["Low", "Medium", "High"]
        }))
        .unwrap();
        let settings = body.into_settings().unwrap();
        assert_eq!(settings.year_names.len(), 2);
        assert_eq!(settings.score_labels.len(), 3);
    }

    #[test]
    fn submissions_decode_from_wire_shape() {
        let body: SubmissionsResponse = serde_json::from_value(json!({
            "submissions": [{
                "id": 7,
                "userId": "u-1",
                "answers": [
                    {"questionId": 1, "scores": [5, null, 7.5]},
                    {"questionId": 2, "skipped": true}
                ]
            }]
        }))
        .unwrap();
        let s = &body.submissions[0];
        assert_eq!(s.user_id, "u-1");
        assert_eq!(s.answers[0].scores, vec![Some(5.0), None, Some(7.5)]);
        assert!(s.answers[1].skipped);
        assert!(s.answers[1].scores.is_empty());
    }

    #[test]
    fn base_url_is_normalized() {
        let src = HttpSource::new("http://localhost:3000/", None, Duration::from_secs(1)).unwrap();
        assert_eq!(src.base_url(), "http://localhost:3000");
    }
}
