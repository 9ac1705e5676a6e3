//! Shared "forecast stack" logic used by every CLI command.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! concurrent fetch -> partition -> aggregate scores -> forecast per method -> merge
//!
//! The commands can then focus on presentation (tables vs exports).

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::data::ReportSource;
use crate::domain::{
    DEFAULT_HORIZON, DriverQuestion, ForecastMethod, ForecastResult, HistoricalPoint, MonthKey,
    PeriodWindow, ReportConfig, RunConfig, ScoreSettings, Submission,
};
use crate::error::ForecastError;
use crate::models::{forecast_from_scores, forecast_linear};
use crate::scores::{AggregateSummary, ScoreScale, aggregate_with_summary};

/// Minimum history a trend needs before it is worth reporting on.
const MIN_HISTORY: usize = 2;

/// One forecast-stack request.
#[derive(Debug, Clone)]
pub struct ForecastRequest {
    pub graph_id: u64,
    pub category: String,
    pub base_month: MonthKey,
    pub horizon: usize,
    pub historical_series: Vec<HistoricalPoint>,
    pub user_id: Option<String>,
}

impl ForecastRequest {
    pub fn new(graph_id: u64, category: impl Into<String>, base_month: MonthKey) -> Self {
        Self {
            graph_id,
            category: category.into(),
            base_month,
            horizon: DEFAULT_HORIZON,
            historical_series: Vec::new(),
            user_id: None,
        }
    }
}

/// Everything fetched for one request, all-or-nothing.
#[derive(Debug, Clone)]
struct Inputs {
    config: ReportConfig,
    questions: Vec<DriverQuestion>,
    settings: ScoreSettings,
    submissions: Vec<Submission>,
    user_submissions: Vec<Submission>,
}

/// Full result of a stack computation, including the intermediates the
/// reports show.
#[derive(Debug, Clone)]
pub struct StackOutput {
    pub results: Vec<ForecastResult>,
    pub window: PeriodWindow,
    pub year_names: Vec<MonthKey>,
    pub consensus: AggregateSummary,
    pub personal: AggregateSummary,
    pub submissions: usize,
    pub user_submissions: usize,
}

/// All computed outputs of a single `race forecast` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub request: ForecastRequest,
    pub stack: StackOutput,
    /// Non-fatal conditions worth showing next to the numbers.
    pub notes: Vec<String>,
}

/// Compute one result per enabled forecast method.
pub fn compute_forecast_stack(
    request: &ForecastRequest,
    source: &impl ReportSource,
) -> Result<Vec<ForecastResult>, ForecastError> {
    compute_stack_detailed(request, source).map(|out| out.results)
}

/// Same as [`compute_forecast_stack`], keeping the intermediates.
pub fn compute_stack_detailed(
    request: &ForecastRequest,
    source: &impl ReportSource,
) -> Result<StackOutput, ForecastError> {
    // 1) Partition the supplied series around the base month.
    let window = PeriodWindow::split(&request.historical_series, request.base_month, request.horizon);
    let historical = window.historical_values();
    debug!(
        historical = historical.len(),
        future = window.future.len(),
        "partitioned series"
    );

    // 2) Fetch everything else concurrently; any failure aborts the run.
    let mut inputs = fetch_inputs(request, source)?;

    // Snap raw scores onto the configured label scale.
    let scale = ScoreScale::new(inputs.settings.score_labels.len());
    scale.apply(&mut inputs.submissions);
    scale.apply(&mut inputs.user_submissions);

    // 3) Method gating.
    let enabled = enabled_methods(&inputs.config);

    // 4) Aggregate survey scores on the label axis.
    let year_names = inputs.settings.year_names.clone();
    let consensus = aggregate_with_summary(&inputs.submissions, &inputs.questions, &year_names);
    let personal = aggregate_with_summary(&inputs.user_submissions, &inputs.questions, &year_names);

    // 5) One result per enabled method, canonical order.
    let mut results = Vec::with_capacity(enabled.len());
    for method in enabled {
        let result = match method {
            // Unreachable while `enabled_methods` drops Linear; kept so lifting
            // that rule needs no other change.
            ForecastMethod::Linear => ForecastResult {
                method,
                by_period: forecast_linear(&historical, &window.future),
                raw: None,
            },
            ForecastMethod::Score => score_result(method, &historical, &consensus, &year_names),
            ForecastMethod::BuildYourOwnForecast => {
                score_result(method, &historical, &personal, &year_names)
            }
            ForecastMethod::Ai => passthrough_result(method, inputs.config.ai.as_ref()),
            ForecastMethod::CuratedInsight => {
                passthrough_result(method, inputs.config.curated_insight.as_ref())
            }
        };
        debug!(method = method.wire_name(), points = result.by_period.len(), "method computed");
        results.push(result);
    }

    Ok(StackOutput {
        results,
        window,
        year_names,
        consensus,
        personal,
        submissions: inputs.submissions.len(),
        user_submissions: inputs.user_submissions.len(),
    })
}

/// Execute the full run: fetch the series, then compute the stack.
pub fn run_forecast(config: &RunConfig, source: &impl ReportSource) -> Result<RunOutput, ForecastError> {
    info!(
        graph_id = config.graph_id,
        category = %config.category,
        base_month = %config.base_month,
        horizon = config.horizon,
        "forecast run"
    );

    let historical_series =
        source.fetch_historical_series(&config.category, config.base_month, config.horizon)?;

    let request = ForecastRequest {
        graph_id: config.graph_id,
        category: config.category.clone(),
        base_month: config.base_month,
        horizon: config.horizon,
        historical_series,
        user_id: config.user_id.clone(),
    };

    let stack = compute_stack_detailed(&request, source)?;

    let mut notes = Vec::new();
    if let Err(err) = stack.window.ensure_history(MIN_HISTORY) {
        warn!(%err, "trend-based methods will be empty");
        notes.push(err.to_string());
    }
    if stack.consensus.is_silent() {
        notes.push("No survey submissions contributed to the score axis.".to_string());
    }
    if request.user_id.is_some() && stack.user_submissions == 0 {
        notes.push("The requesting user has no submissions for this report.".to_string());
    }

    Ok(RunOutput {
        request,
        stack,
        notes,
    })
}

/// Enabled set from configuration, minus `Linear`.
///
/// `Linear` is switched off for this flow as a product decision, whatever the
/// report configuration says.
pub fn enabled_methods(config: &ReportConfig) -> BTreeSet<ForecastMethod> {
    let mut enabled = config.enabled.clone();
    if enabled.remove(&ForecastMethod::Linear) {
        debug!("linear method requested by configuration; force-disabled");
    }
    enabled
}

fn fetch_inputs(request: &ForecastRequest, source: &impl ReportSource) -> Result<Inputs, ForecastError> {
    let graph_id = request.graph_id;
    let base = request.base_month;

    let ((config, questions), ((settings, submissions), user_submissions)) = rayon::join(
        || {
            rayon::join(
                || source.fetch_report_config(graph_id),
                || source.fetch_questions(graph_id),
            )
        },
        || {
            rayon::join(
                || {
                    rayon::join(
                        || source.fetch_score_settings(base, request.horizon),
                        || source.fetch_submissions(graph_id, base, None),
                    )
                },
                || match request.user_id.as_deref() {
                    Some(user) => source.fetch_submissions(graph_id, base, Some(user)),
                    None => Ok(Vec::new()),
                },
            )
        },
    );

    let mut failures = Failures::default();
    let config = failures.collect("report config", config);
    let questions = failures.collect("questions", questions);
    let settings = failures.collect("score settings", settings);
    let submissions = failures.collect("submissions", submissions);
    let user_submissions = failures.collect("user submissions", user_submissions);

    // Malformed periods are bad data, not an outage.
    if let Some(err) = failures.invalid {
        warn!(%err, "collaborator returned a malformed period");
        return Err(err);
    }
    let failures = failures.upstream;

    match (config, questions, settings, submissions, user_submissions) {
        (Some(config), Some(questions), Some(settings), Some(submissions), Some(user_submissions))
            if failures.is_empty() =>
        {
            Ok(Inputs {
                config,
                questions,
                settings,
                submissions,
                user_submissions,
            })
        }
        _ => {
            warn!(failed = failures.len(), "forecast inputs incomplete");
            Err(ForecastError::UpstreamFetch { failures })
        }
    }
}

/// Fetch errors gathered across the concurrent fetches.
#[derive(Debug, Default)]
struct Failures {
    upstream: Vec<String>,
    /// First malformed period seen; it outranks upstream failures.
    invalid: Option<ForecastError>,
}

impl Failures {
    fn collect<T>(&mut self, what: &str, result: Result<T, ForecastError>) -> Option<T> {
        match result {
            Ok(v) => Some(v),
            Err(ForecastError::UpstreamFetch { failures }) => {
                self.upstream
                    .extend(failures.into_iter().map(|f| format!("{what}: {f}")));
                None
            }
            Err(err @ ForecastError::InvalidPeriodKey { .. }) => {
                self.invalid.get_or_insert(err);
                None
            }
            Err(other) => {
                self.upstream.push(format!("{what}: {other}"));
                None
            }
        }
    }
}

fn score_result(
    method: ForecastMethod,
    historical: &[f64],
    summary: &AggregateSummary,
    year_names: &[MonthKey],
) -> ForecastResult {
    if summary.is_silent() {
        return ForecastResult::empty(method);
    }
    let by_period = forecast_from_scores(historical, &summary.values)
        .into_iter()
        .filter_map(|step| {
            year_names
                .get(step.period_offset - 1)
                .map(|&period| (period, step.forecast_value))
        })
        .collect();
    ForecastResult {
        method,
        by_period,
        raw: None,
    }
}

/// Keep the blob as-is and expose any month→number pairs it carries.
///
/// Understood shapes: `{"YYYY-MM": n, ...}` and
/// `[{"period"|"month": "YYYY-MM", "value": n}, ...]`. Anything else is kept
/// only in `raw`.
fn passthrough_result(method: ForecastMethod, blob: Option<&Value>) -> ForecastResult {
    let Some(blob) = blob.filter(|v| !v.is_null()) else {
        return ForecastResult::empty(method);
    };

    let mut by_period = BTreeMap::new();
    match blob {
        Value::Object(map) => {
            for (key, value) in map {
                if let (Ok(period), Some(v)) = (key.parse::<MonthKey>(), value.as_f64()) {
                    by_period.insert(period, v);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                let period = item
                    .get("period")
                    .or_else(|| item.get("month"))
                    .and_then(Value::as_str)
                    .and_then(|s| s.parse::<MonthKey>().ok());
                let value = item.get("value").and_then(Value::as_f64);
                if let (Some(period), Some(v)) = (period, value) {
                    by_period.insert(period, v);
                }
            }
        }
        _ => {}
    }

    ForecastResult {
        method,
        by_period,
        raw: Some(blob.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Answer, Polarity};
    use serde_json::json;

    fn mk(s: &str) -> MonthKey {
        s.parse().unwrap()
    }

    /// In-memory source with switchable failures.
    struct FakeSource {
        config: ReportConfig,
        questions: Vec<DriverQuestion>,
        settings: ScoreSettings,
        submissions: Vec<Submission>,
        series: Vec<HistoricalPoint>,
        fail_questions: bool,
        fail_config: bool,
        bad_year_name: Option<&'static str>,
    }

    impl ReportSource for FakeSource {
        fn fetch_submissions(
            &self,
            _graph_id: u64,
            _base_month: MonthKey,
            user_id: Option<&str>,
        ) -> Result<Vec<Submission>, ForecastError> {
            Ok(self
                .submissions
                .iter()
                .filter(|s| user_id.is_none_or(|u| s.user_id == u))
                .cloned()
                .collect())
        }

        fn fetch_questions(&self, _graph_id: u64) -> Result<Vec<DriverQuestion>, ForecastError> {
            if self.fail_questions {
                return Err(ForecastError::upstream("status 500"));
            }
            Ok(self.questions.clone())
        }

        fn fetch_score_settings(
            &self,
            _base_month: MonthKey,
            _horizon: usize,
        ) -> Result<ScoreSettings, ForecastError> {
            if let Some(raw) = self.bad_year_name {
                raw.parse::<MonthKey>()?;
            }
            Ok(self.settings.clone())
        }

        fn fetch_report_config(&self, _graph_id: u64) -> Result<ReportConfig, ForecastError> {
            if self.fail_config {
                return Err(ForecastError::upstream("timed out"));
            }
            Ok(self.config.clone())
        }

        fn fetch_historical_series(
            &self,
            _category: &str,
            _base_month: MonthKey,
            _horizon: usize,
        ) -> Result<Vec<HistoricalPoint>, ForecastError> {
            Ok(self.series.clone())
        }
    }

    fn series() -> Vec<HistoricalPoint> {
        vec![
            HistoricalPoint { period: mk("2024-01"), value: Some(100.0) },
            HistoricalPoint { period: mk("2024-02"), value: Some(110.0) },
            HistoricalPoint { period: mk("2024-03"), value: Some(121.0) },
            HistoricalPoint { period: mk("2024-04"), value: None },
            HistoricalPoint { period: mk("2024-05"), value: None },
        ]
    }

    fn submission(id: u64, user: &str, score: f64) -> Submission {
        Submission {
            id,
            user_id: user.to_string(),
            answers: vec![Answer {
                question_id: 1,
                scores: vec![Some(score), Some(score)],
                skipped: false,
            }],
        }
    }

    fn fake(enabled: &[ForecastMethod]) -> FakeSource {
        FakeSource {
            config: ReportConfig {
                enabled: enabled.iter().copied().collect(),
                ai: Some(json!({"2024-04": 130.0, "2024-05": 140.0, "notes": "v2"})),
                curated_insight: Some(json!([{"period": "2024-04", "value": 125}])),
            },
            questions: vec![DriverQuestion {
                id: 1,
                text: "Demand".to_string(),
                weight: 1.0,
                polarity: Polarity::Positive,
            }],
            settings: ScoreSettings {
                year_names: vec![mk("2024-04"), mk("2024-05")],
                score_labels: (0..11).map(|i| i.to_string()).collect(),
            },
            submissions: vec![submission(1, "ana", 10.0), submission(2, "ben", 10.0)],
            series: series(),
            fail_questions: false,
            fail_config: false,
            bad_year_name: None,
        }
    }

    fn request(user: Option<&str>) -> ForecastRequest {
        ForecastRequest {
            horizon: 6,
            historical_series: series(),
            user_id: user.map(str::to_string),
            ..ForecastRequest::new(1, "SUV", mk("2024-03"))
        }
    }

    fn methods(results: &[ForecastResult]) -> Vec<ForecastMethod> {
        results.iter().map(|r| r.method).collect()
    }

    #[test]
    fn linear_never_appears_even_when_enabled() {
        let src = fake(&ForecastMethod::ALL);
        let results = compute_forecast_stack(&request(Some("ana")), &src).unwrap();
        assert_eq!(
            methods(&results),
            vec![
                ForecastMethod::Score,
                ForecastMethod::BuildYourOwnForecast,
                ForecastMethod::Ai,
                ForecastMethod::CuratedInsight,
            ]
        );
    }

    #[test]
    fn score_method_continues_growth_on_label_axis() {
        let src = fake(&[ForecastMethod::Score]);
        let results = compute_forecast_stack(&request(None), &src).unwrap();
        let score = &results[0].by_period;
        assert_eq!(score.len(), 2);
        assert!((score[&mk("2024-04")] - 133.1).abs() < 1e-9);
        assert!((score[&mk("2024-05")] - 146.41).abs() < 1e-9);
    }

    #[test]
    fn byof_uses_only_the_users_submissions() {
        let mut src = fake(&[ForecastMethod::Score, ForecastMethod::BuildYourOwnForecast]);
        src.submissions = vec![submission(1, "ana", 0.0), submission(2, "ben", 10.0)];

        let results = compute_forecast_stack(&request(Some("ana")), &src).unwrap();
        // ana scored 0 -> flat at the last actual; consensus is 5 -> 5% steps.
        let byof = &results[1].by_period;
        assert_eq!(byof.values().copied().collect::<Vec<_>>(), vec![121.0, 121.0]);
        let score = &results[0].by_period;
        assert!((score[&mk("2024-04")] - 127.05).abs() < 1e-9);
    }

    #[test]
    fn byof_without_user_or_submissions_is_empty_not_error() {
        let src = fake(&[ForecastMethod::BuildYourOwnForecast]);
        let results = compute_forecast_stack(&request(None), &src).unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].by_period.is_empty());

        let results = compute_forecast_stack(&request(Some("zed")), &src).unwrap();
        assert!(results[0].by_period.is_empty());
    }

    #[test]
    fn passthrough_keeps_raw_and_extracts_months() {
        let src = fake(&[ForecastMethod::Ai, ForecastMethod::CuratedInsight]);
        let results = compute_forecast_stack(&request(None), &src).unwrap();

        let ai = &results[0];
        assert_eq!(ai.by_period.len(), 2);
        assert_eq!(ai.raw.as_ref().unwrap()["notes"], "v2");

        let curated = &results[1];
        assert_eq!(curated.by_period[&mk("2024-04")], 125.0);
    }

    #[test]
    fn enabled_method_without_data_still_appears() {
        let mut src = fake(&[ForecastMethod::Score, ForecastMethod::Ai]);
        src.submissions.clear();
        src.config.ai = None;
        let results = compute_forecast_stack(&request(None), &src).unwrap();
        assert_eq!(methods(&results), vec![ForecastMethod::Score, ForecastMethod::Ai]);
        assert!(results.iter().all(|r| r.by_period.is_empty()));
    }

    #[test]
    fn fetch_failures_are_reported_together() {
        let mut src = fake(&[ForecastMethod::Score]);
        src.fail_questions = true;
        src.fail_config = true;
        let err = compute_forecast_stack(&request(None), &src).unwrap_err();
        match err {
            ForecastError::UpstreamFetch { failures } => {
                assert_eq!(failures.len(), 2);
                assert!(failures.iter().any(|f| f.starts_with("questions:")));
                assert!(failures.iter().any(|f| f.starts_with("report config:")));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn malformed_year_name_is_a_data_error() {
        let mut src = fake(&[ForecastMethod::Score]);
        src.bad_year_name = Some("Jan 2025");
        let err = compute_forecast_stack(&request(None), &src).unwrap_err();
        assert!(matches!(
            err,
            ForecastError::InvalidPeriodKey { ref value } if value == "Jan 2025"
        ));
        assert_eq!(err.exit_code(), 3);

        // Still a data error when an upstream fetch fails alongside it.
        src.fail_questions = true;
        let err = compute_forecast_stack(&request(None), &src).unwrap_err();
        assert!(matches!(err, ForecastError::InvalidPeriodKey { .. }));
    }

    #[test]
    fn run_forecast_notes_short_history() {
        let mut src = fake(&[ForecastMethod::Score]);
        src.series = vec![HistoricalPoint { period: mk("2024-03"), value: Some(5.0) }];
        let config = RunConfig {
            graph_id: 1,
            category: "SUV".to_string(),
            base_month: mk("2024-03"),
            horizon: 6,
            user_id: None,
            source: crate::domain::SourceKind::Sample,
            sample_seed: 0,
            sample_submissions: 0,
            export_csv: None,
            export_json: None,
        };
        let run = run_forecast(&config, &src).unwrap();
        assert!(run.stack.results[0].by_period.is_empty());
        assert!(run.notes.iter().any(|n| n.contains("Insufficient history")));
    }
}
