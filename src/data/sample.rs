//! Synthetic report data for offline runs.
//!
//! Everything is derived from a seed so repeated runs (and repeated fetches
//! within one run) see identical data. Each fetch builds its own RNG from the
//! seed plus a purpose tag, so concurrent fetches never share state.

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::data::ReportSource;
use crate::domain::{
    Answer, DriverQuestion, ForecastMethod, HistoricalPoint, MAX_HORIZON, MonthKey, Polarity,
    ReportConfig, SCORE_MAX, ScoreSettings, Submission,
};
use crate::error::ForecastError;

/// Months of history generated before (and including) the base month.
const HISTORY_MONTHS: i32 = 36;
/// Starting level of the synthetic volume series.
const BASE_LEVEL: f64 = 12_000.0;
/// Month-over-month drift of the synthetic series.
const MONTHLY_DRIFT: f64 = 0.008;
/// Relative noise of each monthly observation.
const NOISE_REL: f64 = 0.03;
/// Share of historical months reported as missing.
const GAP_PROB: f64 = 0.04;
/// Chance an analyst skips a question.
const SKIP_PROB: f64 = 0.1;

const SCORE_LABELS: [&str; 5] = ["Very low", "Low", "Neutral", "High", "Very high"];

/// (text, weight, polarity, typical score)
const QUESTIONS: [(&str, f64, Polarity, f64); 6] = [
    ("Consumer demand for new vehicles", 1.0, Polarity::Positive, 6.5),
    ("Availability of financing", 0.8, Polarity::Positive, 5.5),
    ("Model launches in the category", 0.6, Polarity::Positive, 7.0),
    ("Fuel and energy prices", 0.7, Polarity::Negative, 4.0),
    ("Supply chain disruption", 0.9, Polarity::Negative, 3.5),
    ("Regulatory pressure", 0.4, Polarity::Negative, 3.0),
];

#[derive(Debug, Clone)]
pub struct SampleSource {
    seed: u64,
    submissions: usize,
    /// Month the synthetic AI curve starts after.
    anchor: MonthKey,
}

impl SampleSource {
    pub fn new(seed: u64, submissions: usize, anchor: MonthKey) -> Self {
        Self {
            seed,
            submissions,
            anchor,
        }
    }

    fn rng(&self, purpose: &str, key: impl Hash) -> StdRng {
        let mut hasher = DefaultHasher::new();
        self.seed.hash(&mut hasher);
        purpose.hash(&mut hasher);
        key.hash(&mut hasher);
        StdRng::seed_from_u64(hasher.finish())
    }

    fn questions(graph_id: u64) -> Vec<DriverQuestion> {
        QUESTIONS
            .iter()
            .enumerate()
            .map(|(i, (text, weight, polarity, _))| DriverQuestion {
                id: graph_id * 100 + i as u64 + 1,
                text: text.to_string(),
                weight: *weight,
                polarity: *polarity,
            })
            .collect()
    }

    fn all_submissions(
        &self,
        graph_id: u64,
        base_month: MonthKey,
        periods: usize,
    ) -> Result<Vec<Submission>, ForecastError> {
        let mut rng = self.rng("submissions", (graph_id, base_month));
        let noise = Normal::new(0.0, 1.5)
            .map_err(|e| ForecastError::Config(format!("Score distribution error: {e}")))?;
        let questions = Self::questions(graph_id);

        let mut out = Vec::with_capacity(self.submissions);
        for i in 0..self.submissions {
            // Each analyst leans optimistic or pessimistic by a fixed amount.
            let bias: f64 = rng.gen_range(-1.5..=1.5);
            let answers = questions
                .iter()
                .zip(QUESTIONS.iter())
                .map(|(q, (_, _, _, typical))| {
                    let skipped = rng.gen_bool(SKIP_PROB);
                    let scores = (0..periods)
                        .map(|_| {
                            let s = typical + bias + rng.sample(noise);
                            Some(s.clamp(0.0, SCORE_MAX))
                        })
                        .collect();
                    Answer {
                        question_id: q.id,
                        scores,
                        skipped,
                    }
                })
                .collect();
            out.push(Submission {
                id: i as u64 + 1,
                user_id: format!("analyst-{}", i % 4 + 1),
                answers,
            });
        }
        Ok(out)
    }
}

impl ReportSource for SampleSource {
    fn fetch_submissions(
        &self,
        graph_id: u64,
        base_month: MonthKey,
        user_id: Option<&str>,
    ) -> Result<Vec<Submission>, ForecastError> {
        // The score axis is the horizon after the base month; cover the
        // longest horizon the CLI accepts.
        let mut subs = self.all_submissions(graph_id, base_month, MAX_HORIZON)?;
        if let Some(user) = user_id {
            subs.retain(|s| s.user_id == user);
        }
        Ok(subs)
    }

    fn fetch_questions(&self, graph_id: u64) -> Result<Vec<DriverQuestion>, ForecastError> {
        Ok(Self::questions(graph_id))
    }

    fn fetch_score_settings(
        &self,
        base_month: MonthKey,
        horizon: usize,
    ) -> Result<ScoreSettings, ForecastError> {
        Ok(ScoreSettings {
            year_names: base_month.following(horizon),
            score_labels: SCORE_LABELS.iter().map(|s| s.to_string()).collect(),
        })
    }

    fn fetch_report_config(&self, graph_id: u64) -> Result<ReportConfig, ForecastError> {
        let enabled: BTreeSet<ForecastMethod> = ForecastMethod::ALL.into_iter().collect();
        let mut rng = self.rng("ai", graph_id);
        let bias: f64 = rng.gen_range(0.97..1.03);

        // Continues the synthetic series' trend past the anchor month.
        let ai: BTreeMap<String, f64> = self
            .anchor
            .following(12)
            .into_iter()
            .zip(HISTORY_MONTHS..)
            .map(|(period, t)| {
                let level = BASE_LEVEL * (1.0 + MONTHLY_DRIFT).powi(t) * bias;
                (period.to_string(), level.round())
            })
            .collect();

        Ok(ReportConfig {
            enabled,
            ai: Some(serde_json::to_value(ai)?),
            curated_insight: None,
        })
    }

    fn fetch_historical_series(
        &self,
        category: &str,
        base_month: MonthKey,
        horizon: usize,
    ) -> Result<Vec<HistoricalPoint>, ForecastError> {
        let mut rng = self.rng("series", (category, base_month));
        let noise = Normal::new(0.0, NOISE_REL)
            .map_err(|e| ForecastError::Config(format!("Noise distribution error: {e}")))?;

        let future = base_month.following(horizon);
        let mut points = Vec::with_capacity(HISTORY_MONTHS as usize + future.len());
        for t in 0..HISTORY_MONTHS {
            let trend = BASE_LEVEL * (1.0 + MONTHLY_DRIFT).powi(t);
            let value = if rng.gen_bool(GAP_PROB) {
                None
            } else {
                Some((trend * (1.0 + rng.sample(noise))).round())
            };
            // History is clipped at year 0000.
            if let Some(period) = base_month.add_months(t - (HISTORY_MONTHS - 1)) {
                points.push(HistoricalPoint { period, value });
            }
        }
        for period in future {
            points.push(HistoricalPoint { period, value: None });
        }
        Ok(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> MonthKey {
        "2025-06".parse().unwrap()
    }

    #[test]
    fn series_is_deterministic_and_spans_horizon() {
        let src = SampleSource::new(7, 10, base());
        let a = src.fetch_historical_series("SUV", base(), 6).unwrap();
        let b = src.fetch_historical_series("SUV", base(), 6).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 36 + 6);
        assert_eq!(a[35].period, base());
        assert!(a[36..].iter().all(|p| p.value.is_none()));
        assert!(a[..36].iter().filter(|p| p.value.is_some()).count() >= 2);
    }

    #[test]
    fn user_submissions_are_a_subset_of_all() {
        let src = SampleSource::new(7, 10, base());
        let all = src.fetch_submissions(3, base(), None).unwrap();
        let mine = src.fetch_submissions(3, base(), Some("analyst-2")).unwrap();
        assert_eq!(all.len(), 10);
        assert!(!mine.is_empty());
        assert!(mine.iter().all(|s| all.contains(s)));
        assert!(src.fetch_submissions(3, base(), Some("nobody")).unwrap().is_empty());
    }

    #[test]
    fn scores_stay_on_scale_and_reference_questions() {
        let src = SampleSource::new(1, 5, base());
        let questions = src.fetch_questions(2).unwrap();
        let ids: BTreeSet<u64> = questions.iter().map(|q| q.id).collect();
        for s in src.fetch_submissions(2, base(), None).unwrap() {
            for a in &s.answers {
                assert!(ids.contains(&a.question_id));
                assert!(a.scores.iter().flatten().all(|v| (0.0..=SCORE_MAX).contains(v)));
            }
        }
    }

    #[test]
    fn submissions_cover_the_longest_horizon() {
        let src = SampleSource::new(3, 4, base());
        for s in src.fetch_submissions(1, base(), None).unwrap() {
            assert!(s.answers.iter().all(|a| a.scores.len() == MAX_HORIZON));
        }
    }

    #[test]
    fn series_near_the_calendar_edges_stays_valid() {
        let src = SampleSource::new(7, 1, base());
        let late: MonthKey = "9999-10".parse().unwrap();
        let points = src.fetch_historical_series("SUV", late, 6).unwrap();
        assert_eq!(points.len(), 36 + 2);
        assert_eq!(points.last().unwrap().period.to_string(), "9999-12");

        let early: MonthKey = "0001-06".parse().unwrap();
        let points = src.fetch_historical_series("SUV", early, 0).unwrap();
        assert_eq!(points.len(), 18);
        assert_eq!(points[0].period.to_string(), "0000-01");
    }

    #[test]
    fn config_enables_every_method() {
        let cfg = SampleSource::new(1, 1, base()).fetch_report_config(9).unwrap();
        assert_eq!(cfg.enabled.len(), ForecastMethod::ALL.len());
        let ai = cfg.ai.unwrap();
        let first = ai.as_object().unwrap().keys().next().unwrap().clone();
        assert_eq!(first, "2025-07");
    }
}
