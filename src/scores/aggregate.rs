//! Reduce many analyst submissions to one averaged score per period.
//!
//! Per submission and period `i`:
//!
//! ```text
//! value_i = Σ_pos score_i·weight − Σ_neg score_i·weight
//! ```
//!
//! A skipped answer contributes nothing to any period, and a missing score
//! contributes 0. The consensus for period `i` is the mean of `value_i` over
//! every submission with at least one non-skipped answer to a known question.
//! A submission with no such answer stays out of the denominator. With no
//! counted submission every period is 0.

use std::collections::HashMap;

use crate::domain::{DriverQuestion, MonthKey, Polarity, Submission};

/// Averaged scores plus how many submissions fed each period.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateSummary {
    /// One value per period, rounded to 2 decimals.
    pub values: Vec<f64>,
    /// Counted submissions per period.
    pub contributors: Vec<usize>,
}

impl AggregateSummary {
    /// True when no submission contributed to any period.
    pub fn is_silent(&self) -> bool {
        self.contributors.iter().all(|&c| c == 0)
    }
}

/// Average score per period, aligned to `periods`.
pub fn aggregate(
    submissions: &[Submission],
    questions: &[DriverQuestion],
    periods: &[MonthKey],
) -> Vec<f64> {
    aggregate_with_summary(submissions, questions, periods).values
}

/// Same as [`aggregate`], also reporting contributor counts.
pub fn aggregate_with_summary(
    submissions: &[Submission],
    questions: &[DriverQuestion],
    periods: &[MonthKey],
) -> AggregateSummary {
    let n_periods = periods.len();
    let by_id: HashMap<u64, &DriverQuestion> = questions.iter().map(|q| (q.id, q)).collect();

    let mut totals = vec![0.0; n_periods];
    let mut contributors = vec![0usize; n_periods];

    for submission in submissions {
        let mut sums = vec![0.0; n_periods];
        let mut answered = false;

        for answer in submission.answers.iter().filter(|a| !a.skipped) {
            let Some(question) = by_id.get(&answer.question_id) else {
                continue;
            };
            let sign = match question.polarity {
                Polarity::Positive => 1.0,
                Polarity::Negative => -1.0,
            };
            let weight = question.effective_weight();
            answered = true;

            for (i, score) in answer.scores.iter().take(n_periods).enumerate() {
                if let Some(score) = score.filter(|s| s.is_finite()) {
                    sums[i] += sign * score * weight;
                }
            }
        }

        if !answered {
            continue;
        }
        for i in 0..n_periods {
            totals[i] += sums[i];
            contributors[i] += 1;
        }
    }

    let values = totals
        .iter()
        .zip(&contributors)
        .map(|(&total, &count)| {
            if count == 0 {
                0.0
            } else {
                round2(total / count as f64)
            }
        })
        .collect();

    AggregateSummary {
        values,
        contributors,
    }
}

fn round2(v: f64) -> f64 {
    // `+ 0.0` folds -0.0 into 0.0 so output never prints "-0.00".
    (v * 100.0).round() / 100.0 + 0.0
}
