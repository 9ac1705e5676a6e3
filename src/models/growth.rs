//! Score-driven compounding growth forecast.
//!
//! The historical series gives an average period-over-period growth rate. Each
//! future period applies a fraction of that rate, scaled by its averaged
//! survey score on the 0..=10 scale, compounding from the last actual:
//!
//! ```text
//! growth_k   = avg_growth · score_k / 10
//! forecast_k = forecast_{k-1} · (1 + growth_k),   forecast_0 = last_actual
//! ```

use serde::{Deserialize, Serialize};

use crate::domain::SCORE_MAX;

/// One projected period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrowthStep {
    /// 1-based offset from the last actual.
    pub period_offset: usize,
    /// Growth applied in this period, in percent.
    pub growth_pct: f64,
    pub forecast_value: f64,
}

/// Last finite value, scanning backward; 0 when there is none.
pub fn last_actual(historical: &[f64]) -> f64 {
    historical
        .iter()
        .rev()
        .copied()
        .find(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Mean relative change across adjacent pairs.
///
/// Pairs with a zero previous value or a non-finite member are skipped; with
/// no valid pair the result is 0.
pub fn average_growth(historical: &[f64]) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for pair in historical.windows(2) {
        let (prev, cur) = (pair[0], pair[1]);
        if prev == 0.0 || !prev.is_finite() || !cur.is_finite() {
            continue;
        }
        sum += (cur - prev) / prev;
        count += 1;
    }
    if count == 0 { 0.0 } else { sum / count as f64 }
}

/// Compound the historical growth rate forward, one step per score.
///
/// Returns exactly `period_scores.len()` steps, or nothing when the history
/// has fewer than two entries. Contraction is allowed to go negative.
pub fn forecast_from_scores(historical: &[f64], period_scores: &[f64]) -> Vec<GrowthStep> {
    if historical.len() < 2 || period_scores.is_empty() {
        return Vec::new();
    }

    let avg_growth = average_growth(historical);
    let mut previous = last_actual(historical);

    period_scores
        .iter()
        .enumerate()
        .map(|(i, &score)| {
            let period_growth = avg_growth * (score / SCORE_MAX);
            let forecast_value = previous * (1.0 + period_growth);
            previous = forecast_value;
            GrowthStep {
                period_offset: i + 1,
                growth_pct: period_growth * 100.0,
                forecast_value,
            }
        })
        .collect()
}
