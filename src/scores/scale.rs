//! Ordinal score scale.
//!
//! Analysts pick one of `L` labels; label `j` maps to `j · 10 / (L − 1)` on the
//! 0..=10 axis. Scores arriving from the API are snapped onto those steps so
//! that stray values (sliders, old label sets) land on a valid label.

use crate::domain::{Submission, SCORE_MAX};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreScale {
    steps: usize,
}

impl ScoreScale {
    /// Scale for `label_count` labels. Fewer than two labels only clamps.
    pub fn new(label_count: usize) -> Self {
        Self { steps: label_count }
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Clamp into 0..=10 and snap to the nearest label step.
    ///
    /// Non-finite scores become `None`.
    pub fn quantize(&self, score: f64) -> Option<f64> {
        if !score.is_finite() {
            return None;
        }
        let clamped = score.clamp(0.0, SCORE_MAX);
        if self.steps < 2 {
            return Some(clamped);
        }
        let step = SCORE_MAX / (self.steps - 1) as f64;
        let snapped = ((clamped / step).round() * step).min(SCORE_MAX);
        Some(snapped)
    }

    /// Quantize every score of every submission in place.
    pub fn apply(&self, submissions: &mut [Submission]) {
        for submission in submissions {
            for answer in &mut submission.answers {
                for score in &mut answer.scores {
                    *score = score.and_then(|s| self.quantize(s));
                }
            }
        }
    }
}
