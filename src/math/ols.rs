//! Ordinary least squares for a single regressor.
//!
//! The trend forecaster only ever regresses a series on its own index, so we
//! solve the two-parameter problem in closed form:
//!
//! ```text
//! slope     = (nΣxy − ΣxΣy) / (nΣx² − (Σx)²)
//! intercept = (Σy − slope·Σx) / n
//! ```
//!
//! With x = 1..n the sums are exact for integer-valued inputs, which keeps a
//! perfectly linear history projecting to exact values.

/// A fitted line `y = intercept + slope·x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineFit {
    pub slope: f64,
    pub intercept: f64,
    /// Number of observations used.
    pub n: usize,
}

impl LineFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// Fit `ys` against the index sequence `1..=ys.len()`.
///
/// Returns `None` for fewer than two points or a degenerate denominator.
pub fn fit_line(ys: &[f64]) -> Option<LineFit> {
    let n = ys.len();
    if n < 2 {
        return None;
    }

    let nf = n as f64;
    let (mut sx, mut sy, mut sxy, mut sxx) = (0.0, 0.0, 0.0, 0.0);
    for (i, &y) in ys.iter().enumerate() {
        let x = (i + 1) as f64;
        sx += x;
        sy += y;
        sxy += x * y;
        sxx += x * x;
    }

    let denom = nf * sxx - sx * sx;
    if denom == 0.0 || !denom.is_finite() {
        return None;
    }

    let slope = (nf * sxy - sx * sy) / denom;
    let intercept = (sy - slope * sx) / nf;
    if !(slope.is_finite() && intercept.is_finite()) {
        return None;
    }

    Some(LineFit { slope, intercept, n })
}
