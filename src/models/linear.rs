//! Trend-linear forecast: OLS over the historical index, extrapolated forward.

use std::collections::BTreeMap;

use crate::domain::MonthKey;
use crate::math::fit_line;

/// Project `future` periods from a least-squares trend over `historical`.
///
/// `historical` must already be gap-free and in chronological order. Future
/// offset `k` (1-based) is evaluated at index `n + k`, continuing the
/// historical index. Fewer than two points yields an empty map.
pub fn forecast_linear(historical: &[f64], future: &[MonthKey]) -> BTreeMap<MonthKey, f64> {
    let Some(fit) = fit_line(historical) else {
        return BTreeMap::new();
    };

    future
        .iter()
        .enumerate()
        .map(|(i, &period)| {
            let x = (fit.n + i + 1) as f64;
            (period, fit.predict(x))
        })
        .collect()
}
