//! Export forecasts to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts:
//! one `method,period,value` row per forecast point, methods in output order.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::domain::ForecastResult;
use crate::error::ForecastError;

/// Write forecasts to a CSV file in long format.
pub fn write_results_csv(path: &Path, results: &[ForecastResult]) -> Result<(), ForecastError> {
    let file = File::create(path).map_err(|e| {
        ForecastError::Config(format!("Failed to create export CSV '{}': {e}", path.display()))
    })?;
    let mut out = BufWriter::new(file);

    writeln!(out, "method,period,value")?;
    for result in results {
        for (period, value) in &result.by_period {
            writeln!(out, "{},{},{:.4}", result.method.wire_name(), period, value)?;
        }
    }
    out.flush()?;

    Ok(())
}
