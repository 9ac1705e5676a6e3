//! Read/write forecast stack JSON files.
//!
//! Stack JSON is the "portable" representation of one run:
//! - request metadata (report, category, base month, horizon)
//! - one entry per enabled method, including pass-through payloads
//!
//! The schema is defined by `domain::StackFile`.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use chrono::Utc;

use crate::app::pipeline::RunOutput;
use crate::domain::StackFile;
use crate::error::ForecastError;

pub const TOOL_NAME: &str = "race";

/// Snapshot a run as a `StackFile`.
pub fn stack_file(run: &RunOutput) -> StackFile {
    StackFile {
        tool: TOOL_NAME.to_string(),
        generated_at: Utc::now().to_rfc3339(),
        graph_id: run.request.graph_id,
        category: run.request.category.clone(),
        base_month: run.request.base_month,
        horizon: run.request.horizon,
        results: run.stack.results.clone(),
    }
}

/// Write a stack JSON file.
pub fn write_stack_json(path: &Path, stack: &StackFile) -> Result<(), ForecastError> {
    let file = File::create(path).map_err(|e| {
        ForecastError::Config(format!("Failed to create stack JSON '{}': {e}", path.display()))
    })?;
    serde_json::to_writer_pretty(BufWriter::new(file), stack)?;
    Ok(())
}

/// Read a stack JSON file.
pub fn read_stack_json(path: &Path) -> Result<StackFile, ForecastError> {
    let file = File::open(path).map_err(|e| {
        ForecastError::Config(format!("Failed to open stack JSON '{}': {e}", path.display()))
    })?;
    let stack: StackFile = serde_json::from_reader(BufReader::new(file))?;
    Ok(stack)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ForecastMethod, ForecastResult, MonthKey};
    use serde_json::json;

    #[test]
    fn stack_survives_a_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stack.json");

        let mut score = ForecastResult::empty(ForecastMethod::Score);
        score.by_period.insert("2025-01".parse::<MonthKey>().unwrap(), 101.5);
        let ai = ForecastResult {
            method: ForecastMethod::Ai,
            by_period: Default::default(),
            raw: Some(json!({"model": "external"})),
        };
        let stack = StackFile {
            tool: TOOL_NAME.to_string(),
            generated_at: "2025-01-31T00:00:00+00:00".to_string(),
            graph_id: 4,
            category: "Pickup".to_string(),
            base_month: "2024-12".parse().unwrap(),
            horizon: 6,
            results: vec![score, ai],
        };

        write_stack_json(&path, &stack).unwrap();
        let back = read_stack_json(&path).unwrap();
        assert_eq!(back, stack);

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"2025-01\": 101.5"));
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = read_stack_json(Path::new("/definitely/not/here.json")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
