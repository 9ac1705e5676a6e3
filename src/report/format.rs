//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the forecasting code stays clean and testable
//! - output changes are localized

use std::collections::BTreeSet;

use crate::app::pipeline::{RunOutput, StackOutput};
use crate::domain::{ForecastResult, MonthKey, StackFile};

const NO_DATA: &str = "no data available";

/// Format the run summary (request + inputs actually used).
pub fn format_run_summary(run: &RunOutput) -> String {
    let mut out = String::new();
    let req = &run.request;
    let stack = &run.stack;

    out.push_str("=== race - Forecast Stack ===\n");
    out.push_str(&format!("Report: {} | Category: {}\n", req.graph_id, req.category));
    out.push_str(&format!(
        "Base month: {} | Horizon: {}\n",
        req.base_month, req.horizon
    ));
    if let Some(user) = &req.user_id {
        out.push_str(&format!("User: {user}\n"));
    }

    let hist = &stack.window.historical;
    match (hist.first(), hist.last()) {
        (Some((first, _)), Some((last, value))) => out.push_str(&format!(
            "History: n={} | {first}..{last} | last actual={value:.2}\n",
            hist.len()
        )),
        _ => out.push_str("History: none\n"),
    }
    out.push_str(&format!(
        "Submissions: {} total | {} from user\n",
        stack.submissions, stack.user_submissions
    ));

    if !run.notes.is_empty() {
        out.push_str("\nNotes:\n");
        for note in &run.notes {
            out.push_str(&format!("- {note}\n"));
        }
    }
    out.push('\n');

    out
}

/// Format all results as one period-by-method table.
pub fn format_forecast_table(results: &[ForecastResult]) -> String {
    let mut out = String::new();
    if results.is_empty() {
        out.push_str("No forecast methods enabled for this report.\n");
        return out;
    }

    let periods: BTreeSet<MonthKey> = results
        .iter()
        .flat_map(|r| r.by_period.keys().copied())
        .collect();

    out.push_str(&format!("{:<8}", "Period"));
    for r in results {
        out.push_str(&format!(" {:>16}", r.method.display_name()));
    }
    out.push('\n');

    for period in &periods {
        out.push_str(&format!("{:<8}", period.to_string()));
        for r in results {
            let cell = r
                .by_period
                .get(period)
                .map(|v| format!("{v:.2}"))
                .unwrap_or_else(|| "-".to_string());
            out.push_str(&format!(" {cell:>16}"));
        }
        out.push('\n');
    }

    for r in results.iter().filter(|r| r.by_period.is_empty()) {
        out.push_str(&format!("{}: {NO_DATA}\n", r.method.display_name()));
    }

    out
}

/// Format the aggregated score series (consensus and user).
pub fn format_scores(stack: &StackOutput) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<8} {:>10} {:>4} {:>10} {:>4}\n",
        "Period", "Consensus", "n", "User", "n"
    ));
    for (i, period) in stack.year_names.iter().enumerate() {
        let cell = |values: &[f64], idx: usize| values.get(idx).copied().unwrap_or(0.0);
        let count = |counts: &[usize], idx: usize| counts.get(idx).copied().unwrap_or(0);
        out.push_str(&format!(
            "{:<8} {:>10.2} {:>4} {:>10.2} {:>4}\n",
            period.to_string(),
            cell(&stack.consensus.values, i),
            count(&stack.consensus.contributors, i),
            cell(&stack.personal.values, i),
            count(&stack.personal.contributors, i),
        ));
    }
    out
}

/// Format a saved stack file.
pub fn format_stack_file(stack: &StackFile) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "=== {} stack | report {} | {} | base {} | horizon {} ===\n",
        stack.tool, stack.graph_id, stack.category, stack.base_month, stack.horizon
    ));
    out.push_str(&format!("Generated: {}\n\n", stack.generated_at));
    out.push_str(&format_forecast_table(&stack.results));
    out
}
