//! Command-line parsing for the forecast stack.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the forecasting code.

use std::path::PathBuf;

use clap::builder::RangedU64ValueParser;
use clap::{ArgAction, Parser, Subcommand};

use crate::domain::{DEFAULT_HORIZON, MAX_HORIZON, MonthKey, SourceKind};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "race", version, about = "RACE Analytics forecast stack")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug). `RUST_LOG` wins when set.
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compute every enabled forecast curve and print summary + table.
    Forecast(ForecastArgs),
    /// Print only the aggregated survey scores (useful for scripting).
    Scores(ForecastArgs),
    /// Print a previously exported forecast stack JSON.
    Show(ShowArgs),
}

/// Common options for computing a forecast stack.
#[derive(Debug, Parser, Clone)]
pub struct ForecastArgs {
    /// Report (graph) id the survey belongs to.
    #[arg(short = 'g', long)]
    pub graph_id: u64,

    /// Vehicle category whose volumes are forecast.
    #[arg(short = 'c', long)]
    pub category: String,

    /// Last month with actuals, as YYYY-MM.
    #[arg(short = 'b', long)]
    pub base_month: MonthKey,

    /// Number of future periods to project (1..=120).
    #[arg(
        long,
        default_value_t = DEFAULT_HORIZON,
        value_parser = RangedU64ValueParser::<usize>::new().range(1..=MAX_HORIZON as u64)
    )]
    pub horizon: usize,

    /// Requesting user (enables "build your own forecast").
    #[arg(short = 'u', long)]
    pub user: Option<String>,

    /// Where report data comes from.
    #[arg(long, value_enum, default_value_t = SourceKind::Http)]
    pub source: SourceKind,

    /// Random seed for `--source sample`.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Number of synthetic submissions for `--source sample`.
    #[arg(long, default_value_t = 12)]
    pub submissions: usize,

    /// Export forecasts to CSV (method,period,value).
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Export the forecast stack to JSON (readable by `race show`).
    #[arg(long = "export-json")]
    pub export_json: Option<PathBuf>,
}

/// Options for printing a saved stack.
#[derive(Debug, Parser)]
pub struct ShowArgs {
    /// Stack JSON file produced by `race forecast --export-json`.
    #[arg(long, value_name = "JSON")]
    pub stack: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_forecast_args() {
        let cli = Cli::parse_from([
            "race", "forecast", "-g", "12", "-c", "SUV", "-b", "2025-03", "--source", "sample", "-u",
            "ana", "-vv",
        ]);
        assert_eq!(cli.verbose, 2);
        let Command::Forecast(args) = cli.command else {
            panic!("expected forecast");
        };
        assert_eq!(args.graph_id, 12);
        assert_eq!(args.base_month.to_string(), "2025-03");
        assert_eq!(args.horizon, DEFAULT_HORIZON);
        assert_eq!(args.source, SourceKind::Sample);
        assert_eq!(args.user.as_deref(), Some("ana"));
    }

    #[test]
    fn horizon_is_bounded() {
        let base = ["race", "forecast", "-g", "1", "-c", "SUV", "-b", "2025-01", "--horizon"];
        let parse = |h: &str| {
            let mut argv: Vec<&str> = base.to_vec();
            argv.push(h);
            Cli::try_parse_from(argv)
        };
        assert!(parse("0").is_err());
        assert!(parse("121").is_err());
        assert!(parse("18446744073709551615").is_err());

        let Command::Forecast(args) = parse("120").unwrap().command else {
            panic!("expected forecast");
        };
        assert_eq!(args.horizon, MAX_HORIZON);
    }

    #[test]
    fn rejects_malformed_base_month() {
        let res = Cli::try_parse_from(["race", "forecast", "-g", "1", "-c", "SUV", "-b", "03/2025"]);
        assert!(res.is_err());
    }
}
