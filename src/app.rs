//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - sets up logging
//! - picks the data source
//! - runs the forecast stack
//! - prints reports and writes optional exports

use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Command, ForecastArgs, ShowArgs};
use crate::data::{HttpSource, ReportSource, SampleSource};
use crate::domain::{RunConfig, SourceKind};
use crate::error::ForecastError;

pub mod pipeline;

/// Entry point for the `race` binary.
pub fn run() -> Result<(), ForecastError> {
    // `race -g 1 ...` behaves like `race forecast -g 1 ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    dotenvy::dotenv().ok();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Forecast(args) => handle_forecast(args, OutputMode::Full),
        Command::Scores(args) => handle_forecast(args, OutputMode::ScoresOnly),
        Command::Show(args) => handle_show(args),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Full,
    ScoresOnly,
}

fn handle_forecast(args: ForecastArgs, mode: OutputMode) -> Result<(), ForecastError> {
    let config = run_config_from_args(&args)?;
    match config.source {
        SourceKind::Http => execute(&config, &HttpSource::from_env()?, mode),
        SourceKind::Sample => execute(
            &config,
            &SampleSource::new(config.sample_seed, config.sample_submissions, config.base_month),
            mode,
        ),
    }
}

fn execute(config: &RunConfig, source: &impl ReportSource, mode: OutputMode) -> Result<(), ForecastError> {
    let run = pipeline::run_forecast(config, source)?;

    match mode {
        OutputMode::Full => {
            println!("{}", crate::report::format_run_summary(&run));
            println!("{}", crate::report::format_forecast_table(&run.stack.results));
        }
        OutputMode::ScoresOnly => {
            println!("{}", crate::report::format_scores(&run.stack));
        }
    }

    // Optional exports.
    if let Some(path) = &config.export_csv {
        crate::io::export::write_results_csv(path, &run.stack.results)?;
        info!(path = %path.display(), "wrote CSV export");
    }
    if let Some(path) = &config.export_json {
        crate::io::stack::write_stack_json(path, &crate::io::stack::stack_file(&run))?;
        info!(path = %path.display(), "wrote stack JSON");
    }

    Ok(())
}

fn handle_show(args: ShowArgs) -> Result<(), ForecastError> {
    let stack = crate::io::stack::read_stack_json(&args.stack)?;
    println!("{}", crate::report::format_stack_file(&stack));
    Ok(())
}

pub fn run_config_from_args(args: &ForecastArgs) -> Result<RunConfig, ForecastError> {
    if args.category.trim().is_empty() {
        return Err(ForecastError::Config("Category must not be empty.".to_string()));
    }
    Ok(RunConfig {
        graph_id: args.graph_id,
        category: args.category.trim().to_string(),
        base_month: args.base_month,
        horizon: args.horizon,
        user_id: args.user.clone().filter(|u| !u.trim().is_empty()),
        source: args.source,
        sample_seed: args.seed,
        sample_submissions: args.submissions,
        export_csv: args.export.clone(),
        export_json: args.export_json.clone(),
    })
}

/// Logs go to stderr so stdout stays clean for tables.
///
/// `RUST_LOG` overrides the `-v` level; `RACE_LOG_JSON=1` switches to JSON lines.
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let log_json = std::env::var("RACE_LOG_JSON")
        .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
        .unwrap_or(false);

    // `try_init` so tests or embedding callers that already set a subscriber keep theirs.
    if log_json {
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init();
    } else {
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init();
    }
}

/// Rewrite argv so `race` defaults to `race forecast`.
///
/// Rules:
/// - `race -g 1 ...`              -> `race forecast -g 1 ...`
/// - `race -v -g 1 ...`           -> `race -v forecast -g 1 ...`
/// - `race --help/--version/-h`   -> unchanged (show top-level help/version)
/// - `race` (no args)             -> unchanged (clap prints usage)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    // Leading verbosity flags are global; the decision is made on the first
    // token after them.
    let first = argv
        .iter()
        .skip(1)
        .position(|a| !is_verbosity_flag(a))
        .map(|i| i + 1);
    let Some(idx) = first else {
        return argv;
    };
    let arg = argv[idx].as_str();

    let is_top_level_help_or_version =
        matches!(arg, "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg, "forecast" | "scores" | "show");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "forecast flags".
    if arg.starts_with('-') {
        argv.insert(idx, "forecast".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}

fn is_verbosity_flag(arg: &str) -> bool {
    arg == "--verbose"
        || (arg.len() > 1 && arg.starts_with('-') && arg[1..].chars().all(|c| c == 'v'))
}
