//! Command-line driver: read the draft state, validate it, plan the rest of
//! my draft and write the plan.
//!
//! Exit codes: 0 when a draft was planned, 1 when the input is invalid or
//! no draft is possible, 2 for I/O and conversion failures.

use anyhow::{Context, Result};
use clap::Parser;
use fantop::{input_schema, solve, FantopError, SolveOptions};
use std::path::PathBuf;
use std::process::ExitCode;
use tic_guard::formatters::{FormatterConfig, HumanFormatter, ResultFormatter};
use tic_guard::logging::setup::{init_logging, LoggingConfig};
use tic_guard::logging::LogConfig;
use tic_guard::sources::{DataFormat, WriteOptions};
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about = "Plan the rest of a fantasy football draft", long_about = None)]
struct Args {
    /// Input data: a CSV directory, or a .json, .db/.sqlite or .xlsx file
    #[arg(short, long)]
    input: PathBuf,

    /// Where to write the planned draft
    #[arg(short, long)]
    output: PathBuf,

    /// Input format, inferred from the input path when omitted
    #[arg(long)]
    format: Option<DataFormat>,

    /// Output format, inferred from the output path when omitted
    #[arg(long)]
    output_format: Option<DataFormat>,

    /// Replace existing output
    #[arg(long)]
    allow_overwrite: bool,

    /// Log level for fantop and tic-guard
    #[arg(long, default_value = "info")]
    log_level: tracing::Level,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    /// Log every planned pick
    #[arg(short, long)]
    verbose: bool,
}

enum Outcome {
    Planned,
    Invalid,
    NoDraft,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let logging = LoggingConfig::default()
        .with_library_level(args.log_level)
        .with_target("fantop")
        .with_json_format(args.json_logs);
    if let Err(e) = init_logging(logging) {
        eprintln!("failed to initialize logging: {e}");
    }

    match run(&args) {
        Ok(Outcome::Planned) => ExitCode::SUCCESS,
        Ok(Outcome::Invalid) | Ok(Outcome::NoDraft) => ExitCode::from(1),
        Err(e) => {
            error!(error = format!("{e:#}"), "fantop failed");
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}

fn run(args: &Args) -> Result<Outcome> {
    let format = match args.format {
        Some(format) => format,
        None => DataFormat::from_path(&args.input)?,
    };
    let output_format = match args.output_format {
        Some(format) => format,
        None => DataFormat::from_path(&args.output)?,
    };

    let schema = input_schema()?;
    let duplicates = format
        .find_duplicates(&args.input, &schema)
        .with_context(|| format!("checking {} for duplicate rows", args.input.display()))?;
    if !duplicates.is_empty() {
        let tables: Vec<&String> = duplicates.keys().collect();
        warn!(?tables, "input repeats primary keys; the last row wins");
    }
    let dat = format
        .read(&args.input, &schema)
        .with_context(|| format!("reading {} as {format}", args.input.display()))?;
    info!(input = %args.input.display(), %format, rows = dat.row_count(), "loaded draft state");

    let log = if args.verbose {
        LogConfig::verbose()
    } else {
        LogConfig::default()
    };
    let options = SolveOptions::default().with_log_config(log);

    match solve(&dat, &options) {
        Ok(Some(draft)) => {
            let write = WriteOptions::default().with_overwrite(args.allow_overwrite);
            output_format
                .write(&args.output, &draft, &write)
                .with_context(|| format!("writing {}", args.output.display()))?;
            info!(output = %args.output.display(), picks = draft.row_count(), "wrote planned draft");
            Ok(Outcome::Planned)
        }
        Ok(None) => {
            println!("No draft at all is possible!");
            Ok(Outcome::NoDraft)
        }
        Err(e @ FantopError::InvalidInput { .. }) => {
            match e.report() {
                Some(report) => {
                    let mut report = report.clone();
                    report.add_duplicates(&duplicates);
                    let formatter = HumanFormatter::with_config(FormatterConfig::default().with_colors(false));
                    eprint!("{}", formatter.format(&report)?);
                }
                None => eprintln!("{e}"),
            }
            Ok(Outcome::Invalid)
        }
        Err(e) => Err(e.into()),
    }
}
