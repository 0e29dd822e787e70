//! Command-line entry point for test binaries
//!
//! A test binary registers its suites and hands the runner over:
//!
//! ```rust,no_run
//! use ouroboros_qc::{cli, Runner, UnitTest};
//!
//! fn main() -> std::process::ExitCode {
//!     let mut runner = Runner::new();
//!     runner.add_suite(UnitTest::builder("Math").case("add", || 1 + 1 == 2).build().unwrap());
//!     cli::main_with(runner)
//! }
//! ```
//!
//! Usage:
//!   <bin>                        Run every suite, print banners and a console report
//!   <bin> --fail-fast            Stop after the first failing suite or case
//!   <bin> --config qc.toml       Load the run configuration from a file
//!   <bin> --format junit -o out  Write a JUnit report to a file
//!   <bin> --list                 List suites and test cases without running

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use crate::config::RunConfiguration;
use crate::error::QcError;
use crate::reporter::{ConsoleObserver, ReportFormat, Reporter, TestReport};
use crate::runner::{NoopObserver, Runner};

#[derive(Parser, Debug, Clone)]
#[command(name = "ouroboros-qc")]
#[command(about = "Run registered unit test suites", long_about = None)]
pub struct QcArgs {
    /// TOML run configuration
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Stop on first failure (overrides the configuration file)
    #[arg(long)]
    pub fail_fast: bool,

    /// Report format: console, json, yaml or junit
    #[arg(short, long, default_value = "console")]
    pub format: ReportFormat,

    /// Write the report to a file instead of stdout
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Report title
    #[arg(long, default_value = "ouroboros-qc")]
    pub title: String,

    /// Colored console report
    #[arg(long)]
    pub color: bool,

    /// Do not print suite/test case banners while running
    #[arg(short, long)]
    pub quiet: bool,

    /// List suites and test cases without running them
    #[arg(long)]
    pub list: bool,

    /// Log level (overridden by RUST_LOG)
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

/// Parse process arguments, run, and map the verdict to an exit code
pub fn main_with(runner: Runner) -> ExitCode {
    main_with_args(runner, QcArgs::parse())
}

/// Run with already parsed arguments
pub fn main_with_args(mut runner: Runner, args: QcArgs) -> ExitCode {
    init_logging(&args.log_level);

    match run(&mut runner, &args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Run the suites and emit the report; returns the overall verdict.
///
/// When a cleanup failure aborts the run, the partial report is still
/// written before the error is returned.
pub fn run(runner: &mut Runner, args: &QcArgs) -> Result<bool> {
    let config = load_config(args)?;

    if args.list {
        print!("{}", list_suites(runner));
        return Ok(true);
    }

    let outcome = if args.quiet {
        runner.run_with_observer(&config, &mut NoopObserver)
    } else {
        runner.run_with_observer(&config, &mut ConsoleObserver::stdout(&config))
    };
    let (result, aborted) = match outcome {
        Ok(result) => (result, None),
        Err(QcError::Aborted { partial, source }) => (*partial, Some(*source)),
        Err(e) => return Err(e).context("Test run aborted"),
    };

    let report = TestReport::new(args.title.clone(), result);
    let reporter = Reporter::new(args.format).with_color(args.color);

    match args.output {
        Some(ref path) => {
            let mut file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create report file {}", path.display()))?;
            reporter.write_to(&report, &mut file)?;
            tracing::info!(path = %path.display(), format = %args.format, "report written");
        }
        None => reporter.write_to(&report, &mut std::io::stdout().lock())?,
    }

    match aborted {
        Some(cause) => Err(anyhow::Error::new(cause).context("Test run aborted")),
        None => Ok(report.success),
    }
}

/// Resolve the run configuration from the file and command-line overrides
pub fn load_config(args: &QcArgs) -> Result<RunConfiguration> {
    let mut config = match args.config {
        Some(ref path) => RunConfiguration::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => RunConfiguration::default(),
    };
    if args.fail_fast {
        config.continue_on_failure = false;
    }
    Ok(config)
}

/// Registered suites and their test cases, one per line
pub fn list_suites(runner: &Runner) -> String {
    let mut output = String::new();
    for suite in runner.suites() {
        output.push_str(&format!(" - {} ({} test cases)\n", suite.name(), suite.case_count()));
        for case in suite.case_names() {
            output.push_str(&format!("     * {}\n", case));
        }
    }
    output
}

/// Initialize logging based on log level
pub fn init_logging(level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init()
        .ok(); // Ignore error if already initialized
}
