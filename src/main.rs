//! testcov CLI - API Test Coverage Report
//!
//! Counts test assertions per exported function and prints a Markdown table.
//!
//! Usage:
//!   testcov [OPTIONS] [SOURCE_DIR] [TEST_DIR]

use std::io::{Write, stdout};
use std::path::PathBuf;
use std::process;
use std::time::Instant;

use clap::Parser;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use testcov::{CompiledConfig, TotalPolicy, analyze_coverage, generate_report, load_compiled_config};

/// testcov - How thoroughly does the test suite exercise the exported API?
#[derive(Parser, Debug)]
#[command(name = "testcov")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory containing the library sources and headers
    #[arg(default_value = "./src")]
    source_dir: PathBuf,

    /// Directory containing the test sources
    #[arg(default_value = "./tests")]
    test_dir: PathBuf,

    /// Config file path (default: search for .testcov.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// What the total row counts
    #[arg(long, value_enum)]
    total: Option<TotalPolicy>,

    /// Render function names as inline code
    #[arg(long, overrides_with = "no_code_names")]
    code_names: bool,

    /// Render function names as plain text, even if the config enables code names
    #[arg(long, overrides_with = "code_names")]
    no_code_names: bool,

    /// Add a column with each function's parameter count
    #[arg(long, overrides_with = "no_params")]
    params: bool,

    /// Omit the parameter column, even if the config enables it
    #[arg(long, overrides_with = "params")]
    no_params: bool,

    /// Number of threads for scanning (default: all CPU cores)
    #[arg(long, short = 'j', value_name = "N")]
    jobs: Option<usize>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Resolve a `--flag`/`--no-flag` pair; `None` keeps the config value
fn flag_override(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Some(jobs) = args.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .unwrap_or_else(|e| warn!("Could not set thread count: {}", e));
    }

    let start = Instant::now();

    // An explicit config must load; a discovered one falls back to defaults
    let mut config = match &args.config {
        Some(path) => load_compiled_config(path)?,
        None => {
            let cwd = std::env::current_dir()?;
            match load_compiled_config(&cwd) {
                Ok(config) => config,
                Err(e) => {
                    warn!("Ignoring config file: {}", e);
                    CompiledConfig::defaults()?
                }
            }
        }
    };

    // CLI flags override the config file
    if let Some(total) = args.total {
        config.report.total = total;
    }
    if let Some(code_names) = flag_override(args.code_names, args.no_code_names) {
        config.report.code_names = code_names;
    }
    if let Some(show_params) = flag_override(args.params, args.no_params) {
        config.report.show_params = show_params;
    }

    let analysis = analyze_coverage(&args.source_dir, &args.test_dir, &config)?;

    if args.verbose {
        eprintln!(
            "Sources: {} files scanned, {} unreadable, {} exported functions",
            analysis.exports.files_scanned,
            analysis.exports.files_failed(),
            analysis.registry.len()
        );
        eprintln!(
            "Tests: {} files scanned, {} unreadable, {} assertions attributed",
            analysis.tests.files_scanned,
            analysis.tests.files_failed(),
            analysis.tests.matches
        );
    }

    let mut writer = stdout().lock();
    generate_report(&analysis.registry, &config.report, &mut writer)?;
    writer.flush()?;

    debug!("Total time: {:.2?}", start.elapsed());

    Ok(())
}
