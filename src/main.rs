//! clickcount - yearly click counts per shortened link
//!
//! A CLI tool that joins a link registry CSV with a JSON click log and
//! prints, for each long URL, how many clicks it received in one calendar
//! year, sorted by count.
//!
//! Exit codes:
//!   0 - Success (including an empty result)
//!   1 - Inputs could not be processed (missing file, bad schema, config error)
//!   2 - Records were skipped and --strict was set

mod analysis;
mod cli;
mod config;
mod error;
mod loader;
mod models;
mod pipeline;
mod report;

use anyhow::{Context, Result};
use cli::Args;
use config::{Config, DEFAULT_CONFIG_FILE};
use models::Diagnostics;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(EXIT_FATAL);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("clickcount v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run_count(&args) {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            error!("Click counting failed: {:#}", e);
            eprintln!("\nError: {:#}", e);
            std::process::exit(EXIT_FATAL);
        }
    }
}

/// Handle --init-config: generate a default .clickcount.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "{} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(EXIT_FATAL);
    }

    let content = Config::default_toml()?;
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("Created {} with default settings.", DEFAULT_CONFIG_FILE);
    Ok(())
}

/// Initialize logging on stderr; stdout is reserved for the JSON result.
fn init_logging(args: &Args) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level().to_string().to_lowercase()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Run the complete workflow. Returns exit code (0 or 2).
fn run_count(args: &Args) -> Result<i32> {
    let mut config = load_config(args)?;
    config.merge_with_args(args);
    config.validate().context("Invalid configuration")?;

    let inputs = config.pipeline_inputs();
    let options = config.pipeline_options();

    let output = pipeline::run(&inputs, &options)?;

    let json = report::generate_json_report(&output.results, config.output.pretty)?;
    match args.output {
        Some(ref path) => {
            report::write_json_report(&json, path)
                .with_context(|| format!("Failed to write results to {}", path.display()))?;
            info!("Results saved to: {}", path.display());
        }
        None => println!("{}", json),
    }

    if !args.quiet {
        eprintln!(
            "\n{}",
            report::generate_summary_text(options.target_year, &output.stats, &output.diagnostics)
        );
    }

    let code = exit_code(args.strict, &output.diagnostics);
    if code == EXIT_SKIPPED_STRICT {
        eprintln!(
            "\n{} records were skipped and --strict is set. Failing (exit code {}).",
            output.diagnostics.len(),
            code
        );
    }

    Ok(code)
}

const EXIT_SUCCESS: i32 = 0;
const EXIT_FATAL: i32 = 1;
const EXIT_SKIPPED_STRICT: i32 = 2;

/// Exit code for a run that produced results.
fn exit_code(strict: bool, diagnostics: &Diagnostics) -> i32 {
    if strict && !diagnostics.is_empty() {
        EXIT_SKIPPED_STRICT
    } else {
        EXIT_SUCCESS
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", DEFAULT_CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {:#}", e);
            Ok(Config::default())
        }
    }
}
