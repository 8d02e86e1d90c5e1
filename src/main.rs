//! CaseTrend - test-case automation status reporting
//!
//! A CLI tool that queries Azure DevOps for Test Case work items,
//! classifies them by automation status, aggregates per-area-path
//! counts to CSV, and renders a stacked-bar trend chart.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (connection, auth, file I/O, bad input)

mod aggregate;
mod cli;
mod client;
mod config;
mod fetch;
mod models;
mod trend;

use anyhow::{Context, Result};
use cli::{Args, Command, ConnectionArgs, ResolvedConnection};
use client::AzureDevOpsClient;
use config::Config;
use fetch::FetchOptions;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle init-config early (no logging needed)
    if matches!(args.command, Command::InitConfig) {
        if let Err(e) = handle_init_config() {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
        return;
    }

    // Initialize logging
    init_logging(&args);

    info!("CaseTrend v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(args).await {
        error!("Command failed: {}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Handle init-config: generate a default .casetrend.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(".casetrend.toml");

    if path.exists() {
        eprintln!("⚠️  .casetrend.toml already exists. Remove it first or edit it manually.");
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).context("Failed to write .casetrend.toml")?;

    println!("✅ Created .casetrend.toml with default settings.");
    println!("   Edit it to set organization, project, and output paths.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Dispatch the selected pipeline stage.
async fn run(args: Args) -> Result<()> {
    let config = load_config(&args)?;
    let quiet = args.quiet;

    match args.command {
        Command::GetTestCases { connection, query } => {
            let client = connect(&connection, &config)?;
            let options = FetchOptions {
                query,
                show_progress: !quiet,
            };

            let report = fetch::fetch_test_cases(&client, &options).await?;
            let json =
                serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
            println!("{}", json);
        }

        Command::AggregateCases { connection, output } => {
            let client = connect(&connection, &config)?;
            let options = FetchOptions {
                query: None,
                show_progress: !quiet,
            };
            let output = output.unwrap_or_else(|| PathBuf::from(&config.output.csv));

            let report = fetch::fetch_test_cases(&client, &options).await?;
            let table = aggregate::aggregate_to_file(&report, &output)?;

            println!(
                "📊 Aggregated {} test cases across {} area paths.",
                report.total(),
                table.len()
            );
            println!("✅ Test cases aggregated and saved to {}", output.display());
        }

        Command::PlotTrend { input, output } => {
            let output = output.unwrap_or_else(|| PathBuf::from(&config.output.chart));

            trend::plot_trend(&input, &output)?;
            println!("✅ Trend plot saved to {}", output.display());
        }

        Command::InitConfig => unreachable!("handled before logging init"),
    }

    Ok(())
}

/// Resolve connection settings and build the tracking-service client.
fn connect(connection: &ConnectionArgs, config: &Config) -> Result<AzureDevOpsClient> {
    let resolved: ResolvedConnection = connection
        .resolve(&config.connection)
        .map_err(anyhow::Error::msg)?;

    info!(
        "Connecting to {}/{} as PAT user",
        resolved.organization, resolved.project
    );

    AzureDevOpsClient::new(
        &resolved.organization,
        &resolved.project,
        &resolved.pat,
        resolved.timeout_seconds,
    )
    .context("Failed to create tracking-service client")
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
            info!("Loaded default config from .casetrend.toml");
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => Err(e),
    }
}
