use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use scenario_cli::report::{self, OutputFormat};
use scenario_cli::{app, logging};
use scenario_core::db::DbConfig;
use tracing::{error, info};

/// Compare what-if tax scenarios against a financial year's ledger.
#[derive(Parser, Debug)]
#[command(name = "tax-scenarios", version, about)]
struct Cli {
    /// Scenario request file (TOML)
    #[arg(short, long)]
    request: PathBuf,

    /// Database backend to use.
    #[arg(long, env = "TAX_SCENARIO_BACKEND", default_value = "sqlite")]
    backend: String,

    /// Connection string passed to the backend factory.
    #[arg(long, env = "TAX_SCENARIO_DB", default_value = "scenarios.db")]
    db: String,

    /// Report format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Ignore cached rates and use the built-in schedule
    #[arg(long, default_value_t = false)]
    no_rate_cache: bool,

    /// Recompute every figure and fail if any is inconsistent
    #[arg(long, default_value_t = false)]
    verify: bool,

    /// Log filter, overriding RUST_LOG (e.g. "debug" or "scenario_core=trace")
    #[arg(long)]
    log_level: Option<String>,

    /// Also append logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_logging();
    let cli = Cli::parse();

    if let Some(level) = &cli.log_level {
        logging::set_log_level(level)?;
    }
    if let Some(path) = &cli.log_file {
        logging::enable_file_logging(path)?;
    }

    let request = app::load_request(&cli.request)?;

    let db_config = DbConfig {
        backend: cli.backend,
        connection_string: cli.db,
    };
    info!(
        backend = %db_config.backend,
        db = %db_config.connection_string,
        "Starting scenario analysis"
    );
    let store = app::open_store(&db_config).await?;

    let analysis = app::run_analysis(store.as_ref(), &request, !cli.no_rate_cache)
        .await
        .with_context(|| format!("Scenario analysis failed for {}", request.base_year))?;

    let output = report::render(&analysis, cli.format).context("Failed to render report")?;
    println!("{output}");

    if cli.verify {
        let issues = app::verify(&analysis);
        if !issues.is_empty() {
            for issue in &issues {
                error!(%issue, "Verification failed");
            }
            anyhow::bail!("{} inconsistent figure(s) in the analysis", issues.len());
        }
        info!("All figures verified");
    }

    Ok(())
}
