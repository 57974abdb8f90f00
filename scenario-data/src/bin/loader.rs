use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use scenario_data::TransactionLoader;
use scenario_db_sqlite::SqliteRepository;

/// Load ledger transactions from a CSV file into the database.
///
/// The CSV file should have the following columns:
/// - financial_year: label such as FY2024-25
/// - amount: signed amount (income positive, expenses negative)
/// - is_rnd_candidate: true/false, yes/no or 1/0
/// - transaction_date, description, account_code: optional
#[derive(Parser, Debug)]
#[command(name = "scenario-data-loader")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the CSV file containing transactions
    #[arg(short, long)]
    file: PathBuf,

    /// SQLite database URL (e.g., sqlite:scenarios.db?mode=rwc to create if missing)
    #[arg(short, long, default_value = "sqlite:scenarios.db?mode=rwc")]
    database: String,

    /// Run database migrations before loading data
    #[arg(short, long, default_value_t = false)]
    migrate: bool,

    /// Run seed files from the specified directory after migrations
    #[arg(short, long)]
    seeds: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let repo = SqliteRepository::new(&args.database)
        .await
        .with_context(|| format!("Failed to connect to database: {}", args.database))?;

    if args.migrate {
        println!("Running migrations...");
        repo.run_migrations()
            .await
            .context("Failed to run migrations")?;
        println!("Migrations complete.");
    }

    if let Some(seeds_dir) = &args.seeds {
        println!("Running seeds from: {}", seeds_dir.display());
        repo.run_seeds(seeds_dir)
            .await
            .with_context(|| format!("Failed to run seeds from: {}", seeds_dir.display()))?;
        println!("Seeds complete.");
    }

    println!("Loading transactions from: {}", args.file.display());

    let file = File::open(&args.file)
        .with_context(|| format!("Failed to open: {}", args.file.display()))?;

    let records = TransactionLoader::parse(file)
        .with_context(|| format!("Failed to parse CSV: {}", args.file.display()))?;

    println!("Parsed {} records from CSV", records.len());

    let inserted = TransactionLoader::load(&repo, &records)
        .await
        .context("Failed to load transactions into database")?;

    println!("Successfully loaded {} transactions into the database.", inserted);

    Ok(())
}
