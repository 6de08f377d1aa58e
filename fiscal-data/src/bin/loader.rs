use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use fiscal_data::BracketLoader;
use fiscal_db_sqlite::SqliteRepository;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Load bracket tables from a CSV file into the database.
///
/// The CSV file has the columns:
/// - fiscal_year: e.g. 2025
/// - table: INSS, IRRF, INSS_PRO_LABORE, SIMPLES_III or SIMPLES_V
/// - upper_bound: inclusive upper bound (empty for the last row)
/// - rate: marginal rate as a fraction (e.g. 0.075)
/// - deduction: amount subtracted after applying the rate
#[derive(Parser, Debug)]
#[command(name = "fiscal-data-loader")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the CSV file containing bracket data
    #[arg(short, long)]
    file: PathBuf,

    /// SQLite database path or URL (created if missing)
    #[arg(short, long, default_value = "sqlite://fiscal.db")]
    database: String,

    /// Run database migrations before loading data
    #[arg(short, long, default_value_t = false)]
    migrate: bool,

    /// Run seed files from the specified directory after migrations
    #[arg(short, long)]
    seeds: Option<PathBuf>,
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .without_time()
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let repo = SqliteRepository::new(&args.database)
        .await
        .with_context(|| format!("Failed to connect to database: {}", args.database))?;

    if args.migrate {
        info!("Running migrations");
        repo.run_migrations()
            .await
            .context("Failed to run migrations")?;
    }

    if let Some(seeds_dir) = &args.seeds {
        info!(dir = %seeds_dir.display(), "Running seeds");
        repo.run_seeds(seeds_dir)
            .await
            .with_context(|| format!("Failed to run seeds from: {}", seeds_dir.display()))?;
    }

    info!(file = %args.file.display(), "Loading bracket tables");

    let file = File::open(&args.file)
        .with_context(|| format!("Failed to open: {}", args.file.display()))?;

    let records = BracketLoader::parse(file)
        .with_context(|| format!("Failed to parse CSV: {}", args.file.display()))?;

    info!(records = records.len(), "Parsed CSV");

    let inserted = BracketLoader::load(&repo, &records)
        .await
        .context("Failed to load bracket tables into database")?;

    info!(inserted, "Loaded bracket rows into the database");

    Ok(())
}
