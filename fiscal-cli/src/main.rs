use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use tracing::{debug, info};

use fiscal_cli::config::{Overrides, Settings};
use fiscal_cli::models::{CompareForm, CrossBorderForm};
use fiscal_cli::report::{BatchReport, ComparisonReport, CrossBorderReport, ScheduleReport};
use fiscal_cli::{app, logging, scenario_loader};
use fiscal_core::calculations::{CrossBorderCalculator, EmploymentComparator};

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Brazilian payroll and contractor tax estimates.
///
/// Compares CLT employment with PJ contracting, estimates taxes on foreign
/// income under Simples Nacional and Lucro Presumido, and lists the bracket
/// tables in use. Without a database the built-in 2025 tables are used.
#[derive(Debug, Parser)]
#[command(name = "fiscal", version)]
struct Cli {
    /// TOML settings file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database backend to use. Needs `--db` or a `[database]` section.
    #[arg(long, global = true)]
    backend: Option<String>,

    /// Database connection string.
    /// For SQLite this is a file path (e.g. `fiscal.db`) or `:memory:`.
    #[arg(long, global = true)]
    db: Option<String>,

    /// Fiscal year whose tables are used.
    #[arg(long, global = true)]
    year: Option<i32>,

    /// Append log output to this file.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Log level or filter directive (e.g. `debug`, `info,fiscal_core=debug`).
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Keep log output off the terminal.
    #[arg(long, short, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compare CLT employment with PJ contracting for one gross amount.
    Compare {
        /// Monthly gross amount (e.g. `6000`, `6.000,00`).
        #[arg(long)]
        gross: String,

        /// Meal allowance per business day.
        #[arg(long, default_value = "")]
        meal_per_day: String,

        /// Monthly food allowance.
        #[arg(long, default_value = "")]
        food: String,

        /// Monthly health plan.
        #[arg(long, default_value = "")]
        health: String,

        /// Other monthly benefits.
        #[arg(long, default_value = "")]
        other: String,
    },

    /// Taxes on one month of income received from abroad.
    CrossBorder {
        /// Amount in the foreign currency.
        #[arg(long)]
        amount: String,

        /// Three-letter currency code.
        #[arg(long, default_value = "USD")]
        currency: String,

        /// Reais per unit of currency. Uses the fallback table when omitted.
        #[arg(long, default_value = "")]
        rate: String,

        /// Monthly pro-labore.
        #[arg(long, default_value = "")]
        draw: String,

        /// Municipal service tax in percent (0 to 5).
        #[arg(long, default_value = "")]
        iss: String,

        /// Pay INSS and IRRF on the pro-labore.
        #[arg(long)]
        contribute_inss: bool,
    },

    /// Run the comparison for every row of a scenarios CSV.
    Batch {
        /// CSV with label, gross and optional benefit columns.
        #[arg(long)]
        file: PathBuf,
    },

    /// Print the bracket tables of the selected fiscal year.
    Brackets,
}

// ─── settings ────────────────────────────────────────────────────────────────

fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    settings.apply_overrides(Overrides {
        backend: cli.backend.clone(),
        db: cli.db.clone(),
        year: cli.year,
        log_level: cli.log_level.clone(),
        log_file: cli.log_file.clone(),
    })?;
    if cli.quiet {
        settings.logging.stdout = false;
    }
    Ok(settings)
}

fn apply_logging(settings: &Settings) -> Result<()> {
    if let Some(level) = &settings.logging.level {
        logging::set_log_level(level)?;
    }
    if !settings.logging.stdout {
        logging::set_stdout_enabled(false)?;
    }
    if let Some(path) = &settings.logging.file {
        logging::enable_file_logging(path)?;
    }
    Ok(())
}

fn invalid_input(errors: Vec<String>) -> anyhow::Error {
    anyhow!("invalid input:\n  - {}", errors.join("\n  - "))
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_logging();

    let cli = Cli::parse();
    let settings = load_settings(&cli)?;
    apply_logging(&settings)?;

    let year = settings.calculator.fiscal_year;
    debug!(app = logging::app_name(), year, "Starting");

    let registry = app::build_registry();
    let db_config = settings.db_config();
    let schedule = app::load_schedule(&registry, db_config.as_ref(), year).await?;

    match cli.command {
        Command::Compare {
            gross,
            meal_per_day,
            food,
            health,
            other,
        } => {
            let request = CompareForm {
                gross,
                daily_meal_allowance: meal_per_day,
                monthly_food_allowance: food,
                monthly_health_plan: health,
                monthly_other_benefits: other,
            }
            .validate_for_submit()
            .map_err(invalid_input)?;

            let comparison =
                EmploymentComparator::new(&schedule).compare(request.gross, &request.benefits)?;
            println!("{}", ComparisonReport(&comparison));
        }

        Command::CrossBorder {
            amount,
            currency,
            rate,
            draw,
            iss,
            contribute_inss,
        } => {
            let request = CrossBorderForm {
                foreign_amount: amount,
                currency,
                exchange_rate: rate,
                professional_draw: draw,
                municipal_service_tax_percent: iss,
                contributes_to_social_security: contribute_inss,
            }
            .validate_for_submit()
            .map_err(invalid_input)?;
            debug!("cross-border request\n{request}");

            let quote = app::resolve_rate(&request, settings.fallback_rates()?).await;
            let result =
                CrossBorderCalculator::new(&schedule).calculate(&request.to_input(quote.rate));
            println!(
                "{}",
                CrossBorderReport {
                    result: &result,
                    quote: &quote,
                }
            );
        }

        Command::Batch { file } => {
            let scenarios = scenario_loader::load_from_file(&file)
                .with_context(|| format!("Failed to load scenarios from {}", file.display()))?;
            info!(count = scenarios.len(), "Loaded scenarios");

            let comparator = EmploymentComparator::new(&schedule);
            let mut rows = Vec::with_capacity(scenarios.len());
            for scenario in scenarios {
                let comparison = comparator
                    .compare(scenario.gross, &scenario.benefits)
                    .with_context(|| format!("Scenario '{}'", scenario.label))?;
                rows.push((scenario.label, comparison));
            }
            println!("{}", BatchReport(&rows));
        }

        Command::Brackets => {
            println!("{}", ScheduleReport(&schedule));
        }
    }

    Ok(())
}
