use anyhow::{Context, Result, bail};
use fiscal_core::FiscalRepository;
use fiscal_core::calculations::FiscalSchedule;
use fiscal_core::db::{DbConfig, RepositoryRegistry};
use fiscal_core::exchange::{
    ExchangeRateProvider, FallbackRates, FixedRateProvider, RateQuote, RateResolver,
};
use fiscal_db_sqlite::SqliteRepositoryFactory;
use tracing::{debug, info};

use crate::models::CrossBorderRequest;

/// Fiscal year covered by [`FiscalSchedule::year_2025`].
pub const BUILTIN_FISCAL_YEAR: i32 = 2025;

/// Registry with every backend this binary ships with.
pub fn build_registry() -> RepositoryRegistry {
    let mut registry = RepositoryRegistry::new();
    registry.register(Box::new(SqliteRepositoryFactory));
    registry
}

/// Schedule for `year`: the built-in tables when no database is configured,
/// otherwise whatever the configured backend holds for that year.
pub async fn load_schedule(
    registry: &RepositoryRegistry,
    db_config: Option<&DbConfig>,
    year: i32,
) -> Result<FiscalSchedule> {
    let Some(db_config) = db_config else {
        if year != BUILTIN_FISCAL_YEAR {
            bail!(
                "no database configured; the built-in schedule covers fiscal year \
                 {BUILTIN_FISCAL_YEAR} only (requested {year})"
            );
        }
        debug!(year, "Using built-in fiscal schedule");
        return Ok(FiscalSchedule::year_2025());
    };

    debug!(backend = %db_config.backend, "Connecting to repository");
    let repo = registry
        .create(db_config)
        .await
        .with_context(|| format!("Failed to open {} database", db_config.backend))?;

    schedule_from_repository(&*repo, year).await
}

/// Assembles the schedule for `year` from a repository.
pub async fn schedule_from_repository(
    repo: &dyn FiscalRepository,
    year: i32,
) -> Result<FiscalSchedule> {
    let config = repo
        .get_fiscal_year_config(year)
        .await
        .with_context(|| format!("Fiscal year {year} is not configured"))?;
    let brackets = repo
        .list_tax_brackets(year)
        .await
        .with_context(|| format!("Failed to read bracket tables for {year}"))?;

    let rows = brackets.len();
    let schedule = FiscalSchedule::from_brackets(config, brackets)
        .with_context(|| format!("Invalid bracket tables for {year}"))?;
    info!(year, rows, "Loaded fiscal schedule from repository");
    Ok(schedule)
}

/// Quote for the request's currency. A typed rate acts as the live provider;
/// otherwise the fallback table answers.
pub async fn resolve_rate(
    request: &CrossBorderRequest,
    fallback: FallbackRates,
) -> RateQuote {
    let primary = request.exchange_rate.map(|rate| {
        Box::new(FixedRateProvider::new(request.currency.clone(), rate))
            as Box<dyn ExchangeRateProvider>
    });
    RateResolver::new(primary, fallback)
        .resolve(&request.currency)
        .await
}
