use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use fiscal_core::{
    BracketTableCode, FiscalRepository, FiscalYearConfig, RepositoryError, TaxBracket,
};
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

use crate::decimal::{decimal_to_text, get_decimal, get_optional_decimal};

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Connects to `database_url`, creating the database file if needed.
    ///
    /// Accepts sqlx URLs (`sqlite://fiscal.db`), bare paths (`fiscal.db`) and
    /// `:memory:`.
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid database URL: {}", database_url))?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to connect to database: {}", database_url))?;
        Ok(Self { pool })
    }

    pub async fn new_with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    /// Load and execute all SQL seed files from the specified directory.
    /// Files are executed in alphabetical order by filename.
    pub async fn run_seeds(
        &self,
        seeds_dir: &Path,
    ) -> Result<()> {
        let mut entries: Vec<_> = std::fs::read_dir(seeds_dir)
            .with_context(|| format!("Failed to read seeds directory '{}'", seeds_dir.display()))?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "sql"))
            .collect();

        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let path = entry.path();
            let sql = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read seed file '{}'", path.display()))?;

            sqlx::raw_sql(&sql)
                .execute(&self.pool)
                .await
                .with_context(|| format!("Failed to execute seed file '{}'", path.display()))?;
            debug!(file = %path.display(), "Applied seed file");
        }

        info!(dir = %seeds_dir.display(), "Seeds applied");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn db_error(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Database(e.to_string())
}

fn row_to_tax_bracket(row: &sqlx::sqlite::SqliteRow) -> Result<TaxBracket, RepositoryError> {
    let code: String = row.try_get("table_code").map_err(db_error)?;
    let table_code = BracketTableCode::parse(&code)
        .ok_or_else(|| RepositoryError::Database(format!("Invalid table code: {}", code)))?;

    Ok(TaxBracket {
        fiscal_year: row.try_get("fiscal_year").map_err(db_error)?,
        table_code,
        upper_bound: get_optional_decimal(row, "upper_bound")?,
        rate: get_decimal(row, "rate")?,
        deduction: get_decimal(row, "deduction")?,
    })
}

#[async_trait]
impl FiscalRepository for SqliteRepository {
    async fn get_fiscal_year_config(
        &self,
        year: i32,
    ) -> Result<FiscalYearConfig, RepositoryError> {
        let row = sqlx::query(
            "SELECT fiscal_year, social_security_base_ceiling, severance_fund_rate,
                    simplified_flat_rate, professional_draw_fraction, bookkeeping_fee,
                    business_days_per_month, transfer_fee_rate, factor_r_threshold,
                    presumed_profit_margin, corporate_income_tax_rate, corporate_surtax_rate,
                    corporate_surtax_threshold, social_contribution_tax_rate
             FROM fiscal_year_config WHERE fiscal_year = ?",
        )
        .bind(year)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .ok_or(RepositoryError::NotFound)?;

        Ok(FiscalYearConfig {
            fiscal_year: row.try_get("fiscal_year").map_err(db_error)?,
            social_security_base_ceiling: get_decimal(&row, "social_security_base_ceiling")?,
            severance_fund_rate: get_decimal(&row, "severance_fund_rate")?,
            simplified_flat_rate: get_decimal(&row, "simplified_flat_rate")?,
            professional_draw_fraction: get_decimal(&row, "professional_draw_fraction")?,
            bookkeeping_fee: get_decimal(&row, "bookkeeping_fee")?,
            business_days_per_month: row.try_get("business_days_per_month").map_err(db_error)?,
            transfer_fee_rate: get_decimal(&row, "transfer_fee_rate")?,
            factor_r_threshold: get_decimal(&row, "factor_r_threshold")?,
            presumed_profit_margin: get_decimal(&row, "presumed_profit_margin")?,
            corporate_income_tax_rate: get_decimal(&row, "corporate_income_tax_rate")?,
            corporate_surtax_rate: get_decimal(&row, "corporate_surtax_rate")?,
            corporate_surtax_threshold: get_decimal(&row, "corporate_surtax_threshold")?,
            social_contribution_tax_rate: get_decimal(&row, "social_contribution_tax_rate")?,
        })
    }

    async fn list_fiscal_years(&self) -> Result<Vec<i32>, RepositoryError> {
        let rows = sqlx::query("SELECT fiscal_year FROM fiscal_year_config ORDER BY fiscal_year DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        rows.iter()
            .map(|row| row.try_get("fiscal_year").map_err(db_error))
            .collect()
    }

    async fn get_tax_brackets(
        &self,
        fiscal_year: i32,
        table: BracketTableCode,
    ) -> Result<Vec<TaxBracket>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT fiscal_year, table_code, upper_bound, rate, deduction
             FROM tax_brackets
             WHERE fiscal_year = ? AND table_code = ?
             ORDER BY CAST(rate AS REAL)",
        )
        .bind(fiscal_year)
        .bind(table.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.iter().map(row_to_tax_bracket).collect()
    }

    async fn list_tax_brackets(
        &self,
        fiscal_year: i32,
    ) -> Result<Vec<TaxBracket>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT fiscal_year, table_code, upper_bound, rate, deduction
             FROM tax_brackets
             WHERE fiscal_year = ?
             ORDER BY table_code, CAST(rate AS REAL)",
        )
        .bind(fiscal_year)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.iter().map(row_to_tax_bracket).collect()
    }

    async fn insert_tax_bracket(
        &self,
        bracket: &TaxBracket,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO tax_brackets (fiscal_year, table_code, upper_bound, rate, deduction)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(bracket.fiscal_year)
        .bind(bracket.table_code.as_str())
        .bind(bracket.upper_bound.map(decimal_to_text))
        .bind(decimal_to_text(bracket.rate))
        .bind(decimal_to_text(bracket.deduction))
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(())
    }

    async fn delete_tax_brackets(
        &self,
        fiscal_year: i32,
        table: BracketTableCode,
    ) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM tax_brackets WHERE fiscal_year = ? AND table_code = ?")
            .bind(fiscal_year)
            .bind(table.as_str())
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(())
    }
}
