use std::collections::BTreeMap;
use std::io::Read;

use fiscal_core::calculations::{BracketTable, BracketTableError};
use fiscal_core::{BracketTableCode, FiscalRepository, RepositoryError, TaxBracket};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur when loading bracket data.
#[derive(Debug, Error)]
pub enum BracketLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Unknown bracket table '{0}'")]
    InvalidTable(String),

    #[error("Invalid bracket table: {0}")]
    InvalidBrackets(#[from] BracketTableError),

    #[error("Fiscal year {0} not found in database (have you run the seeds?)")]
    FiscalYearNotFound(i32),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<csv::Error> for BracketLoaderError {
    fn from(err: csv::Error) -> Self {
        BracketLoaderError::CsvParse(err.to_string())
    }
}

/// A single row of the brackets CSV file.
///
/// - `fiscal_year`: e.g. 2025
/// - `table`: `INSS`, `IRRF`, `INSS_PRO_LABORE`, `SIMPLES_III` or `SIMPLES_V`
/// - `upper_bound`: inclusive upper bound of the row (empty for the last row)
/// - `rate`: marginal rate as a fraction (e.g. 0.075 for 7.5%)
/// - `deduction`: amount subtracted after applying the rate
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BracketRecord {
    pub fiscal_year: i32,
    pub table: String,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub upper_bound: Option<Decimal>,
    pub rate: Decimal,
    pub deduction: Decimal,
}

fn deserialize_optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// Loader for bracket tables from CSV files.
///
/// Works against any [`FiscalRepository`]. Every table in the input is
/// validated before anything is written, so a bad file leaves the database
/// untouched.
pub struct BracketLoader;

impl BracketLoader {
    /// Parse bracket records from any CSV reader.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<BracketRecord>, BracketLoaderError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: BracketRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Group records by `(fiscal_year, table)` and check each group forms a
    /// valid progressive table.
    ///
    /// Rows within a group are ordered by upper bound, unbounded last.
    pub fn validate(
        records: &[BracketRecord],
    ) -> Result<BTreeMap<(i32, BracketTableCode), Vec<TaxBracket>>, BracketLoaderError> {
        let mut groups: BTreeMap<(i32, BracketTableCode), Vec<TaxBracket>> = BTreeMap::new();

        for record in records {
            let table_code = BracketTableCode::parse(record.table.trim())
                .ok_or_else(|| BracketLoaderError::InvalidTable(record.table.clone()))?;
            groups
                .entry((record.fiscal_year, table_code))
                .or_default()
                .push(TaxBracket {
                    fiscal_year: record.fiscal_year,
                    table_code,
                    upper_bound: record.upper_bound,
                    rate: record.rate,
                    deduction: record.deduction,
                });
        }

        for ((fiscal_year, table_code), rows) in groups.iter_mut() {
            rows.sort_by(|a, b| match (a.upper_bound, b.upper_bound) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => a.rate.cmp(&b.rate),
            });
            BracketTable::new(*table_code, *fiscal_year, rows.clone(), None)?;
        }

        Ok(groups)
    }

    /// Load bracket records into the repository.
    ///
    /// For each `(fiscal_year, table)` group the existing rows are deleted
    /// and the new ones inserted, so loading the same file twice gives the
    /// same result. Returns the number of rows inserted.
    pub async fn load<R: FiscalRepository + ?Sized>(
        repo: &R,
        records: &[BracketRecord],
    ) -> Result<usize, BracketLoaderError> {
        let groups = Self::validate(records)?;
        let mut inserted = 0;

        for ((fiscal_year, table_code), rows) in groups {
            repo.get_fiscal_year_config(fiscal_year)
                .await
                .map_err(|e| match e {
                    RepositoryError::NotFound => BracketLoaderError::FiscalYearNotFound(fiscal_year),
                    other => BracketLoaderError::Repository(other),
                })?;

            repo.delete_tax_brackets(fiscal_year, table_code).await?;

            for bracket in &rows {
                repo.insert_tax_bracket(bracket).await.map_err(|e| {
                    if let RepositoryError::Database(ref inner) = e {
                        if inner.contains("FOREIGN KEY constraint failed") {
                            return BracketLoaderError::FiscalYearNotFound(fiscal_year);
                        }
                    }
                    BracketLoaderError::Repository(e)
                })?;
                inserted += 1;
            }

            debug!(fiscal_year, table = table_code.as_str(), rows = rows.len(), "Replaced bracket table");
        }

        info!(inserted, "Bracket tables loaded");
        Ok(inserted)
    }
}
