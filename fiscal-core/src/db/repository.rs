use async_trait::async_trait;
use thiserror::Error;

use crate::models::{BracketTableCode, FiscalYearConfig, TaxBracket};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Read/write access to year-versioned reference data.
///
/// Calculation results are never stored; only the parameters and bracket
/// tables the engines consume live behind this trait.
#[async_trait]
pub trait FiscalRepository: Send + Sync {
    // Fiscal year config
    async fn get_fiscal_year_config(&self, year: i32) -> Result<FiscalYearConfig, RepositoryError>;
    async fn list_fiscal_years(&self) -> Result<Vec<i32>, RepositoryError>;

    // Bracket tables
    async fn get_tax_brackets(
        &self,
        fiscal_year: i32,
        table: BracketTableCode,
    ) -> Result<Vec<TaxBracket>, RepositoryError>;

    async fn list_tax_brackets(&self, fiscal_year: i32) -> Result<Vec<TaxBracket>, RepositoryError>;

    async fn insert_tax_bracket(&self, bracket: &TaxBracket) -> Result<(), RepositoryError>;

    async fn delete_tax_brackets(
        &self,
        fiscal_year: i32,
        table: BracketTableCode,
    ) -> Result<(), RepositoryError>;
}
