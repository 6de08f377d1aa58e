use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when a fiscal-year configuration holds out-of-range values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FiscalConfigError {
    /// A rate that must be a fraction in [0, 1] is outside that range.
    #[error("{name} must be between 0 and 1, got {value}")]
    RateOutOfRange { name: &'static str, value: Decimal },

    /// An amount that must be strictly positive is zero or negative.
    #[error("{name} must be positive, got {value}")]
    NonPositiveAmount { name: &'static str, value: Decimal },

    /// An amount that must be non-negative is negative.
    #[error("{name} must be non-negative, got {value}")]
    NegativeAmount { name: &'static str, value: Decimal },

    /// Business days per month must fall within a calendar month.
    #[error("business days per month must be between 1 and 31, got {0}")]
    InvalidBusinessDays(i32),

    /// The Factor-R threshold is a percentage in (0, 100].
    #[error("factor-R threshold must be between 0 and 100, got {0}")]
    InvalidFactorRThreshold(Decimal),
}

/// Scalar parameters for one fiscal year.
///
/// Together with the bracket tables these are the only inputs the engines
/// take besides the user's numbers. Swapping in a new year means swapping
/// this record and its tables; no engine code changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiscalYearConfig {
    pub fiscal_year: i32,

    /// Maximum monthly base subject to social-security contribution ("teto").
    pub social_security_base_ceiling: Decimal,

    /// Monthly severance-fund (FGTS) deposit as a fraction of gross salary.
    pub severance_fund_rate: Decimal,

    /// Flat Simples Nacional rate used by the CLT vs PJ comparison.
    pub simplified_flat_rate: Decimal,

    /// Professional draw as a fraction of revenue in the CLT vs PJ comparison.
    pub professional_draw_fraction: Decimal,

    /// Monthly bookkeeping fee charged to a contractor company.
    pub bookkeeping_fee: Decimal,

    /// Business days used to turn a daily meal allowance into a monthly one.
    pub business_days_per_month: i32,

    /// Fee charged by the platform that brings foreign income into the country.
    pub transfer_fee_rate: Decimal,

    /// Factor-R percentage at or above which Annex III applies.
    pub factor_r_threshold: Decimal,

    /// Share of revenue presumed to be profit under Lucro Presumido.
    pub presumed_profit_margin: Decimal,

    /// IRPJ rate on presumed profit.
    pub corporate_income_tax_rate: Decimal,

    /// IRPJ surtax rate on presumed profit above the monthly threshold.
    pub corporate_surtax_rate: Decimal,

    /// Monthly presumed profit above which the IRPJ surtax applies.
    pub corporate_surtax_threshold: Decimal,

    /// CSLL rate on presumed profit.
    pub social_contribution_tax_rate: Decimal,
}

impl FiscalYearConfig {
    /// Parameters in force for 2025.
    pub fn year_2025() -> Self {
        Self {
            fiscal_year: 2025,
            social_security_base_ceiling: Decimal::new(815741, 2),
            severance_fund_rate: Decimal::new(8, 2),
            simplified_flat_rate: Decimal::new(6, 2),
            professional_draw_fraction: Decimal::new(28, 2),
            bookkeeping_fee: Decimal::new(24900, 2),
            business_days_per_month: 22,
            transfer_fee_rate: Decimal::new(5, 3),
            factor_r_threshold: Decimal::from(28),
            presumed_profit_margin: Decimal::new(32, 2),
            corporate_income_tax_rate: Decimal::new(15, 2),
            corporate_surtax_rate: Decimal::new(10, 2),
            corporate_surtax_threshold: Decimal::new(2000000, 2),
            social_contribution_tax_rate: Decimal::new(9, 2),
        }
    }

    /// Validates every field against its legal range.
    ///
    /// # Errors
    ///
    /// Returns the first [`FiscalConfigError`] found.
    pub fn validate(&self) -> Result<(), FiscalConfigError> {
        let rates = [
            ("severance fund rate", self.severance_fund_rate),
            ("simplified flat rate", self.simplified_flat_rate),
            ("professional draw fraction", self.professional_draw_fraction),
            ("transfer fee rate", self.transfer_fee_rate),
            ("presumed profit margin", self.presumed_profit_margin),
            ("corporate income tax rate", self.corporate_income_tax_rate),
            ("corporate surtax rate", self.corporate_surtax_rate),
            ("social contribution tax rate", self.social_contribution_tax_rate),
        ];
        for (name, value) in rates {
            if value < Decimal::ZERO || value > Decimal::ONE {
                return Err(FiscalConfigError::RateOutOfRange { name, value });
            }
        }

        if self.social_security_base_ceiling <= Decimal::ZERO {
            return Err(FiscalConfigError::NonPositiveAmount {
                name: "social security base ceiling",
                value: self.social_security_base_ceiling,
            });
        }
        if self.bookkeeping_fee < Decimal::ZERO {
            return Err(FiscalConfigError::NegativeAmount {
                name: "bookkeeping fee",
                value: self.bookkeeping_fee,
            });
        }
        if self.corporate_surtax_threshold < Decimal::ZERO {
            return Err(FiscalConfigError::NegativeAmount {
                name: "corporate surtax threshold",
                value: self.corporate_surtax_threshold,
            });
        }
        if !(1..=31).contains(&self.business_days_per_month) {
            return Err(FiscalConfigError::InvalidBusinessDays(
                self.business_days_per_month,
            ));
        }
        if self.factor_r_threshold <= Decimal::ZERO
            || self.factor_r_threshold > Decimal::ONE_HUNDRED
        {
            return Err(FiscalConfigError::InvalidFactorRThreshold(
                self.factor_r_threshold,
            ));
        }
        Ok(())
    }
}
