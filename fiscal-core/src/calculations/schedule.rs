//! One fiscal year's worth of reference data.
//!
//! A [`FiscalSchedule`] bundles the scalar [`FiscalYearConfig`] with the five
//! progressive tables the engines consult. Engines only ever read from a
//! schedule, so moving to a new year is a matter of loading different data.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::debug;

use crate::calculations::bracket_table::{BracketTable, BracketTableError};
use crate::models::{BracketTableCode, FiscalConfigError, FiscalYearConfig, TaxBracket};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("invalid fiscal year configuration: {0}")]
    Config(#[from] FiscalConfigError),

    #[error("fiscal year {fiscal_year} has no {code} table")]
    MissingTable {
        code: &'static str,
        fiscal_year: i32,
    },

    #[error("{code} table supplied more than once")]
    DuplicateTable { code: &'static str },

    #[error("{code} data belongs to fiscal year {found}, expected {expected}")]
    YearMismatch {
        code: &'static str,
        expected: i32,
        found: i32,
    },

    #[error(transparent)]
    Table(#[from] BracketTableError),
}

/// Configuration plus every bracket table for a single fiscal year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiscalSchedule {
    config: FiscalYearConfig,
    social_security: BracketTable,
    income_tax: BracketTable,
    owner_draw_social_security: BracketTable,
    simples_annex_iii: BracketTable,
    simples_annex_v: BracketTable,
}

impl FiscalSchedule {
    /// Assembles a schedule from already-built tables.
    ///
    /// # Errors
    ///
    /// Fails when the configuration is invalid, a table is missing or
    /// supplied twice, belongs to another year, or breaks its invariants.
    pub fn new(
        config: FiscalYearConfig,
        tables: Vec<BracketTable>,
    ) -> Result<Self, ScheduleError> {
        config.validate()?;

        let mut by_code = BTreeMap::new();
        for table in tables {
            let code = table.code();
            if table.fiscal_year() != config.fiscal_year {
                return Err(ScheduleError::YearMismatch {
                    code: code.as_str(),
                    expected: config.fiscal_year,
                    found: table.fiscal_year(),
                });
            }
            table.validate()?;
            if by_code.insert(code, table).is_some() {
                return Err(ScheduleError::DuplicateTable {
                    code: code.as_str(),
                });
            }
        }

        let fiscal_year = config.fiscal_year;
        let mut take = |code: BracketTableCode| {
            by_code
                .remove(&code)
                .ok_or(ScheduleError::MissingTable {
                    code: code.as_str(),
                    fiscal_year,
                })
        };

        Ok(Self {
            social_security: take(BracketTableCode::SocialSecurity)?,
            income_tax: take(BracketTableCode::IncomeTax)?,
            owner_draw_social_security: take(BracketTableCode::OwnerDrawSocialSecurity)?,
            simples_annex_iii: take(BracketTableCode::SimplesAnnexIii)?,
            simples_annex_v: take(BracketTableCode::SimplesAnnexV)?,
            config,
        })
    }

    /// Assembles a schedule from flat bracket rows, as stored in a repository.
    ///
    /// Rows are grouped by table and ordered by upper bound with the
    /// unbounded row last. The contribution ceiling from `config` is attached
    /// to the social-security tables.
    ///
    /// # Errors
    ///
    /// See [`FiscalSchedule::new`].
    pub fn from_brackets(
        config: FiscalYearConfig,
        brackets: Vec<TaxBracket>,
    ) -> Result<Self, ScheduleError> {
        let mut grouped: BTreeMap<BracketTableCode, Vec<TaxBracket>> = BTreeMap::new();
        for bracket in brackets {
            if bracket.fiscal_year != config.fiscal_year {
                return Err(ScheduleError::YearMismatch {
                    code: bracket.table_code.as_str(),
                    expected: config.fiscal_year,
                    found: bracket.fiscal_year,
                });
            }
            grouped.entry(bracket.table_code).or_default().push(bracket);
        }

        let mut tables = Vec::with_capacity(grouped.len());
        for (code, mut rows) in grouped {
            rows.sort_by(|a, b| match (a.upper_bound, b.upper_bound) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => a.rate.cmp(&b.rate),
            });
            let ceiling = code
                .uses_contribution_ceiling()
                .then_some(config.social_security_base_ceiling);
            debug!(
                table = code.as_str(),
                rows = rows.len(),
                "Assembling bracket table"
            );
            tables.push(BracketTable::new(code, config.fiscal_year, rows, ceiling)?);
        }

        Self::new(config, tables)
    }

    /// Published 2025 parameters and tables.
    pub fn year_2025() -> Self {
        let config = FiscalYearConfig::year_2025();
        let year = config.fiscal_year;
        let ceiling = Some(config.social_security_base_ceiling);

        let table = |code, rows: &[(Option<Decimal>, Decimal, Decimal)], ceiling| {
            BracketTable::from_parts(code, year, BracketTable::rows(code, year, rows), ceiling)
        };
        let money = |cents: i64| Decimal::new(cents, 2);
        let rate = |value: i64, scale: u32| Decimal::new(value, scale);

        Self {
            social_security: table(
                BracketTableCode::SocialSecurity,
                &[
                    (Some(money(151800)), rate(75, 3), Decimal::ZERO),
                    (Some(money(279388)), rate(9, 2), money(2277)),
                    (Some(money(419083)), rate(12, 2), money(10659)),
                    (None, rate(14, 2), money(19040)),
                ],
                ceiling,
            ),
            income_tax: table(
                BracketTableCode::IncomeTax,
                &[
                    (Some(money(225920)), Decimal::ZERO, Decimal::ZERO),
                    (Some(money(282665)), rate(75, 3), money(16944)),
                    (Some(money(375105)), rate(15, 2), money(38144)),
                    (Some(money(466468)), rate(225, 3), money(66277)),
                    (None, rate(275, 3), money(89600)),
                ],
                None,
            ),
            owner_draw_social_security: table(
                BracketTableCode::OwnerDrawSocialSecurity,
                &[(None, rate(11, 2), Decimal::ZERO)],
                ceiling,
            ),
            simples_annex_iii: table(
                BracketTableCode::SimplesAnnexIii,
                &[
                    (Some(money(18000000)), rate(6, 2), Decimal::ZERO),
                    (Some(money(36000000)), rate(112, 3), money(936000)),
                    (Some(money(72000000)), rate(135, 3), money(1764000)),
                    (Some(money(180000000)), rate(16, 2), money(3564000)),
                    (Some(money(360000000)), rate(21, 2), money(12564000)),
                    (None, rate(33, 2), money(64800000)),
                ],
                None,
            ),
            simples_annex_v: table(
                BracketTableCode::SimplesAnnexV,
                &[
                    (Some(money(18000000)), rate(155, 3), Decimal::ZERO),
                    (Some(money(36000000)), rate(18, 2), money(450000)),
                    (Some(money(72000000)), rate(195, 3), money(990000)),
                    (Some(money(180000000)), rate(205, 3), money(1710000)),
                    (Some(money(360000000)), rate(23, 2), money(6210000)),
                    (None, rate(305, 3), money(54000000)),
                ],
                None,
            ),
            config,
        }
    }

    pub fn config(&self) -> &FiscalYearConfig {
        &self.config
    }

    pub fn fiscal_year(&self) -> i32 {
        self.config.fiscal_year
    }

    pub fn social_security(&self) -> &BracketTable {
        &self.social_security
    }

    pub fn income_tax(&self) -> &BracketTable {
        &self.income_tax
    }

    pub fn owner_draw_social_security(&self) -> &BracketTable {
        &self.owner_draw_social_security
    }

    pub fn simples_annex_iii(&self) -> &BracketTable {
        &self.simples_annex_iii
    }

    pub fn simples_annex_v(&self) -> &BracketTable {
        &self.simples_annex_v
    }

    /// Looks a table up by its code.
    pub fn table(
        &self,
        code: BracketTableCode,
    ) -> &BracketTable {
        match code {
            BracketTableCode::SocialSecurity => &self.social_security,
            BracketTableCode::IncomeTax => &self.income_tax,
            BracketTableCode::OwnerDrawSocialSecurity => &self.owner_draw_social_security,
            BracketTableCode::SimplesAnnexIii => &self.simples_annex_iii,
            BracketTableCode::SimplesAnnexV => &self.simples_annex_v,
        }
    }

    /// Every table, in [`BracketTableCode::ALL`] order.
    pub fn tables(&self) -> impl Iterator<Item = &BracketTable> {
        BracketTableCode::ALL.into_iter().map(|code| self.table(code))
    }

    /// Every bracket row of the schedule, flattened for persistence.
    pub fn brackets(&self) -> Vec<TaxBracket> {
        self.tables()
            .flat_map(|table| table.brackets().iter().cloned())
            .collect()
    }
}

impl Default for FiscalSchedule {
    fn default() -> Self {
        Self::year_2025()
    }
}
