//! Progressive bracket evaluation.
//!
//! A bracket table is an ordered list of `(upper_bound, rate, deduction)`
//! rows. The amount due on a base is `base × rate − deduction` for the first
//! row whose upper bound is at or above the base; the last row has no upper
//! bound. Results are floored at zero: the published deductions keep the
//! formula continuous across rows, but rounding can push a boundary value a
//! centavo below zero.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use fiscal_core::calculations::FiscalSchedule;
//!
//! let schedule = FiscalSchedule::year_2025();
//!
//! // 6000.00 falls in the fourth INSS tier: 6000 × 14% − 190.40
//! assert_eq!(schedule.social_security().evaluate(dec!(6000.00)), dec!(649.60));
//!
//! // The contribution ceiling caps the base at 8157.41
//! assert_eq!(schedule.social_security().evaluate(dec!(20000.00)), dec!(951.64));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calculations::common::{non_negative, round_half_up, round_places};
use crate::models::{BracketTableCode, TaxBracket};

/// Invariant violations detected while assembling a [`BracketTable`].
///
/// These describe malformed reference data, never bad user input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BracketTableError {
    #[error("{code} table for {fiscal_year} has no rows")]
    Empty {
        code: &'static str,
        fiscal_year: i32,
    },

    #[error("{code} table for {fiscal_year}: row {row} belongs to {row_code} {row_year}")]
    ForeignRow {
        code: &'static str,
        fiscal_year: i32,
        row: usize,
        row_code: &'static str,
        row_year: i32,
    },

    #[error("{code} table: upper bound of row {row} does not exceed the previous row")]
    NonIncreasingBound { code: &'static str, row: usize },

    #[error("{code} table: rate of row {row} does not exceed the previous row")]
    NonIncreasingRate { code: &'static str, row: usize },

    #[error("{code} table: rate {rate} of row {row} is outside [0, 1]")]
    RateOutOfRange {
        code: &'static str,
        row: usize,
        rate: Decimal,
    },

    #[error("{code} table: deduction {deduction} of row {row} is negative")]
    NegativeDeduction {
        code: &'static str,
        row: usize,
        deduction: Decimal,
    },

    #[error("{code} table: only the last row may be unbounded (row {row} is unbounded)")]
    UnboundedBeforeLast { code: &'static str, row: usize },

    #[error("{code} table: the last row must be unbounded")]
    BoundedLastRow { code: &'static str },

    #[error("{code} table: base ceiling must be positive, got {ceiling}")]
    InvalidBaseCeiling { code: &'static str, ceiling: Decimal },
}

/// A validated, immutable progressive table for one fiscal year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketTable {
    code: BracketTableCode,
    fiscal_year: i32,
    brackets: Vec<TaxBracket>,
    base_ceiling: Option<Decimal>,
}

impl BracketTable {
    /// Builds a table after checking its ordering invariants.
    ///
    /// `brackets` must be sorted by ascending upper bound with the unbounded
    /// row last. `base_ceiling`, when present, clamps the base before lookup.
    ///
    /// # Errors
    ///
    /// Returns [`BracketTableError`] describing the first violated invariant.
    pub fn new(
        code: BracketTableCode,
        fiscal_year: i32,
        brackets: Vec<TaxBracket>,
        base_ceiling: Option<Decimal>,
    ) -> Result<Self, BracketTableError> {
        let table = Self::from_parts(code, fiscal_year, brackets, base_ceiling);
        table.validate()?;
        Ok(table)
    }

    /// Builds a table without validation. Callers guarantee the invariants.
    pub(crate) fn from_parts(
        code: BracketTableCode,
        fiscal_year: i32,
        brackets: Vec<TaxBracket>,
        base_ceiling: Option<Decimal>,
    ) -> Self {
        Self {
            code,
            fiscal_year,
            brackets,
            base_ceiling,
        }
    }

    /// Shorthand for building rows of one table from `(upper_bound, rate, deduction)`.
    pub(crate) fn rows(
        code: BracketTableCode,
        fiscal_year: i32,
        rows: &[(Option<Decimal>, Decimal, Decimal)],
    ) -> Vec<TaxBracket> {
        rows.iter()
            .map(|&(upper_bound, rate, deduction)| TaxBracket {
                fiscal_year,
                table_code: code,
                upper_bound,
                rate,
                deduction,
            })
            .collect()
    }

    pub fn code(&self) -> BracketTableCode {
        self.code
    }

    pub fn fiscal_year(&self) -> i32 {
        self.fiscal_year
    }

    pub fn brackets(&self) -> &[TaxBracket] {
        &self.brackets
    }

    pub fn base_ceiling(&self) -> Option<Decimal> {
        self.base_ceiling
    }

    /// Checks the table invariants.
    ///
    /// # Errors
    ///
    /// Returns [`BracketTableError`] describing the first violated invariant.
    pub fn validate(&self) -> Result<(), BracketTableError> {
        let code = self.code.as_str();
        let last = match self.brackets.len() {
            0 => {
                return Err(BracketTableError::Empty {
                    code,
                    fiscal_year: self.fiscal_year,
                });
            }
            n => n - 1,
        };

        if let Some(ceiling) = self.base_ceiling {
            if ceiling <= Decimal::ZERO {
                return Err(BracketTableError::InvalidBaseCeiling { code, ceiling });
            }
        }

        for (row, bracket) in self.brackets.iter().enumerate() {
            if bracket.table_code != self.code || bracket.fiscal_year != self.fiscal_year {
                return Err(BracketTableError::ForeignRow {
                    code,
                    fiscal_year: self.fiscal_year,
                    row,
                    row_code: bracket.table_code.as_str(),
                    row_year: bracket.fiscal_year,
                });
            }
            if bracket.rate < Decimal::ZERO || bracket.rate > Decimal::ONE {
                return Err(BracketTableError::RateOutOfRange {
                    code,
                    row,
                    rate: bracket.rate,
                });
            }
            if bracket.deduction < Decimal::ZERO {
                return Err(BracketTableError::NegativeDeduction {
                    code,
                    row,
                    deduction: bracket.deduction,
                });
            }
            match (row == last, bracket.upper_bound) {
                (false, None) => return Err(BracketTableError::UnboundedBeforeLast { code, row }),
                (true, Some(_)) => return Err(BracketTableError::BoundedLastRow { code }),
                _ => {}
            }
        }

        for (row, pair) in self.brackets.windows(2).enumerate() {
            let (previous, current) = (&pair[0], &pair[1]);
            if let (Some(prev_bound), Some(bound)) = (previous.upper_bound, current.upper_bound) {
                if bound <= prev_bound {
                    return Err(BracketTableError::NonIncreasingBound { code, row: row + 1 });
                }
            }
            if current.rate <= previous.rate {
                return Err(BracketTableError::NonIncreasingRate { code, row: row + 1 });
            }
        }

        Ok(())
    }

    /// The base actually subject to the table: negatives count as zero and
    /// the contribution ceiling, if any, caps the rest.
    pub fn taxable_base(
        &self,
        base: Decimal,
    ) -> Decimal {
        let base = non_negative(base);
        match self.base_ceiling {
            Some(ceiling) if base > ceiling => ceiling,
            _ => base,
        }
    }

    /// Selects the row that applies to `base`.
    ///
    /// The first row whose upper bound is at or above the taxable base wins;
    /// anything above the last finite bound falls into the unbounded row.
    pub fn find_bracket(
        &self,
        base: Decimal,
    ) -> &TaxBracket {
        debug_assert!(self.validate().is_ok(), "bracket table invariants violated");

        let base = self.taxable_base(base);
        let last = self.brackets.len() - 1;
        let index = self.brackets[..last]
            .iter()
            .position(|b| b.upper_bound.is_some_and(|bound| base <= bound))
            .unwrap_or(last);
        &self.brackets[index]
    }

    /// Amount due on `base`, rounded to centavos and never negative.
    pub fn evaluate(
        &self,
        base: Decimal,
    ) -> Decimal {
        round_half_up(non_negative(self.raw_amount(base)))
    }

    /// Unrounded `base × rate − deduction` for the applicable row.
    fn raw_amount(
        &self,
        base: Decimal,
    ) -> Decimal {
        let bracket = self.find_bracket(base);
        self.taxable_base(base) * bracket.rate - bracket.deduction
    }

    /// Effective rate on `base`: amount due divided by the base, to six places.
    ///
    /// For a zero or negative base this is the nominal rate of the first row.
    pub fn effective_rate(
        &self,
        base: Decimal,
    ) -> Decimal {
        if base <= Decimal::ZERO {
            return self.brackets[0].rate;
        }
        round_places(non_negative(self.raw_amount(base)) / base, 6)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn bracket(
        upper_bound: Option<Decimal>,
        rate: Decimal,
        deduction: Decimal,
    ) -> TaxBracket {
        TaxBracket {
            fiscal_year: 2025,
            table_code: BracketTableCode::SocialSecurity,
            upper_bound,
            rate,
            deduction,
        }
    }

    fn inss_2025() -> BracketTable {
        BracketTable::new(
            BracketTableCode::SocialSecurity,
            2025,
            vec![
                bracket(Some(dec!(1518.00)), dec!(0.075), dec!(0)),
                bracket(Some(dec!(2793.88)), dec!(0.09), dec!(22.77)),
                bracket(Some(dec!(4190.83)), dec!(0.12), dec!(106.59)),
                bracket(None, dec!(0.14), dec!(190.40)),
            ],
            Some(dec!(8157.41)),
        )
        .expect("2025 INSS table is valid")
    }

    fn irrf_2025() -> BracketTable {
        let rows = BracketTable::rows(
            BracketTableCode::IncomeTax,
            2025,
            &[
                (Some(dec!(2259.20)), dec!(0), dec!(0)),
                (Some(dec!(2826.65)), dec!(0.075), dec!(169.44)),
                (Some(dec!(3751.05)), dec!(0.15), dec!(381.44)),
                (Some(dec!(4664.68)), dec!(0.225), dec!(662.77)),
                (None, dec!(0.275), dec!(896.00)),
            ],
        );
        BracketTable::new(BracketTableCode::IncomeTax, 2025, rows, None)
            .expect("2025 IRRF table is valid")
    }

    // =========================================================================
    // validation
    // =========================================================================

    #[test]
    fn new_rejects_empty_table() {
        let result = BracketTable::new(BracketTableCode::IncomeTax, 2025, vec![], None);

        assert_eq!(
            result,
            Err(BracketTableError::Empty {
                code: "IRRF",
                fiscal_year: 2025
            })
        );
    }

    #[test]
    fn new_rejects_non_increasing_bounds() {
        let result = BracketTable::new(
            BracketTableCode::SocialSecurity,
            2025,
            vec![
                bracket(Some(dec!(2000)), dec!(0.075), dec!(0)),
                bracket(Some(dec!(2000)), dec!(0.09), dec!(30)),
                bracket(None, dec!(0.12), dec!(90)),
            ],
            None,
        );

        assert_eq!(
            result,
            Err(BracketTableError::NonIncreasingBound {
                code: "INSS",
                row: 1
            })
        );
    }

    #[test]
    fn new_rejects_non_increasing_rates() {
        let result = BracketTable::new(
            BracketTableCode::SocialSecurity,
            2025,
            vec![
                bracket(Some(dec!(1000)), dec!(0.09), dec!(0)),
                bracket(None, dec!(0.09), dec!(0)),
            ],
            None,
        );

        assert_eq!(
            result,
            Err(BracketTableError::NonIncreasingRate {
                code: "INSS",
                row: 1
            })
        );
    }

    #[test]
    fn new_rejects_bounded_last_row() {
        let result = BracketTable::new(
            BracketTableCode::SocialSecurity,
            2025,
            vec![bracket(Some(dec!(1000)), dec!(0.075), dec!(0))],
            None,
        );

        assert_eq!(
            result,
            Err(BracketTableError::BoundedLastRow { code: "INSS" })
        );
    }

    #[test]
    fn new_rejects_unbounded_middle_row() {
        let result = BracketTable::new(
            BracketTableCode::SocialSecurity,
            2025,
            vec![
                bracket(None, dec!(0.075), dec!(0)),
                bracket(None, dec!(0.09), dec!(0)),
            ],
            None,
        );

        assert_eq!(
            result,
            Err(BracketTableError::UnboundedBeforeLast {
                code: "INSS",
                row: 0
            })
        );
    }

    #[test]
    fn new_rejects_row_from_another_year() {
        let mut stray = bracket(None, dec!(0.14), dec!(190.40));
        stray.fiscal_year = 2024;

        let result = BracketTable::new(BracketTableCode::SocialSecurity, 2025, vec![stray], None);

        assert_eq!(
            result,
            Err(BracketTableError::ForeignRow {
                code: "INSS",
                fiscal_year: 2025,
                row: 0,
                row_code: "INSS",
                row_year: 2024,
            })
        );
    }

    #[test]
    fn new_rejects_rate_above_one() {
        let result = BracketTable::new(
            BracketTableCode::SocialSecurity,
            2025,
            vec![bracket(None, dec!(14), dec!(0))],
            None,
        );

        assert_eq!(
            result,
            Err(BracketTableError::RateOutOfRange {
                code: "INSS",
                row: 0,
                rate: dec!(14)
            })
        );
    }

    #[test]
    fn new_rejects_negative_deduction() {
        let result = BracketTable::new(
            BracketTableCode::SocialSecurity,
            2025,
            vec![bracket(None, dec!(0.14), dec!(-1142.04))],
            None,
        );

        assert_eq!(
            result,
            Err(BracketTableError::NegativeDeduction {
                code: "INSS",
                row: 0,
                deduction: dec!(-1142.04)
            })
        );
    }

    #[test]
    fn new_rejects_non_positive_ceiling() {
        let result = BracketTable::new(
            BracketTableCode::SocialSecurity,
            2025,
            vec![bracket(None, dec!(0.11), dec!(0))],
            Some(dec!(0)),
        );

        assert_eq!(
            result,
            Err(BracketTableError::InvalidBaseCeiling {
                code: "INSS",
                ceiling: dec!(0)
            })
        );
    }

    // =========================================================================
    // evaluate
    // =========================================================================

    #[test]
    fn evaluate_first_tier() {
        assert_eq!(inss_2025().evaluate(dec!(1000.00)), dec!(75.00));
    }

    #[test]
    fn evaluate_upper_bound_is_inclusive() {
        let table = inss_2025();

        assert_eq!(table.find_bracket(dec!(1518.00)).rate, dec!(0.075));
        assert_eq!(table.find_bracket(dec!(1518.01)).rate, dec!(0.09));
    }

    #[test]
    fn evaluate_fourth_tier_for_6000() {
        let table = inss_2025();

        assert_eq!(table.find_bracket(dec!(6000)).rate, dec!(0.14));
        assert_eq!(table.evaluate(dec!(6000)), dec!(649.60));
    }

    #[test]
    fn evaluate_caps_base_at_ceiling() {
        let table = inss_2025();

        assert_eq!(table.evaluate(dec!(8157.41)), dec!(951.64));
        assert_eq!(table.evaluate(dec!(50000)), dec!(951.64));
    }

    #[test]
    fn evaluate_treats_negative_base_as_zero() {
        assert_eq!(inss_2025().evaluate(dec!(-500)), Decimal::ZERO);
        assert_eq!(irrf_2025().evaluate(dec!(-500)), Decimal::ZERO);
    }

    #[test]
    fn evaluate_exempt_tier_is_zero() {
        assert_eq!(irrf_2025().evaluate(dec!(2259.20)), Decimal::ZERO);
    }

    #[test]
    fn evaluate_floors_boundary_rounding_at_zero() {
        let table = BracketTable::new(
            BracketTableCode::IncomeTax,
            2025,
            BracketTable::rows(
                BracketTableCode::IncomeTax,
                2025,
                &[
                    (Some(dec!(1000)), dec!(0), dec!(0)),
                    (None, dec!(0.10), dec!(100.01)),
                ],
            ),
            None,
        )
        .unwrap();

        assert_eq!(table.evaluate(dec!(1000.05)), Decimal::ZERO);
    }

    #[test]
    fn evaluate_is_never_negative_across_range() {
        let inss = inss_2025();
        let irrf = irrf_2025();
        let mut base = Decimal::ZERO;

        while base <= dec!(12000) {
            assert!(inss.evaluate(base) >= Decimal::ZERO, "INSS negative at {base}");
            assert!(irrf.evaluate(base) >= Decimal::ZERO, "IRRF negative at {base}");
            base += dec!(13.37);
        }
    }

    #[test]
    fn evaluate_is_continuous_at_bounds() {
        let epsilon = dec!(0.01);

        for table in [inss_2025(), irrf_2025()] {
            for bracket in table.brackets() {
                let Some(bound) = bracket.upper_bound else {
                    continue;
                };
                let below = table.evaluate(bound - epsilon);
                let above = table.evaluate(bound + epsilon);
                let jump = (above - below).abs();

                // Two centavos of base at the top marginal rate, plus rounding slack.
                assert!(
                    jump <= dec!(0.02),
                    "{} jumps by {jump} at {bound}",
                    table.code().as_str()
                );
            }
        }
    }

    #[test]
    fn evaluate_is_deterministic() {
        let table = irrf_2025();

        assert_eq!(table.evaluate(dec!(5350.40)), table.evaluate(dec!(5350.40)));
        assert_eq!(table.evaluate(dec!(5350.40)), dec!(575.36));
    }

    // =========================================================================
    // effective_rate
    // =========================================================================

    #[test]
    fn effective_rate_below_ceiling_blends_tiers() {
        // 6000 × 14% − 190.40 = 649.60; 649.60 / 6000
        assert_eq!(inss_2025().effective_rate(dec!(6000)), dec!(0.108267));
    }

    #[test]
    fn effective_rate_of_zero_base_is_first_nominal_rate() {
        assert_eq!(inss_2025().effective_rate(dec!(0)), dec!(0.075));
    }
}
