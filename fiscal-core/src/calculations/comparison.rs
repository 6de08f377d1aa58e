//! Side-by-side CLT (payroll) vs PJ (contractor) comparison.
//!
//! Both engines are fed the **same** gross amount: once as a salary, once as
//! contractor revenue. Real offers rarely carry identical gross figures in
//! both modes; the comparison keeps this simplification and reports it
//! through [`EmploymentComparison::SAME_GROSS_ASSUMPTION`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::calculations::common::round_half_up;
use crate::calculations::contractor::{ContractorCalculator, ContractorInput, ContractorResult};
use crate::calculations::payroll::{PayrollCalculator, PayrollResult};
use crate::calculations::schedule::FiscalSchedule;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ComparisonError {
    #[error("gross amount must be positive, got {0}")]
    NonPositiveGross(Decimal),
}

/// Untaxed benefits offered with a position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenefitsInput {
    /// Meal allowance per business day (vale-refeição).
    pub daily_meal_allowance: Decimal,
    /// Monthly food allowance (vale-alimentação).
    pub monthly_food_allowance: Decimal,
    /// Employer's monthly health-plan contribution.
    pub monthly_health_plan: Decimal,
    pub monthly_other_benefits: Decimal,
}

impl BenefitsInput {
    /// Monthly value of all benefits, with the daily meal allowance spread
    /// over a fixed number of business days.
    pub fn monthly_total(
        &self,
        business_days_per_month: i32,
    ) -> Decimal {
        round_half_up(
            self.daily_meal_allowance * Decimal::from(business_days_per_month)
                + self.monthly_food_allowance
                + self.monthly_health_plan
                + self.monthly_other_benefits,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmploymentComparison {
    pub gross_amount: Decimal,
    pub non_statutory_benefits_monthly: Decimal,
    pub payroll: PayrollResult,
    pub contractor: ContractorResult,
}

impl EmploymentComparison {
    pub const SAME_GROSS_ASSUMPTION: &'static str = "The same gross amount is used as CLT salary and as PJ revenue; \
         actual offers usually differ between the two modes.";

    /// Contractor annual compensation minus payroll annual compensation.
    /// Positive means the contractor arrangement pays more.
    pub fn annual_difference(&self) -> Decimal {
        self.contractor.annualized_total_compensation - self.payroll.annualized_total_compensation
    }
}

/// Runs the payroll and contractor engines on one gross amount.
pub struct EmploymentComparator<'a> {
    schedule: &'a FiscalSchedule,
}

impl<'a> EmploymentComparator<'a> {
    pub fn new(schedule: &'a FiscalSchedule) -> Self {
        Self { schedule }
    }

    /// Compares both employment modes.
    ///
    /// # Errors
    ///
    /// Returns [`ComparisonError::NonPositiveGross`] when `gross_amount <= 0`;
    /// nothing is computed in that case.
    ///
    /// # Example
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use fiscal_core::calculations::{BenefitsInput, EmploymentComparator, FiscalSchedule};
    ///
    /// let schedule = FiscalSchedule::year_2025();
    /// let comparison = EmploymentComparator::new(&schedule)
    ///     .compare(dec!(6000.00), &BenefitsInput::default())
    ///     .unwrap();
    ///
    /// assert_eq!(comparison.payroll.net_salary, dec!(4775.04));
    /// assert_eq!(comparison.contractor.net_income, dec!(5262.57));
    /// ```
    pub fn compare(
        &self,
        gross_amount: Decimal,
        benefits: &BenefitsInput,
    ) -> Result<EmploymentComparison, ComparisonError> {
        if gross_amount <= Decimal::ZERO {
            return Err(ComparisonError::NonPositiveGross(gross_amount));
        }

        let config = self.schedule.config();
        let non_statutory_benefits_monthly =
            benefits.monthly_total(config.business_days_per_month);

        let payroll =
            PayrollCalculator::new(self.schedule).calculate(gross_amount, non_statutory_benefits_monthly);
        let contractor = ContractorCalculator::new(self.schedule).calculate(&ContractorInput {
            gross_revenue: gross_amount,
            bookkeeping_fee: config.bookkeeping_fee,
            non_statutory_benefits_monthly,
        });

        debug!(
            %gross_amount,
            payroll_annual = %payroll.annualized_total_compensation,
            contractor_annual = %contractor.annualized_total_compensation,
            "Compared employment modes"
        );

        Ok(EmploymentComparison {
            gross_amount: payroll.gross_salary,
            non_statutory_benefits_monthly,
            payroll,
            contractor,
        })
    }
}
