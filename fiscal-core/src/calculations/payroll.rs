//! Payroll (CLT) withholding and benefit accruals.
//!
//! | Line                       | Computation                                           |
//! |----------------------------|-------------------------------------------------------|
//! | Social contribution        | INSS table on gross                                   |
//! | Income withholding         | IRRF table on gross − social contribution             |
//! | Net salary                 | gross − social contribution − income withholding      |
//! | 13th month (net)           | gross/2 + (gross/2 − INSS' − IRRF') on the full gross |
//! | Vacation (net)             | base = gross + gross/3, minus its own INSS and IRRF   |
//! | Severance fund (annual)    | gross × FGTS rate × 12                                |
//! | Total benefits (monthly)   | (FGTS + 13th + vacation) / 12 + non-statutory         |
//! | Annualized compensation    | (net salary + total benefits) × 12                    |
//!
//! Non-statutory benefits (meal and food allowances, health plan) are never
//! taxed and never folded into the net salary.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::calculations::common::round_half_up;
use crate::calculations::schedule::FiscalSchedule;

/// Output of [`PayrollCalculator::calculate`]. All amounts are in centavos precision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollResult {
    pub gross_salary: Decimal,
    pub social_contribution: Decimal,
    pub income_withholding: Decimal,
    pub net_salary: Decimal,
    pub annual_severance_accrual: Decimal,
    pub thirteenth_month_net: Decimal,
    pub vacation_net: Decimal,
    pub non_statutory_benefits_monthly: Decimal,
    pub total_benefits_monthly: Decimal,
    pub annualized_total_compensation: Decimal,
}

/// Withholding on one salary-like payment.
struct Withholding {
    social_contribution: Decimal,
    income_withholding: Decimal,
}

impl Withholding {
    fn total(&self) -> Decimal {
        self.social_contribution + self.income_withholding
    }
}

/// Computes employee payroll figures against one fiscal year.
pub struct PayrollCalculator<'a> {
    schedule: &'a FiscalSchedule,
}

impl<'a> PayrollCalculator<'a> {
    pub fn new(schedule: &'a FiscalSchedule) -> Self {
        Self { schedule }
    }

    /// Runs the full payroll computation.
    ///
    /// A zero or negative gross salary yields zero withholding; callers are
    /// expected to reject it before presenting results.
    ///
    /// # Example
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use fiscal_core::calculations::{FiscalSchedule, PayrollCalculator};
    ///
    /// let schedule = FiscalSchedule::year_2025();
    /// let result = PayrollCalculator::new(&schedule).calculate(dec!(6000.00), dec!(0));
    ///
    /// assert_eq!(result.social_contribution, dec!(649.60));
    /// assert_eq!(result.income_withholding, dec!(575.36));
    /// assert_eq!(result.net_salary, dec!(4775.04));
    /// ```
    pub fn calculate(
        &self,
        gross_salary: Decimal,
        non_statutory_benefits_monthly: Decimal,
    ) -> PayrollResult {
        if gross_salary < Decimal::ZERO {
            warn!(%gross_salary, "Negative gross salary; withholding evaluates to zero");
        }

        let gross_salary = round_half_up(gross_salary);
        let non_statutory_benefits_monthly = round_half_up(non_statutory_benefits_monthly);

        let regular = self.withholding(gross_salary);
        let net_salary = gross_salary - regular.total();

        let thirteenth_month_net = self.thirteenth_month_net(gross_salary);
        let vacation_net = self.vacation_net(gross_salary);
        let annual_severance_accrual = self.annual_severance_accrual(gross_salary);

        let total_benefits_monthly = round_half_up(
            (annual_severance_accrual + thirteenth_month_net + vacation_net) / Decimal::from(12),
        ) + non_statutory_benefits_monthly;

        let annualized_total_compensation =
            round_half_up((net_salary + total_benefits_monthly) * Decimal::from(12));

        PayrollResult {
            gross_salary,
            social_contribution: regular.social_contribution,
            income_withholding: regular.income_withholding,
            net_salary,
            annual_severance_accrual,
            thirteenth_month_net,
            vacation_net,
            non_statutory_benefits_monthly,
            total_benefits_monthly,
            annualized_total_compensation,
        }
    }

    /// INSS on the base, then IRRF on what remains.
    fn withholding(
        &self,
        base: Decimal,
    ) -> Withholding {
        let social_contribution = self.schedule.social_security().evaluate(base);
        let income_withholding = self
            .schedule
            .income_tax()
            .evaluate(base - social_contribution);
        Withholding {
            social_contribution,
            income_withholding,
        }
    }

    /// First installment is paid without withholding; the second bears the
    /// withholding computed on the full amount.
    fn thirteenth_month_net(
        &self,
        gross_salary: Decimal,
    ) -> Decimal {
        let withholding = self.withholding(gross_salary);
        let first_installment = round_half_up(gross_salary / Decimal::TWO);
        let second_installment = gross_salary - first_installment - withholding.total();
        first_installment + second_installment
    }

    fn vacation_net(
        &self,
        gross_salary: Decimal,
    ) -> Decimal {
        let base = round_half_up(gross_salary + gross_salary / Decimal::from(3));
        base - self.withholding(base).total()
    }

    fn annual_severance_accrual(
        &self,
        gross_salary: Decimal,
    ) -> Decimal {
        round_half_up(gross_salary * self.schedule.config().severance_fund_rate * Decimal::from(12))
    }
}
