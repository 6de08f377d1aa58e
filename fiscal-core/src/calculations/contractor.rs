//! Contractor (PJ) net income under a flat simplified-regime rate.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::calculations::common::round_half_up;
use crate::calculations::schedule::FiscalSchedule;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractorInput {
    /// Monthly revenue invoiced by the contractor's company.
    pub gross_revenue: Decimal,
    /// Monthly accounting fee paid by the company.
    pub bookkeeping_fee: Decimal,
    /// Untaxed benefits negotiated alongside the contract, per month.
    pub non_statutory_benefits_monthly: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractorResult {
    pub gross_revenue: Decimal,
    pub simplified_regime_tax: Decimal,
    pub professional_draw: Decimal,
    pub social_contribution_on_draw: Decimal,
    pub income_withholding_on_draw: Decimal,
    pub bookkeeping_fee: Decimal,
    pub net_income: Decimal,
    pub non_statutory_benefits_monthly: Decimal,
    pub annualized_total_compensation: Decimal,
}

/// Computes contractor take-home pay.
///
/// The simplified-regime tax here is a flat percentage of revenue, not the
/// progressive annex lookup used by the cross-border calculator.
pub struct ContractorCalculator<'a> {
    schedule: &'a FiscalSchedule,
}

impl<'a> ContractorCalculator<'a> {
    pub fn new(schedule: &'a FiscalSchedule) -> Self {
        Self { schedule }
    }

    /// # Example
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use fiscal_core::calculations::{ContractorCalculator, ContractorInput, FiscalSchedule};
    ///
    /// let schedule = FiscalSchedule::year_2025();
    /// let result = ContractorCalculator::new(&schedule).calculate(&ContractorInput {
    ///     gross_revenue: dec!(6000.00),
    ///     bookkeeping_fee: dec!(249.00),
    ///     non_statutory_benefits_monthly: dec!(0),
    /// });
    ///
    /// assert_eq!(result.simplified_regime_tax, dec!(360.00));
    /// assert_eq!(result.net_income, dec!(5262.57));
    /// ```
    pub fn calculate(
        &self,
        input: &ContractorInput,
    ) -> ContractorResult {
        let config = self.schedule.config();
        let gross_revenue = round_half_up(input.gross_revenue);
        let bookkeeping_fee = round_half_up(input.bookkeeping_fee);
        let non_statutory_benefits_monthly = round_half_up(input.non_statutory_benefits_monthly);

        let simplified_regime_tax = round_half_up(gross_revenue * config.simplified_flat_rate);
        let professional_draw = round_half_up(gross_revenue * config.professional_draw_fraction);

        let social_contribution_on_draw = self.schedule.social_security().evaluate(professional_draw);
        let income_withholding_on_draw = self
            .schedule
            .income_tax()
            .evaluate(professional_draw - social_contribution_on_draw);

        let net_income = gross_revenue
            - simplified_regime_tax
            - bookkeeping_fee
            - social_contribution_on_draw
            - income_withholding_on_draw;
        if net_income < Decimal::ZERO && gross_revenue > Decimal::ZERO {
            warn!(
                %gross_revenue,
                %bookkeeping_fee,
                %net_income,
                "Fixed costs exceed contractor revenue"
            );
        }

        let annualized_total_compensation =
            round_half_up((net_income + non_statutory_benefits_monthly) * Decimal::from(12));

        ContractorResult {
            gross_revenue,
            simplified_regime_tax,
            professional_draw,
            social_contribution_on_draw,
            income_withholding_on_draw,
            bookkeeping_fee,
            net_income,
            non_statutory_benefits_monthly,
            annualized_total_compensation,
        }
    }
}
