//! Plain-text reports printed by the `fiscal` binary.

use std::fmt::{self, Display};

use fiscal_core::calculations::{CrossBorderResult, EmploymentComparison, FiscalSchedule};
use fiscal_core::exchange::{RateQuote, RateSource};
use rust_decimal::Decimal;

use crate::utils::{format_brl, format_number, format_percent};

fn heading(
    f: &mut fmt::Formatter<'_>,
    title: &str,
) -> fmt::Result {
    writeln!(f, "{title}")?;
    writeln!(f, "{}", "-".repeat(title.chars().count()))
}

fn row(
    f: &mut fmt::Formatter<'_>,
    label: &str,
    value: impl Display,
) -> fmt::Result {
    writeln!(f, "  {label:<32}{value:>18}")
}

fn money_row(
    f: &mut fmt::Formatter<'_>,
    label: &str,
    amount: Decimal,
) -> fmt::Result {
    row(f, label, format_brl(amount))
}

/// CLT vs PJ side by side for one gross amount.
pub struct ComparisonReport<'a>(pub &'a EmploymentComparison);

impl Display for ComparisonReport<'_> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let comparison = self.0;
        let payroll = &comparison.payroll;
        let contractor = &comparison.contractor;

        heading(
            f,
            &format!("CLT vs PJ for {} per month", format_brl(comparison.gross_amount)),
        )?;
        writeln!(f)?;

        writeln!(f, "CLT (employee)")?;
        money_row(f, "Gross salary", payroll.gross_salary)?;
        money_row(f, "INSS", payroll.social_contribution)?;
        money_row(f, "IRRF", payroll.income_withholding)?;
        money_row(f, "Net salary", payroll.net_salary)?;
        money_row(f, "13th salary (net)", payroll.thirteenth_month_net)?;
        money_row(f, "Vacation + 1/3 (net)", payroll.vacation_net)?;
        money_row(f, "FGTS (per year)", payroll.annual_severance_accrual)?;
        money_row(f, "Benefits (per month)", payroll.non_statutory_benefits_monthly)?;
        money_row(f, "All benefits (per month)", payroll.total_benefits_monthly)?;
        money_row(f, "Annual total", payroll.annualized_total_compensation)?;
        writeln!(f)?;

        writeln!(f, "PJ (contractor)")?;
        money_row(f, "Gross revenue", contractor.gross_revenue)?;
        money_row(f, "Simples Nacional", contractor.simplified_regime_tax)?;
        money_row(f, "Pro-labore", contractor.professional_draw)?;
        money_row(f, "INSS on pro-labore", contractor.social_contribution_on_draw)?;
        money_row(f, "IRRF on pro-labore", contractor.income_withholding_on_draw)?;
        money_row(f, "Bookkeeping fee", contractor.bookkeeping_fee)?;
        money_row(f, "Net income", contractor.net_income)?;
        money_row(f, "Benefits (per month)", contractor.non_statutory_benefits_monthly)?;
        money_row(f, "Annual total", contractor.annualized_total_compensation)?;
        writeln!(f)?;

        money_row(f, "Annual difference (PJ - CLT)", comparison.annual_difference())?;
        writeln!(f)?;
        writeln!(f, "Note: {}", EmploymentComparison::SAME_GROSS_ASSUMPTION)
    }
}

/// One line per scenario, for batch runs.
pub struct BatchReport<'a>(pub &'a [(String, EmploymentComparison)]);

impl Display for BatchReport<'_> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        writeln!(
            f,
            "{:<20}{:>18}{:>18}{:>18}{:>18}  {}",
            "Scenario", "Gross", "CLT annual", "PJ annual", "Difference", "Better"
        )?;
        for (label, comparison) in self.0 {
            let difference = comparison.annual_difference();
            let better = match difference.cmp(&Decimal::ZERO) {
                std::cmp::Ordering::Greater => "PJ",
                std::cmp::Ordering::Less => "CLT",
                std::cmp::Ordering::Equal => "-",
            };
            writeln!(
                f,
                "{:<20}{:>18}{:>18}{:>18}{:>18}  {}",
                label,
                format_brl(comparison.gross_amount),
                format_brl(comparison.payroll.annualized_total_compensation),
                format_brl(comparison.contractor.annualized_total_compensation),
                format_brl(difference),
                better
            )?;
        }
        writeln!(f)?;
        writeln!(f, "Note: {}", EmploymentComparison::SAME_GROSS_ASSUMPTION)
    }
}

/// Both tax regimes for one month of foreign income.
pub struct CrossBorderReport<'a> {
    pub result: &'a CrossBorderResult,
    pub quote: &'a RateQuote,
}

impl Display for CrossBorderReport<'_> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let result = self.result;
        let simples = &result.simplified_regime;
        let presumed = &result.presumed_profit_regime;
        let source = match &self.quote.source {
            RateSource::Provider(name) => name.as_str(),
            RateSource::Fallback => "fallback table",
        };

        heading(
            f,
            &format!(
                "Foreign income: {} {}",
                result.currency.symbol(),
                format_number(result.foreign_amount, 2)
            ),
        )?;
        row(
            f,
            &format!("Exchange rate ({source})"),
            format_number(result.exchange_rate, 4),
        )?;
        money_row(f, "Gross in reais", result.gross_domestic_amount)?;
        money_row(f, "Transfer fee", result.transfer_fee)?;
        money_row(f, "Net received", result.net_received)?;
        writeln!(f)?;

        writeln!(
            f,
            "Simples Nacional ({}, Factor-R {}%)",
            simples.annex_used.name(),
            format_number(simples.factor_r, 2)
        )?;
        row(f, "Effective rate", format_percent(simples.effective_rate))?;
        money_row(f, "DAS", simples.corporate_tax)?;
        money_row(f, "INSS on pro-labore", simples.owner_draw_social_contribution)?;
        money_row(f, "IRRF on pro-labore", simples.owner_draw_income_withholding)?;
        money_row(f, "Net amount", simples.net_amount)?;
        writeln!(f)?;

        writeln!(f, "Lucro Presumido")?;
        money_row(f, "Presumed profit base", presumed.presumed_profit_base)?;
        money_row(f, "IRPJ (incl. surtax)", presumed.corporate_income_tax)?;
        money_row(f, "IRPJ surtax", presumed.corporate_income_surtax)?;
        money_row(f, "CSLL", presumed.social_contribution_tax)?;
        money_row(f, "ISS", presumed.municipal_service_tax)?;
        money_row(f, "PIS (exempt)", presumed.pis_tax)?;
        money_row(f, "COFINS (exempt)", presumed.cofins_tax)?;
        money_row(f, "Net amount", presumed.net_amount)?;
        writeln!(f)?;

        let best = if simples.net_amount >= presumed.net_amount {
            "Simples Nacional"
        } else {
            "Lucro Presumido"
        };
        writeln!(f, "Higher net amount: {best}")?;

        let plan = result.recommended_plan();
        writeln!(
            f,
            "Recommended plan: {} ({} per month)",
            plan.name(),
            format_brl(plan.monthly_fee())
        )
    }
}

/// Every bracket table of a fiscal year.
pub struct ScheduleReport<'a>(pub &'a FiscalSchedule);

impl Display for ScheduleReport<'_> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let schedule = self.0;
        for (index, table) in schedule.tables().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            heading(
                f,
                &format!("{} ({})", table.code().description(), schedule.fiscal_year()),
            )?;
            if let Some(ceiling) = table.base_ceiling() {
                writeln!(f, "  base capped at {}", format_brl(ceiling))?;
            }

            let mut lower: Option<Decimal> = None;
            for bracket in table.brackets() {
                let range = match (bracket.upper_bound, lower) {
                    (Some(upper), _) => format!("up to {}", format_brl(upper)),
                    (None, Some(lower)) => format!("above {}", format_brl(lower)),
                    (None, None) => "any amount".to_string(),
                };
                writeln!(
                    f,
                    "  {range:<28}{:>10}   deduction {:>14}",
                    format_percent(bracket.rate),
                    format_brl(bracket.deduction)
                )?;
                lower = bracket.upper_bound;
            }
        }
        Ok(())
    }
}
