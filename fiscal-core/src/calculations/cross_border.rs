//! Tax on foreign income received by a Brazilian company.
//!
//! The amount is converted to reais, the transfer platform's fee is taken
//! off, and two regimes are computed side by side:
//!
//! - **Simples Nacional**: Factor-R (professional draw ÷ revenue) selects
//!   Annex III at or above the threshold, Annex V below it. The annex table
//!   is evaluated on twelve months of revenue at the current pace (RBT12) to
//!   get an effective rate, which is then applied to the month's revenue.
//!   Personal tax on the draw is added when the owner contributes to INSS.
//! - **Lucro Presumido**: IRPJ and CSLL on a presumed-profit share of
//!   revenue, plus municipal service tax. PIS and COFINS are zero on
//!   exported services.
//!
//! Neither regime is picked as a winner here.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::calculations::bracket_table::BracketTable;
use crate::calculations::common::{non_negative, round_half_up, round_places};
use crate::calculations::schedule::FiscalSchedule;
use crate::models::{BracketTableCode, CurrencyCode, ServicePlan};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossBorderInput {
    /// Monthly amount invoiced abroad, in `currency`.
    pub foreign_amount: Decimal,
    pub currency: CurrencyCode,
    /// Reais per unit of `currency`.
    pub exchange_rate: Decimal,
    /// Monthly pro-labore drawn by the owner.
    pub professional_draw: Decimal,
    /// ISS rate as a fraction. Callers bound it (0% to 5%); it is used as given.
    pub municipal_service_tax_rate: Decimal,
    /// Whether the owner pays INSS and IRRF on the draw.
    pub contributes_to_social_security: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimplesAnnex {
    AnnexIii,
    AnnexV,
}

impl SimplesAnnex {
    pub fn name(&self) -> &'static str {
        match self {
            Self::AnnexIii => "Anexo III",
            Self::AnnexV => "Anexo V",
        }
    }

    pub fn table_code(&self) -> BracketTableCode {
        match self {
            Self::AnnexIii => BracketTableCode::SimplesAnnexIii,
            Self::AnnexV => BracketTableCode::SimplesAnnexV,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimplifiedRegimeResult {
    pub annex_used: SimplesAnnex,
    /// Draw as a percentage of revenue, to two places.
    pub factor_r: Decimal,
    /// Effective Simples rate for the revenue band, as a fraction.
    pub effective_rate: Decimal,
    pub corporate_tax: Decimal,
    pub owner_draw_social_contribution: Decimal,
    pub owner_draw_income_withholding: Decimal,
    pub personal_tax: Decimal,
    pub net_amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresumedProfitResult {
    pub presumed_profit_base: Decimal,
    /// IRPJ including the surtax.
    pub corporate_income_tax: Decimal,
    /// The surtax portion of `corporate_income_tax`.
    pub corporate_income_surtax: Decimal,
    pub social_contribution_tax: Decimal,
    pub municipal_service_tax: Decimal,
    /// Always zero: exported services are exempt.
    pub pis_tax: Decimal,
    /// Always zero: exported services are exempt.
    pub cofins_tax: Decimal,
    pub net_amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossBorderResult {
    pub currency: CurrencyCode,
    pub foreign_amount: Decimal,
    pub exchange_rate: Decimal,
    pub professional_draw: Decimal,
    pub gross_domestic_amount: Decimal,
    pub transfer_fee: Decimal,
    pub net_received: Decimal,
    pub simplified_regime: SimplifiedRegimeResult,
    pub presumed_profit_regime: PresumedProfitResult,
}

impl CrossBorderResult {
    /// Accounting plan suited to this income profile.
    pub fn recommended_plan(&self) -> ServicePlan {
        ServicePlan::recommend_for_foreign_income(self.net_received, self.professional_draw)
    }
}

pub struct CrossBorderCalculator<'a> {
    schedule: &'a FiscalSchedule,
}

impl<'a> CrossBorderCalculator<'a> {
    pub fn new(schedule: &'a FiscalSchedule) -> Self {
        Self { schedule }
    }

    /// Computes both regimes for one month of foreign income.
    ///
    /// # Example
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use fiscal_core::calculations::{
    ///     CrossBorderCalculator, CrossBorderInput, FiscalSchedule, SimplesAnnex,
    /// };
    /// use fiscal_core::CurrencyCode;
    ///
    /// let schedule = FiscalSchedule::year_2025();
    /// let result = CrossBorderCalculator::new(&schedule).calculate(&CrossBorderInput {
    ///     foreign_amount: dec!(1000),
    ///     currency: CurrencyCode::parse("USD").unwrap(),
    ///     exchange_rate: dec!(5.25),
    ///     professional_draw: dec!(0),
    ///     municipal_service_tax_rate: dec!(0.02),
    ///     contributes_to_social_security: false,
    /// });
    ///
    /// assert_eq!(result.gross_domestic_amount, dec!(5250.00));
    /// assert_eq!(result.transfer_fee, dec!(26.25));
    /// assert_eq!(result.net_received, dec!(5223.75));
    /// assert_eq!(result.simplified_regime.annex_used, SimplesAnnex::AnnexV);
    /// assert_eq!(result.presumed_profit_regime.net_amount, dec!(4741.80));
    /// ```
    pub fn calculate(
        &self,
        input: &CrossBorderInput,
    ) -> CrossBorderResult {
        let config = self.schedule.config();

        let gross_domestic_amount = round_half_up(input.foreign_amount * input.exchange_rate);
        let transfer_fee = round_half_up(gross_domestic_amount * config.transfer_fee_rate);
        let net_received = gross_domestic_amount - transfer_fee;
        let professional_draw = round_half_up(input.professional_draw);

        if gross_domestic_amount <= Decimal::ZERO {
            warn!(
                foreign_amount = %input.foreign_amount,
                exchange_rate = %input.exchange_rate,
                "Non-positive converted amount; Factor-R evaluates to zero"
            );
        }

        let simplified_regime = self.simplified_regime(
            gross_domestic_amount,
            professional_draw,
            input.contributes_to_social_security,
        );
        let presumed_profit_regime =
            self.presumed_profit_regime(gross_domestic_amount, input.municipal_service_tax_rate);

        CrossBorderResult {
            currency: input.currency.clone(),
            foreign_amount: input.foreign_amount,
            exchange_rate: input.exchange_rate,
            professional_draw,
            gross_domestic_amount,
            transfer_fee,
            net_received,
            simplified_regime,
            presumed_profit_regime,
        }
    }

    /// Factor-R in percent, unrounded. Zero when there is no revenue.
    fn factor_r(
        gross: Decimal,
        professional_draw: Decimal,
    ) -> Decimal {
        if gross <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        professional_draw / gross * Decimal::ONE_HUNDRED
    }

    fn annex_table(
        &self,
        annex: SimplesAnnex,
    ) -> &BracketTable {
        self.schedule.table(annex.table_code())
    }

    fn simplified_regime(
        &self,
        gross: Decimal,
        professional_draw: Decimal,
        contributes_to_social_security: bool,
    ) -> SimplifiedRegimeResult {
        let factor_r = Self::factor_r(gross, professional_draw);
        let annex_used = if factor_r >= self.schedule.config().factor_r_threshold {
            SimplesAnnex::AnnexIii
        } else {
            SimplesAnnex::AnnexV
        };

        let twelve_month_revenue = gross * Decimal::from(12);
        let effective_rate = self.annex_table(annex_used).effective_rate(twelve_month_revenue);
        let corporate_tax = round_half_up(non_negative(gross) * effective_rate);

        debug!(
            %factor_r,
            annex = annex_used.name(),
            %effective_rate,
            "Selected Simples Nacional annex"
        );

        let (owner_draw_social_contribution, owner_draw_income_withholding) =
            if contributes_to_social_security {
                let inss = self
                    .schedule
                    .owner_draw_social_security()
                    .evaluate(professional_draw);
                let irrf = self.schedule.income_tax().evaluate(professional_draw - inss);
                (inss, irrf)
            } else {
                (Decimal::ZERO, Decimal::ZERO)
            };
        let personal_tax = owner_draw_social_contribution + owner_draw_income_withholding;

        SimplifiedRegimeResult {
            annex_used,
            factor_r: round_places(factor_r, 2),
            effective_rate,
            corporate_tax,
            owner_draw_social_contribution,
            owner_draw_income_withholding,
            personal_tax,
            net_amount: gross - corporate_tax - personal_tax,
        }
    }

    fn presumed_profit_regime(
        &self,
        gross: Decimal,
        municipal_service_tax_rate: Decimal,
    ) -> PresumedProfitResult {
        let config = self.schedule.config();
        let presumed_profit_base = round_half_up(non_negative(gross) * config.presumed_profit_margin);

        let surtax_base = non_negative(presumed_profit_base - config.corporate_surtax_threshold);
        let corporate_income_surtax = round_half_up(surtax_base * config.corporate_surtax_rate);
        let corporate_income_tax =
            round_half_up(presumed_profit_base * config.corporate_income_tax_rate)
                + corporate_income_surtax;
        let social_contribution_tax =
            round_half_up(presumed_profit_base * config.social_contribution_tax_rate);
        let municipal_service_tax =
            round_half_up(non_negative(gross * municipal_service_tax_rate));

        let net_amount = gross - corporate_income_tax - social_contribution_tax - municipal_service_tax;

        PresumedProfitResult {
            presumed_profit_base,
            corporate_income_tax,
            corporate_income_surtax,
            social_contribution_tax,
            municipal_service_tax,
            pis_tax: Decimal::ZERO,
            cofins_tax: Decimal::ZERO,
            net_amount,
        }
    }
}
