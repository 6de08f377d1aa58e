//! Raw user input and its validation.
//!
//! Forms hold text exactly as typed. `validate_for_submit` turns them into
//! typed requests or a list of field-level messages; the engines never see
//! invalid input.

use std::fmt;

use fiscal_core::CurrencyCode;
use fiscal_core::calculations::{BenefitsInput, CrossBorderInput};
use rust_decimal::Decimal;

use crate::utils::{
    MAX_AMOUNT, ParseAmountError, format_brl, format_number, parse_brl, parse_rate,
};

/// Municipal service-tax percent used when the field is left blank.
const DEFAULT_ISS_PERCENT: Decimal = Decimal::TWO;
/// Statutory maximum municipal service-tax percent.
const MAX_ISS_PERCENT: Decimal = Decimal::from_parts(5, 0, 0, false, 0);

/// Parses `raw` with `parse`, recording a failure in `errors` under `label`.
/// Blank input counts as zero.
fn parse_field(
    raw: &str,
    label: &str,
    parse: fn(&str) -> Result<Decimal, ParseAmountError>,
    errors: &mut Vec<String>,
) -> Decimal {
    match parse(raw) {
        Ok(value) => value,
        Err(_) => {
            errors.push(format!("{label} is not a valid amount: '{}'.", raw.trim()));
            Decimal::ZERO
        }
    }
}

fn require_within_limit(
    value: Decimal,
    label: &str,
    errors: &mut Vec<String>,
) {
    if value > MAX_AMOUNT {
        errors.push(format!("{label} cannot exceed {}.", format_number(MAX_AMOUNT, 0)));
    }
}

fn require_non_negative(
    value: Decimal,
    label: &str,
    errors: &mut Vec<String>,
) {
    if value < Decimal::ZERO {
        errors.push(format!("{label} cannot be negative."));
    }
}

/// Input for the CLT vs PJ comparison.
#[derive(Clone, Debug, Default)]
pub struct CompareForm {
    pub gross: String,
    pub daily_meal_allowance: String,
    pub monthly_food_allowance: String,
    pub monthly_health_plan: String,
    pub monthly_other_benefits: String,
}

/// A validated comparison request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompareRequest {
    pub gross: Decimal,
    pub benefits: BenefitsInput,
}

impl CompareForm {
    /// Rules:
    /// - gross amount is required and must be greater than zero
    /// - every benefit is optional (blank is zero) and must not be negative
    /// - no amount may exceed [`MAX_AMOUNT`]
    pub fn validate_for_submit(&self) -> Result<CompareRequest, Vec<String>> {
        let mut errors = Vec::new();

        let gross = parse_field(&self.gross, "Gross amount", parse_brl, &mut errors);
        if self.gross.trim().is_empty() {
            errors.push("Gross amount is required.".to_string());
        } else if errors.is_empty() && gross <= Decimal::ZERO {
            errors.push("Gross amount must be greater than zero.".to_string());
        }
        require_within_limit(gross, "Gross amount", &mut errors);

        let benefit_fields = [
            (&self.daily_meal_allowance, "Daily meal allowance"),
            (&self.monthly_food_allowance, "Monthly food allowance"),
            (&self.monthly_health_plan, "Monthly health plan"),
            (&self.monthly_other_benefits, "Other monthly benefits"),
        ];
        let mut values = [Decimal::ZERO; 4];
        for (slot, (raw, label)) in values.iter_mut().zip(benefit_fields) {
            *slot = parse_field(raw, label, parse_brl, &mut errors);
            require_non_negative(*slot, label, &mut errors);
            require_within_limit(*slot, label, &mut errors);
        }
        let [daily_meal_allowance, monthly_food_allowance, monthly_health_plan, monthly_other_benefits] =
            values;

        if errors.is_empty() {
            Ok(CompareRequest {
                gross,
                benefits: BenefitsInput {
                    daily_meal_allowance,
                    monthly_food_allowance,
                    monthly_health_plan,
                    monthly_other_benefits,
                },
            })
        } else {
            Err(errors)
        }
    }
}

/// Input for the foreign-income calculation.
#[derive(Clone, Debug, Default)]
pub struct CrossBorderForm {
    pub foreign_amount: String,
    pub currency: String,
    /// Blank to resolve the rate from the configured provider or fallback table.
    pub exchange_rate: String,
    pub professional_draw: String,
    /// Municipal service tax in percent (`2` means 2%). Blank means 2%.
    pub municipal_service_tax_percent: String,
    pub contributes_to_social_security: bool,
}

/// A validated foreign-income request, still missing the exchange rate when
/// none was typed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CrossBorderRequest {
    pub foreign_amount: Decimal,
    pub currency: CurrencyCode,
    pub exchange_rate: Option<Decimal>,
    pub professional_draw: Decimal,
    /// Fraction, already clamped to the statutory range.
    pub municipal_service_tax_rate: Decimal,
    pub contributes_to_social_security: bool,
}

impl CrossBorderRequest {
    pub fn to_input(
        &self,
        exchange_rate: Decimal,
    ) -> CrossBorderInput {
        CrossBorderInput {
            foreign_amount: self.foreign_amount,
            currency: self.currency.clone(),
            exchange_rate,
            professional_draw: self.professional_draw,
            municipal_service_tax_rate: self.municipal_service_tax_rate,
            contributes_to_social_security: self.contributes_to_social_security,
        }
    }
}

impl CrossBorderForm {
    /// Rules:
    /// - foreign amount is required and must be greater than zero
    /// - currency must be a three-letter code
    /// - a typed exchange rate must be greater than zero
    /// - professional draw must not be negative
    /// - contributing to INSS requires a positive professional draw
    /// - the service-tax percent is clamped to 0..=5 and stored as a fraction
    /// - amounts and the exchange rate may not exceed [`MAX_AMOUNT`]
    pub fn validate_for_submit(&self) -> Result<CrossBorderRequest, Vec<String>> {
        let mut errors = Vec::new();

        let foreign_amount =
            parse_field(&self.foreign_amount, "Foreign amount", parse_brl, &mut errors);
        if self.foreign_amount.trim().is_empty() {
            errors.push("Foreign amount is required.".to_string());
        } else if foreign_amount <= Decimal::ZERO && errors.is_empty() {
            errors.push("Foreign amount must be greater than zero.".to_string());
        }
        require_within_limit(foreign_amount, "Foreign amount", &mut errors);

        let currency = match CurrencyCode::parse(&self.currency) {
            Ok(code) => Some(code),
            Err(_) => {
                errors.push(format!(
                    "Currency must be a three-letter code (e.g. USD), got '{}'.",
                    self.currency.trim()
                ));
                None
            }
        };

        let exchange_rate = if self.exchange_rate.trim().is_empty() {
            None
        } else {
            let rate = parse_field(&self.exchange_rate, "Exchange rate", parse_rate, &mut errors);
            if rate <= Decimal::ZERO {
                errors.push("Exchange rate must be greater than zero.".to_string());
            }
            require_within_limit(rate, "Exchange rate", &mut errors);
            Some(rate)
        };

        let professional_draw =
            parse_field(&self.professional_draw, "Professional draw", parse_brl, &mut errors);
        require_non_negative(professional_draw, "Professional draw", &mut errors);
        require_within_limit(professional_draw, "Professional draw", &mut errors);
        if self.contributes_to_social_security && professional_draw <= Decimal::ZERO {
            errors.push("Contributing to INSS requires a professional draw.".to_string());
        }

        let iss_percent = if self.municipal_service_tax_percent.trim().is_empty() {
            DEFAULT_ISS_PERCENT
        } else {
            parse_field(
                &self.municipal_service_tax_percent,
                "Service tax (ISS) percent",
                parse_rate,
                &mut errors,
            )
        };
        let municipal_service_tax_rate =
            iss_percent.clamp(Decimal::ZERO, MAX_ISS_PERCENT) / Decimal::ONE_HUNDRED;

        match currency {
            Some(currency) if errors.is_empty() => Ok(CrossBorderRequest {
                foreign_amount,
                currency,
                exchange_rate,
                professional_draw,
                municipal_service_tax_rate,
                contributes_to_social_security: self.contributes_to_social_security,
            }),
            _ => Err(errors),
        }
    }
}

impl fmt::Display for CrossBorderRequest {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        writeln!(f, "Amount:            {} {}", self.currency, self.foreign_amount)?;
        match self.exchange_rate {
            Some(rate) => writeln!(f, "Exchange rate:     {rate}")?,
            None => writeln!(f, "Exchange rate:     (resolved)")?,
        }
        writeln!(f, "Professional draw: {}", format_brl(self.professional_draw))?;
        writeln!(f, "Contributes INSS:  {}", self.contributes_to_social_security)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn compare_form(gross: &str) -> CompareForm {
        CompareForm {
            gross: gross.to_string(),
            ..CompareForm::default()
        }
    }

    fn cross_border_form() -> CrossBorderForm {
        CrossBorderForm {
            foreign_amount: "1000".to_string(),
            currency: "usd".to_string(),
            ..CrossBorderForm::default()
        }
    }

    #[test]
    fn compare_form_accepts_pt_br_amounts() {
        let form = CompareForm {
            gross: "R$ 6.000,00".to_string(),
            daily_meal_allowance: "35,00".to_string(),
            monthly_health_plan: "450".to_string(),
            ..CompareForm::default()
        };

        let request = form.validate_for_submit().unwrap();

        assert_eq!(request.gross, dec!(6000.00));
        assert_eq!(request.benefits.daily_meal_allowance, dec!(35.00));
        assert_eq!(request.benefits.monthly_health_plan, dec!(450));
        assert_eq!(request.benefits.monthly_food_allowance, dec!(0));
    }

    #[test]
    fn compare_form_requires_gross() {
        let errors = compare_form("").validate_for_submit().unwrap_err();

        assert_eq!(errors, vec!["Gross amount is required.".to_string()]);
    }

    #[test]
    fn compare_form_rejects_non_positive_gross() {
        let errors = compare_form("0").validate_for_submit().unwrap_err();
        assert_eq!(errors, vec!["Gross amount must be greater than zero.".to_string()]);

        let errors = compare_form("-100").validate_for_submit().unwrap_err();
        assert_eq!(errors, vec!["Gross amount must be greater than zero.".to_string()]);
    }

    #[test]
    fn compare_form_reads_single_dot_as_thousands() {
        let form = CompareForm {
            gross: "6.000".to_string(),
            monthly_health_plan: "1.500".to_string(),
            ..CompareForm::default()
        };

        let request = form.validate_for_submit().unwrap();

        assert_eq!(request.gross, dec!(6000));
        assert_eq!(request.benefits.monthly_health_plan, dec!(1500));
    }

    #[test]
    fn compare_form_rejects_amounts_above_limit() {
        let form = CompareForm {
            gross: "79228162514264337593543950335".to_string(),
            daily_meal_allowance: "1000000000001".to_string(),
            ..CompareForm::default()
        };

        let errors = form.validate_for_submit().unwrap_err();

        assert_eq!(
            errors,
            vec![
                "Gross amount cannot exceed 1.000.000.000.000.".to_string(),
                "Daily meal allowance cannot exceed 1.000.000.000.000.".to_string(),
            ]
        );
    }

    #[test]
    fn compare_form_accepts_amount_at_limit() {
        let request = compare_form("1.000.000.000.000").validate_for_submit().unwrap();

        assert_eq!(request.gross, MAX_AMOUNT);
    }

    #[test]
    fn compare_form_collects_every_field_error() {
        let form = CompareForm {
            gross: "abc".to_string(),
            monthly_food_allowance: "-1".to_string(),
            monthly_other_benefits: "x".to_string(),
            ..CompareForm::default()
        };

        let errors = form.validate_for_submit().unwrap_err();

        assert_eq!(
            errors,
            vec![
                "Gross amount is not a valid amount: 'abc'.".to_string(),
                "Monthly food allowance cannot be negative.".to_string(),
                "Other monthly benefits is not a valid amount: 'x'.".to_string(),
            ]
        );
    }

    #[test]
    fn cross_border_form_defaults() {
        let request = cross_border_form().validate_for_submit().unwrap();

        assert_eq!(request.currency.as_str(), "USD");
        assert_eq!(request.exchange_rate, None);
        assert_eq!(request.professional_draw, dec!(0));
        assert_eq!(request.municipal_service_tax_rate, dec!(0.02));
        assert!(!request.contributes_to_social_security);
    }

    #[test]
    fn cross_border_form_clamps_service_tax_percent() {
        let mut form = cross_border_form();
        form.municipal_service_tax_percent = "8".to_string();
        assert_eq!(form.validate_for_submit().unwrap().municipal_service_tax_rate, dec!(0.05));

        form.municipal_service_tax_percent = "-3".to_string();
        assert_eq!(form.validate_for_submit().unwrap().municipal_service_tax_rate, dec!(0));

        form.municipal_service_tax_percent = "3,5".to_string();
        assert_eq!(form.validate_for_submit().unwrap().municipal_service_tax_rate, dec!(0.035));
    }

    #[test]
    fn cross_border_form_rejects_malformed_currency() {
        let mut form = cross_border_form();
        form.currency = "US$".to_string();

        let errors = form.validate_for_submit().unwrap_err();

        assert_eq!(
            errors,
            vec!["Currency must be a three-letter code (e.g. USD), got 'US$'.".to_string()]
        );
    }

    #[test]
    fn cross_border_form_social_security_requires_draw() {
        let mut form = cross_border_form();
        form.contributes_to_social_security = true;

        let errors = form.validate_for_submit().unwrap_err();
        assert_eq!(
            errors,
            vec!["Contributing to INSS requires a professional draw.".to_string()]
        );

        form.professional_draw = "3.000,00".to_string();
        let request = form.validate_for_submit().unwrap();
        assert_eq!(request.professional_draw, dec!(3000.00));
    }

    #[test]
    fn cross_border_form_rejects_non_positive_values() {
        let form = CrossBorderForm {
            foreign_amount: "0".to_string(),
            currency: "EUR".to_string(),
            exchange_rate: "-5".to_string(),
            professional_draw: "-1".to_string(),
            ..CrossBorderForm::default()
        };

        let errors = form.validate_for_submit().unwrap_err();

        assert_eq!(
            errors,
            vec![
                "Foreign amount must be greater than zero.".to_string(),
                "Exchange rate must be greater than zero.".to_string(),
                "Professional draw cannot be negative.".to_string(),
            ]
        );
    }

    #[test]
    fn cross_border_form_rejects_values_above_limit() {
        let form = CrossBorderForm {
            foreign_amount: "79228162514264337593543950335".to_string(),
            currency: "USD".to_string(),
            exchange_rate: "5000000000000".to_string(),
            professional_draw: "2000000000000".to_string(),
            ..CrossBorderForm::default()
        };

        let errors = form.validate_for_submit().unwrap_err();

        assert_eq!(
            errors,
            vec![
                "Foreign amount cannot exceed 1.000.000.000.000.".to_string(),
                "Exchange rate cannot exceed 1.000.000.000.000.".to_string(),
                "Professional draw cannot exceed 1.000.000.000.000.".to_string(),
            ]
        );
    }

    #[test]
    fn cross_border_form_rate_keeps_three_decimals() {
        let mut form = cross_border_form();
        form.exchange_rate = "5.250".to_string();

        let request = form.validate_for_submit().unwrap();

        assert_eq!(request.exchange_rate, Some(dec!(5.250)));
    }

    #[test]
    fn cross_border_request_builds_engine_input() {
        let mut form = cross_border_form();
        form.exchange_rate = "5,25".to_string();
        let request = form.validate_for_submit().unwrap();

        let input = request.to_input(request.exchange_rate.unwrap());

        assert_eq!(input.exchange_rate, dec!(5.25));
        assert_eq!(input.foreign_amount, dec!(1000));
        assert_eq!(input.currency.as_str(), "USD");
    }
}
