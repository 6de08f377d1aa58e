use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::models::CurrencyCode;

/// Static reais-per-unit rates used when no live quote is available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackRates {
    rates: BTreeMap<CurrencyCode, Decimal>,
    default_rate: Decimal,
}

impl FallbackRates {
    /// An empty table that answers every currency with `default_rate`.
    pub fn with_default(default_rate: Decimal) -> Self {
        Self {
            rates: BTreeMap::new(),
            default_rate,
        }
    }

    /// Sets or replaces the rate for one currency.
    pub fn set(
        &mut self,
        currency: CurrencyCode,
        rate: Decimal,
    ) {
        self.rates.insert(currency, rate);
    }

    /// Rate for `currency`, or the default rate when it is not listed.
    pub fn rate_for(
        &self,
        currency: &CurrencyCode,
    ) -> Decimal {
        self.rates
            .get(currency)
            .copied()
            .unwrap_or(self.default_rate)
    }

    pub fn default_rate(&self) -> Decimal {
        self.default_rate
    }

    /// Listed currencies and their rates, ordered by code.
    pub fn iter(&self) -> impl Iterator<Item = (&CurrencyCode, Decimal)> {
        self.rates.iter().map(|(code, rate)| (code, *rate))
    }
}

impl Default for FallbackRates {
    fn default() -> Self {
        let mut table = Self::with_default(Decimal::new(525, 2));
        for (code, rate) in [
            ("USD", Decimal::new(525, 2)),
            ("EUR", Decimal::new(568, 2)),
            ("GBP", Decimal::new(645, 2)),
            ("CAD", Decimal::new(389, 2)),
            ("AUD", Decimal::new(352, 2)),
        ] {
            if let Ok(currency) = CurrencyCode::parse(code) {
                table.set(currency, rate);
            }
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn code(s: &str) -> CurrencyCode {
        CurrencyCode::parse(s).unwrap()
    }

    #[test]
    fn default_table_covers_supported_currencies() {
        let table = FallbackRates::default();

        assert_eq!(table.rate_for(&code("USD")), dec!(5.25));
        assert_eq!(table.rate_for(&code("EUR")), dec!(5.68));
        assert_eq!(table.rate_for(&code("GBP")), dec!(6.45));
        assert_eq!(table.rate_for(&code("CAD")), dec!(3.89));
        assert_eq!(table.rate_for(&code("AUD")), dec!(3.52));
        for supported in CurrencyCode::SUPPORTED {
            assert!(table.iter().any(|(c, _)| c.as_str() == supported));
        }
    }

    #[test]
    fn unknown_currency_uses_default_rate() {
        assert_eq!(FallbackRates::default().rate_for(&code("CHF")), dec!(5.25));
    }

    #[test]
    fn set_overrides_listed_rate() {
        let mut table = FallbackRates::default();
        table.set(code("EUR"), dec!(6.01));

        assert_eq!(table.rate_for(&code("EUR")), dec!(6.01));
    }
}
