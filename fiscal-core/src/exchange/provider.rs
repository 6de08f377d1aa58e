use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::CurrencyCode;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExchangeRateError {
    #[error("no rate available for {0}")]
    UnsupportedCurrency(String),

    #[error("rate provider unavailable: {0}")]
    Unavailable(String),

    #[error("rate provider returned a non-positive rate {rate} for {currency}")]
    InvalidRate { currency: String, rate: Decimal },
}

/// A source of reais-per-unit exchange rates.
#[async_trait]
pub trait ExchangeRateProvider: Send + Sync {
    /// Short identifier used in logs and quotes.
    fn name(&self) -> &'static str;

    async fn get_rate(&self, currency: &CurrencyCode) -> Result<Decimal, ExchangeRateError>;
}

/// A provider that answers with a single user-supplied rate for one currency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedRateProvider {
    currency: CurrencyCode,
    rate: Decimal,
}

impl FixedRateProvider {
    pub fn new(
        currency: CurrencyCode,
        rate: Decimal,
    ) -> Self {
        Self { currency, rate }
    }
}

#[async_trait]
impl ExchangeRateProvider for FixedRateProvider {
    fn name(&self) -> &'static str {
        "fixed"
    }

    async fn get_rate(&self, currency: &CurrencyCode) -> Result<Decimal, ExchangeRateError> {
        if *currency != self.currency {
            return Err(ExchangeRateError::UnsupportedCurrency(currency.to_string()));
        }
        if self.rate <= Decimal::ZERO {
            return Err(ExchangeRateError::InvalidRate {
                currency: currency.to_string(),
                rate: self.rate,
            });
        }
        Ok(self.rate)
    }
}
