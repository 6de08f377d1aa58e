use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::fallback::FallbackRates;
use super::provider::{ExchangeRateError, ExchangeRateProvider};
use crate::calculations::common::round_places;
use crate::models::CurrencyCode;

/// Where a quote came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RateSource {
    /// A live provider, identified by name.
    Provider(String),
    /// The static fallback table.
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateQuote {
    pub currency: CurrencyCode,
    /// Reais per unit of `currency`, to four places.
    pub rate: Decimal,
    pub source: RateSource,
    pub quoted_at: DateTime<Utc>,
}

impl RateQuote {
    pub fn is_fallback(&self) -> bool {
        self.source == RateSource::Fallback
    }
}

/// Resolves a rate from an optional primary provider, recovering from any
/// provider failure with the fallback table.
pub struct RateResolver {
    primary: Option<Box<dyn ExchangeRateProvider>>,
    fallback: FallbackRates,
}

impl RateResolver {
    pub fn new(
        primary: Option<Box<dyn ExchangeRateProvider>>,
        fallback: FallbackRates,
    ) -> Self {
        Self { primary, fallback }
    }

    /// A resolver with no live provider; every quote comes from `fallback`.
    pub fn fallback_only(fallback: FallbackRates) -> Self {
        Self::new(None, fallback)
    }

    /// Returns a quote for `currency`. Never fails: a missing provider, a
    /// provider error or a non-positive rate all fall back to the table.
    pub async fn resolve(
        &self,
        currency: &CurrencyCode,
    ) -> RateQuote {
        match self.primary.as_deref() {
            Some(provider) => match provider.get_rate(currency).await {
                Ok(rate) if rate > Decimal::ZERO => {
                    debug!(provider = provider.name(), %currency, %rate, "Resolved live exchange rate");
                    return self.quote(currency, rate, RateSource::Provider(provider.name().to_string()));
                }
                Ok(rate) => {
                    let error = ExchangeRateError::InvalidRate {
                        currency: currency.to_string(),
                        rate,
                    };
                    warn!(provider = provider.name(), %error, "Using fallback exchange rate");
                }
                Err(error) => {
                    warn!(provider = provider.name(), %error, "Using fallback exchange rate");
                }
            },
            None => debug!(%currency, "No exchange rate provider configured"),
        }

        self.quote(currency, self.fallback.rate_for(currency), RateSource::Fallback)
    }

    fn quote(
        &self,
        currency: &CurrencyCode,
        rate: Decimal,
        source: RateSource,
    ) -> RateQuote {
        RateQuote {
            currency: currency.clone(),
            rate: round_places(rate, 4),
            source,
            quoted_at: Utc::now(),
        }
    }
}
