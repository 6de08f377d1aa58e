//! Exchange-rate lookup for the cross-border calculator.
//!
//! The calculators take a resolved rate as plain input. This module is the
//! collaborator that produces it: an optional live [`ExchangeRateProvider`]
//! backed by a static [`FallbackRates`] table, combined in a [`RateResolver`]
//! that always yields a usable quote.

mod fallback;
mod provider;
mod resolver;

pub use fallback::FallbackRates;
pub use provider::{ExchangeRateError, ExchangeRateProvider, FixedRateProvider};
pub use resolver::{RateQuote, RateResolver, RateSource};
