use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

static CURRENCY_CODE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{3}$").expect("currency code pattern is valid"));

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid currency code '{0}': expected three uppercase letters (e.g. USD)")]
pub struct CurrencyCodeError(pub String);

/// An ISO 4217-style three-letter currency code.
///
/// Input is trimmed and upper-cased before validation, so `" usd "` is
/// accepted as `USD`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Currencies the cross-border calculator offers by default.
    pub const SUPPORTED: [&'static str; 5] = ["USD", "EUR", "GBP", "CAD", "AUD"];

    pub fn parse(s: &str) -> Result<Self, CurrencyCodeError> {
        let normalized = s.trim().to_ascii_uppercase();
        if CURRENCY_CODE_PATTERN.is_match(&normalized) {
            Ok(Self(normalized))
        } else {
            Err(CurrencyCodeError(s.to_string()))
        }
    }

    /// The domestic currency (Brazilian real).
    pub fn brl() -> Self {
        Self("BRL".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Display symbol; unknown currencies fall back to the code itself.
    pub fn symbol(&self) -> &str {
        match self.0.as_str() {
            "USD" => "$",
            "EUR" => "€",
            "GBP" => "£",
            "CAD" => "C$",
            "AUD" => "A$",
            "BRL" => "R$",
            other => other,
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = CurrencyCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}
