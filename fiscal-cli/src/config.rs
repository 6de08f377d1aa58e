//! Optional TOML settings for the `fiscal` binary.
//!
//! ```toml
//! [database]
//! backend = "sqlite"
//! connection_string = "fiscal.db"
//!
//! [calculator]
//! fiscal_year = 2025
//!
//! [logging]
//! level = "info"
//! file = "fiscal.log"
//! stdout = true
//!
//! [exchange.fallback_rates]
//! USD = "5.30"
//! EUR = "5.71"
//! ```
//!
//! Every section is optional. Without `[database]` the built-in 2025
//! schedule is used.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use fiscal_core::db::DbConfig;
use fiscal_core::exchange::FallbackRates;
use fiscal_core::{CurrencyCode, CurrencyCodeError};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use crate::utils::MAX_AMOUNT;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cannot read settings file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error(transparent)]
    InvalidCurrency(#[from] CurrencyCodeError),

    #[error("fallback rate for {currency} must be in (0, 1000000000000], got {rate}")]
    InvalidRate { currency: String, rate: Decimal },

    #[error("backend '{backend}' given without a database; pass --db or add a [database] section")]
    BackendWithoutDatabase { backend: String },
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub database: Option<DatabaseSettings>,
    pub calculator: CalculatorSettings,
    pub logging: LoggingSettings,
    pub exchange: ExchangeSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseSettings {
    #[serde(default = "default_backend")]
    pub backend: String,
    pub connection_string: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CalculatorSettings {
    pub fiscal_year: i32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSettings {
    /// Bare level or `EnvFilter` directive. `RUST_LOG` applies when unset.
    pub level: Option<String>,
    pub file: Option<PathBuf>,
    pub stdout: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExchangeSettings {
    /// Overrides for the static fallback table, keyed by currency code.
    pub fallback_rates: BTreeMap<String, Decimal>,
}

fn default_backend() -> String {
    "sqlite".to_string()
}

impl Default for CalculatorSettings {
    fn default() -> Self {
        Self { fiscal_year: 2025 }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: None,
            file: None,
            stdout: true,
        }
    }
}

/// Command-line values that take precedence over the settings file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub backend: Option<String>,
    pub db: Option<String>,
    pub year: Option<i32>,
    pub log_level: Option<String>,
    pub log_file: Option<PathBuf>,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Fails when a backend is named but no database is configured anywhere.
    pub fn apply_overrides(
        &mut self,
        overrides: Overrides,
    ) -> Result<(), SettingsError> {
        match (overrides.db, self.database.as_mut()) {
            (Some(connection_string), Some(database)) => {
                database.connection_string = connection_string;
            }
            (Some(connection_string), None) => {
                self.database = Some(DatabaseSettings {
                    backend: default_backend(),
                    connection_string,
                });
            }
            (None, _) => {}
        }
        match (overrides.backend, self.database.as_mut()) {
            (Some(backend), Some(database)) => database.backend = backend,
            (Some(backend), None) => {
                return Err(SettingsError::BackendWithoutDatabase { backend });
            }
            (None, _) => {}
        }
        if let Some(year) = overrides.year {
            self.calculator.fiscal_year = year;
        }
        if overrides.log_level.is_some() {
            self.logging.level = overrides.log_level;
        }
        if overrides.log_file.is_some() {
            self.logging.file = overrides.log_file;
        }
        Ok(())
    }

    /// Backend configuration, or `None` to use the built-in schedule.
    pub fn db_config(&self) -> Option<DbConfig> {
        self.database.as_ref().map(|db| DbConfig {
            backend: db.backend.clone(),
            connection_string: db.connection_string.clone(),
        })
    }

    /// The default fallback table with the configured overrides applied.
    pub fn fallback_rates(&self) -> Result<FallbackRates, SettingsError> {
        let mut rates = FallbackRates::default();
        for (code, rate) in &self.exchange.fallback_rates {
            let currency = CurrencyCode::parse(code)?;
            if *rate <= Decimal::ZERO || *rate > MAX_AMOUNT {
                return Err(SettingsError::InvalidRate {
                    currency: currency.to_string(),
                    rate: *rate,
                });
            }
            rates.set(currency, *rate);
        }
        Ok(rates)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    const FULL: &str = r#"
[database]
backend = "sqlite"
connection_string = "fiscal.db"

[calculator]
fiscal_year = 2026

[logging]
level = "debug"
file = "fiscal.log"
stdout = false

[exchange.fallback_rates]
USD = "5.30"
chf = "6.10"
"#;

    #[test]
    fn empty_file_uses_defaults() {
        let settings = Settings::parse("").unwrap();

        assert_eq!(settings, Settings::default());
        assert_eq!(settings.calculator.fiscal_year, 2025);
        assert!(settings.logging.stdout);
        assert!(settings.db_config().is_none());
    }

    #[test]
    fn full_file_parses_every_section() {
        let settings = Settings::parse(FULL).unwrap();

        assert_eq!(
            settings.db_config(),
            Some(DbConfig {
                backend: "sqlite".to_string(),
                connection_string: "fiscal.db".to_string(),
            })
        );
        assert_eq!(settings.calculator.fiscal_year, 2026);
        assert_eq!(settings.logging.level.as_deref(), Some("debug"));
        assert_eq!(settings.logging.file, Some(PathBuf::from("fiscal.log")));
        assert!(!settings.logging.stdout);
    }

    #[test]
    fn database_backend_defaults_to_sqlite() {
        let settings = Settings::parse("[database]\nconnection_string = \":memory:\"\n").unwrap();

        assert_eq!(settings.db_config().unwrap().backend, "sqlite");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Settings::parse("[calculator]\nyear = 2025\n").is_err());
    }

    #[test]
    fn fallback_overrides_merge_with_defaults() {
        let settings = Settings::parse(FULL).unwrap();
        let rates = settings.fallback_rates().unwrap();

        assert_eq!(rates.rate_for(&CurrencyCode::parse("USD").unwrap()), dec!(5.30));
        assert_eq!(rates.rate_for(&CurrencyCode::parse("CHF").unwrap()), dec!(6.10));
        assert_eq!(rates.rate_for(&CurrencyCode::parse("EUR").unwrap()), dec!(5.68));
    }

    #[test]
    fn fallback_override_rejects_bad_code_and_rate() {
        let bad_code = Settings::parse("[exchange.fallback_rates]\nDOLLAR = \"5\"\n").unwrap();
        assert!(matches!(
            bad_code.fallback_rates(),
            Err(SettingsError::InvalidCurrency(_))
        ));

        let bad_rate = Settings::parse("[exchange.fallback_rates]\nUSD = \"0\"\n").unwrap();
        assert!(matches!(
            bad_rate.fallback_rates(),
            Err(SettingsError::InvalidRate { currency, .. }) if currency == "USD"
        ));
    }

    #[test]
    fn overrides_take_precedence() {
        let mut settings = Settings::parse(FULL).unwrap();
        settings.apply_overrides(Overrides {
            db: Some("other.db".to_string()),
            year: Some(2025),
            log_level: Some("warn".to_string()),
            ..Overrides::default()
        })
        .unwrap();

        let db = settings.db_config().unwrap();
        assert_eq!(db.connection_string, "other.db");
        assert_eq!(db.backend, "sqlite");
        assert_eq!(settings.calculator.fiscal_year, 2025);
        assert_eq!(settings.logging.level.as_deref(), Some("warn"));
        assert_eq!(settings.logging.file, Some(PathBuf::from("fiscal.log")));
    }

    #[test]
    fn db_override_creates_database_section() {
        let mut settings = Settings::default();
        settings.apply_overrides(Overrides {
            backend: Some("sqlite".to_string()),
            db: Some(":memory:".to_string()),
            ..Overrides::default()
        })
        .unwrap();

        assert_eq!(
            settings.db_config(),
            Some(DbConfig {
                backend: "sqlite".to_string(),
                connection_string: ":memory:".to_string(),
            })
        );
    }

    #[test]
    fn backend_override_without_database_is_an_error() {
        let mut settings = Settings::default();

        let err = settings
            .apply_overrides(Overrides {
                backend: Some("postgres".to_string()),
                ..Overrides::default()
            })
            .unwrap_err();

        assert!(matches!(
            &err,
            SettingsError::BackendWithoutDatabase { backend } if backend == "postgres"
        ));
        assert_eq!(
            err.to_string(),
            "backend 'postgres' given without a database; pass --db or add a [database] section"
        );
        assert!(settings.db_config().is_none());
    }

    #[test]
    fn backend_override_applies_to_configured_database() {
        let mut settings = Settings::parse("[database]\nconnection_string = \"fiscal.db\"\n").unwrap();

        settings
            .apply_overrides(Overrides {
                backend: Some("postgres".to_string()),
                ..Overrides::default()
            })
            .unwrap();

        assert_eq!(settings.db_config().unwrap().backend, "postgres");
    }

    #[test]
    fn fallback_override_rejects_rate_above_limit() {
        let settings =
            Settings::parse("[exchange.fallback_rates]\nUSD = \"1000000000001\"\n").unwrap();

        assert!(matches!(
            settings.fallback_rates(),
            Err(SettingsError::InvalidRate { currency, .. }) if currency == "USD"
        ));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = Settings::load(Path::new("/nonexistent/fiscal.toml")).unwrap_err();

        assert!(matches!(err, SettingsError::Read { .. }));
        assert!(err.to_string().starts_with("cannot read settings file '/nonexistent/fiscal.toml'"));
    }
}
