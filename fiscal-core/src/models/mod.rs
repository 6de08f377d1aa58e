mod currency;
mod fiscal_year_config;
mod service_plan;
mod tax_bracket;

pub use currency::{CurrencyCode, CurrencyCodeError};
pub use fiscal_year_config::{FiscalConfigError, FiscalYearConfig};
pub use service_plan::ServicePlan;
pub use tax_bracket::{BracketTableCode, TaxBracket};
