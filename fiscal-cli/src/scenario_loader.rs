//! CSV loader for batch CLT vs PJ comparisons.
//!
//! ## CSV Format
//!
//! Headers are matched by name, so column order does not matter. Names are
//! case-sensitive.
//!
//! | Column                   | Required | Type    | Notes                        |
//! |--------------------------|----------|---------|------------------------------|
//! | `label`                  | yes      | string  | Shown in the report          |
//! | `gross`                  | yes      | decimal | Monthly gross, must be > 0   |
//! | `daily_meal_allowance`   | no       | decimal | Per business day; empty is 0 |
//! | `monthly_food_allowance` | no       | decimal | Empty is 0                   |
//! | `monthly_health_plan`    | no       | decimal | Empty is 0                   |
//! | `monthly_other_benefits` | no       | decimal | Empty is 0                   |
//!
//! Amounts use a dot as decimal separator and no thousands separator, and
//! none may exceed [`MAX_AMOUNT`].
//!
//! ```csv
//! label,gross,daily_meal_allowance,monthly_food_allowance,monthly_health_plan,monthly_other_benefits
//! Junior,4500.00,35.00,,350.00,
//! Senior,15000.00,45.00,600.00,800.00,200.00
//! ```

use std::path::Path;

use fiscal_core::calculations::BenefitsInput;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::utils::MAX_AMOUNT;

#[derive(Debug, Deserialize)]
struct ScenarioRow {
    label: String,
    gross: Decimal,
    daily_meal_allowance: Option<Decimal>,
    monthly_food_allowance: Option<Decimal>,
    monthly_health_plan: Option<Decimal>,
    monthly_other_benefits: Option<Decimal>,
}

/// One named comparison to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    pub label: String,
    pub gross: Decimal,
    pub benefits: BenefitsInput,
}

/// Errors raised while reading scenarios. `row` is the 1-based data row
/// (the header is row 0).
#[derive(Debug, thiserror::Error)]
pub enum ScenarioLoadError {
    #[error("cannot read scenario file: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parse error on row {row}: {source}")]
    Parse {
        row: usize,
        #[source]
        source: csv::Error,
    },

    #[error("scenario '{label}' on row {row}: gross must be positive, got {gross}")]
    NonPositiveGross {
        label: String,
        row: usize,
        gross: Decimal,
    },

    #[error("scenario '{label}' on row {row}: {column} exceeds 1000000000000")]
    AmountTooLarge {
        label: String,
        row: usize,
        column: &'static str,
    },

    #[error("scenario '{label}' on row {row}: {column} cannot be negative")]
    NegativeBenefit {
        label: String,
        row: usize,
        column: &'static str,
    },
}

fn convert_row(
    row: ScenarioRow,
    row_number: usize,
) -> Result<Scenario, ScenarioLoadError> {
    if row.gross > MAX_AMOUNT {
        return Err(ScenarioLoadError::AmountTooLarge {
            label: row.label,
            row: row_number,
            column: "gross",
        });
    }
    if row.gross <= Decimal::ZERO {
        return Err(ScenarioLoadError::NonPositiveGross {
            label: row.label,
            row: row_number,
            gross: row.gross,
        });
    }

    let benefit = |value: Option<Decimal>, column: &'static str| {
        let value = value.unwrap_or_default();
        if value < Decimal::ZERO {
            Err(ScenarioLoadError::NegativeBenefit {
                label: row.label.clone(),
                row: row_number,
                column,
            })
        } else if value > MAX_AMOUNT {
            Err(ScenarioLoadError::AmountTooLarge {
                label: row.label.clone(),
                row: row_number,
                column,
            })
        } else {
            Ok(value)
        }
    };

    let benefits = BenefitsInput {
        daily_meal_allowance: benefit(row.daily_meal_allowance, "daily_meal_allowance")?,
        monthly_food_allowance: benefit(row.monthly_food_allowance, "monthly_food_allowance")?,
        monthly_health_plan: benefit(row.monthly_health_plan, "monthly_health_plan")?,
        monthly_other_benefits: benefit(row.monthly_other_benefits, "monthly_other_benefits")?,
    };

    Ok(Scenario {
        label: row.label,
        gross: row.gross,
        benefits,
    })
}

/// Parses CSV text into scenarios, in file order.
///
/// # Errors
///
/// * [`ScenarioLoadError::Parse`] for structural problems, a missing required
///   column or a value that is not a number.
/// * [`ScenarioLoadError::NonPositiveGross`], [`ScenarioLoadError::NegativeBenefit`]
///   or [`ScenarioLoadError::AmountTooLarge`] for rows that parse but cannot be
///   compared.
pub fn load_from_str(input: &str) -> Result<Vec<Scenario>, ScenarioLoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(false)
        .from_reader(input.as_bytes());

    reader
        .deserialize::<ScenarioRow>()
        .enumerate()
        .map(|(idx, result)| {
            let row_number = idx + 1;
            let row = result.map_err(|source| ScenarioLoadError::Parse {
                row: row_number,
                source,
            })?;
            convert_row(row, row_number)
        })
        .collect()
}

/// Reads `path` and delegates to [`load_from_str`].
pub fn load_from_file(path: &Path) -> Result<Vec<Scenario>, ScenarioLoadError> {
    let contents = std::fs::read_to_string(path)?;
    load_from_str(&contents)
}
