use fiscal_core::calculations::common::round_places;
use rust_decimal::Decimal;
use thiserror::Error;

/// Error returned when a string cannot be parsed as an amount.
#[derive(Debug, Error)]
#[error("invalid amount '{input}': {source}")]
pub struct ParseAmountError {
    input: String,
    #[source]
    source: rust_decimal::Error,
}

/// Largest amount accepted from user input. Keeps every downstream product
/// and annual total well inside `Decimal` range.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(3_567_587_328, 232, 0, false, 0);

fn strip_amount_input(s: &str) -> String {
    s.trim()
        .trim_start_matches("R$")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

/// `6.000`, `12.345`: one dot, one to three leading digits and exactly three
/// after it.
fn is_grouped_thousands(s: &str) -> bool {
    let unsigned = s.strip_prefix('-').unwrap_or(s);
    match unsigned.split_once('.') {
        Some((int_part, frac_part)) => {
            (1..=3).contains(&int_part.len())
                && frac_part.len() == 3
                && int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit())
        }
        None => false,
    }
}

/// Normalizes money input for parsing.
///
/// Drops the `R$` prefix and whitespace. When a comma is present the input is
/// read as pt-BR (`1.234,56`). Without a comma, dots group thousands when
/// there are several (`1.000.000`) or when the only one is followed by three
/// digits (`6.000`); any other single dot is the decimal point (`1234.56`).
fn normalize_amount_input(s: &str) -> String {
    let stripped = strip_amount_input(s);

    if stripped.contains(',') {
        stripped.replace('.', "").replace(',', ".")
    } else if stripped.matches('.').count() > 1 || is_grouped_thousands(&stripped) {
        stripped.replace('.', "")
    } else {
        stripped
    }
}

fn parse_normalized(
    raw: &str,
    normalized: String,
) -> Result<Decimal, ParseAmountError> {
    if normalized.is_empty() {
        return Ok(Decimal::ZERO);
    }
    normalized.parse().map_err(|e| {
        tracing::debug!(input = %raw, "invalid amount: {}", e);
        ParseAmountError {
            input: raw.to_string(),
            source: e,
        }
    })
}

/// Parses a money amount in pt-BR or plain decimal notation.
///
/// Accepts `1.234,56`, `6.000`, `1234.56`, `1234,56` and `R$ 1.234,56`.
/// Empty or whitespace-only input is treated as 0.
pub fn parse_brl(s: &str) -> Result<Decimal, ParseAmountError> {
    parse_normalized(s, normalize_amount_input(s))
}

/// Parses a rate or percentage. There is no digit grouping here, so either a
/// comma or a dot marks the decimals (`5,25`, `5.250`).
pub fn parse_rate(s: &str) -> Result<Decimal, ParseAmountError> {
    parse_normalized(s, strip_amount_input(s).replace(',', "."))
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

/// Formats a number the pt-BR way: `.` groups thousands, `,` marks decimals.
pub fn format_number(
    value: Decimal,
    places: u32,
) -> String {
    let rounded = round_places(value, places);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let text = format!("{:.*}", places as usize, rounded.abs());
    match text.split_once('.') {
        Some((int_part, frac_part)) => format!("{sign}{},{frac_part}", group_thousands(int_part)),
        None => format!("{sign}{}", group_thousands(&text)),
    }
}

/// `R$ 1.234,56`; negative amounts render as `-R$ 22,77`.
pub fn format_brl(amount: Decimal) -> String {
    let text = format_number(amount, 2);
    match text.strip_prefix('-') {
        Some(abs) => format!("-R$ {abs}"),
        None => format!("R$ {text}"),
    }
}

/// A fractional rate as a percentage: `0.14` renders as `14,00%`.
pub fn format_percent(rate: Decimal) -> String {
    format!("{}%", format_number(rate * Decimal::ONE_HUNDRED, 2))
}
