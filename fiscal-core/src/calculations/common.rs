//! Rounding and comparison helpers shared by the engines.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds a monetary value to centavos, half away from zero.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use fiscal_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(26.245)), dec!(26.25));
/// assert_eq!(round_half_up(dec!(951.6374)), dec!(951.64));
/// assert_eq!(round_half_up(dec!(-0.005)), dec!(-0.01));
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    round_places(value, 2)
}

/// Rounds to `places` decimal places, half away from zero.
///
/// Used for rates, which carry more precision than money.
pub fn round_places(
    value: Decimal,
    places: u32,
) -> Decimal {
    value.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero)
}

/// Returns the larger of two values.
pub fn max(
    a: Decimal,
    b: Decimal,
) -> Decimal {
    if a > b { a } else { b }
}

/// Clamps a value at zero from below.
pub fn non_negative(value: Decimal) -> Decimal {
    max(value, Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn round_half_up_rounds_midpoint_away_from_zero() {
        assert_eq!(round_half_up(dec!(113.845)), dec!(113.85));
        assert_eq!(round_half_up(dec!(-113.845)), dec!(-113.85));
    }

    #[test]
    fn round_half_up_rounds_down_below_midpoint() {
        assert_eq!(round_half_up(dec!(42.55875)), dec!(42.56));
        assert_eq!(round_half_up(dec!(1379.7566)), dec!(1379.76));
        assert_eq!(round_half_up(dec!(0.004)), dec!(0.00));
    }

    #[test]
    fn round_places_keeps_rate_precision() {
        assert_eq!(round_places(dec!(5.123456), 4), dec!(5.1235));
        assert_eq!(round_places(dec!(0.1549999), 6), dec!(0.155000));
    }

    #[test]
    fn max_picks_larger_value() {
        assert_eq!(max(dec!(-22.77), dec!(0)), dec!(0));
        assert_eq!(max(dec!(649.60), dec!(0)), dec!(649.60));
    }

    #[test]
    fn non_negative_floors_at_zero() {
        assert_eq!(non_negative(dec!(-0.01)), Decimal::ZERO);
        assert_eq!(non_negative(dec!(0.01)), dec!(0.01));
    }
}
