//! Rounding and clamping helpers shared by the calculator, the recommender,
//! the simulator and the score evaluator.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds to cents, halves away from zero.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::common::round_cents;
///
/// assert_eq!(round_cents(dec!(123.455)), dec!(123.46));
/// assert_eq!(round_cents(dec!(-123.455)), dec!(-123.46));
/// ```
pub fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds to whole dollars, halves away from zero.
///
/// Savings estimates are always reported in whole dollars.
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::common::round_dollars;
///
/// assert_eq!(round_dollars(dec!(1539.5)), dec!(1540));
/// assert_eq!(round_dollars(dec!(1712.99)), dec!(1713));
/// ```
pub fn round_dollars(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Clamps negative values to zero.
pub fn non_negative(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO)
}

/// `numerator / denominator`, or zero when the denominator is not positive.
pub fn ratio(
    numerator: Decimal,
    denominator: Decimal,
) -> Decimal {
    if denominator > Decimal::ZERO {
        numerator / denominator
    } else {
        Decimal::ZERO
    }
}

/// Formats whole dollars with thousands separators, e.g. `$7,000`.
pub fn format_dollars(value: Decimal) -> String {
    let rounded = round_dollars(value);
    let digits = rounded.abs().trunc().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    if rounded < Decimal::ZERO {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

/// Formats a fractional rate as a percentage, e.g. `0.22` as `22%`.
pub fn format_percent(rate: Decimal) -> String {
    let percent = (rate * Decimal::ONE_HUNDRED).normalize();
    format!("{percent}%")
}
