//! Common utility functions for tax calculations.
//!
//! This module provides shared functionality used by both the base and the
//! scenario calculators, including rounding, the payable/net floors and
//! currency formatting for advisory text.

use rust_decimal::Decimal;

/// Rounds a decimal value to exactly two decimal places using half-up rounding.
///
/// This follows standard financial rounding conventions where values at exactly
/// 0.005 are rounded up to 0.01 (away from zero).
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use scenario_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(123.454)), dec!(123.45));
/// assert_eq!(round_half_up(dec!(123.455)), dec!(123.46));
/// assert_eq!(round_half_up(dec!(14.125)), dec!(14.13));
/// assert_eq!(round_half_up(dec!(-123.455)), dec!(-123.46)); // Away from zero
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
}

/// Returns the maximum of two decimal values.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use scenario_core::calculations::common::max;
///
/// assert_eq!(max(dec!(100.00), dec!(200.00)), dec!(200.00));
/// assert_eq!(max(dec!(-100.00), dec!(0)), dec!(0));
/// ```
pub fn max(
    a: Decimal,
    b: Decimal,
) -> Decimal {
    if a > b { a } else { b }
}

/// Tax payable on `taxable_income` at `rate`, never negative.
pub fn tax_payable(
    taxable_income: Decimal,
    rate: Decimal,
) -> Decimal {
    max(round_half_up(taxable_income * rate), Decimal::ZERO)
}

/// Tax payable less the R&D offset, floored at zero.
pub fn net_tax_position(
    tax_payable: Decimal,
    rnd_offset: Decimal,
) -> Decimal {
    round_half_up(max(tax_payable - rnd_offset, Decimal::ZERO))
}

/// Net tax position as a percentage of taxable income.
///
/// Zero when there is no positive taxable income to divide by.
pub fn effective_tax_rate(
    net_tax_position: Decimal,
    taxable_income: Decimal,
) -> Decimal {
    if taxable_income > Decimal::ZERO {
        round_half_up(net_tax_position / taxable_income * Decimal::ONE_HUNDRED)
    } else {
        Decimal::ZERO
    }
}

/// Formats an amount as Australian dollars, e.g. `$12,500.00`.
///
/// ```
/// use rust_decimal_macros::dec;
/// use scenario_core::calculations::common::format_aud;
///
/// assert_eq!(format_aud(dec!(12500)), "$12,500.00");
/// assert_eq!(format_aud(dec!(-1234.5)), "-$1,234.50");
/// ```
pub fn format_aud(value: Decimal) -> String {
    let rounded = round_half_up(value);
    let formatted = format!("{:.2}", rounded.abs());
    let (whole, cents) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}${grouped}.{cents}")
}
