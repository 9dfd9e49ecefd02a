//! Conversion between human-readable decimal quantities and base units.
//!
//! `parse_units(dec!(1.5), 18)` yields `1_500_000_000_000_000_000`;
//! `format_units` is its inverse. Both are exact: a value with more
//! fractional digits than the asset supports is rejected, never truncated.

use rust_decimal::Decimal;

use crate::{Amount, LaunchpoolError, Result};

/// `10^exp` as an [`Amount`], or `None` past `10^38`.
#[must_use]
pub fn pow10(exp: u32) -> Option<Amount> {
    10u128.checked_pow(exp)
}

/// Convert a human quantity into base units of an asset with `decimals`.
///
/// # Errors
/// - `InvalidAmount` for negative values or values finer than `decimals`
/// - `ArithmeticOverflow` if the result does not fit in an [`Amount`]
pub fn parse_units(value: Decimal, decimals: u8) -> Result<Amount> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(LaunchpoolError::invalid_amount(format!("{value} is negative")));
    }
    let value = value.normalize();
    let scale = value.scale();
    let decimals = u32::from(decimals);
    if scale > decimals {
        return Err(LaunchpoolError::invalid_amount(format!(
            "{value} has more than {decimals} fractional digits"
        )));
    }
    let mantissa = Amount::try_from(value.mantissa().unsigned_abs())
        .map_err(|_| LaunchpoolError::overflow("parse_units mantissa"))?;
    pow10(decimals - scale)
        .and_then(|factor| mantissa.checked_mul(factor))
        .ok_or_else(|| LaunchpoolError::overflow("parse_units"))
}

/// Convert base units of an asset with `decimals` into a human quantity.
///
/// # Errors
/// `ArithmeticOverflow` if the amount is beyond `Decimal`'s 96-bit
/// mantissa or `decimals` exceeds its 28-digit scale.
pub fn format_units(amount: Amount, decimals: u8) -> Result<Decimal> {
    let mantissa =
        i128::try_from(amount).map_err(|_| LaunchpoolError::overflow("format_units mantissa"))?;
    Decimal::try_from_i128_with_scale(mantissa, u32::from(decimals))
        .map(|d| d.normalize())
        .map_err(|_| LaunchpoolError::overflow("format_units"))
}
