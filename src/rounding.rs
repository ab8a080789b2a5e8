//! Display rounding and settlement (fixed-point ledger) rounding.
//!
//! Both are applied to engine output only, never to intermediate values.

use crate::error::{PricingError, PricingResult};

pub const LEDGER_SCALE: i128 = 1_000_000; // 1 micro-cent units

/// Round half away from zero at `digits` decimal places.
///
/// Non-finite values pass through unchanged.
pub fn round_for_display(value: f64, digits: i32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let factor = 10f64.powi(digits);
    let scaled = value * factor;
    if !scaled.is_finite() {
        return value;
    }
    // f64::round is half-away-from-zero
    scaled.round() / factor
}

/// Render `value` rounded to at most `digits` places, without trailing zeros.
pub fn format_rounded(value: f64, digits: i32) -> String {
    let rounded = round_for_display(value, digits);
    // -0 renders as "0"
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    format!("{}", rounded)
}

/// Convert an amount to integer ledger units, rounding half away from zero.
#[inline]
pub fn to_ledger_units(x: f64) -> PricingResult<i128> {
    if !x.is_finite() {
        return Err(PricingError::NonFiniteInput {
            field: "ledger_amount",
            value: x,
        });
    }
    let scaled = x * (LEDGER_SCALE as f64);
    if !scaled.is_finite() || scaled.abs() >= i128::MAX as f64 {
        return Err(PricingError::Overflow("to_ledger_units"));
    }
    Ok(if scaled >= 0.0 {
        (scaled + 0.5).floor() as i128
    } else {
        (scaled - 0.5).ceil() as i128
    })
}

#[inline]
pub fn from_ledger_units(x: i128) -> f64 {
    x as f64 / LEDGER_SCALE as f64
}
