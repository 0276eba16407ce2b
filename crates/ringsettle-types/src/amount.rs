//! Checked integer arithmetic over [`Amount`].
//!
//! `U256` operators wrap on overflow. Every settlement computation goes
//! through these helpers instead, so an overflow surfaces as an error.

use rust_decimal::Decimal;

use crate::{Amount, RingsettleError};

/// `floor(a * b / d)`; fails on overflow or a zero divisor.
pub fn mul_div(a: Amount, b: Amount, d: Amount) -> Result<Amount, RingsettleError> {
    if d.is_zero() {
        return Err(RingsettleError::ArithmeticOverflow);
    }
    a.checked_mul(b)
        .map(|product| product / d)
        .ok_or(RingsettleError::ArithmeticOverflow)
}

/// `floor(a * pct / base)` for small percentage-style factors.
pub fn percentage_of(a: Amount, pct: u16, base: u16) -> Result<Amount, RingsettleError> {
    mul_div(a, Amount::from(u64::from(pct)), Amount::from(u64::from(base)))
}

pub fn checked_add(a: Amount, b: Amount) -> Result<Amount, RingsettleError> {
    a.checked_add(b).ok_or(RingsettleError::ArithmeticOverflow)
}

pub fn checked_sub(a: Amount, b: Amount) -> Result<Amount, RingsettleError> {
    a.checked_sub(b).ok_or(RingsettleError::ArithmeticOverflow)
}

/// Share of `amount_s` already filled, as a percentage with two decimals.
///
/// Used for audit output only; settlement never reads it back.
#[must_use]
pub fn fill_percentage(filled: Amount, amount_s: Amount) -> Decimal {
    if amount_s.is_zero() {
        return Decimal::ZERO;
    }
    let Some(scaled) = filled.checked_mul(Amount::from(10_000u64)) else {
        return Decimal::ZERO;
    };
    let basis_points = u64::try_from(scaled / amount_s).unwrap_or(u64::MAX);
    let basis_points = i64::try_from(basis_points).unwrap_or(i64::MAX);
    Decimal::new(basis_points, 2)
}
