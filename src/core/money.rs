//! Currency arithmetic for ledger entries.
//!
//! Amounts are stored as dollars in `f64` columns, but every computation here is
//! done in integer cents and converted back once, so a stored amount always has at
//! most two decimals. Halves round away from zero.

use crate::errors::{Error, Result};

/// Largest cent amount an `f64` dollar value still represents exactly.
const MAX_CENTS: i64 = 1 << 53;

/// Converts a dollar amount to whole cents, rounding half away from zero.
///
/// # Errors
/// Returns [`Error::InvalidAmount`] for NaN, infinite or out-of-range input.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn to_cents(amount: f64) -> Result<i64> {
    let cents = (amount * 100.0).round();
    if !cents.is_finite() || cents.abs() > MAX_CENTS as f64 {
        return Err(Error::InvalidAmount { amount });
    }
    Ok(cents as i64)
}

/// Rejects cent amounts that overflowed or left the exact `f64` range.
fn checked_cents(cents: Option<i64>, amount: f64) -> Result<i64> {
    cents
        .filter(|c| c.unsigned_abs() <= MAX_CENTS.unsigned_abs())
        .ok_or(Error::InvalidAmount { amount })
}

/// `count * unit_cents`.
///
/// # Errors
/// Returns [`Error::InvalidAmount`] if the product is out of range.
pub fn multiply_cents(count: i64, unit_cents: i64) -> Result<i64> {
    checked_cents(count.checked_mul(unit_cents), from_cents(unit_cents))
}

/// `a + b` in cents.
///
/// # Errors
/// Returns [`Error::InvalidAmount`] if the sum is out of range.
pub fn add_cents(a: i64, b: i64) -> Result<i64> {
    checked_cents(a.checked_add(b), from_cents(b))
}

/// Converts cents back to dollars.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn from_cents(cents: i64) -> f64 {
    cents as f64 / 100.0
}

/// Rounds a dollar amount to cents.
///
/// # Errors
/// Returns [`Error::InvalidAmount`] for NaN or infinite input.
pub fn round_currency(amount: f64) -> Result<f64> {
    to_cents(amount).map(from_cents)
}

/// Rejects negative, NaN or infinite amounts.
///
/// # Errors
/// Returns [`Error::InvalidAmount`] when the amount is not a finite, non-negative number.
pub fn ensure_non_negative(amount: f64) -> Result<f64> {
    if amount < 0.0 || !amount.is_finite() {
        return Err(Error::InvalidAmount { amount });
    }
    Ok(amount)
}

/// Tax on a taxable amount, in cents.
///
/// The rate is converted to basis points first so the multiplication stays in
/// integers: `$43.00 at 13%` is `4300 * 1300 / 10000 = 559` cents.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn tax_cents(taxable_cents: i64, tax_rate: f64) -> Result<i64> {
    let bps = (tax_rate * 10_000.0).round();
    if bps > MAX_CENTS as f64 {
        return Err(Error::InvalidAmount { amount: tax_rate });
    }
    let raw = taxable_cents
        .checked_mul(bps as i64)
        .ok_or(Error::InvalidAmount { amount: tax_rate })?;
    // Half away from zero
    let half = if raw >= 0 { 5_000 } else { -5_000 };
    Ok(raw.saturating_add(half) / 10_000)
}

/// Breakdown of a payment, all amounts rounded to cents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaymentTotals {
    /// Amount before discount and tax
    pub subtotal: f64,
    /// Discount taken off the subtotal
    pub discount_amount: f64,
    /// Tax on `subtotal - discount_amount`
    pub tax_amount: f64,
    /// `subtotal - discount_amount + tax_amount`
    pub total_amount: f64,
}

/// Computes totals from a subtotal already expressed in cents.
///
/// # Errors
/// Returns [`Error::InvalidAmount`] if the discount or tax rate is negative or not
/// finite, or if the discount exceeds the subtotal.
pub fn totals_from_subtotal_cents(
    subtotal_cents: i64,
    discount_amount: f64,
    tax_rate: f64,
) -> Result<PaymentTotals> {
    let discount_cents = to_cents(ensure_non_negative(discount_amount)?)?;
    ensure_non_negative(tax_rate)?;
    if discount_cents > subtotal_cents {
        return Err(Error::InvalidAmount {
            amount: discount_amount,
        });
    }

    let taxable = subtotal_cents - discount_cents;
    let tax = tax_cents(taxable, tax_rate)?;

    Ok(PaymentTotals {
        subtotal: from_cents(subtotal_cents),
        discount_amount: from_cents(discount_cents),
        tax_amount: from_cents(tax),
        total_amount: from_cents(add_cents(taxable, tax)?),
    })
}

/// Computes the totals of a credit purchase: `credits * price_per_credit`, less the
/// discount, plus tax on the discounted amount.
///
/// # Errors
/// Returns [`Error::InvalidAmount`] for a negative or non-finite price, discount or
/// rate, a discount larger than the subtotal, or totals too large to store.
pub fn credit_purchase_totals(
    credits: i32,
    price_per_credit: f64,
    discount_amount: f64,
    tax_rate: f64,
) -> Result<PaymentTotals> {
    let price_cents = to_cents(ensure_non_negative(price_per_credit)?)?;
    let subtotal_cents = multiply_cents(i64::from(credits), price_cents)?;
    totals_from_subtotal_cents(subtotal_cents, discount_amount, tax_rate)
}

/// `quantity * unit_price`, rounded to cents.
///
/// # Errors
/// Returns [`Error::InvalidAmount`] for a negative or non-finite unit price, or a
/// total too large to store.
pub fn line_total(quantity: i32, unit_price: f64) -> Result<f64> {
    let unit_cents = to_cents(ensure_non_negative(unit_price)?)?;
    multiply_cents(i64::from(quantity), unit_cents).map(from_cents)
}
