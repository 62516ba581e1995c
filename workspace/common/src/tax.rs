//! Derived tax computation.
//!
//! The tax amount is never stored on the expense row; category rates can
//! change retroactively, so it is recomputed from the current rate on
//! every read.

use rust_decimal::Decimal;

/// Computes the deductible tax amount for an expense:
/// `amount * tax_percentage / 100`, rounded to two decimal places.
pub fn tax_amount(amount: Decimal, tax_percentage: Decimal) -> Decimal {
    let mut value = (amount * tax_percentage / Decimal::ONE_HUNDRED).round_dp(2);
    value.rescale(2);
    value
}
