//! Tax and total computation for expenses.
//!
//! The derived `tax_amount` and `total_amount` fields are never settable
//! directly; they are recomputed from `amount` and `tax_rate` on every
//! save so the invariant
//! `tax_amount = round(amount * tax_rate / 100, 2)` and
//! `total_amount = round(amount + tax_amount, 2)` holds after every
//! persisted state.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::expense::error::ExpenseError;

/// Derived money fields of an expense.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaxBreakdown {
    /// Tax portion, rounded half-up to 2 decimal places.
    pub tax_amount: Decimal,
    /// Net amount plus tax, rounded half-up to 2 decimal places.
    pub total_amount: Decimal,
}

/// Computes the tax amount and total for a net amount and tax rate.
///
/// Both results are rounded half-up (away from zero) to 2 decimal
/// places. The computation is idempotent: reapplying it to an expense
/// whose derived fields are already correct changes nothing.
///
/// # Errors
///
/// Returns `ExpenseError::NegativeAmount` or
/// `ExpenseError::NegativeTaxRate` for negative inputs.
pub fn compute_amounts(amount: Decimal, tax_rate: Decimal) -> Result<TaxBreakdown, ExpenseError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(ExpenseError::NegativeAmount(amount));
    }
    if tax_rate.is_sign_negative() && !tax_rate.is_zero() {
        return Err(ExpenseError::NegativeTaxRate(tax_rate));
    }

    let tax_amount = (amount * tax_rate / Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let total_amount =
        (amount + tax_amount).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

    Ok(TaxBreakdown {
        tax_amount,
        total_amount,
    })
}
