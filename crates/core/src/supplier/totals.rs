//! Full recomputation of supplier aggregates from paid expenses.

use chrono::NaiveDate;
use rust_decimal::Decimal;

/// The slice of a paid expense the aggregation needs.
#[derive(Debug, Clone, Copy)]
pub struct PaidExpense {
    /// The expense's derived total (net plus tax).
    pub total_amount: Decimal,
    /// The expense date.
    pub expense_date: NaiveDate,
}

/// Recomputed supplier aggregate state.
///
/// There is no incremental update path: callers always pass the full
/// current set of paid, non-deleted expenses for the supplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SupplierTotals {
    /// Sum of `total_amount` over the paid expenses.
    pub total_spent: Decimal,
    /// Latest `expense_date` among the paid expenses, if any.
    pub last_purchase_date: Option<NaiveDate>,
}

impl SupplierTotals {
    /// Folds the paid expenses of a supplier into its aggregate fields.
    #[must_use]
    pub fn from_paid_expenses(expenses: &[PaidExpense]) -> Self {
        Self {
            total_spent: expenses.iter().map(|e| e.total_amount).sum(),
            last_purchase_date: expenses.iter().map(|e| e.expense_date).max(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn paid(total: Decimal, y: i32, m: u32, d: u32) -> PaidExpense {
        PaidExpense {
            total_amount: total,
            expense_date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
        }
    }

    #[test]
    fn test_empty_set_resets_to_defaults() {
        let totals = SupplierTotals::from_paid_expenses(&[]);
        assert_eq!(totals.total_spent, dec!(0));
        assert_eq!(totals.last_purchase_date, None);
    }

    #[test]
    fn test_single_paid_expense() {
        let totals = SupplierTotals::from_paid_expenses(&[paid(dec!(121.00), 2026, 1, 15)]);
        assert_eq!(totals.total_spent, dec!(121.00));
        assert_eq!(
            totals.last_purchase_date,
            NaiveDate::from_ymd_opt(2026, 1, 15)
        );
    }

    #[test]
    fn test_sums_and_takes_latest_date() {
        let totals = SupplierTotals::from_paid_expenses(&[
            paid(dec!(100.00), 2026, 1, 10),
            paid(dec!(50.50), 2026, 3, 2),
            paid(dec!(0.01), 2026, 2, 28),
        ]);
        assert_eq!(totals.total_spent, dec!(150.51));
        assert_eq!(
            totals.last_purchase_date,
            NaiveDate::from_ymd_opt(2026, 3, 2)
        );
    }
}
