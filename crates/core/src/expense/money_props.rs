//! Property-based tests for tax/total computation.

use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::expense::money::compute_amounts;

/// Strategy for non-negative 2dp amounts up to 99,999,999.99.
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (0i64..=9_999_999_999).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for non-negative 2dp tax rates up to 100.00%.
fn arb_tax_rate() -> impl Strategy<Value = Decimal> {
    (0i64..=10_000).prop_map(|bp| Decimal::new(bp, 2))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// The derived fields always satisfy the rounding invariant.
    #[test]
    fn prop_invariant_holds(amount in arb_amount(), tax_rate in arb_tax_rate()) {
        let breakdown = compute_amounts(amount, tax_rate).unwrap();

        let expected_tax = (amount * tax_rate / Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero);
        prop_assert_eq!(breakdown.tax_amount, expected_tax);
        prop_assert_eq!(breakdown.total_amount, amount + expected_tax);
    }

    /// Recomputation is idempotent: the same inputs always yield the
    /// same derived fields, no matter how many times they are applied.
    #[test]
    fn prop_idempotent(amount in arb_amount(), tax_rate in arb_tax_rate()) {
        let first = compute_amounts(amount, tax_rate).unwrap();
        let second = compute_amounts(amount, tax_rate).unwrap();
        prop_assert_eq!(first, second);
    }

    /// Derived fields carry at most 2 fraction digits.
    #[test]
    fn prop_two_decimal_places(amount in arb_amount(), tax_rate in arb_tax_rate()) {
        let breakdown = compute_amounts(amount, tax_rate).unwrap();
        prop_assert!(breakdown.tax_amount.scale() <= 2);
        prop_assert!(breakdown.total_amount.scale() <= 2);
    }

    /// Tax is never negative and the total is never below the net amount.
    #[test]
    fn prop_monotone_bounds(amount in arb_amount(), tax_rate in arb_tax_rate()) {
        let breakdown = compute_amounts(amount, tax_rate).unwrap();
        prop_assert!(breakdown.tax_amount >= Decimal::ZERO);
        prop_assert!(breakdown.total_amount >= amount);
    }
}
