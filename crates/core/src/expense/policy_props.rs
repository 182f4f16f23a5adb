//! Property-based tests for the approval/payment gate.

use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::expense::policy::{ApprovalPolicy, PaymentGate};
use crate::expense::types::ExpenseStatus;

fn arb_status() -> impl Strategy<Value = ExpenseStatus> {
    prop_oneof![
        Just(ExpenseStatus::Draft),
        Just(ExpenseStatus::Pending),
        Just(ExpenseStatus::Approved),
        Just(ExpenseStatus::Paid),
        Just(ExpenseStatus::Rejected),
    ]
}

fn arb_money() -> impl Strategy<Value = Decimal> {
    (0i64..=100_000_00).prop_map(|cents| Decimal::new(cents, 2))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// With approval disabled the gate never blocks, regardless of
    /// status, amount, or threshold.
    #[test]
    fn prop_disabled_gate_always_allows(
        status in arb_status(),
        total in arb_money(),
        threshold in arb_money()
    ) {
        let gate = PaymentGate {
            require_approval: false,
            approval_threshold: threshold,
        };
        prop_assert!(ApprovalPolicy::can_mark_paid(status, total, &gate));
    }

    /// An approved expense always passes the gate.
    #[test]
    fn prop_approved_always_allowed(total in arb_money(), threshold in arb_money()) {
        let gate = PaymentGate {
            require_approval: true,
            approval_threshold: threshold,
        };
        prop_assert!(ApprovalPolicy::can_mark_paid(ExpenseStatus::Approved, total, &gate));
    }

    /// A zero threshold blocks every non-approved expense.
    #[test]
    fn prop_zero_threshold_blocks_non_approved(
        status in arb_status(),
        total in arb_money()
    ) {
        prop_assume!(status != ExpenseStatus::Approved);
        let gate = PaymentGate {
            require_approval: true,
            approval_threshold: Decimal::ZERO,
        };
        prop_assert!(!ApprovalPolicy::can_mark_paid(status, total, &gate));
    }

    /// The decision matches the literal double condition: a non-approved
    /// expense is blocked iff the total exceeds the threshold or the
    /// threshold is zero.
    #[test]
    fn prop_matches_literal_rule(
        status in arb_status(),
        total in arb_money(),
        threshold in arb_money()
    ) {
        let gate = PaymentGate {
            require_approval: true,
            approval_threshold: threshold,
        };
        let allowed = ApprovalPolicy::can_mark_paid(status, total, &gate);
        let expected = status == ExpenseStatus::Approved
            || (total <= threshold && !threshold.is_zero());
        prop_assert_eq!(allowed, expected);
    }
}
