//! Property-based tests for the expense lifecycle state machine.

use chrono::Utc;
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::expense::error::ExpenseError;
use crate::expense::lifecycle::ExpenseLifecycle;
use crate::expense::policy::PaymentGate;
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

fn arb_uuid() -> impl Strategy<Value = Uuid> {
    any::<u128>().prop_map(Uuid::from_u128)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Approve succeeds exactly from draft and pending, and the action
    /// carries the actor and timestamp it was given.
    #[test]
    fn prop_approve_matrix(status in arb_status(), actor in arb_uuid()) {
        let now = Utc::now();
        let result = ExpenseLifecycle::approve(status, actor, now);
        if status.is_open() {
            let action = result.unwrap();
            prop_assert_eq!(action.new_status(), ExpenseStatus::Approved);
            if let crate::expense::types::LifecycleAction::Approve {
                approved_by, approved_at, ..
            } = action {
                prop_assert_eq!(approved_by, actor);
                prop_assert_eq!(approved_at, now);
            } else {
                prop_assert!(false, "expected Approve action");
            }
        } else {
            let declined = matches!(result, Err(ExpenseError::InvalidTransition { .. }));
            prop_assert!(declined);
        }
    }

    /// Reject succeeds exactly from draft and pending.
    #[test]
    fn prop_reject_matrix(status in arb_status()) {
        let result = ExpenseLifecycle::reject(status);
        if status.is_open() {
            prop_assert_eq!(result.unwrap().new_status(), ExpenseStatus::Rejected);
        } else {
            let declined = matches!(result, Err(ExpenseError::InvalidTransition { .. }));
            prop_assert!(declined);
        }
    }

    /// Submit succeeds exactly from draft.
    #[test]
    fn prop_submit_matrix(status in arb_status()) {
        let result = ExpenseLifecycle::submit(status);
        if status == ExpenseStatus::Draft {
            prop_assert_eq!(result.unwrap().new_status(), ExpenseStatus::Pending);
        } else {
            let declined = matches!(result, Err(ExpenseError::InvalidTransition { .. }));
            prop_assert!(declined);
        }
    }

    /// Mark-paid succeeds from any status when the gate is disabled.
    #[test]
    fn prop_mark_paid_open_gate(status in arb_status(), cents in 0i64..=100_000_00) {
        let gate = PaymentGate {
            require_approval: false,
            approval_threshold: Decimal::ZERO,
        };
        let result =
            ExpenseLifecycle::mark_paid(status, Decimal::new(cents, 2), &gate, Utc::now());
        prop_assert_eq!(result.unwrap().new_status(), ExpenseStatus::Paid);
    }
}
