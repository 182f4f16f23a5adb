//! Expense lifecycle state transitions.
//!
//! This module implements the core state machine logic for moving
//! expenses through the approval/payment workflow. All methods are
//! pure: the caller supplies the clock and persists the returned
//! [`LifecycleAction`] atomically.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::expense::error::ExpenseError;
use crate::expense::policy::{ApprovalPolicy, PaymentGate};
use crate::expense::types::{ExpenseStatus, LifecycleAction};

/// Stateless service for managing expense lifecycle transitions.
pub struct ExpenseLifecycle;

impl ExpenseLifecycle {
    /// Submit a draft expense for approval.
    ///
    /// # Errors
    ///
    /// Returns `ExpenseError::InvalidTransition` unless the expense is
    /// in `Draft` status.
    pub fn submit(current_status: ExpenseStatus) -> Result<LifecycleAction, ExpenseError> {
        match current_status {
            ExpenseStatus::Draft => Ok(LifecycleAction::Submit {
                new_status: ExpenseStatus::Pending,
            }),
            _ => Err(ExpenseError::InvalidTransition {
                from: current_status,
                to: ExpenseStatus::Pending,
            }),
        }
    }

    /// Approve a draft or pending expense.
    ///
    /// Only this transition writes `approved_by` and `approved_at`.
    ///
    /// # Errors
    ///
    /// Returns `ExpenseError::InvalidTransition` when the expense is
    /// already approved, paid, or rejected.
    pub fn approve(
        current_status: ExpenseStatus,
        approved_by: Uuid,
        approved_at: DateTime<Utc>,
    ) -> Result<LifecycleAction, ExpenseError> {
        match current_status {
            ExpenseStatus::Draft | ExpenseStatus::Pending => Ok(LifecycleAction::Approve {
                new_status: ExpenseStatus::Approved,
                approved_by,
                approved_at,
            }),
            _ => Err(ExpenseError::InvalidTransition {
                from: current_status,
                to: ExpenseStatus::Approved,
            }),
        }
    }

    /// Reject a draft or pending expense.
    ///
    /// # Errors
    ///
    /// Returns `ExpenseError::InvalidTransition` when the expense is
    /// already approved, paid, or rejected.
    pub fn reject(current_status: ExpenseStatus) -> Result<LifecycleAction, ExpenseError> {
        match current_status {
            ExpenseStatus::Draft | ExpenseStatus::Pending => Ok(LifecycleAction::Reject {
                new_status: ExpenseStatus::Rejected,
            }),
            _ => Err(ExpenseError::InvalidTransition {
                from: current_status,
                to: ExpenseStatus::Rejected,
            }),
        }
    }

    /// Mark an expense as paid, gated by the approval policy.
    ///
    /// The state machine itself does not restrict the source status;
    /// the gate alone decides. On success the caller must recompute the
    /// linked supplier's aggregates in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns `ExpenseError::ApprovalRequired` when the gate declines.
    pub fn mark_paid(
        current_status: ExpenseStatus,
        total_amount: Decimal,
        gate: &PaymentGate,
        paid_at: DateTime<Utc>,
    ) -> Result<LifecycleAction, ExpenseError> {
        ApprovalPolicy::check_mark_paid(current_status, total_amount, gate)?;

        Ok(LifecycleAction::MarkPaid {
            new_status: ExpenseStatus::Paid,
            paid_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn open_gate() -> PaymentGate {
        PaymentGate {
            require_approval: false,
            approval_threshold: dec!(0.00),
        }
    }

    #[test]
    fn test_submit_from_draft() {
        let action = ExpenseLifecycle::submit(ExpenseStatus::Draft).unwrap();
        assert_eq!(action.new_status(), ExpenseStatus::Pending);
    }

    #[rstest]
    #[case(ExpenseStatus::Pending)]
    #[case(ExpenseStatus::Approved)]
    #[case(ExpenseStatus::Paid)]
    #[case(ExpenseStatus::Rejected)]
    fn test_submit_from_non_draft_fails(#[case] status: ExpenseStatus) {
        assert!(matches!(
            ExpenseLifecycle::submit(status),
            Err(ExpenseError::InvalidTransition { .. })
        ));
    }

    #[rstest]
    #[case(ExpenseStatus::Draft)]
    #[case(ExpenseStatus::Pending)]
    fn test_approve_from_open_status(#[case] status: ExpenseStatus) {
        let actor = Uuid::new_v4();
        let now = Utc::now();
        let action = ExpenseLifecycle::approve(status, actor, now).unwrap();
        assert_eq!(action.new_status(), ExpenseStatus::Approved);
        match action {
            LifecycleAction::Approve {
                approved_by,
                approved_at,
                ..
            } => {
                assert_eq!(approved_by, actor);
                assert_eq!(approved_at, now);
            }
            other => panic!("expected Approve action, got {other:?}"),
        }
    }

    #[rstest]
    #[case(ExpenseStatus::Approved)]
    #[case(ExpenseStatus::Paid)]
    #[case(ExpenseStatus::Rejected)]
    fn test_approve_from_closed_status_fails(#[case] status: ExpenseStatus) {
        let result = ExpenseLifecycle::approve(status, Uuid::new_v4(), Utc::now());
        assert!(matches!(
            result,
            Err(ExpenseError::InvalidTransition { .. })
        ));
    }

    #[rstest]
    #[case(ExpenseStatus::Draft)]
    #[case(ExpenseStatus::Pending)]
    fn test_reject_from_open_status(#[case] status: ExpenseStatus) {
        let action = ExpenseLifecycle::reject(status).unwrap();
        assert_eq!(action.new_status(), ExpenseStatus::Rejected);
    }

    #[rstest]
    #[case(ExpenseStatus::Approved)]
    #[case(ExpenseStatus::Paid)]
    #[case(ExpenseStatus::Rejected)]
    fn test_reject_from_closed_status_fails(#[case] status: ExpenseStatus) {
        assert!(matches!(
            ExpenseLifecycle::reject(status),
            Err(ExpenseError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_mark_paid_without_approval_requirement() {
        let now = Utc::now();
        let action =
            ExpenseLifecycle::mark_paid(ExpenseStatus::Draft, dec!(1000.00), &open_gate(), now)
                .unwrap();
        assert_eq!(action.new_status(), ExpenseStatus::Paid);
        match action {
            LifecycleAction::MarkPaid { paid_at, .. } => assert_eq!(paid_at, now),
            other => panic!("expected MarkPaid action, got {other:?}"),
        }
    }

    #[test]
    fn test_mark_paid_declined_by_gate() {
        let gate = PaymentGate {
            require_approval: true,
            approval_threshold: dec!(0.00),
        };
        let result =
            ExpenseLifecycle::mark_paid(ExpenseStatus::Pending, dec!(10.00), &gate, Utc::now());
        assert!(matches!(result, Err(ExpenseError::ApprovalRequired { .. })));
    }

    #[test]
    fn test_mark_paid_under_threshold_without_approval() {
        let gate = PaymentGate {
            require_approval: true,
            approval_threshold: dec!(500.00),
        };
        let action =
            ExpenseLifecycle::mark_paid(ExpenseStatus::Draft, dec!(100.00), &gate, Utc::now())
                .unwrap();
        assert_eq!(action.new_status(), ExpenseStatus::Paid);
    }
}
