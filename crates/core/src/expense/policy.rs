//! Approval gate for the mark-paid transition.

use rust_decimal::Decimal;

use crate::expense::error::ExpenseError;
use crate::expense::types::ExpenseStatus;

/// The per-hub settings consulted by the payment gate.
#[derive(Debug, Clone, Copy)]
pub struct PaymentGate {
    /// Whether paying an expense requires prior approval at all.
    pub require_approval: bool,
    /// Amount threshold above which approval is mandatory. A threshold
    /// of zero means every expense requires approval.
    pub approval_threshold: Decimal,
}

/// Stateless policy deciding whether an expense may be marked paid.
pub struct ApprovalPolicy;

impl ApprovalPolicy {
    /// Returns whether an expense may transition to paid.
    ///
    /// The literal rule, easy to misstate:
    /// - `require_approval = false`: always allowed, regardless of
    ///   status or threshold.
    /// - `require_approval = true`: an expense already in `Approved`
    ///   status is always allowed. A non-approved expense is blocked
    ///   when `total_amount > approval_threshold` OR the threshold is
    ///   exactly zero (zero blocks all amounts). Consequently a
    ///   non-approved expense can still be paid when the threshold is
    ///   positive and the total does not exceed it.
    #[must_use]
    pub fn can_mark_paid(
        current_status: ExpenseStatus,
        total_amount: Decimal,
        gate: &PaymentGate,
    ) -> bool {
        if !gate.require_approval {
            return true;
        }
        if current_status == ExpenseStatus::Approved {
            return true;
        }
        total_amount <= gate.approval_threshold && !gate.approval_threshold.is_zero()
    }

    /// Checks the payment gate, returning a typed decline.
    ///
    /// # Errors
    ///
    /// Returns `ExpenseError::ApprovalRequired` when the gate blocks the
    /// transition.
    pub fn check_mark_paid(
        current_status: ExpenseStatus,
        total_amount: Decimal,
        gate: &PaymentGate,
    ) -> Result<(), ExpenseError> {
        if Self::can_mark_paid(current_status, total_amount, gate) {
            Ok(())
        } else {
            Err(ExpenseError::ApprovalRequired {
                total_amount,
                threshold: gate.approval_threshold,
            })
        }
    }
}
