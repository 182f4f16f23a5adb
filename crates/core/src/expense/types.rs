//! Expense domain types for lifecycle management.
//!
//! This module defines the core types used for managing expense
//! status transitions and lifecycle actions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Expense status in the approval/payment workflow.
///
/// Expenses progress through these states from creation to payment.
/// The transitions exposed as operations are:
/// - Draft → Pending (submit)
/// - Draft/Pending → Approved (approve)
/// - Draft/Pending → Rejected (reject)
/// - any, gated by the approval policy → Paid (mark-paid)
///
/// `Paid` and `Rejected` are conventionally terminal but the model does
/// not prevent further edits to such expenses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseStatus {
    /// Expense is being drafted.
    Draft,
    /// Expense has been submitted for approval.
    Pending,
    /// Expense has been approved and may be paid.
    Approved,
    /// Expense has been paid.
    Paid,
    /// Expense has been rejected.
    Rejected,
}

impl ExpenseStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Paid => "paid",
            Self::Rejected => "rejected",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "paid" => Some(Self::Paid),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Returns true if the expense can still be approved or rejected.
    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Draft | Self::Pending)
    }

    /// Returns true if the expense has reached a conventionally terminal
    /// status.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Paid | Self::Rejected)
    }
}

impl fmt::Display for ExpenseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle action representing a state transition with audit data.
///
/// Each variant captures the action performed, the resulting status,
/// and the fields the transition is allowed to stamp. Only the approve
/// transition writes `approved_by`/`approved_at`, and only mark-paid
/// writes `paid_at`.
#[derive(Debug, Clone)]
pub enum LifecycleAction {
    /// Submit a draft expense for approval.
    Submit {
        /// The new status after submission.
        new_status: ExpenseStatus,
    },
    /// Approve a draft or pending expense.
    Approve {
        /// The new status after approval.
        new_status: ExpenseStatus,
        /// The actor who approved the expense.
        approved_by: Uuid,
        /// When the expense was approved.
        approved_at: DateTime<Utc>,
    },
    /// Reject a draft or pending expense.
    Reject {
        /// The new status after rejection.
        new_status: ExpenseStatus,
    },
    /// Mark an expense as paid.
    MarkPaid {
        /// The new status after payment.
        new_status: ExpenseStatus,
        /// When the expense was paid.
        paid_at: DateTime<Utc>,
    },
}

impl LifecycleAction {
    /// Returns the new status resulting from this action.
    #[must_use]
    pub fn new_status(&self) -> ExpenseStatus {
        match self {
            Self::Submit { new_status }
            | Self::Approve { new_status, .. }
            | Self::Reject { new_status }
            | Self::MarkPaid { new_status, .. } => *new_status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_as_str() {
        assert_eq!(ExpenseStatus::Draft.as_str(), "draft");
        assert_eq!(ExpenseStatus::Pending.as_str(), "pending");
        assert_eq!(ExpenseStatus::Approved.as_str(), "approved");
        assert_eq!(ExpenseStatus::Paid.as_str(), "paid");
        assert_eq!(ExpenseStatus::Rejected.as_str(), "rejected");
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(ExpenseStatus::parse("draft"), Some(ExpenseStatus::Draft));
        assert_eq!(ExpenseStatus::parse("PENDING"), Some(ExpenseStatus::Pending));
        assert_eq!(
            ExpenseStatus::parse("Approved"),
            Some(ExpenseStatus::Approved)
        );
        assert_eq!(ExpenseStatus::parse("paid"), Some(ExpenseStatus::Paid));
        assert_eq!(
            ExpenseStatus::parse("rejected"),
            Some(ExpenseStatus::Rejected)
        );
        assert_eq!(ExpenseStatus::parse("invalid"), None);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(format!("{}", ExpenseStatus::Draft), "draft");
        assert_eq!(format!("{}", ExpenseStatus::Paid), "paid");
    }

    #[test]
    fn test_status_open() {
        assert!(ExpenseStatus::Draft.is_open());
        assert!(ExpenseStatus::Pending.is_open());
        assert!(!ExpenseStatus::Approved.is_open());
        assert!(!ExpenseStatus::Paid.is_open());
        assert!(!ExpenseStatus::Rejected.is_open());
    }

    #[test]
    fn test_status_settled() {
        assert!(!ExpenseStatus::Draft.is_settled());
        assert!(!ExpenseStatus::Pending.is_settled());
        assert!(!ExpenseStatus::Approved.is_settled());
        assert!(ExpenseStatus::Paid.is_settled());
        assert!(ExpenseStatus::Rejected.is_settled());
    }
}
