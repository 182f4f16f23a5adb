//! Expense error types for lifecycle and numbering operations.

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::expense::types::ExpenseStatus;

/// Errors that can occur during expense operations.
#[derive(Debug, Error)]
pub enum ExpenseError {
    /// Attempted an invalid status transition.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        /// The current status.
        from: ExpenseStatus,
        /// The attempted target status.
        to: ExpenseStatus,
    },

    /// The approval gate declined a mark-paid request.
    #[error(
        "Expense requires approval before it can be marked as paid \
         (total {total_amount}, threshold {threshold})"
    )]
    ApprovalRequired {
        /// The expense total amount.
        total_amount: Decimal,
        /// The hub's approval threshold.
        threshold: Decimal,
    },

    /// Amount is negative.
    #[error("Amount must not be negative, got {0}")]
    NegativeAmount(Decimal),

    /// Tax rate is negative.
    #[error("Tax rate must not be negative, got {0}")]
    NegativeTaxRate(Decimal),

    /// Title is required but empty.
    #[error("Title is required")]
    TitleRequired,

    /// Expense not found in this hub's scope.
    #[error("Expense {0} not found")]
    ExpenseNotFound(Uuid),

    /// Expense number already taken (unique-index backstop; the counter
    /// serialization should make this unreachable).
    #[error("Expense number '{0}' already exists")]
    DuplicateNumber(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl ExpenseError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidTransition { .. }
            | Self::ApprovalRequired { .. }
            | Self::DuplicateNumber(_) => 409,

            Self::NegativeAmount(_) | Self::NegativeTaxRate(_) | Self::TitleRequired => 422,

            Self::ExpenseNotFound(_) => 404,

            Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::ApprovalRequired { .. } => "APPROVAL_REQUIRED",
            Self::NegativeAmount(_) => "NEGATIVE_AMOUNT",
            Self::NegativeTaxRate(_) => "NEGATIVE_TAX_RATE",
            Self::TitleRequired => "TITLE_REQUIRED",
            Self::ExpenseNotFound(_) => "EXPENSE_NOT_FOUND",
            Self::DuplicateNumber(_) => "DUPLICATE_NUMBER",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}
