//! Expense lifecycle and numbering engine.
//!
//! This module implements the expense state machine, tax/total
//! derivation, expense number formatting, and the approval/payment gate.
//!
//! # Modules
//!
//! - `types` - Domain types (`ExpenseStatus`, `LifecycleAction`)
//! - `error` - Expense-specific error types
//! - `money` - Tax and total computation
//! - `numbering` - Expense number period keys and sequences
//! - `policy` - Approval gate for the mark-paid transition
//! - `lifecycle` - State transition logic

pub mod error;
pub mod lifecycle;
pub mod money;
pub mod numbering;
pub mod policy;
pub mod types;

#[cfg(test)]
mod lifecycle_props;
#[cfg(test)]
mod money_props;
#[cfg(test)]
mod numbering_props;
#[cfg(test)]
mod policy_props;

pub use error::ExpenseError;
pub use lifecycle::ExpenseLifecycle;
pub use money::{TaxBreakdown, compute_amounts};
pub use policy::{ApprovalPolicy, PaymentGate};
pub use types::{ExpenseStatus, LifecycleAction};
