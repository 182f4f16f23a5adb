//! Supplier spending aggregates.
//!
//! `total_spent` and `last_purchase_date` on a supplier are a cached
//! projection over its paid expenses, never user-writable state. The
//! persistence layer fetches the paid rows and this module folds them.

pub mod totals;

pub use totals::{PaidExpense, SupplierTotals};
