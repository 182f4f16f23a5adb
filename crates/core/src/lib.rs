//! Core business logic for Outlay.
//!
//! This crate contains pure business logic with ZERO web or database
//! dependencies. All domain types, validation rules, and calculations
//! live here.
//!
//! # Modules
//!
//! - `expense` - Expense lifecycle state machine, numbering, tax math,
//!   and the approval/payment gate
//! - `supplier` - Supplier spending aggregates (recomputed projection)
//! - `category` - Category tree rules
//! - `recurring` - Recurring expense schedule arithmetic

pub mod category;
pub mod expense;
pub mod recurring;
pub mod supplier;
