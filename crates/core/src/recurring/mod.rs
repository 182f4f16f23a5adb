//! Recurring expense schedule arithmetic.
//!
//! Recurring expenses are templates from which concrete expenses are
//! generated; this module owns the frequency vocabulary and the
//! due-date advancement rule.

pub mod schedule;

#[cfg(test)]
mod schedule_props;

pub use schedule::{Frequency, next_date_after};
