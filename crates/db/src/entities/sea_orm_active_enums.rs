//! Postgres enum types used by the entities.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Expense status in the approval/payment workflow.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "expense_status")]
#[serde(rename_all = "lowercase")]
pub enum ExpenseStatus {
    /// Expense is being drafted.
    #[sea_orm(string_value = "draft")]
    Draft,
    /// Expense has been submitted for approval.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Expense has been approved.
    #[sea_orm(string_value = "approved")]
    Approved,
    /// Expense has been paid.
    #[sea_orm(string_value = "paid")]
    Paid,
    /// Expense has been rejected.
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

/// Recurring expense frequency.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(
    rs_type = "String",
    db_type = "Enum",
    enum_name = "recurrence_frequency"
)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceFrequency {
    /// Every 7 days.
    #[sea_orm(string_value = "weekly")]
    Weekly,
    /// Every calendar month.
    #[sea_orm(string_value = "monthly")]
    Monthly,
    /// Every 3 calendar months.
    #[sea_orm(string_value = "quarterly")]
    Quarterly,
    /// Every calendar year.
    #[sea_orm(string_value = "yearly")]
    Yearly,
}
