//! `SeaORM` entity definitions.

pub mod expense_categories;
pub mod expense_counters;
pub mod expense_settings;
pub mod expenses;
pub mod recurring_expenses;
pub mod sea_orm_active_enums;
pub mod suppliers;
