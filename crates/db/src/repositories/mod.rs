//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the
//! application. They fetch current state, delegate the business rules
//! to `outlay-core`, and persist the outcome atomically.

pub mod category;
pub mod expense;
pub mod recurring;
pub mod report;
pub mod settings;
pub mod supplier;

pub use category::{
    CategoryError, CategoryRepository, CategoryWithCount, CreateCategoryInput, UpdateCategoryInput,
};
pub use expense::{
    CreateExpenseInput, ExpenseFilter, ExpenseRepository, UpdateExpenseInput,
};
pub use recurring::{
    CreateRecurringInput, GeneratedExpense, RecurringError, RecurringRepository,
    UpdateRecurringInput,
};
pub use report::{ReportPeriod, ReportRepository};
pub use settings::{SettingsRepository, UpdateSettingsInput};
pub use supplier::{
    CreateSupplierInput, SupplierError, SupplierFilter, SupplierRepository, UpdateSupplierInput,
};
