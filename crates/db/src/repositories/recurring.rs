//! Recurring expense templates and expense generation.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use outlay_core::expense::{ExpenseError, ExpenseStatus};
use outlay_core::recurring::{Frequency, next_date_after};
use outlay_shared::types::{PageRequest, PageResponse};

use crate::entities::{expense_settings, expenses, recurring_expenses, sea_orm_active_enums};
use crate::repositories::expense::{CreateExpenseInput, insert_with_number};

/// Errors from recurring template operations.
#[derive(Debug, Error)]
pub enum RecurringError {
    /// Template does not exist in the hub's scope.
    #[error("Recurring expense not found: {0}")]
    NotFound(Uuid),

    /// Template title was missing or blank.
    #[error("Recurring expense title is required")]
    TitleRequired,

    /// Generation was requested on a deactivated template.
    #[error("Recurring expense {0} is inactive")]
    Inactive(Uuid),

    /// Generating the expense itself failed.
    #[error(transparent)]
    Expense(#[from] ExpenseError),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(String),
}

impl RecurringError {
    /// Maps the error to an HTTP status code.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::TitleRequired => 422,
            Self::Inactive(_) => 409,
            Self::Expense(e) => e.status_code(),
            Self::Database(_) => 500,
        }
    }

    /// Machine-readable error code.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "RECURRING_NOT_FOUND",
            Self::TitleRequired => "RECURRING_TITLE_REQUIRED",
            Self::Inactive(_) => "RECURRING_INACTIVE",
            Self::Expense(e) => e.error_code(),
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

impl From<DbErr> for RecurringError {
    fn from(e: DbErr) -> Self {
        Self::Database(e.to_string())
    }
}

/// Input for creating a recurring template.
#[derive(Debug, Clone)]
pub struct CreateRecurringInput {
    /// Hub (tenant) scope.
    pub hub_id: Uuid,
    /// Template title, copied onto generated expenses.
    pub title: String,
    /// Optional category for generated expenses.
    pub category_id: Option<Uuid>,
    /// Optional supplier for generated expenses.
    pub supplier_id: Option<Uuid>,
    /// Net amount of each generated expense.
    pub amount: Decimal,
    /// Tax rate; the hub's default applies when omitted.
    pub tax_rate: Option<Decimal>,
    /// Recurrence frequency.
    pub frequency: Frequency,
    /// First due date.
    pub next_due_date: chrono::NaiveDate,
    /// Whether a background job may generate from this template.
    pub auto_create: bool,
}

/// Input for updating a recurring template.
#[derive(Debug, Clone, Default)]
pub struct UpdateRecurringInput {
    /// New title.
    pub title: Option<String>,
    /// New category (`Some(None)` clears it).
    pub category_id: Option<Option<Uuid>>,
    /// New supplier.
    pub supplier_id: Option<Option<Uuid>>,
    /// New amount.
    pub amount: Option<Decimal>,
    /// New tax rate.
    pub tax_rate: Option<Decimal>,
    /// New frequency.
    pub frequency: Option<Frequency>,
    /// New next due date.
    pub next_due_date: Option<chrono::NaiveDate>,
    /// Active flag.
    pub is_active: Option<bool>,
    /// Auto-create flag.
    pub auto_create: Option<bool>,
}

/// Outcome of generating an expense from a template.
#[derive(Debug, Clone)]
pub struct GeneratedExpense {
    /// The newly created draft expense.
    pub expense: expenses::Model,
    /// The template with its schedule advanced.
    pub template: recurring_expenses::Model,
}

/// Recurring expense repository.
#[derive(Debug, Clone)]
pub struct RecurringRepository {
    db: DatabaseConnection,
}

impl RecurringRepository {
    /// Creates a new recurring expense repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a recurring template.
    ///
    /// # Errors
    ///
    /// Returns `RecurringError::TitleRequired` for a blank title, or a
    /// validation error for a negative amount or tax rate.
    pub async fn create(
        &self,
        input: CreateRecurringInput,
        settings: &expense_settings::Model,
    ) -> Result<recurring_expenses::Model, RecurringError> {
        if input.title.trim().is_empty() {
            return Err(RecurringError::TitleRequired);
        }
        if input.amount.is_sign_negative() {
            return Err(RecurringError::Expense(ExpenseError::NegativeAmount(
                input.amount,
            )));
        }
        let tax_rate = input.tax_rate.unwrap_or(settings.default_tax_rate);
        if tax_rate.is_sign_negative() {
            return Err(RecurringError::Expense(ExpenseError::NegativeTaxRate(
                tax_rate,
            )));
        }

        let now = Utc::now();
        let active = recurring_expenses::ActiveModel {
            id: Set(Uuid::new_v4()),
            hub_id: Set(input.hub_id),
            title: Set(input.title),
            category_id: Set(input.category_id),
            supplier_id: Set(input.supplier_id),
            amount: Set(input.amount),
            tax_rate: Set(tax_rate),
            frequency: Set(core_frequency_to_db(input.frequency)),
            next_due_date: Set(input.next_due_date),
            is_active: Set(true),
            auto_create: Set(input.auto_create),
            last_generated_date: Set(None),
            is_deleted: Set(false),
            deleted_at: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let created = active.insert(&self.db).await?;
        info!(hub_id = %created.hub_id, recurring_id = %created.id, "Created recurring expense");
        Ok(created)
    }

    /// Fetches a non-deleted template.
    ///
    /// # Errors
    ///
    /// Returns `RecurringError::NotFound` if missing or deleted.
    pub async fn find_by_id(
        &self,
        hub_id: Uuid,
        recurring_id: Uuid,
    ) -> Result<recurring_expenses::Model, RecurringError> {
        recurring_expenses::Entity::find_by_id(recurring_id)
            .filter(recurring_expenses::Column::HubId.eq(hub_id))
            .filter(recurring_expenses::Column::IsDeleted.eq(false))
            .one(&self.db)
            .await?
            .ok_or(RecurringError::NotFound(recurring_id))
    }

    /// Lists the hub's non-deleted templates ordered by next due date.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        hub_id: Uuid,
        page: &PageRequest,
    ) -> Result<PageResponse<recurring_expenses::Model>, RecurringError> {
        let query = recurring_expenses::Entity::find()
            .filter(recurring_expenses::Column::HubId.eq(hub_id))
            .filter(recurring_expenses::Column::IsDeleted.eq(false));

        let total = query.clone().count(&self.db).await?;

        let items = query
            .order_by_asc(recurring_expenses::Column::NextDueDate)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok(PageResponse::new(items, page.page, page.per_page, total))
    }

    /// Updates a template.
    ///
    /// # Errors
    ///
    /// Returns `RecurringError::NotFound` or a validation error.
    pub async fn update(
        &self,
        hub_id: Uuid,
        recurring_id: Uuid,
        input: UpdateRecurringInput,
    ) -> Result<recurring_expenses::Model, RecurringError> {
        let current = self.find_by_id(hub_id, recurring_id).await?;

        if let Some(title) = input.title.as_deref()
            && title.trim().is_empty()
        {
            return Err(RecurringError::TitleRequired);
        }
        if let Some(amount) = input.amount
            && amount.is_sign_negative()
        {
            return Err(RecurringError::Expense(ExpenseError::NegativeAmount(amount)));
        }
        if let Some(rate) = input.tax_rate
            && rate.is_sign_negative()
        {
            return Err(RecurringError::Expense(ExpenseError::NegativeTaxRate(rate)));
        }

        let mut active: recurring_expenses::ActiveModel = current.into();
        if let Some(title) = input.title {
            active.title = Set(title);
        }
        if let Some(category_id) = input.category_id {
            active.category_id = Set(category_id);
        }
        if let Some(supplier_id) = input.supplier_id {
            active.supplier_id = Set(supplier_id);
        }
        if let Some(amount) = input.amount {
            active.amount = Set(amount);
        }
        if let Some(tax_rate) = input.tax_rate {
            active.tax_rate = Set(tax_rate);
        }
        if let Some(frequency) = input.frequency {
            active.frequency = Set(core_frequency_to_db(frequency));
        }
        if let Some(next_due_date) = input.next_due_date {
            active.next_due_date = Set(next_due_date);
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        if let Some(auto_create) = input.auto_create {
            active.auto_create = Set(auto_create);
        }
        active.updated_at = Set(Utc::now().into());

        Ok(active.update(&self.db).await?)
    }

    /// Soft-deletes a template. Already generated expenses are kept.
    ///
    /// # Errors
    ///
    /// Returns `RecurringError::NotFound` if missing or already deleted.
    pub async fn soft_delete(&self, hub_id: Uuid, recurring_id: Uuid) -> Result<(), RecurringError> {
        let current = self.find_by_id(hub_id, recurring_id).await?;
        let now = Utc::now();

        let mut active: recurring_expenses::ActiveModel = current.into();
        active.is_deleted = Set(true);
        active.deleted_at = Set(Some(now.into()));
        active.updated_at = Set(now.into());
        active.update(&self.db).await?;

        info!(%hub_id, %recurring_id, "Soft-deleted recurring expense");
        Ok(())
    }

    /// Generates a draft expense from the template and advances its
    /// schedule, atomically.
    ///
    /// The expense is dated on the template's current due date; the
    /// template's `next_due_date` advances by one interval and
    /// `last_generated_date` records today.
    ///
    /// # Errors
    ///
    /// Returns `RecurringError::Inactive` for a deactivated template.
    pub async fn generate(
        &self,
        hub_id: Uuid,
        recurring_id: Uuid,
        settings: &expense_settings::Model,
    ) -> Result<GeneratedExpense, RecurringError> {
        let template = self.find_by_id(hub_id, recurring_id).await?;
        if !template.is_active {
            return Err(RecurringError::Inactive(recurring_id));
        }

        let due_date = template.next_due_date;
        let frequency = db_frequency_to_core(&template.frequency);
        let advanced = next_date_after(due_date, frequency);

        let txn = self.db.begin().await?;

        let expense = insert_with_number(
            &txn,
            CreateExpenseInput {
                hub_id,
                title: template.title.clone(),
                description: None,
                category_id: template.category_id,
                supplier_id: template.supplier_id,
                amount: template.amount,
                tax_rate: Some(template.tax_rate),
                expense_date: due_date,
                due_date: Some(due_date),
                status: Some(ExpenseStatus::Draft),
                payment_method: None,
                reference_number: None,
                receipt_ref: None,
                notes: None,
            },
            settings,
        )
        .await?;

        let mut active: recurring_expenses::ActiveModel = template.into();
        active.next_due_date = Set(advanced);
        active.last_generated_date = Set(Some(Utc::now().date_naive()));
        active.updated_at = Set(Utc::now().into());
        let template = active.update(&txn).await?;

        txn.commit().await?;

        info!(
            %hub_id,
            %recurring_id,
            expense_id = %expense.id,
            next_due = %template.next_due_date,
            "Generated expense from recurring template"
        );
        Ok(GeneratedExpense { expense, template })
    }
}

/// Converts the core frequency to the database enum.
pub(crate) fn core_frequency_to_db(freq: Frequency) -> sea_orm_active_enums::RecurrenceFrequency {
    match freq {
        Frequency::Weekly => sea_orm_active_enums::RecurrenceFrequency::Weekly,
        Frequency::Monthly => sea_orm_active_enums::RecurrenceFrequency::Monthly,
        Frequency::Quarterly => sea_orm_active_enums::RecurrenceFrequency::Quarterly,
        Frequency::Yearly => sea_orm_active_enums::RecurrenceFrequency::Yearly,
    }
}

/// Converts the database enum to the core frequency.
pub(crate) fn db_frequency_to_core(
    freq: &sea_orm_active_enums::RecurrenceFrequency,
) -> Frequency {
    match freq {
        sea_orm_active_enums::RecurrenceFrequency::Weekly => Frequency::Weekly,
        sea_orm_active_enums::RecurrenceFrequency::Monthly => Frequency::Monthly,
        sea_orm_active_enums::RecurrenceFrequency::Quarterly => Frequency::Quarterly,
        sea_orm_active_enums::RecurrenceFrequency::Yearly => Frequency::Yearly,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_codes_delegate_to_expense_errors() {
        let id = Uuid::new_v4();

        assert_eq!(RecurringError::NotFound(id).status_code(), 404);
        assert_eq!(RecurringError::Inactive(id).status_code(), 409);
        assert_eq!(RecurringError::TitleRequired.error_code(), "RECURRING_TITLE_REQUIRED");

        let wrapped = RecurringError::Expense(ExpenseError::ExpenseNotFound(id));
        assert_eq!(wrapped.status_code(), 404);
        assert_eq!(wrapped.error_code(), "EXPENSE_NOT_FOUND");

        let negative = RecurringError::Expense(ExpenseError::NegativeAmount(dec!(-1.00)));
        assert_eq!(negative.status_code(), 422);
    }
}
