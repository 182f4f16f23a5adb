//! Supplier repository: contact records plus derived spend aggregates.

use chrono::Utc;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::{Condition, Expr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use outlay_core::supplier::{PaidExpense, SupplierTotals};
use outlay_shared::types::{PageRequest, PageResponse};

use crate::entities::{expenses, sea_orm_active_enums, suppliers};

/// Errors from supplier operations.
#[derive(Debug, Error)]
pub enum SupplierError {
    /// Supplier does not exist in the hub's scope.
    #[error("Supplier not found: {0}")]
    NotFound(Uuid),

    /// Supplier name was missing or blank.
    #[error("Supplier name is required")]
    NameRequired,

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(String),
}

impl SupplierError {
    /// Maps the error to an HTTP status code.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::NameRequired => 422,
            Self::Database(_) => 500,
        }
    }

    /// Machine-readable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "SUPPLIER_NOT_FOUND",
            Self::NameRequired => "SUPPLIER_NAME_REQUIRED",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

impl From<DbErr> for SupplierError {
    fn from(e: DbErr) -> Self {
        Self::Database(e.to_string())
    }
}

/// Input for creating a supplier.
#[derive(Debug, Clone)]
pub struct CreateSupplierInput {
    /// Hub (tenant) scope.
    pub hub_id: Uuid,
    /// Supplier name.
    pub name: String,
    /// Contact person.
    pub contact_name: Option<String>,
    /// Contact email.
    pub email: Option<String>,
    /// Contact phone.
    pub phone: Option<String>,
    /// Tax identifier (CIF/NIF/VAT).
    pub tax_id: Option<String>,
    /// Street address.
    pub address: Option<String>,
    /// City.
    pub city: Option<String>,
    /// Postal code.
    pub postal_code: Option<String>,
    /// Country; defaults when omitted.
    pub country: Option<String>,
    /// Website URL.
    pub website: Option<String>,
    /// Free-form notes.
    pub notes: Option<String>,
}

/// Input for updating a supplier. The derived aggregates are absent on
/// purpose: they are only written by recomputation.
#[derive(Debug, Clone, Default)]
pub struct UpdateSupplierInput {
    /// New name.
    pub name: Option<String>,
    /// New contact person (`Some(None)` clears it).
    pub contact_name: Option<Option<String>>,
    /// New email.
    pub email: Option<Option<String>>,
    /// New phone.
    pub phone: Option<Option<String>>,
    /// New tax identifier.
    pub tax_id: Option<Option<String>>,
    /// New address.
    pub address: Option<Option<String>>,
    /// New city.
    pub city: Option<Option<String>>,
    /// New postal code.
    pub postal_code: Option<Option<String>>,
    /// New country.
    pub country: Option<String>,
    /// New website.
    pub website: Option<Option<String>>,
    /// New notes.
    pub notes: Option<Option<String>>,
    /// Active flag.
    pub is_active: Option<bool>,
}

/// Filter options for listing suppliers.
#[derive(Debug, Clone, Default)]
pub struct SupplierFilter {
    /// Case-insensitive search across name, email, and tax id.
    pub search: Option<String>,
    /// Include inactive suppliers.
    pub show_inactive: bool,
}

/// Supplier repository.
#[derive(Debug, Clone)]
pub struct SupplierRepository {
    db: DatabaseConnection,
}

impl SupplierRepository {
    /// Creates a new supplier repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a supplier.
    ///
    /// # Errors
    ///
    /// Returns `SupplierError::NameRequired` for a blank name.
    pub async fn create(
        &self,
        input: CreateSupplierInput,
    ) -> Result<suppliers::Model, SupplierError> {
        if input.name.trim().is_empty() {
            return Err(SupplierError::NameRequired);
        }

        let now = Utc::now();
        let active = suppliers::ActiveModel {
            id: Set(Uuid::new_v4()),
            hub_id: Set(input.hub_id),
            name: Set(input.name),
            contact_name: Set(input.contact_name),
            email: Set(input.email),
            phone: Set(input.phone),
            tax_id: Set(input.tax_id),
            address: Set(input.address),
            city: Set(input.city),
            postal_code: Set(input.postal_code),
            country: Set(input.country.unwrap_or_else(|| "España".to_string())),
            website: Set(input.website),
            notes: Set(input.notes),
            is_active: Set(true),
            total_spent: Set(rust_decimal::Decimal::ZERO),
            last_purchase_date: Set(None),
            is_deleted: Set(false),
            deleted_at: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let created = active.insert(&self.db).await?;
        info!(hub_id = %created.hub_id, supplier_id = %created.id, "Created supplier");
        Ok(created)
    }

    /// Fetches a non-deleted supplier.
    ///
    /// # Errors
    ///
    /// Returns `SupplierError::NotFound` if missing or deleted.
    pub async fn find_by_id(
        &self,
        hub_id: Uuid,
        supplier_id: Uuid,
    ) -> Result<suppliers::Model, SupplierError> {
        suppliers::Entity::find_by_id(supplier_id)
            .filter(suppliers::Column::HubId.eq(hub_id))
            .filter(suppliers::Column::IsDeleted.eq(false))
            .one(&self.db)
            .await?
            .ok_or(SupplierError::NotFound(supplier_id))
    }

    /// Lists non-deleted suppliers of a hub, ordered by name.
    ///
    /// Inactive suppliers are hidden unless the filter opts in.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        hub_id: Uuid,
        filter: &SupplierFilter,
        page: &PageRequest,
    ) -> Result<PageResponse<suppliers::Model>, SupplierError> {
        let mut query = suppliers::Entity::find()
            .filter(suppliers::Column::HubId.eq(hub_id))
            .filter(suppliers::Column::IsDeleted.eq(false));

        if !filter.show_inactive {
            query = query.filter(suppliers::Column::IsActive.eq(true));
        }
        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = format!("%{search}%");
            query = query.filter(
                Condition::any()
                    .add(Expr::col(suppliers::Column::Name).ilike(pattern.clone()))
                    .add(Expr::col(suppliers::Column::Email).ilike(pattern.clone()))
                    .add(Expr::col(suppliers::Column::TaxId).ilike(pattern)),
            );
        }

        let total = query.clone().count(&self.db).await?;

        let items = query
            .order_by_asc(suppliers::Column::Name)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok(PageResponse::new(items, page.page, page.per_page, total))
    }

    /// Updates a supplier's contact fields.
    ///
    /// # Errors
    ///
    /// Returns `SupplierError::NotFound` or `SupplierError::NameRequired`.
    pub async fn update(
        &self,
        hub_id: Uuid,
        supplier_id: Uuid,
        input: UpdateSupplierInput,
    ) -> Result<suppliers::Model, SupplierError> {
        let current = self.find_by_id(hub_id, supplier_id).await?;

        if let Some(name) = input.name.as_deref()
            && name.trim().is_empty()
        {
            return Err(SupplierError::NameRequired);
        }

        let mut active: suppliers::ActiveModel = current.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(contact_name) = input.contact_name {
            active.contact_name = Set(contact_name);
        }
        if let Some(email) = input.email {
            active.email = Set(email);
        }
        if let Some(phone) = input.phone {
            active.phone = Set(phone);
        }
        if let Some(tax_id) = input.tax_id {
            active.tax_id = Set(tax_id);
        }
        if let Some(address) = input.address {
            active.address = Set(address);
        }
        if let Some(city) = input.city {
            active.city = Set(city);
        }
        if let Some(postal_code) = input.postal_code {
            active.postal_code = Set(postal_code);
        }
        if let Some(country) = input.country {
            active.country = Set(country);
        }
        if let Some(website) = input.website {
            active.website = Set(website);
        }
        if let Some(notes) = input.notes {
            active.notes = Set(notes);
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Utc::now().into());

        Ok(active.update(&self.db).await?)
    }

    /// Soft-deletes a supplier.
    ///
    /// Referencing expenses keep their `supplier_id`; the link only
    /// nulls out on a hard delete.
    ///
    /// # Errors
    ///
    /// Returns `SupplierError::NotFound` if missing or already deleted.
    pub async fn soft_delete(&self, hub_id: Uuid, supplier_id: Uuid) -> Result<(), SupplierError> {
        let current = self.find_by_id(hub_id, supplier_id).await?;
        let now = Utc::now();

        let mut active: suppliers::ActiveModel = current.into();
        active.is_deleted = Set(true);
        active.deleted_at = Set(Some(now.into()));
        active.updated_at = Set(now.into());
        active.update(&self.db).await?;

        info!(%hub_id, %supplier_id, "Soft-deleted supplier");
        Ok(())
    }

    /// Recomputes the supplier's derived aggregates from its paid,
    /// non-deleted expenses.
    ///
    /// # Errors
    ///
    /// Returns `SupplierError::NotFound` or a database error.
    pub async fn recompute_totals(
        &self,
        hub_id: Uuid,
        supplier_id: Uuid,
    ) -> Result<suppliers::Model, SupplierError> {
        // Existence check keeps the 404 contract before touching rows.
        self.find_by_id(hub_id, supplier_id).await?;
        recompute_supplier_totals(&self.db, hub_id, supplier_id).await?;
        self.find_by_id(hub_id, supplier_id).await
    }
}

/// Recomputes one supplier's aggregates on the given connection.
///
/// Runs inside the caller's transaction when invoked from the
/// mark-paid transition.
pub(crate) async fn recompute_supplier_totals<C: ConnectionTrait>(
    conn: &C,
    hub_id: Uuid,
    supplier_id: Uuid,
) -> Result<(), DbErr> {
    let rows = expenses::Entity::find()
        .filter(expenses::Column::HubId.eq(hub_id))
        .filter(expenses::Column::SupplierId.eq(supplier_id))
        .filter(expenses::Column::Status.eq(sea_orm_active_enums::ExpenseStatus::Paid))
        .filter(expenses::Column::IsDeleted.eq(false))
        .all(conn)
        .await?;

    let paid: Vec<PaidExpense> = rows
        .iter()
        .map(|e| PaidExpense {
            total_amount: e.total_amount,
            expense_date: e.expense_date,
        })
        .collect();
    let totals = SupplierTotals::from_paid_expenses(&paid);

    let active = suppliers::ActiveModel {
        id: Set(supplier_id),
        total_spent: Set(totals.total_spent),
        last_purchase_date: Set(totals.last_purchase_date),
        updated_at: Set(Utc::now().into()),
        ..Default::default()
    };
    suppliers::Entity::update(active).exec(conn).await?;

    info!(%hub_id, %supplier_id, total_spent = %totals.total_spent, "Recomputed supplier totals");
    Ok(())
}
