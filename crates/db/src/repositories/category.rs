//! Category repository: the per-hub category hierarchy.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use outlay_core::category::{CategoryTreeError, validate_parent};

use crate::entities::{expense_categories, expenses};

/// Errors from category operations.
#[derive(Debug, Error)]
pub enum CategoryError {
    /// Category does not exist in the hub's scope.
    #[error("Category not found: {0}")]
    NotFound(Uuid),

    /// Category name was missing or blank.
    #[error("Category name is required")]
    NameRequired,

    /// The proposed parent edge would break the tree.
    #[error(transparent)]
    InvalidParent(#[from] CategoryTreeError),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(String),
}

impl CategoryError {
    /// Maps the error to an HTTP status code.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::NameRequired | Self::InvalidParent(_) => 422,
            Self::Database(_) => 500,
        }
    }

    /// Machine-readable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "CATEGORY_NOT_FOUND",
            Self::NameRequired => "CATEGORY_NAME_REQUIRED",
            Self::InvalidParent(_) => "CATEGORY_INVALID_PARENT",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

impl From<DbErr> for CategoryError {
    fn from(e: DbErr) -> Self {
        Self::Database(e.to_string())
    }
}

/// Input for creating a category.
#[derive(Debug, Clone)]
pub struct CreateCategoryInput {
    /// Hub (tenant) scope.
    pub hub_id: Uuid,
    /// Category name.
    pub name: String,
    /// Display icon; defaults when omitted.
    pub icon: Option<String>,
    /// Display color; defaults when omitted.
    pub color: Option<String>,
    /// Optional description.
    pub description: Option<String>,
    /// Optional parent category.
    pub parent_id: Option<Uuid>,
    /// Listing position; defaults to 0.
    pub sort_order: Option<i32>,
}

/// Input for updating a category.
#[derive(Debug, Clone, Default)]
pub struct UpdateCategoryInput {
    /// New name.
    pub name: Option<String>,
    /// New icon.
    pub icon: Option<String>,
    /// New color.
    pub color: Option<String>,
    /// New description (`Some(None)` clears it).
    pub description: Option<Option<String>>,
    /// New parent edge (`Some(None)` moves to the root).
    pub parent_id: Option<Option<Uuid>>,
    /// Active flag.
    pub is_active: Option<bool>,
    /// New listing position.
    pub sort_order: Option<i32>,
}

/// A category together with its non-deleted expense count.
#[derive(Debug, Clone)]
pub struct CategoryWithCount {
    /// Category id.
    pub id: Uuid,
    /// Category name.
    pub name: String,
    /// Display icon.
    pub icon: String,
    /// Display color.
    pub color: String,
    /// Description.
    pub description: Option<String>,
    /// Parent category, if nested.
    pub parent_id: Option<Uuid>,
    /// Active flag.
    pub is_active: bool,
    /// Listing position.
    pub sort_order: i32,
    /// Count of non-deleted expenses referencing this category.
    pub expense_count: i64,
}

/// Category repository.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    db: DatabaseConnection,
}

impl CategoryRepository {
    /// Creates a new category repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a category, validating the parent edge against the
    /// hub's current tree.
    ///
    /// # Errors
    ///
    /// Returns `CategoryError::NameRequired` or
    /// `CategoryError::InvalidParent`.
    pub async fn create(
        &self,
        input: CreateCategoryInput,
    ) -> Result<expense_categories::Model, CategoryError> {
        if input.name.trim().is_empty() {
            return Err(CategoryError::NameRequired);
        }

        let id = Uuid::new_v4();
        if let Some(parent_id) = input.parent_id {
            let parents = self.parent_edges(input.hub_id).await?;
            validate_parent(id, parent_id, &parents)?;
        }

        let now = Utc::now();
        let active = expense_categories::ActiveModel {
            id: Set(id),
            hub_id: Set(input.hub_id),
            name: Set(input.name),
            icon: Set(input.icon.unwrap_or_else(|| "folder-outline".to_string())),
            color: Set(input.color.unwrap_or_else(|| "#6366f1".to_string())),
            description: Set(input.description),
            parent_id: Set(input.parent_id),
            is_active: Set(true),
            sort_order: Set(input.sort_order.unwrap_or(0)),
            is_deleted: Set(false),
            deleted_at: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let created = active.insert(&self.db).await?;
        info!(hub_id = %created.hub_id, category_id = %created.id, "Created category");
        Ok(created)
    }

    /// Fetches a non-deleted category.
    ///
    /// # Errors
    ///
    /// Returns `CategoryError::NotFound` if missing or deleted.
    pub async fn find_by_id(
        &self,
        hub_id: Uuid,
        category_id: Uuid,
    ) -> Result<expense_categories::Model, CategoryError> {
        expense_categories::Entity::find_by_id(category_id)
            .filter(expense_categories::Column::HubId.eq(hub_id))
            .filter(expense_categories::Column::IsDeleted.eq(false))
            .one(&self.db)
            .await?
            .ok_or(CategoryError::NotFound(category_id))
    }

    /// Lists the hub's non-deleted categories with their expense
    /// counts, ordered by (`sort_order`, name).
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, hub_id: Uuid) -> Result<Vec<CategoryWithCount>, CategoryError> {
        let categories = expense_categories::Entity::find()
            .filter(expense_categories::Column::HubId.eq(hub_id))
            .filter(expense_categories::Column::IsDeleted.eq(false))
            .order_by_asc(expense_categories::Column::SortOrder)
            .order_by_asc(expense_categories::Column::Name)
            .all(&self.db)
            .await?;

        let counts: Vec<(Option<Uuid>, i64)> = expenses::Entity::find()
            .filter(expenses::Column::HubId.eq(hub_id))
            .filter(expenses::Column::IsDeleted.eq(false))
            .filter(expenses::Column::CategoryId.is_not_null())
            .select_only()
            .column(expenses::Column::CategoryId)
            .column_as(expenses::Column::Id.count(), "count")
            .group_by(expenses::Column::CategoryId)
            .into_tuple()
            .all(&self.db)
            .await?;
        let counts: HashMap<Uuid, i64> =
            counts.into_iter().filter_map(|(id, n)| id.map(|id| (id, n))).collect();

        Ok(categories
            .into_iter()
            .map(|c| {
                let expense_count = counts.get(&c.id).copied().unwrap_or(0);
                CategoryWithCount {
                    id: c.id,
                    name: c.name,
                    icon: c.icon,
                    color: c.color,
                    description: c.description,
                    parent_id: c.parent_id,
                    is_active: c.is_active,
                    sort_order: c.sort_order,
                    expense_count,
                }
            })
            .collect())
    }

    /// Updates a category, re-validating the parent edge when it
    /// changes.
    ///
    /// # Errors
    ///
    /// Returns `CategoryError::NotFound`, `CategoryError::NameRequired`,
    /// or `CategoryError::InvalidParent`.
    pub async fn update(
        &self,
        hub_id: Uuid,
        category_id: Uuid,
        input: UpdateCategoryInput,
    ) -> Result<expense_categories::Model, CategoryError> {
        let current = self.find_by_id(hub_id, category_id).await?;

        if let Some(name) = input.name.as_deref()
            && name.trim().is_empty()
        {
            return Err(CategoryError::NameRequired);
        }
        if let Some(Some(parent_id)) = input.parent_id {
            let parents = self.parent_edges(hub_id).await?;
            validate_parent(category_id, parent_id, &parents)?;
        }

        let mut active: expense_categories::ActiveModel = current.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(icon) = input.icon {
            active.icon = Set(icon);
        }
        if let Some(color) = input.color {
            active.color = Set(color);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(parent_id) = input.parent_id {
            active.parent_id = Set(parent_id);
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        if let Some(sort_order) = input.sort_order {
            active.sort_order = Set(sort_order);
        }
        active.updated_at = Set(Utc::now().into());

        Ok(active.update(&self.db).await?)
    }

    /// Soft-deletes a category.
    ///
    /// Children keep their parent edge and expenses keep their
    /// reference; only a hard delete nulls those out.
    ///
    /// # Errors
    ///
    /// Returns `CategoryError::NotFound` if missing or already deleted.
    pub async fn soft_delete(&self, hub_id: Uuid, category_id: Uuid) -> Result<(), CategoryError> {
        let current = self.find_by_id(hub_id, category_id).await?;
        let now = Utc::now();

        let mut active: expense_categories::ActiveModel = current.into();
        active.is_deleted = Set(true);
        active.deleted_at = Set(Some(now.into()));
        active.updated_at = Set(now.into());
        active.update(&self.db).await?;

        info!(%hub_id, %category_id, "Soft-deleted category");
        Ok(())
    }

    /// Loads the (id, `parent_id`) edges of the hub's live categories.
    async fn parent_edges(&self, hub_id: Uuid) -> Result<HashMap<Uuid, Option<Uuid>>, DbErr> {
        let edges: Vec<(Uuid, Option<Uuid>)> = expense_categories::Entity::find()
            .filter(expense_categories::Column::HubId.eq(hub_id))
            .filter(expense_categories::Column::IsDeleted.eq(false))
            .select_only()
            .column(expense_categories::Column::Id)
            .column(expense_categories::Column::ParentId)
            .into_tuple()
            .all(&self.db)
            .await?;
        Ok(edges.into_iter().collect())
    }
}
