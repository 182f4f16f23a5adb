//! Expense category routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use crate::{AppState, middleware::AuthUser};
use crate::routes::double_option;
use outlay_db::repositories::{
    CategoryError, CategoryRepository, CategoryWithCount, CreateCategoryInput, UpdateCategoryInput,
};

/// Creates the category routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories))
        .route("/categories", post(create_category))
        .route("/categories/{id}", get(get_category))
        .route("/categories/{id}", put(update_category))
        .route("/categories/{id}", delete(delete_category))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating a category.
#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    /// Category name.
    pub name: String,
    /// Display icon.
    pub icon: Option<String>,
    /// Display color.
    pub color: Option<String>,
    /// Optional description.
    pub description: Option<String>,
    /// Optional parent category.
    pub parent_id: Option<Uuid>,
    /// Listing position.
    pub sort_order: Option<i32>,
}

/// Request body for updating a category.
///
/// Absent fields are unchanged; an explicit `null` clears the
/// description or moves the category back to the top level.
#[derive(Debug, Deserialize)]
pub struct UpdateCategoryRequest {
    /// New name.
    pub name: Option<String>,
    /// New icon.
    pub icon: Option<String>,
    /// New color.
    pub color: Option<String>,
    /// New description.
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    /// New parent category.
    #[serde(default, deserialize_with = "double_option")]
    pub parent_id: Option<Option<Uuid>>,
    /// Active flag.
    pub is_active: Option<bool>,
    /// New listing position.
    pub sort_order: Option<i32>,
}

/// Response item for the category listing.
#[derive(Debug, Serialize)]
pub struct CategoryResponse {
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
    /// Count of non-deleted expenses in this category.
    pub expense_count: i64,
}

impl From<CategoryWithCount> for CategoryResponse {
    fn from(c: CategoryWithCount) -> Self {
        Self {
            id: c.id,
            name: c.name,
            icon: c.icon,
            color: c.color,
            description: c.description,
            parent_id: c.parent_id,
            is_active: c.is_active,
            sort_order: c.sort_order,
            expense_count: c.expense_count,
        }
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/categories` - List categories with live expense counts.
async fn list_categories(State(state): State<AppState>, auth: AuthUser) -> Response {
    let repo = CategoryRepository::new((*state.db).clone());
    match repo.list(auth.hub_id()).await {
        Ok(categories) => {
            let items: Vec<CategoryResponse> =
                categories.into_iter().map(CategoryResponse::from).collect();
            (StatusCode::OK, Json(json!({ "data": items }))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to list categories");
            category_error_response(&e)
        }
    }
}

/// POST `/categories` - Create a category.
async fn create_category(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateCategoryRequest>,
) -> Response {
    let input = CreateCategoryInput {
        hub_id: auth.hub_id(),
        name: payload.name,
        icon: payload.icon,
        color: payload.color,
        description: payload.description,
        parent_id: payload.parent_id,
        sort_order: payload.sort_order,
    };

    let repo = CategoryRepository::new((*state.db).clone());
    match repo.create(input).await {
        Ok(category) => (StatusCode::CREATED, Json(category)).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to create category");
            category_error_response(&e)
        }
    }
}

/// GET `/categories/{id}` - Get one category.
async fn get_category(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Response {
    let repo = CategoryRepository::new((*state.db).clone());
    match repo.find_by_id(auth.hub_id(), id).await {
        Ok(category) => (StatusCode::OK, Json(category)).into_response(),
        Err(e) => category_error_response(&e),
    }
}

/// PUT `/categories/{id}` - Update a category.
async fn update_category(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCategoryRequest>,
) -> Response {
    let input = UpdateCategoryInput {
        name: payload.name,
        icon: payload.icon,
        color: payload.color,
        description: payload.description,
        parent_id: payload.parent_id,
        is_active: payload.is_active,
        sort_order: payload.sort_order,
    };

    let repo = CategoryRepository::new((*state.db).clone());
    match repo.update(auth.hub_id(), id, input).await {
        Ok(category) => (StatusCode::OK, Json(category)).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to update category");
            category_error_response(&e)
        }
    }
}

/// DELETE `/categories/{id}` - Soft-delete a category.
async fn delete_category(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Response {
    let repo = CategoryRepository::new((*state.db).clone());
    match repo.soft_delete(auth.hub_id(), id).await {
        Ok(()) => (StatusCode::NO_CONTENT, ()).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to delete category");
            category_error_response(&e)
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn category_error_response(e: &CategoryError) -> Response {
    let status = StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let message = match e {
        CategoryError::Database(_) => "An error occurred".to_string(),
        other => other.to_string(),
    };

    (
        status,
        Json(json!({ "error": e.error_code(), "message": message })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_request_null_parent_moves_to_top_level() {
        let req: UpdateCategoryRequest =
            serde_json::from_str(r#"{"parent_id": null}"#).unwrap();
        assert_eq!(req.parent_id, Some(None));
        assert_eq!(req.description, None);
    }
}
