//! Supplier management routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use crate::{AppState, middleware::AuthUser};
use crate::routes::double_option;
use outlay_db::repositories::{
    CreateSupplierInput, SupplierError, SupplierFilter, SupplierRepository, UpdateSupplierInput,
};
use outlay_shared::types::PageRequest;

/// Creates the supplier routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/suppliers", get(list_suppliers))
        .route("/suppliers", post(create_supplier))
        .route("/suppliers/{id}", get(get_supplier))
        .route("/suppliers/{id}", put(update_supplier))
        .route("/suppliers/{id}", delete(delete_supplier))
        .route("/suppliers/{id}/recompute-totals", post(recompute_totals))
}

// ============================================================================
// Request Types
// ============================================================================

/// Query parameters for listing suppliers.
#[derive(Debug, Deserialize)]
pub struct ListSuppliersQuery {
    /// Search across name, email, and tax id.
    pub search: Option<String>,
    /// Include inactive suppliers.
    #[serde(default)]
    pub show_inactive: bool,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Items per page.
    pub per_page: Option<u32>,
}

/// Request body for creating a supplier.
#[derive(Debug, Deserialize)]
pub struct CreateSupplierRequest {
    /// Supplier name.
    pub name: String,
    /// Contact person.
    pub contact_name: Option<String>,
    /// Contact email.
    pub email: Option<String>,
    /// Contact phone.
    pub phone: Option<String>,
    /// Tax identifier.
    pub tax_id: Option<String>,
    /// Street address.
    pub address: Option<String>,
    /// City.
    pub city: Option<String>,
    /// Postal code.
    pub postal_code: Option<String>,
    /// Country.
    pub country: Option<String>,
    /// Website URL.
    pub website: Option<String>,
    /// Free-form notes.
    pub notes: Option<String>,
}

/// Request body for updating a supplier.
///
/// Absent fields are unchanged; an explicit `null` clears an optional
/// field.
#[derive(Debug, Deserialize)]
pub struct UpdateSupplierRequest {
    /// New name.
    pub name: Option<String>,
    /// New contact person.
    #[serde(default, deserialize_with = "double_option")]
    pub contact_name: Option<Option<String>>,
    /// New email.
    #[serde(default, deserialize_with = "double_option")]
    pub email: Option<Option<String>>,
    /// New phone.
    #[serde(default, deserialize_with = "double_option")]
    pub phone: Option<Option<String>>,
    /// New tax identifier.
    #[serde(default, deserialize_with = "double_option")]
    pub tax_id: Option<Option<String>>,
    /// New address.
    #[serde(default, deserialize_with = "double_option")]
    pub address: Option<Option<String>>,
    /// New city.
    #[serde(default, deserialize_with = "double_option")]
    pub city: Option<Option<String>>,
    /// New postal code.
    #[serde(default, deserialize_with = "double_option")]
    pub postal_code: Option<Option<String>>,
    /// New country.
    pub country: Option<String>,
    /// New website.
    #[serde(default, deserialize_with = "double_option")]
    pub website: Option<Option<String>>,
    /// New notes.
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
    /// Active flag.
    pub is_active: Option<bool>,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/suppliers` - List suppliers.
async fn list_suppliers(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListSuppliersQuery>,
) -> Response {
    let filter = SupplierFilter {
        search: query.search,
        show_inactive: query.show_inactive,
    };

    let page = PageRequest::from_params(query.page, query.per_page);
    let repo = SupplierRepository::new((*state.db).clone());
    match repo.list(auth.hub_id(), &filter, &page).await {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to list suppliers");
            supplier_error_response(&e)
        }
    }
}

/// POST `/suppliers` - Create a supplier.
async fn create_supplier(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateSupplierRequest>,
) -> Response {
    let input = CreateSupplierInput {
        hub_id: auth.hub_id(),
        name: payload.name,
        contact_name: payload.contact_name,
        email: payload.email,
        phone: payload.phone,
        tax_id: payload.tax_id,
        address: payload.address,
        city: payload.city,
        postal_code: payload.postal_code,
        country: payload.country,
        website: payload.website,
        notes: payload.notes,
    };

    let repo = SupplierRepository::new((*state.db).clone());
    match repo.create(input).await {
        Ok(supplier) => (StatusCode::CREATED, Json(supplier)).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to create supplier");
            supplier_error_response(&e)
        }
    }
}

/// GET `/suppliers/{id}` - Get one supplier.
async fn get_supplier(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Response {
    let repo = SupplierRepository::new((*state.db).clone());
    match repo.find_by_id(auth.hub_id(), id).await {
        Ok(supplier) => (StatusCode::OK, Json(supplier)).into_response(),
        Err(e) => supplier_error_response(&e),
    }
}

/// PUT `/suppliers/{id}` - Update a supplier.
async fn update_supplier(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSupplierRequest>,
) -> Response {
    let input = UpdateSupplierInput {
        name: payload.name,
        contact_name: payload.contact_name,
        email: payload.email,
        phone: payload.phone,
        tax_id: payload.tax_id,
        address: payload.address,
        city: payload.city,
        postal_code: payload.postal_code,
        country: payload.country,
        website: payload.website,
        notes: payload.notes,
        is_active: payload.is_active,
    };

    let repo = SupplierRepository::new((*state.db).clone());
    match repo.update(auth.hub_id(), id, input).await {
        Ok(supplier) => (StatusCode::OK, Json(supplier)).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to update supplier");
            supplier_error_response(&e)
        }
    }
}

/// DELETE `/suppliers/{id}` - Soft-delete a supplier.
async fn delete_supplier(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Response {
    let repo = SupplierRepository::new((*state.db).clone());
    match repo.soft_delete(auth.hub_id(), id).await {
        Ok(()) => (StatusCode::NO_CONTENT, ()).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to delete supplier");
            supplier_error_response(&e)
        }
    }
}

/// POST `/suppliers/{id}/recompute-totals` - Recompute the derived
/// spend aggregates from paid expenses.
async fn recompute_totals(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Response {
    let repo = SupplierRepository::new((*state.db).clone());
    match repo.recompute_totals(auth.hub_id(), id).await {
        Ok(supplier) => (StatusCode::OK, Json(supplier)).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to recompute supplier totals");
            supplier_error_response(&e)
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn supplier_error_response(e: &SupplierError) -> Response {
    let status = StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let message = match e {
        SupplierError::Database(_) => "An error occurred".to_string(),
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
    use axum::http::Uri;

    #[test]
    fn test_list_query_parses_pagination_params() {
        let uri: Uri = "/suppliers?page=3&per_page=25&show_inactive=true"
            .parse()
            .unwrap();
        let Query(query) = Query::<ListSuppliersQuery>::try_from_uri(&uri).unwrap();

        assert_eq!(query.page, Some(3));
        assert_eq!(query.per_page, Some(25));
        assert!(query.show_inactive);
    }
}
