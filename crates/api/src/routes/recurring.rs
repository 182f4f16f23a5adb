//! Recurring expense template routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use crate::{AppState, middleware::AuthUser};
use crate::routes::double_option;
use outlay_core::recurring::Frequency;
use outlay_db::repositories::{
    CreateRecurringInput, RecurringError, RecurringRepository, SettingsRepository,
    UpdateRecurringInput,
};
use outlay_shared::types::PageRequest;

/// Creates the recurring expense routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/recurring", get(list_recurring))
        .route("/recurring", post(create_recurring))
        .route("/recurring/{id}", get(get_recurring))
        .route("/recurring/{id}", put(update_recurring))
        .route("/recurring/{id}", delete(delete_recurring))
        .route("/recurring/{id}/generate", post(generate_expense))
}

// ============================================================================
// Request Types
// ============================================================================

/// Query parameters for listing templates.
#[derive(Debug, Deserialize)]
pub struct ListRecurringQuery {
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Items per page.
    pub per_page: Option<u32>,
}

/// Request body for creating a recurring template.
#[derive(Debug, Deserialize)]
pub struct CreateRecurringRequest {
    /// Template title.
    pub title: String,
    /// Optional category for generated expenses.
    pub category_id: Option<Uuid>,
    /// Optional supplier for generated expenses.
    pub supplier_id: Option<Uuid>,
    /// Net amount of each occurrence.
    pub amount: Decimal,
    /// Tax rate; the hub's default applies when omitted.
    pub tax_rate: Option<Decimal>,
    /// Recurrence frequency.
    pub frequency: String,
    /// First due date.
    pub next_due_date: NaiveDate,
    /// Whether a background job may generate from this template.
    #[serde(default)]
    pub auto_create: bool,
}

/// Request body for updating a recurring template.
///
/// Absent fields are unchanged; an explicit `null` clears the category
/// or supplier link.
#[derive(Debug, Deserialize)]
pub struct UpdateRecurringRequest {
    /// New title.
    pub title: Option<String>,
    /// New category.
    #[serde(default, deserialize_with = "double_option")]
    pub category_id: Option<Option<Uuid>>,
    /// New supplier.
    #[serde(default, deserialize_with = "double_option")]
    pub supplier_id: Option<Option<Uuid>>,
    /// New amount.
    pub amount: Option<Decimal>,
    /// New tax rate.
    pub tax_rate: Option<Decimal>,
    /// New frequency.
    pub frequency: Option<String>,
    /// New next due date.
    pub next_due_date: Option<NaiveDate>,
    /// Active flag.
    pub is_active: Option<bool>,
    /// Auto-create flag.
    pub auto_create: Option<bool>,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/recurring` - List recurring templates ordered by next due date.
async fn list_recurring(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListRecurringQuery>,
) -> Response {
    let page = PageRequest::from_params(query.page, query.per_page);
    let repo = RecurringRepository::new((*state.db).clone());
    match repo.list(auth.hub_id(), &page).await {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to list recurring expenses");
            recurring_error_response(&e)
        }
    }
}

/// POST `/recurring` - Create a recurring template.
async fn create_recurring(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateRecurringRequest>,
) -> Response {
    let frequency = match parse_frequency(&payload.frequency) {
        Ok(f) => f,
        Err(response) => return response,
    };

    let settings = match SettingsRepository::new((*state.db).clone())
        .get_or_create(auth.hub_id())
        .await
    {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "Failed to load expense settings");
            return recurring_error_response(&RecurringError::Expense(e));
        }
    };

    let input = CreateRecurringInput {
        hub_id: auth.hub_id(),
        title: payload.title,
        category_id: payload.category_id,
        supplier_id: payload.supplier_id,
        amount: payload.amount,
        tax_rate: payload.tax_rate,
        frequency,
        next_due_date: payload.next_due_date,
        auto_create: payload.auto_create,
    };

    let repo = RecurringRepository::new((*state.db).clone());
    match repo.create(input, &settings).await {
        Ok(template) => (StatusCode::CREATED, Json(template)).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to create recurring expense");
            recurring_error_response(&e)
        }
    }
}

/// GET `/recurring/{id}` - Get one template.
async fn get_recurring(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Response {
    let repo = RecurringRepository::new((*state.db).clone());
    match repo.find_by_id(auth.hub_id(), id).await {
        Ok(template) => (StatusCode::OK, Json(template)).into_response(),
        Err(e) => recurring_error_response(&e),
    }
}

/// PUT `/recurring/{id}` - Update a template.
async fn update_recurring(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRecurringRequest>,
) -> Response {
    let frequency = match payload.frequency.as_deref().map(parse_frequency) {
        Some(Ok(f)) => Some(f),
        Some(Err(response)) => return response,
        None => None,
    };

    let input = UpdateRecurringInput {
        title: payload.title,
        category_id: payload.category_id,
        supplier_id: payload.supplier_id,
        amount: payload.amount,
        tax_rate: payload.tax_rate,
        frequency,
        next_due_date: payload.next_due_date,
        is_active: payload.is_active,
        auto_create: payload.auto_create,
    };

    let repo = RecurringRepository::new((*state.db).clone());
    match repo.update(auth.hub_id(), id, input).await {
        Ok(template) => (StatusCode::OK, Json(template)).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to update recurring expense");
            recurring_error_response(&e)
        }
    }
}

/// DELETE `/recurring/{id}` - Soft-delete a template.
async fn delete_recurring(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Response {
    let repo = RecurringRepository::new((*state.db).clone());
    match repo.soft_delete(auth.hub_id(), id).await {
        Ok(()) => (StatusCode::NO_CONTENT, ()).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to delete recurring expense");
            recurring_error_response(&e)
        }
    }
}

/// POST `/recurring/{id}/generate` - Generate a draft expense from the
/// template and advance its schedule.
async fn generate_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Response {
    let settings = match SettingsRepository::new((*state.db).clone())
        .get_or_create(auth.hub_id())
        .await
    {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "Failed to load expense settings");
            return recurring_error_response(&RecurringError::Expense(e));
        }
    };

    let repo = RecurringRepository::new((*state.db).clone());
    match repo.generate(auth.hub_id(), id, &settings).await {
        Ok(generated) => (
            StatusCode::CREATED,
            Json(json!({
                "expense": generated.expense,
                "recurring": generated.template
            })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to generate expense from template");
            recurring_error_response(&e)
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn parse_frequency(s: &str) -> Result<Frequency, Response> {
    Frequency::parse(s).ok_or_else(|| {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "error": "INVALID_FREQUENCY",
                "message": format!("Unknown recurrence frequency: {s}")
            })),
        )
            .into_response()
    })
}

fn recurring_error_response(e: &RecurringError) -> Response {
    let status = StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let message = match e {
        RecurringError::Database(_) => "An error occurred".to_string(),
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
        let uri: Uri = "/recurring?page=2&per_page=5".parse().unwrap();
        let Query(query) = Query::<ListRecurringQuery>::try_from_uri(&uri).unwrap();

        assert_eq!(query.page, Some(2));
        assert_eq!(query.per_page, Some(5));
    }
}
