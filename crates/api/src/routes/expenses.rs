//! Expense management routes.
//!
//! CRUD plus the lifecycle transitions (submit, approve, reject,
//! mark-paid). All queries are scoped to the token's hub.

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
use outlay_core::expense::{ExpenseError, ExpenseStatus};
use outlay_db::repositories::{
    CreateExpenseInput, ExpenseFilter, ExpenseRepository, SettingsRepository, UpdateExpenseInput,
};
use outlay_shared::types::PageRequest;

/// Creates the expense routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/expenses", get(list_expenses))
        .route("/expenses", post(create_expense))
        .route("/expenses/{id}", get(get_expense))
        .route("/expenses/{id}", put(update_expense))
        .route("/expenses/{id}", delete(delete_expense))
        .route("/expenses/{id}/submit", post(submit_expense))
        .route("/expenses/{id}/approve", post(approve_expense))
        .route("/expenses/{id}/reject", post(reject_expense))
        .route("/expenses/{id}/mark-paid", post(mark_paid_expense))
}

// ============================================================================
// Request Types
// ============================================================================

/// Query parameters for listing expenses.
#[derive(Debug, Deserialize)]
pub struct ListExpensesQuery {
    /// Search across number, title, and supplier name.
    pub search: Option<String>,
    /// Status filter.
    pub status: Option<String>,
    /// Category filter.
    pub category_id: Option<Uuid>,
    /// Inclusive lower bound on the expense date.
    pub date_from: Option<NaiveDate>,
    /// Inclusive upper bound on the expense date.
    pub date_to: Option<NaiveDate>,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Items per page.
    pub per_page: Option<u32>,
}

/// Request body for creating an expense.
#[derive(Debug, Deserialize)]
pub struct CreateExpenseRequest {
    /// Expense title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Optional category reference.
    pub category_id: Option<Uuid>,
    /// Optional supplier reference.
    pub supplier_id: Option<Uuid>,
    /// Net amount.
    pub amount: Decimal,
    /// Tax rate; the hub's default applies when omitted.
    pub tax_rate: Option<Decimal>,
    /// Expense date.
    pub expense_date: NaiveDate,
    /// Optional due date.
    pub due_date: Option<NaiveDate>,
    /// Initial status; defaults to draft.
    pub status: Option<String>,
    /// Payment method label.
    pub payment_method: Option<String>,
    /// Supplier invoice/receipt number.
    pub reference_number: Option<String>,
    /// Reference to an externally stored receipt image.
    pub receipt_ref: Option<String>,
    /// Free-form notes.
    pub notes: Option<String>,
}

/// Request body for updating an expense.
///
/// Absent fields are unchanged; an explicit `null` clears an optional
/// field.
#[derive(Debug, Deserialize)]
pub struct UpdateExpenseRequest {
    /// New title.
    pub title: Option<String>,
    /// New description.
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    /// New category reference.
    #[serde(default, deserialize_with = "double_option")]
    pub category_id: Option<Option<Uuid>>,
    /// New supplier reference.
    #[serde(default, deserialize_with = "double_option")]
    pub supplier_id: Option<Option<Uuid>>,
    /// New net amount.
    pub amount: Option<Decimal>,
    /// New tax rate.
    pub tax_rate: Option<Decimal>,
    /// New expense date.
    pub expense_date: Option<NaiveDate>,
    /// New due date.
    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<NaiveDate>>,
    /// New status.
    pub status: Option<String>,
    /// New payment method.
    #[serde(default, deserialize_with = "double_option")]
    pub payment_method: Option<Option<String>>,
    /// New reference number.
    #[serde(default, deserialize_with = "double_option")]
    pub reference_number: Option<Option<String>>,
    /// New receipt reference.
    #[serde(default, deserialize_with = "double_option")]
    pub receipt_ref: Option<Option<String>>,
    /// New notes.
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/expenses` - List expenses with filters and pagination.
async fn list_expenses(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListExpensesQuery>,
) -> Response {
    let status = match query.status.as_deref().map(parse_status) {
        Some(Ok(s)) => Some(s),
        Some(Err(response)) => return response,
        None => None,
    };

    let filter = ExpenseFilter {
        search: query.search,
        status,
        category_id: query.category_id,
        date_from: query.date_from,
        date_to: query.date_to,
    };

    let page = PageRequest::from_params(query.page, query.per_page);
    let repo = ExpenseRepository::new((*state.db).clone());
    match repo.list(auth.hub_id(), &filter, &page).await {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to list expenses");
            expense_error_response(&e)
        }
    }
}

/// POST `/expenses` - Create an expense.
async fn create_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateExpenseRequest>,
) -> Response {
    let status = match payload.status.as_deref().map(parse_status) {
        Some(Ok(s)) => Some(s),
        Some(Err(response)) => return response,
        None => None,
    };

    let settings = match SettingsRepository::new((*state.db).clone())
        .get_or_create(auth.hub_id())
        .await
    {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "Failed to load expense settings");
            return expense_error_response(&e);
        }
    };

    let input = CreateExpenseInput {
        hub_id: auth.hub_id(),
        title: payload.title,
        description: payload.description,
        category_id: payload.category_id,
        supplier_id: payload.supplier_id,
        amount: payload.amount,
        tax_rate: payload.tax_rate,
        expense_date: payload.expense_date,
        due_date: payload.due_date,
        status,
        payment_method: payload.payment_method,
        reference_number: payload.reference_number,
        receipt_ref: payload.receipt_ref,
        notes: payload.notes,
    };

    let repo = ExpenseRepository::new((*state.db).clone());
    match repo.create(input, &settings).await {
        Ok(expense) => (StatusCode::CREATED, Json(expense)).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to create expense");
            expense_error_response(&e)
        }
    }
}

/// GET `/expenses/{id}` - Get one expense.
async fn get_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Response {
    let repo = ExpenseRepository::new((*state.db).clone());
    match repo.find_by_id(auth.hub_id(), id).await {
        Ok(expense) => (StatusCode::OK, Json(expense)).into_response(),
        Err(e) => expense_error_response(&e),
    }
}

/// PUT `/expenses/{id}` - Update an expense.
async fn update_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateExpenseRequest>,
) -> Response {
    let status = match payload.status.as_deref().map(parse_status) {
        Some(Ok(s)) => Some(s),
        Some(Err(response)) => return response,
        None => None,
    };

    let input = UpdateExpenseInput {
        title: payload.title,
        description: payload.description,
        category_id: payload.category_id,
        supplier_id: payload.supplier_id,
        amount: payload.amount,
        tax_rate: payload.tax_rate,
        expense_date: payload.expense_date,
        due_date: payload.due_date,
        status,
        payment_method: payload.payment_method,
        reference_number: payload.reference_number,
        receipt_ref: payload.receipt_ref,
        notes: payload.notes,
    };

    let repo = ExpenseRepository::new((*state.db).clone());
    match repo.update(auth.hub_id(), id, input).await {
        Ok(expense) => (StatusCode::OK, Json(expense)).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to update expense");
            expense_error_response(&e)
        }
    }
}

/// DELETE `/expenses/{id}` - Soft-delete an expense.
async fn delete_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Response {
    let repo = ExpenseRepository::new((*state.db).clone());
    match repo.soft_delete(auth.hub_id(), id).await {
        Ok(()) => (StatusCode::NO_CONTENT, ()).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to delete expense");
            expense_error_response(&e)
        }
    }
}

/// POST `/expenses/{id}/submit` - Submit a draft expense for approval.
async fn submit_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Response {
    let repo = ExpenseRepository::new((*state.db).clone());
    match repo.submit(auth.hub_id(), id).await {
        Ok(expense) => (StatusCode::OK, Json(expense)).into_response(),
        Err(e) => expense_error_response(&e),
    }
}

/// POST `/expenses/{id}/approve` - Approve an expense.
///
/// The authenticated user is stamped as the approver.
async fn approve_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Response {
    let repo = ExpenseRepository::new((*state.db).clone());
    match repo.approve(auth.hub_id(), id, auth.user_id()).await {
        Ok(expense) => (StatusCode::OK, Json(expense)).into_response(),
        Err(e) => expense_error_response(&e),
    }
}

/// POST `/expenses/{id}/reject` - Reject an expense.
async fn reject_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Response {
    let repo = ExpenseRepository::new((*state.db).clone());
    match repo.reject(auth.hub_id(), id).await {
        Ok(expense) => (StatusCode::OK, Json(expense)).into_response(),
        Err(e) => expense_error_response(&e),
    }
}

/// POST `/expenses/{id}/mark-paid` - Mark an expense as paid.
///
/// Gated by the hub's approval policy; recomputes the linked supplier's
/// aggregates on success.
async fn mark_paid_expense(
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
            return expense_error_response(&e);
        }
    };

    let repo = ExpenseRepository::new((*state.db).clone());
    match repo.mark_paid(auth.hub_id(), id, &settings).await {
        Ok(expense) => (StatusCode::OK, Json(expense)).into_response(),
        Err(e) => expense_error_response(&e),
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn parse_status(s: &str) -> Result<ExpenseStatus, Response> {
    ExpenseStatus::parse(s).ok_or_else(|| {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "error": "INVALID_STATUS",
                "message": format!("Unknown expense status: {s}")
            })),
        )
            .into_response()
    })
}

pub(crate) fn expense_error_response(e: &ExpenseError) -> Response {
    let status = StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let message = match e {
        ExpenseError::Database(_) => "An error occurred".to_string(),
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
        let uri: Uri = "/expenses?page=2&per_page=10&status=draft"
            .parse()
            .unwrap();
        let Query(query) = Query::<ListExpensesQuery>::try_from_uri(&uri).unwrap();

        assert_eq!(query.page, Some(2));
        assert_eq!(query.per_page, Some(10));
        assert_eq!(query.status.as_deref(), Some("draft"));

        let page = PageRequest::from_params(query.page, query.per_page);
        assert_eq!(page.offset(), 10);
        assert_eq!(page.limit(), 10);
    }

    #[test]
    fn test_update_request_null_clears_absent_keeps() {
        let req: UpdateExpenseRequest =
            serde_json::from_str(r#"{"supplier_id": null, "notes": "paid in cash"}"#).unwrap();

        assert_eq!(req.supplier_id, Some(None));
        assert_eq!(req.notes, Some(Some("paid in cash".to_string())));
        assert_eq!(req.description, None);
        assert_eq!(req.due_date, None);
    }

    #[test]
    fn test_list_query_defaults_without_params() {
        let uri: Uri = "/expenses".parse().unwrap();
        let Query(query) = Query::<ListExpensesQuery>::try_from_uri(&uri).unwrap();

        assert_eq!(query.page, None);
        let page = PageRequest::from_params(query.page, query.per_page);
        assert_eq!(page.page, 1);
        assert_eq!(page.per_page, 20);
    }
}
