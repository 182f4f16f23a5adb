//! Hub settings routes (get-or-create singleton).

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::error;

use crate::{AppState, middleware::AuthUser, routes::expenses::expense_error_response};
use outlay_db::repositories::{SettingsRepository, UpdateSettingsInput};

/// Creates the settings routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/settings", get(get_settings))
        .route("/settings", put(update_settings))
}

/// Request body for updating settings. Absent fields are unchanged.
#[derive(Debug, Deserialize)]
pub struct UpdateSettingsRequest {
    /// Whether paying an expense requires prior approval.
    pub require_approval: Option<bool>,
    /// Approval threshold (0 means all expenses require approval).
    pub approval_threshold: Option<Decimal>,
    /// Default tax rate applied when a create omits one.
    pub default_tax_rate: Option<Decimal>,
    /// Default currency code.
    pub default_currency: Option<String>,
    /// Whether the configured prefix is used for numbering.
    pub auto_numbering: Option<bool>,
    /// Expense number prefix.
    pub number_prefix: Option<String>,
}

/// GET `/settings` - Get the hub's settings, creating defaults on
/// first access.
async fn get_settings(State(state): State<AppState>, auth: AuthUser) -> Response {
    let repo = SettingsRepository::new((*state.db).clone());
    match repo.get_or_create(auth.hub_id()).await {
        Ok(settings) => (StatusCode::OK, Json(settings)).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to load expense settings");
            expense_error_response(&e)
        }
    }
}

/// PUT `/settings` - Update the hub's settings.
async fn update_settings(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<UpdateSettingsRequest>,
) -> Response {
    let input = UpdateSettingsInput {
        require_approval: payload.require_approval,
        approval_threshold: payload.approval_threshold,
        default_tax_rate: payload.default_tax_rate,
        default_currency: payload.default_currency,
        auto_numbering: payload.auto_numbering,
        number_prefix: payload.number_prefix,
    };

    let repo = SettingsRepository::new((*state.db).clone());
    match repo.update(auth.hub_id(), input).await {
        Ok(settings) => (StatusCode::OK, Json(settings)).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to update expense settings");
            expense_error_response(&e)
        }
    }
}
