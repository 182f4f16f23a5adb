//! Reporting routes: dashboard and period summaries.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use crate::{AppState, middleware::AuthUser};
use outlay_db::repositories::{ReportPeriod, ReportRepository};

/// Creates the report routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/reports/dashboard", get(dashboard))
        .route("/reports/summary", get(summary))
}

/// Query parameters for the summary report.
#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    /// Reporting window; defaults to `month`.
    pub period: Option<String>,
}

/// GET `/reports/dashboard` - Current-month overview.
async fn dashboard(State(state): State<AppState>, auth: AuthUser) -> Response {
    let repo = ReportRepository::new((*state.db).clone());
    match repo.dashboard(auth.hub_id()).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to build dashboard");
            internal_error_response()
        }
    }
}

/// GET `/reports/summary?period=week|month|quarter|year` - Aggregates
/// over a trailing window.
async fn summary(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<SummaryQuery>,
) -> Response {
    let period = match query.period.as_deref() {
        None => ReportPeriod::Month,
        Some(s) => match ReportPeriod::parse(s) {
            Some(p) => p,
            None => {
                return (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(json!({
                        "error": "INVALID_PERIOD",
                        "message": format!("Unknown report period: {s}")
                    })),
                )
                    .into_response();
            }
        },
    };

    let repo = ReportRepository::new((*state.db).clone());
    match repo.summary(auth.hub_id(), period).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to build summary report");
            internal_error_response()
        }
    }
}

fn internal_error_response() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": "DATABASE_ERROR",
            "message": "An error occurred"
        })),
    )
        .into_response()
}
