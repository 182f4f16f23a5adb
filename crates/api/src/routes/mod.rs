//! API route definitions.

use axum::{Router, middleware};
use serde::{Deserialize, Deserializer};

use crate::{AppState, middleware::auth::auth_middleware};

pub mod categories;
pub mod expenses;
pub mod health;
pub mod recurring;
pub mod reports;
pub mod settings;
pub mod suppliers;

/// Creates the API router with protected routes that need state for middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    // Protected routes that require authentication
    let protected_routes = Router::new()
        .merge(expenses::routes())
        .merge(suppliers::routes())
        .merge(categories::routes())
        .merge(recurring::routes())
        .merge(reports::routes())
        .merge(settings::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Combine public and protected routes
    Router::new().merge(health::routes()).merge(protected_routes)
}

/// Deserializes an update field that must distinguish an absent key
/// (leave unchanged) from an explicit `null` (clear the value).
///
/// Use together with `#[serde(default)]`: absent yields `None`, `null`
/// yields `Some(None)`, and a value yields `Some(Some(v))`.
pub(crate) fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}
