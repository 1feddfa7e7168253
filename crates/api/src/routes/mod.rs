//! API route definitions.

use axum::{Router, middleware};

use crate::{AppState, middleware::auth::auth_middleware};

pub mod health;
pub mod sales;

/// Creates the API router with protected routes that need state for middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    // Protected routes that require authentication
    let protected_routes = Router::new().merge(sales::routes()).layer(
        middleware::from_fn_with_state(state.clone(), auth_middleware),
    );

    // Combine public and protected routes
    Router::new().merge(health::routes()).merge(protected_routes)
}
