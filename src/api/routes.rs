//! API route definitions

use axum::routing::get;
use axum::Router;

use super::handlers;
use super::server::AppState;

/// Create the API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/check", get(handlers::check::check_proxy))
        .route("/endpoint", get(handlers::endpoint::check_endpoint))
        .with_state(state)
}
