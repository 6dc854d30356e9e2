use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use super::handlers;
use super::state::AppState;

// API Routes - REST API for programmatic access
pub fn api_routes() -> Router<Arc<AppState>> {
    // The raw passthrough is reachable from browsers on any origin
    let proxy_routes = Router::new()
        .route("/proxy", post(handlers::api::proxy_chat))
        .layer(CorsLayer::permissive());

    Router::new().nest(
        "/api",
        Router::new()
            // SQL generation
            .route("/generate-sql", post(handlers::api::generate_sql))
            // System status
            .route("/status", get(handlers::api::system_status))
            .merge(proxy_routes),
    )
}
