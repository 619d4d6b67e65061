//! Route definitions for the API server

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Creates the main application router with all routes and middleware
pub fn create_router(state: Arc<AppState>) -> Router {
    // Dashboard is served from another origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health_check))
        // Reports
        .route("/api/kpis", get(handlers::get_kpis))
        .route("/api/top-routes", get(handlers::get_top_routes))
        .route("/api/seasonality", get(handlers::get_seasonality))
        .route(
            "/api/new_customers_over_time",
            get(handlers::get_new_customers_over_time),
        )
        // Route network
        .route("/api/hubs", get(handlers::get_hubs))
        .route("/api/hub_details", get(handlers::get_hub_details))
        // Segmentation
        .route("/api/clusters", get(handlers::get_clusters))
        .route(
            "/api/segment_distribution",
            get(handlers::get_segment_distribution),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
