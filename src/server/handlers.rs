//! HTTP request handlers for API endpoints

use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;

use super::error::ApiError;
use super::state::AppState;
use crate::hubs::{HubCentrality, HubDegree};
use crate::reports::{Kpis, MonthlyCount, MonthlyRevenue, RouteCount};
use crate::segmentation::{ClusterSummary, SegmentCount};

/// Health check endpoint
///
/// Returns a simple status response to verify the server is running
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok"
    }))
}

/// GET /api/kpis
pub async fn get_kpis(State(state): State<Arc<AppState>>) -> Result<Json<Kpis>, ApiError> {
    state.run_query("kpis", |q| q.kpis()).await.map(Json)
}

/// GET /api/top-routes - Ten most purchased routes
pub async fn get_top_routes(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<RouteCount>>, ApiError> {
    state.run_query("top_routes", |q| q.top_routes()).await.map(Json)
}

/// GET /api/seasonality - Revenue per month
pub async fn get_seasonality(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<MonthlyRevenue>>, ApiError> {
    state
        .run_query("seasonality", |q| q.monthly_revenue())
        .await
        .map(Json)
}

/// GET /api/hubs
pub async fn get_hubs(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<HubCentrality>>, ApiError> {
    state.run_query("hubs", |q| q.top_hubs()).await.map(Json)
}

/// GET /api/hub_details
pub async fn get_hub_details(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<HubDegree>>, ApiError> {
    state.run_query("hub_details", |q| q.hub_details()).await.map(Json)
}

/// GET /api/clusters - Spend-ranked customer segments
pub async fn get_clusters(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ClusterSummary>>, ApiError> {
    state.run_query("clusters", |q| q.clusters()).await.map(Json)
}

/// GET /api/segment_distribution
pub async fn get_segment_distribution(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<SegmentCount>>, ApiError> {
    state
        .run_query("segment_distribution", |q| q.segment_distribution())
        .await
        .map(Json)
}

/// GET /api/new_customers_over_time
pub async fn get_new_customers_over_time(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<MonthlyCount>>, ApiError> {
    state
        .run_query("new_customers_over_time", |q| q.new_customers_over_time())
        .await
        .map(Json)
}
