//! HTTP routes exercised through the router without binding a socket.

mod common;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use common::{dashboard_batch, purchase};
use nextride::{create_router, AppState, InMemorySource, PurchaseRecord, PurchaseSource, SourceError};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn app_with(records: Vec<PurchaseRecord>) -> Router {
    let state = AppState::new(
        Box::new(InMemorySource::new(records)),
        42,
        Duration::from_secs(30),
    );
    create_router(Arc::new(state))
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

struct UnreachableSource;

impl PurchaseSource for UnreachableSource {
    fn load_batch(&self) -> Result<Vec<PurchaseRecord>, SourceError> {
        Err(SourceError::Database("unable to open database file".to_string()))
    }
}

struct SlowSource;

impl PurchaseSource for SlowSource {
    fn load_batch(&self) -> Result<Vec<PurchaseRecord>, SourceError> {
        std::thread::sleep(Duration::from_millis(500));
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn test_health() {
    let (status, body) = get(app_with(Vec::new()), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_every_dashboard_route_answers() {
    let app = app_with(dashboard_batch());
    for uri in [
        "/api/kpis",
        "/api/top-routes",
        "/api/seasonality",
        "/api/hubs",
        "/api/hub_details",
        "/api/clusters",
        "/api/segment_distribution",
        "/api/new_customers_over_time",
    ] {
        let (status, _) = get(app.clone(), uri).await;
        assert_eq!(status, StatusCode::OK, "{}", uri);
    }
}

#[tokio::test]
async fn test_response_shapes() {
    let app = app_with(dashboard_batch());

    let (_, kpis) = get(app.clone(), "/api/kpis").await;
    assert_eq!(kpis["unique_customers"], 12);
    assert!(kpis["total_revenue"].is_number());
    assert!(kpis["total_tickets"].is_number());

    let (_, clusters) = get(app.clone(), "/api/clusters").await;
    let first = &clusters[0];
    assert_eq!(first["cluster_rank"], 0);
    assert_eq!(first["persona_name"], "VIP");
    for field in ["mean_spend", "mean_trips", "mean_destinations"] {
        assert!(first[field].is_number(), "{}", field);
    }

    let (_, hubs) = get(app.clone(), "/api/hub_details").await;
    assert!(hubs[0]["in_degree"].is_number());
    assert!(hubs[0]["out_degree"].is_number());

    let (_, seasonality) = get(app, "/api/seasonality").await;
    assert_eq!(seasonality[0]["month"], "2024-01");
}

#[tokio::test]
async fn test_route_counts_scenario() {
    let mut records = Vec::new();
    for i in 0..7 {
        records.push(purchase(&format!("x{}", i), "c1", "2024-02-01", "X", "Y", 5.0));
    }
    for i in 0..3 {
        records.push(purchase(&format!("y{}", i), "c2", "2024-02-02", "Y", "X", 5.0));
    }
    let (status, body) = get(app_with(records), "/api/top-routes").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        serde_json::json!([
            {"route": "X -> Y", "count": 7},
            {"route": "Y -> X", "count": 3}
        ])
    );
}

#[tokio::test]
async fn test_empty_batch_is_not_found() {
    let (status, body) = get(app_with(Vec::new()), "/api/kpis").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "EmptyBatch");
    assert!(body["message"].as_str().unwrap().contains("empty"));
}

#[tokio::test]
async fn test_too_few_customers_is_unprocessable() {
    let records = vec![
        purchase("o1", "c1", "2024-01-01", "A", "B", 10.0),
        purchase("o2", "c2", "2024-01-01", "B", "C", 20.0),
        purchase("o3", "c3", "2024-01-01", "C", "A", 30.0),
    ];
    let (status, body) = get(app_with(records), "/api/clusters").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "InsufficientData");
}

#[tokio::test]
async fn test_unreachable_source_is_service_unavailable() {
    let state = AppState::new(Box::new(UnreachableSource), 42, Duration::from_secs(30));
    let (status, body) = get(create_router(Arc::new(state)), "/api/hubs").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "SourceUnavailable");
}

#[tokio::test]
async fn test_slow_query_times_out() {
    let state = AppState::new(Box::new(SlowSource), 42, Duration::from_millis(50));
    let (status, body) = get(create_router(Arc::new(state)), "/api/kpis").await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["error"], "Timeout");
}
