mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use restaurant_discovery::transport::http::{create_router, AppState};
use restaurant_discovery::{
    CsvExportSink, MemoryStore, RecalculationPipeline, RestaurantService, RestaurantStore,
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

fn app(store: Arc<MemoryStore>, export_dir: &tempfile::TempDir) -> Router {
    let store: Arc<dyn RestaurantStore> = store;
    create_router(AppState {
        service: RestaurantService::new(Arc::clone(&store)),
        pipeline: Arc::new(RecalculationPipeline::new(
            store,
            CsvExportSink::new(export_dir.path().join("ratings.csv")),
            4,
        )),
    })
}

async fn call(app: Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn health_reports_ok() {
    let dir = tempfile::tempdir().unwrap();
    let (status, body) = call(app(common::rated_pair().await, &dir), "GET", "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
}

#[tokio::test]
async fn listing_returns_envelope_with_count() {
    let dir = tempfile::tempdir().unwrap();
    let (status, body) = call(
        app(common::catalogue().await, &dir),
        "GET",
        "/api/v1/restaurants?limit=5&count=true&district_id=d2",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["restaurants"].as_array().unwrap().len(), 5);
    assert_eq!(body["data"]["restaurants"][0]["id"], "c11");
    assert_eq!(body["data"]["total_count"], 6);
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn bad_limit_falls_back_to_default() {
    let dir = tempfile::tempdir().unwrap();
    let (status, body) = call(
        app(common::catalogue().await, &dir),
        "GET",
        "/api/v1/restaurants?limit=-4",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["restaurants"].as_array().unwrap().len(), 12);
}

#[tokio::test]
async fn malformed_latitude_is_bad_request() {
    let dir = tempfile::tempdir().unwrap();
    let (status, body) = call(
        app(common::catalogue().await, &dir),
        "GET",
        "/api/v1/restaurants?lat=north&lng=106.7",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("lat"));
}

#[tokio::test]
async fn unknown_restaurant_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let (status, body) = call(
        app(common::rated_pair().await, &dir),
        "GET",
        "/api/v1/restaurants/ghost",
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn restaurant_detail_includes_labels() {
    let dir = tempfile::tempdir().unwrap();
    let (status, body) = call(
        app(common::rated_pair().await, &dir),
        "GET",
        "/api/v1/restaurants/r1",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["restaurant"]["name"], "Pho Hoa");
    assert_eq!(body["data"]["labels"]["food"]["rating"], 4.0);
    assert_eq!(body["data"]["labels"]["price"]["rating"], Value::Null);
}

#[tokio::test]
async fn reviews_validate_label() {
    let dir = tempfile::tempdir().unwrap();
    let store = common::rated_pair().await;

    let (status, _) = call(app(store.clone(), &dir), "GET", "/api/v1/restaurants/r1/reviews").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(
        app(store.clone(), &dir),
        "GET",
        "/api/v1/restaurants/r1/reviews?label=taste",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = call(
        app(store, &dir),
        "GET",
        "/api/v1/restaurants/r1/reviews?label=food",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_reviews"], 1);
    assert_eq!(body["data"]["reviews"][0]["rating_id"], "v1");
}

#[tokio::test]
async fn empty_search_query_is_bad_request() {
    let dir = tempfile::tempdir().unwrap();
    let store = common::rated_pair().await;

    let (status, _) = call(app(store.clone(), &dir), "GET", "/api/v1/restaurants/search?query=").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = call(app(store, &dir), "GET", "/api/v1/restaurants/search?query=bun").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["id"], "r2");
}

#[tokio::test]
async fn food_types_and_menu() {
    let dir = tempfile::tempdir().unwrap();
    let store = common::rated_pair().await;

    let (status, body) = call(app(store.clone(), &dir), "GET", "/api/v1/foodtypes").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], serde_json::json!(["Pho"]));

    let (status, body) = call(app(store, &dir), "GET", "/api/v1/restaurants/r2/menu").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], serde_json::json!([]));
}

#[tokio::test]
async fn admin_recalculate_runs_requested_strategy() {
    let dir = tempfile::tempdir().unwrap();
    let store = common::rated_pair().await;

    let (status, _) = call(
        app(store.clone(), &dir),
        "POST",
        "/api/v1/admin/recalculate?strategy=parallel",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = call(
        app(store.clone(), &dir),
        "POST",
        "/api/v1/admin/recalculate?strategy=bulk",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["strategy"], "bulk");
    assert_eq!(body["data"]["updated"], 2);

    let r1 = store.fetch_restaurant_by_id("r1", None).await.unwrap();
    assert_eq!(r1.rating, 4.5);
    assert!(dir.path().join("ratings.csv").exists());
}
