use super::common::*;
use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::workflows::quote::repository::StoreError;
use crate::workflows::quote::router::{estimate_handler, quote_router};
use crate::workflows::quote::service::EstimateRequest;
use crate::workflows::quote::{AccommodationType, SchoolId, MAPLE_LEAF_ID};

fn json_request(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

#[tokio::test]
async fn schools_route_lists_catalogs() {
    let router = quote_router(Arc::new(build_service(Arc::new(MemoryStore::default()))));

    let response = router
        .oneshot(
            Request::get("/api/v1/quotes/schools")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    let schools = payload["schools"].as_array().expect("schools array");
    assert_eq!(schools.len(), 2);
    assert_eq!(schools[1]["school_id"], MAPLE_LEAF_ID);
}

#[tokio::test]
async fn estimate_route_returns_result_and_display() {
    let router = quote_router(Arc::new(build_service(Arc::new(MemoryStore::default()))));

    let response = router
        .oneshot(json_request(
            "/api/v1/quotes/estimate",
            json!({
                "schoolId": MAPLE_LEAF_ID,
                "weeks": 12,
                "accommodationType": "homestay",
                "startDate": "2027-04-10"
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["result"]["total"], 1_529_500);
    assert_eq!(payload["result"]["subtotal"], 1_610_000);
    assert_eq!(payload["display"]["total"], "¥1,529,500");
}

#[tokio::test]
async fn estimate_handler_maps_errors_to_statuses() {
    let service = Arc::new(build_service(Arc::new(MemoryStore::default())));

    let out_of_range = EstimateRequest {
        school_id: SchoolId::new(MAPLE_LEAF_ID),
        weeks: 60,
        accommodation_type: AccommodationType::Homestay,
        options: options(&[]),
        start_date: None,
    };
    let response =
        estimate_handler(State(service.clone()), axum::Json(out_of_range.clone())).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert!(payload["error"]
        .as_str()
        .unwrap_or_default()
        .contains("60"));

    let unknown_school = EstimateRequest {
        school_id: SchoolId::new("nowhere"),
        weeks: 4,
        ..out_of_range
    };
    let response = estimate_handler(State(service), axum::Json(unknown_school)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn save_route_creates_a_quote() {
    let store = Arc::new(MemoryStore::default());
    let router = quote_router(Arc::new(build_service(store.clone())));

    let response = router
        .oneshot(json_request(
            "/api/v1/quotes",
            json!({
                "schoolId": MAPLE_LEAF_ID,
                "weeks": 4,
                "accommodationType": "none",
                "options": ["travel_insurance"],
                "contact": { "email": "kenji@example.jp" }
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["quoteId"], "Q-0001");
    assert_eq!(payload["validUntil"], "2027-02-09");
    assert_eq!(payload["display"]["total"], "¥262,000");
    assert_eq!(store.saved().len(), 1);
}

#[tokio::test]
async fn save_route_reports_bad_gateway_when_the_store_fails() {
    let store = Arc::new(FailingStore::new(StoreError::Server { status: 500 }));
    let router = quote_router(Arc::new(build_service(store)));

    let response = router
        .oneshot(json_request(
            "/api/v1/quotes",
            json!({
                "schoolId": MAPLE_LEAF_ID,
                "weeks": 4,
                "accommodationType": "homestay"
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}
