// API integration tests
//
// Drive the full router in-process via tower::ServiceExt::oneshot. Endpoints
// that consult the weather/soil providers fall back to static data when the
// upstream APIs are unreachable, so these tests hold with or without
// network access.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use cropcast::{create_router, AppState};
use serde_json::{json, Value};
use tower::ServiceExt; // for oneshot

// Helper: create router over the builtin catalog
fn create_test_app() -> axum::Router {
    let state = AppState::new().expect("builtin catalog must validate");
    create_router(state)
}

// Helper: parse JSON response body
async fn json_response(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body");
    serde_json::from_slice(&body).expect("Failed to parse JSON")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

// =========================================================================
// Health
// =========================================================================

#[tokio::test]
async fn test_health_check() {
    let app = create_test_app();
    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_response(response).await;
    assert_eq!(body["status"], "healthy");
    assert!(body["timestamp"].is_string());
}

// =========================================================================
// Catalog listing
// =========================================================================

#[tokio::test]
async fn test_crops_listing() {
    let app = create_test_app();
    let response = app.oneshot(get("/api/crops")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_response(response).await;
    let crops = body["crops"].as_array().expect("crops array");
    assert!(!crops.is_empty());
    for crop in crops {
        assert!(crop["name"].is_string());
        assert!(crop["metadata"]["display_name"].is_string());
        // Listing is a catalog dump, never scored
        assert!(crop.get("score").is_none());
    }
}

// =========================================================================
// Coordinate validation (shared by weather/soil/calendar)
// =========================================================================

#[tokio::test]
async fn test_missing_coords_rejected() {
    for uri in ["/api/weather", "/api/soil", "/api/calendar"] {
        let app = create_test_app();
        let response = app.oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
        let body = json_response(response).await;
        assert_eq!(body["error"], "lat and lon required");
    }
}

#[tokio::test]
async fn test_unparseable_coords_rejected() {
    let app = create_test_app();
    let response = app
        .oneshot(get("/api/weather?lat=abc&lon=77.2"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_response(response).await;
    assert_eq!(body["error"], "invalid coordinates");
}

#[tokio::test]
async fn test_out_of_range_coords_rejected() {
    let app = create_test_app();
    let response = app
        .oneshot(get("/api/calendar?lat=95.0&lon=77.2"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_response(response).await;
    assert_eq!(body["error"], "out of range coordinates");
}

// =========================================================================
// Recommend
// =========================================================================

#[tokio::test]
async fn test_recommend_requires_coords() {
    let app = create_test_app();
    let response = app
        .oneshot(post_json("/api/recommend", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_response(response).await;
    assert_eq!(body["error"], "lat and lon required");
}

#[tokio::test]
async fn test_recommend_rejects_out_of_range() {
    let app = create_test_app();
    let response = app
        .oneshot(post_json(
            "/api/recommend",
            json!({"lat": 28.6, "lon": 200.0}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_recommend_returns_full_ranked_list() {
    let app = create_test_app();
    let response = app
        .oneshot(post_json(
            "/api/recommend",
            json!({"lat": 28.6139, "lon": 77.2090}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_response(response).await;
    let recs = body["recommendations"].as_array().expect("recommendations");
    assert!(!recs.is_empty());

    let scores: Vec<f64> = recs
        .iter()
        .map(|r| r["score"].as_f64().expect("numeric score"))
        .collect();
    for pair in scores.windows(2) {
        assert!(pair[0] >= pair[1], "not sorted descending: {:?}", scores);
    }
    for score in &scores {
        assert!((0.0..=100.0).contains(score));
    }
}

// =========================================================================
// Calendar
// =========================================================================

#[tokio::test]
async fn test_calendar_returns_twelve_months() {
    let app = create_test_app();
    let response = app
        .oneshot(get("/api/calendar?lat=28.6139&lon=77.2090"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_response(response).await;
    let months = body["months"].as_array().expect("months");
    let climatology = body["climatology_months"].as_array().expect("climatology");
    assert_eq!(months.len(), 12);
    assert_eq!(climatology.len(), 12);

    for (i, month) in months.iter().enumerate() {
        assert_eq!(month["month"], (i + 1) as u64);
        let status = month["status"].as_str().expect("status label");
        assert!(["favorable", "moderate", "unfavorable"].contains(&status));
    }
}

// =========================================================================
// Weather / soil passthrough
// =========================================================================

#[tokio::test]
async fn test_weather_report_shape() {
    let app = create_test_app();
    let response = app
        .oneshot(get("/api/weather?lat=28.6139&lon=77.2090"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_response(response).await;
    assert!(body["current"]["temp"].is_number());
    assert!(body["current"]["rain"]["1h"].is_number());
    assert!(!body["daily"].as_array().expect("daily").is_empty());
    assert_eq!(
        body["climatology"]["monthly"].as_array().expect("monthly").len(),
        12
    );
}

#[tokio::test]
async fn test_soil_properties_shape() {
    let app = create_test_app();
    let response = app
        .oneshot(get("/api/soil?lat=28.6139&lon=77.2090"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_response(response).await;
    assert!(body["ph"].is_number());
    assert!(body["texture"].is_string());
    assert!(body.get("soc_pct").is_some());
}

#[tokio::test]
async fn test_geocode_empty_query_returns_empty_results() {
    let app = create_test_app();
    let response = app.oneshot(get("/api/geocode?query=")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_response(response).await;
    assert_eq!(body["results"].as_array().expect("results").len(), 0);
}

// =========================================================================
// CSV export
// =========================================================================

#[tokio::test]
async fn test_export_csv() {
    let app = create_test_app();
    let response = app
        .oneshot(post_json(
            "/api/export/csv",
            json!({
                "recs": [
                    {"name": "wheat", "score": 87.5},
                    {"name": "rice", "score": 42.0}
                ],
                "fields": ["name", "score"]
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE].to_str().unwrap(),
        "text/csv"
    );
    assert!(response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .contains("crop_recommendations.csv"));

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("name,score"));
    assert_eq!(lines.next(), Some("wheat,87.5"));
    assert_eq!(lines.next(), Some("rice,42.0"));
}

#[tokio::test]
async fn test_export_csv_requires_recs_and_fields() {
    let app = create_test_app();
    let response = app
        .oneshot(post_json("/api/export/csv", json!({"recs": [], "fields": []})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_response(response).await;
    assert_eq!(body["error"], "recs and fields required");
}
