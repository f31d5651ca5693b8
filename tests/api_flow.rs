use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use surplus_connect::{
    AppState,
    config::AppConfig,
    router,
    services::{MockAuth, MockInspector, MockStorage, NoopGeocoder},
    store::{DataStore, JsonFileStore},
};

const BOUNDARY: &str = "surplus-test-boundary";

fn app() -> (TempDir, Router) {
    let dir = TempDir::new().unwrap();
    let store: Arc<dyn DataStore> = Arc::new(JsonFileStore::new(dir.path().join("db.json")));
    let state = AppState::from_parts(
        AppConfig::default(),
        store.clone(),
        Arc::new(MockAuth::new(store)),
        Arc::new(MockStorage),
        Arc::new(NoopGeocoder),
        Arc::new(MockInspector),
    );
    (dir, router(Arc::new(state)))
}

fn multipart_body(fields: &[(&str, &str)], image: Option<&[u8]>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n").as_bytes(),
        );
    }
    if let Some(bytes) = image {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"tray.jpg\"\r\nContent-Type: image/jpeg\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn multipart_request(uri: &str, token: &str, body: Vec<u8>) -> Request<Body> {
    Request::post(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap()
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn donation_fields() -> Vec<(&'static str, &'static str)> {
    vec![
        ("food_category", "Cooked"),
        ("weight_kg", "7.5"),
        ("expiry_hours", "6"),
        ("pickup_instructions", "Ask at the front desk"),
        ("freshness_score", "8"),
        ("can_deliver", "false"),
    ]
}

#[tokio::test]
async fn donation_claim_delivery_flow() {
    let (_dir, app) = app();

    let (status, body) = send(
        &app,
        multipart_request("/donations", "donor-1", multipart_body(&donation_fields(), Some(&b"jpeg"[..]))),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);

    let (status, feed) = send(&app, json_request("GET", "/donations", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    let donations = feed.as_array().unwrap();
    assert_eq!(donations.len(), 1);
    assert_eq!(donations[0]["donor_id"], "donor-1");
    assert_eq!(donations[0]["is_verified"], true);
    let donation_id = donations[0]["id"].as_str().unwrap().to_string();

    let claim_uri = format!("/donations/{donation_id}/claim");
    let (status, claim) = send(
        &app,
        json_request("POST", &claim_uri, Some("ngo-1"), Some(json!({ "method": "VOLUNTEER" }))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(claim["success"], true);
    let task_id = claim["task_id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        json_request("POST", &claim_uri, Some("ngo-1"), Some(json!({ "method": "PICKUP" }))),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, feed) = send(&app, json_request("GET", "/donations", None, None)).await;
    assert!(feed.as_array().unwrap().is_empty());

    let (_, open) = send(&app, json_request("GET", "/tasks/open", None, None)).await;
    let open = open.as_array().unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0]["id"], task_id.as_str());
    assert_eq!(open[0]["claim"]["ngo"]["organization_name"], "Food Bank Central");
    assert_eq!(open[0]["claim"]["donation"]["donor"]["organization_name"], "Community Kitchen");

    let (status, accepted) = send(
        &app,
        json_request("POST", &format!("/tasks/{task_id}/accept"), Some("volunteer-1"), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(accepted["success"], true);

    let (_, assigned) = send(&app, json_request("GET", "/tasks/assigned", Some("volunteer-1"), None)).await;
    assert_eq!(assigned.as_array().unwrap().len(), 1);

    let (status, done) = send(
        &app,
        json_request("POST", &format!("/tasks/{task_id}/complete"), Some("volunteer-1"), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(done["points_earned"], 50);

    let (status, _) = send(
        &app,
        json_request("POST", &format!("/tasks/{task_id}/complete"), Some("volunteer-1"), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, board) = send(&app, json_request("GET", "/leaderboard", None, None)).await;
    assert_eq!(board[0]["id"], "volunteer-1");
    assert_eq!(board[0]["points"], 50);
    assert_eq!(board[0]["lifetime_deliveries"], 1);
}

#[tokio::test]
async fn invalid_donation_reports_every_field() {
    let (_dir, app) = app();

    let fields = [("food_category", "Frozen"), ("weight_kg", "0"), ("expiry_hours", "soon")];
    let (status, body) = send(&app, multipart_request("/donations", "donor-1", multipart_body(&fields, None))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Validation failed");
    for field in ["food_category", "weight_kg", "expiry_hours", "pickup_instructions", "image"] {
        assert!(body["details"][field].is_array(), "missing issue for {field}");
    }
}

#[tokio::test]
async fn ai_check_uses_inspector() {
    let (_dir, app) = app();

    let (status, report) = send(&app, multipart_request("/ai/check", "donor-1", multipart_body(&[], Some(&b"jpeg"[..])))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["is_safe"], true);
    assert_eq!(report["detected_category"], "Cooked");

    let (status, body) = send(&app, multipart_request("/ai/check", "donor-1", multipart_body(&[], None))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No image provided");
}

#[tokio::test]
async fn login_and_role() {
    let (_dir, app) = app();

    let (status, login) = send(
        &app,
        json_request("POST", "/auth/login", None, Some(json!({ "email": "ngo@example.com", "password": "pw" }))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(login["access_token"], "ngo-1");
    assert_eq!(login["role"], "NGO");
    assert_eq!(login["redirect_to"], "/dashboard/ngo");

    let (_, role) = send(&app, json_request("GET", "/auth/role", Some("volunteer-1"), None)).await;
    assert_eq!(role["role"], "VOLUNTEER");

    let (status, body) = send(&app, json_request("POST", "/auth/login", None, Some(json!({ "email": "" })))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Email and password are required");

    let (status, body) = send(&app, json_request("POST", "/auth/logout", Some("ngo-1"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn health_check() {
    let (_dir, app) = app();
    let (status, body) = send(&app, json_request("GET", "/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
