//! Integration tests for the lifecycle HTTP API.
//!
//! These tests exercise the full router over in-memory adapters:
//! 1. Gym setup and the plan catalog
//! 2. Onboarding, reading back and renewing a client
//! 3. Error mapping and the guarded reconciliation trigger

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use chrono::{TimeZone, Utc};
use secrecy::Secret;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use gym_membership::adapters::http::{lifecycle_router, LifecycleAppState};
use gym_membership::adapters::memory::{
    InMemoryGymDirectory, InMemoryLifecycleStore, InMemoryPlanCatalog,
};
use gym_membership::adapters::notify::RecordingNotifier;
use gym_membership::adapters::FixedClock;
use gym_membership::application::handlers::lifecycle::{
    LifecyclePolicy, ReconcileMembershipsHandler,
};
use gym_membership::domain::foundation::{GymId, Timestamp};
use gym_membership::ports::{Clock, GymDirectory, LifecycleStore, Notifier, PlanCatalog};

const SECRET: &str = "reconcile-secret-123";

// =============================================================================
// Test Infrastructure
// =============================================================================

fn app() -> Router {
    let gyms: Arc<dyn GymDirectory> = Arc::new(InMemoryGymDirectory::new());
    let plans: Arc<dyn PlanCatalog> = Arc::new(InMemoryPlanCatalog::new());
    let store: Arc<dyn LifecycleStore> = Arc::new(InMemoryLifecycleStore::new());
    let notifier: Arc<dyn Notifier> = Arc::new(RecordingNotifier::new());
    // 2025-01-01 10:00 in Kolkata
    let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(Timestamp::from_datetime(
        Utc.with_ymd_and_hms(2025, 1, 1, 4, 30, 0).unwrap(),
    )));
    let policy = LifecyclePolicy::default();

    let reconciler = Arc::new(ReconcileMembershipsHandler::new(
        gyms.clone(),
        store.clone(),
        notifier.clone(),
        clock.clone(),
        policy,
    ));

    lifecycle_router(LifecycleAppState {
        gyms,
        plans,
        store,
        notifier,
        clock,
        policy,
        default_reminder_days: 3,
        reconciler,
        reconciliation_secret: Some(Arc::new(Secret::new(SECRET.to_string()))),
    })
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Registers a gym with one individual monthly plan; returns (gym_id, plan_id).
async fn gym_with_plan(app: &Router) -> (GymId, String) {
    let gym_id = GymId::new();
    let (status, _) = send(
        app,
        Method::PUT,
        &format!("/api/gyms/{}", gym_id),
        Some(json!({ "name": "Iron Temple" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, plan) = send(
        app,
        Method::POST,
        &format!("/api/gyms/{}/plans", gym_id),
        Some(json!({
            "plan_name": "Monthly",
            "duration_in_months": 1,
            "price": 1000,
            "plan_type": "individual",
            "members_allowed": 1
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    (gym_id, plan["id"].as_str().unwrap().to_string())
}

fn onboarding(plan_id: &str, phone: &str) -> Value {
    json!({
        "primary": { "name": "Asha", "phone_number": phone },
        "plan_id": plan_id,
        "method": "cash",
        "payment_received": false
    })
}

// =============================================================================
// Gym and Plans
// =============================================================================

#[tokio::test]
async fn health_reports_ok() {
    let (status, body) = send(&app(), Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn gym_settings_reject_unknown_timezone() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/gyms/{}", GymId::new()),
        Some(json!({ "name": "Iron Temple", "timezone": "Mars/Olympus" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "VALIDATION_FAILED");
}

#[tokio::test]
async fn deactivated_plan_is_hidden_and_cannot_be_sold() {
    let app = app();
    let (gym_id, plan_id) = gym_with_plan(&app).await;

    let (status, plan) = send(
        &app,
        Method::POST,
        &format!("/api/gyms/{}/plans/{}/deactivate", gym_id, plan_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(plan["active"], false);

    let (_, listed) = send(&app, Method::GET, &format!("/api/gyms/{}/plans", gym_id), None).await;
    assert!(listed["plans"].as_array().unwrap().is_empty());

    let (_, listed) = send(
        &app,
        Method::GET,
        &format!("/api/gyms/{}/plans?include_inactive=true", gym_id),
        None,
    )
    .await;
    assert_eq!(listed["plans"].as_array().unwrap().len(), 1);

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/gyms/{}/clients", gym_id),
        Some(onboarding(&plan_id, "9876543210")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "PLAN_INACTIVE");
}

// =============================================================================
// Clients
// =============================================================================

#[tokio::test]
async fn onboard_then_read_back_client_and_history() {
    let app = app();
    let (gym_id, plan_id) = gym_with_plan(&app).await;

    let (status, created) = send(
        &app,
        Method::POST,
        &format!("/api/gyms/{}/clients", gym_id),
        Some(onboarding(&plan_id, "9876543210")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["membership"]["status"], "active");
    assert_eq!(created["membership"]["end_date"], "2025-01-31");
    assert_eq!(created["client"]["balance"], 1000);
    let client_id = created["client"]["id"].as_str().unwrap().to_string();

    let (status, state) = send(
        &app,
        Method::GET,
        &format!("/api/gyms/{}/clients/{}", gym_id, client_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(state["client"]["membership_status"], "active");
    assert_eq!(state["active"]["id"], created["membership"]["id"]);
    assert!(state["upcoming"].is_null());

    let (status, paid) = send(
        &app,
        Method::POST,
        &format!("/api/gyms/{}/clients/{}/payments", gym_id, client_id),
        Some(json!({ "amount": 400, "method": "upi" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(paid["balance"], 600);

    let (status, history) = send(
        &app,
        Method::GET,
        &format!("/api/gyms/{}/clients/{}/memberships", gym_id, client_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history["memberships"].as_array().unwrap().len(), 1);
    let types: Vec<&str> = history["activities"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["type"].as_str().unwrap())
        .collect();
    assert!(types.contains(&"ONBOARDING"));
    assert!(types.contains(&"PAYMENT"));
}

#[tokio::test]
async fn duplicate_phone_number_conflicts() {
    let app = app();
    let (gym_id, plan_id) = gym_with_plan(&app).await;
    let uri = format!("/api/gyms/{}/clients", gym_id);

    let (status, _) = send(&app, Method::POST, &uri, Some(onboarding(&plan_id, "9876543210"))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, Method::POST, &uri, Some(onboarding(&plan_id, "9876543210"))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error_code"], "PHONE_NUMBER_TAKEN");
}

#[tokio::test]
async fn malformed_start_date_is_a_validation_error() {
    let app = app();
    let (gym_id, plan_id) = gym_with_plan(&app).await;
    let mut body = onboarding(&plan_id, "9876543210");
    body["start_date"] = json!("01/02/2025");

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/gyms/{}/clients", gym_id),
        Some(body),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "VALIDATION_FAILED");
    assert_eq!(body["details"]["field"], "body");
    assert!(body["message"].as_str().unwrap().contains("start_date"));
}

#[tokio::test]
async fn advance_renewal_is_upcoming() {
    let app = app();
    let (gym_id, plan_id) = gym_with_plan(&app).await;
    let (_, created) = send(
        &app,
        Method::POST,
        &format!("/api/gyms/{}/clients", gym_id),
        Some(onboarding(&plan_id, "9876543210")),
    )
    .await;
    let client_id = created["client"]["id"].as_str().unwrap();

    let (status, renewed) = send(
        &app,
        Method::POST,
        &format!("/api/gyms/{}/clients/{}/renewals", gym_id, client_id),
        Some(json!({
            "plan_id": plan_id,
            "method": "card",
            "payment_received": true,
            "start_date": "2025-02-01"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(renewed["membership"]["status"], "future");
    assert_eq!(renewed["client"]["upcoming_membership"], renewed["membership"]["id"]);
    assert!(renewed["closed_out"].is_null());
}

#[tokio::test]
async fn unknown_client_is_not_found() {
    let app = app();
    let (gym_id, _) = gym_with_plan(&app).await;
    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/gyms/{}/clients/{}", gym_id, uuid::Uuid::new_v4()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error_code"], "CLIENT_NOT_FOUND");
}

// =============================================================================
// Reconciliation Trigger
// =============================================================================

#[tokio::test]
async fn reconciliation_requires_the_shared_secret() {
    let app = app();
    let (status, body) = send(&app, Method::POST, "/api/reconciliation/run", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error_code"], "UNAUTHORIZED");

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/reconciliation/run")
        .header("X-Reconciliation-Secret", SECRET)
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
