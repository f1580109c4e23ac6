//! Integration tests for the Remedy HTTP API.
//!
//! Uses axum-test to test the API handlers without starting a real server.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use axum::http::StatusCode;
use axum_test::TestServer;
use remedy::api::{
    AppState, CategoriesResponse, ErrorResponse, FaultDetailResponse, FaultsResponse,
    HealthResponse, SessionResponse, create_router,
};
use remedy::config::DeploymentConfig;
use remedy_core::{Machine, Outcome, SessionState};
use serde_json::json;

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Create a test server over a built-in deployment.
fn create_machine_server(machine: Machine) -> TestServer {
    let troubleshooter = DeploymentConfig::builtin(machine).unwrap().build().unwrap();
    let router = create_router(AppState::new(troubleshooter));
    TestServer::new(router).unwrap()
}

/// Create a test server over the default hemodialysis deployment.
fn create_test_server() -> TestServer {
    create_machine_server(Machine::Hemodialysis)
}

/// Start a session for the air detector alarm and return its total step count.
async fn start_air_detector(server: &TestServer) -> usize {
    let response = server
        .post("/session")
        .json(&json!({ "category": "Blood Circuit Errors", "fault": "Air Detector Alarm" }))
        .await;
    response.assert_status_ok();
    response.json::<SessionResponse>().session.progress.total
}

// =============================================================================
// HEALTH / TAXONOMY
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let server = create_test_server();

    let response = server.get("/health").await;

    response.assert_status_ok();
    let health: HealthResponse = response.json();
    assert_eq!(health.status, "ok");
    assert_eq!(health.deployment, "Hemodialysis Machine");
}

#[tokio::test]
async fn test_categories_in_declaration_order() {
    let server = create_test_server();

    let response = server.get("/categories").await;

    response.assert_status_ok();
    let body: CategoriesResponse = response.json();
    assert_eq!(body.categories.len(), 6);
    assert_eq!(body.categories[0].name, "Water System Errors");
    assert_eq!(body.categories[0].fault_count, 3);
}

#[tokio::test]
async fn test_faults_with_encoded_path() {
    let server = create_test_server();

    let response = server.get("/categories/Blood%20Circuit%20Errors/faults").await;

    response.assert_status_ok();
    let body: FaultsResponse = response.json();
    assert_eq!(body.category, "Blood Circuit Errors");
    assert_eq!(body.faults[0].name, "Air Detector Alarm");
}

#[tokio::test]
async fn test_unknown_category_is_404() {
    let server = create_test_server();

    let response = server.get("/categories/Nope/faults").await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body: ErrorResponse = response.json();
    assert_eq!(body.kind, "not_found");
    assert!(body.session.is_none());
}

#[tokio::test]
async fn test_fault_detail_includes_plan() {
    let server = create_test_server();

    let response = server
        .get("/categories/Blood%20Circuit%20Errors/faults/Air%20Detector%20Alarm")
        .await;

    response.assert_status_ok();
    let detail: FaultDetailResponse = response.json();
    assert!(detail.steps_documented);
    assert!(detail.steps_missing.is_none());
    let ids: Vec<&str> = detail.procedures.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["connections_check", "safety_systems"]);
}

// =============================================================================
// SESSION LIFECYCLE
// =============================================================================

#[tokio::test]
async fn test_no_session_is_404() {
    let server = create_test_server();

    server.get("/session").await.assert_status(StatusCode::NOT_FOUND);
    server.post("/session/steps/0").await.assert_status(StatusCode::NOT_FOUND);
    server.delete("/session").await.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_start_unknown_fault_is_404() {
    let server = create_test_server();

    let response = server
        .post("/session")
        .json(&json!({ "category": "Blood Circuit Errors", "fault": "Nope" }))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_session_walkthrough_to_persists() {
    let server = create_test_server();
    let total = start_air_detector(&server).await;
    assert!(total > 0);

    for i in 0..total {
        let response = server.post(&format!("/session/steps/{}", i)).await;
        response.assert_status_ok();
    }

    let body: SessionResponse = server.get("/session").await.json();
    assert_eq!(body.session.state, SessionState::AwaitingResolution);
    assert_eq!(body.session.progress.percent, 100);
    assert!(body.follow_up.is_empty());

    let response = server
        .post("/session/outcome")
        .json(&json!({ "outcome": "persists" }))
        .await;
    response.assert_status_ok();
    let body: SessionResponse = response.json();
    assert_eq!(body.session.state, SessionState::Persists);
    assert_eq!(body.session.outcome, Some(Outcome::Persists));
    assert_eq!(
        body.follow_up[0].as_str(),
        "Escalate to a senior biomedical engineer"
    );
}

#[tokio::test]
async fn test_out_of_order_step_returns_conflict_with_view() {
    let server = create_test_server();
    start_air_detector(&server).await;

    let response = server.post("/session/steps/3").await;

    response.assert_status(StatusCode::CONFLICT);
    let body: ErrorResponse = response.json();
    assert_eq!(body.kind, "out_of_order_step");
    let view = body.session.unwrap();
    assert_eq!(view.progress.completed, 0);
    assert_eq!(view.state, SessionState::InProgress);
}

#[tokio::test]
async fn test_outcome_before_completion_is_conflict() {
    let server = create_test_server();
    start_air_detector(&server).await;

    let response = server
        .post("/session/outcome")
        .json(&json!({ "outcome": "resolved" }))
        .await;

    response.assert_status(StatusCode::CONFLICT);
    let body: ErrorResponse = response.json();
    assert_eq!(body.kind, "outcome_not_ready");
}

#[tokio::test]
async fn test_uncomplete_and_reset() {
    let server = create_test_server();
    start_air_detector(&server).await;

    server.post("/session/steps/0").await.assert_status_ok();
    server.post("/session/steps/1").await.assert_status_ok();

    // Only the last completed step can be retracted.
    server
        .delete("/session/steps/0")
        .await
        .assert_status(StatusCode::CONFLICT);
    let body: SessionResponse = server.delete("/session/steps/1").await.json();
    assert_eq!(body.session.progress.completed, 1);

    let body: SessionResponse = server.post("/session/reset").await.json();
    assert_eq!(body.session.progress.completed, 0);
    assert_eq!(body.session.state, SessionState::InProgress);
}

#[tokio::test]
async fn test_new_session_replaces_old_and_delete_discards() {
    let server = create_test_server();
    start_air_detector(&server).await;
    server.post("/session/steps/0").await.assert_status_ok();

    let response = server
        .post("/session")
        .json(&json!({ "category": "Pump and Motor Errors", "fault": "UF Pump Error" }))
        .await;
    response.assert_status_ok();
    let body: SessionResponse = response.json();
    assert_eq!(body.session.fault, "UF Pump Error");
    assert_eq!(body.session.progress.completed, 0);

    server
        .delete("/session")
        .await
        .assert_status(StatusCode::NO_CONTENT);
    server.get("/session").await.assert_status(StatusCode::NOT_FOUND);
}

// =============================================================================
// OTHER MACHINES
// =============================================================================

#[tokio::test]
async fn test_pms_faults_carry_codes() {
    let server = create_machine_server(Machine::Pms);

    let response = server.get("/categories/Power%20Supply%20Errors/faults").await;

    response.assert_status_ok();
    let body: FaultsResponse = response.json();
    assert_eq!(body.faults[0].name, "Low Battery Voltage");
    assert_eq!(body.faults[0].code.as_deref(), Some("E01"));
}

#[tokio::test]
async fn test_monitor_session_uses_monitor_follow_up() {
    let server = create_machine_server(Machine::Up7000);
    let response = server
        .post("/session")
        .json(&json!({ "category": "Printer Issues", "fault": "Paper Not Feeding" }))
        .await;
    response.assert_status_ok();
    let body: SessionResponse = response.json();
    let ids: Vec<&str> = body
        .session
        .procedures
        .iter()
        .map(|p| p.id.as_str())
        .collect();
    assert_eq!(ids, vec!["power_cycle", "connections_check", "safety_systems"]);

    for i in 0..body.session.progress.total {
        server
            .post(&format!("/session/steps/{}", i))
            .await
            .assert_status_ok();
    }
    let body: SessionResponse = server
        .post("/session/outcome")
        .json(&json!({ "outcome": "persists" }))
        .await
        .json();
    assert!(
        body.follow_up
            .last()
            .unwrap()
            .as_str()
            .contains("backup monitoring equipment")
    );
}
