//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.
//!
//! Session handlers never hold the lock across anything but the engine call
//! itself. Rejected events answer with the current session so the client can
//! re-sync instead of guessing.

use super::{
    AppState,
    types::{
        CategoriesResponse, ErrorResponse, FaultDetailResponse, FaultsResponse, HealthResponse,
        OutcomeRequest, SessionResponse, StartSessionRequest,
    },
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use remedy_core::{RemedyError, Session, SessionState, Troubleshooter};

// =============================================================================
// HELPERS
// =============================================================================

/// Map an engine error to a status code.
fn status_for(err: &RemedyError) -> StatusCode {
    if err.is_not_found() {
        StatusCode::NOT_FOUND
    } else if err.is_ui_desync() {
        StatusCode::CONFLICT
    } else if matches!(err, RemedyError::Io(_)) {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::BAD_REQUEST
    }
}

fn error_response(err: &RemedyError, session: Option<&Session>) -> Response {
    let view = session.filter(|_| err.is_ui_desync()).map(Session::view);
    (
        status_for(err),
        Json(ErrorResponse::from_error(err, view)),
    )
        .into_response()
}

fn no_session() -> Response {
    (StatusCode::NOT_FOUND, Json(ErrorResponse::no_session())).into_response()
}

fn session_response(troubleshooter: &Troubleshooter, session: &Session) -> Response {
    let follow_up = session
        .outcome()
        .map(|o| troubleshooter.recorder().follow_up(o).to_vec())
        .unwrap_or_default();
    (
        StatusCode::OK,
        Json(SessionResponse {
            session: session.view(),
            follow_up,
        }),
    )
        .into_response()
}

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse::ok(state.troubleshooter.name()))
}

// =============================================================================
// TAXONOMY HANDLERS
// =============================================================================

/// List categories.
pub async fn categories_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(CategoriesResponse::from_troubleshooter(&state.troubleshooter))
}

/// List the faults of a category.
pub async fn faults_handler(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Response {
    match state.troubleshooter.store().category(&category) {
        Ok(cat) => Json(FaultsResponse::new(cat.name(), cat.faults())).into_response(),
        Err(e) => error_response(&e, None),
    }
}

/// Fault details plus the procedures a session would walk through.
pub async fn fault_handler(
    State(state): State<AppState>,
    Path((category, fault)): Path<(String, String)>,
) -> Response {
    let troubleshooter = &state.troubleshooter;
    let result = troubleshooter.fault(&category, &fault).and_then(|f| {
        let procedures = troubleshooter.plan(&category, &fault)?;
        FaultDetailResponse::new(f, troubleshooter.direct_steps(&category, &fault), &procedures)
    });
    match result {
        Ok(detail) => Json(detail).into_response(),
        Err(e) => error_response(&e, None),
    }
}

// =============================================================================
// SESSION HANDLERS
// =============================================================================

/// Start a session, replacing any active one.
pub async fn start_session_handler(
    State(state): State<AppState>,
    Json(request): Json<StartSessionRequest>,
) -> Response {
    let session = match state
        .troubleshooter
        .start_session(&request.category, &request.fault)
    {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!("Session not started: {}", e);
            return error_response(&e, None);
        }
    };

    tracing::info!(
        "Session started for '{}' / '{}' ({} steps)",
        request.category,
        request.fault,
        session.total()
    );

    let mut slot = state.session.write().await;
    let response = session_response(&state.troubleshooter, &session);
    *slot = Some(session);
    response
}

/// Get the active session.
pub async fn get_session_handler(State(state): State<AppState>) -> Response {
    let slot = state.session.read().await;
    match slot.as_ref() {
        Some(session) => session_response(&state.troubleshooter, session),
        None => no_session(),
    }
}

/// Discard the active session.
pub async fn end_session_handler(State(state): State<AppState>) -> Response {
    let mut slot = state.session.write().await;
    match slot.take() {
        Some(session) => {
            tracing::info!("Session for '{}' discarded", session.fault().name);
            StatusCode::NO_CONTENT.into_response()
        }
        None => no_session(),
    }
}

/// Complete the step at the frontier.
pub async fn complete_step_handler(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Response {
    apply(&state, "complete", |s| s.complete_step(index)).await
}

/// Retract the last completed step.
pub async fn uncomplete_step_handler(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Response {
    apply(&state, "uncomplete", |s| s.uncomplete_step(index)).await
}

/// Record the outcome.
pub async fn outcome_handler(
    State(state): State<AppState>,
    Json(request): Json<OutcomeRequest>,
) -> Response {
    let recorder = state.troubleshooter.recorder();
    apply(&state, "outcome", |s| {
        recorder.record(s, request.outcome).map(|(next, _)| next)
    })
    .await
}

/// Reset progress and outcome.
pub async fn reset_handler(State(state): State<AppState>) -> Response {
    apply(&state, "reset", |s| Ok(s.reset())).await
}

/// Run one transition against the active session.
async fn apply<F>(state: &AppState, event: &str, transition: F) -> Response
where
    F: FnOnce(&mut Session) -> Result<SessionState, RemedyError>,
{
    let mut slot = state.session.write().await;
    let Some(session) = slot.as_mut() else {
        return no_session();
    };

    match transition(session) {
        Ok(next) => {
            let progress = session.progress();
            tracing::info!(
                "Session {}: {} ({}/{})",
                event,
                next,
                progress.completed,
                progress.total
            );
            session_response(&state.troubleshooter, session)
        }
        Err(e) => {
            tracing::warn!("Session {} rejected: {}", event, e);
            error_response(&e, Some(&*session))
        }
    }
}
