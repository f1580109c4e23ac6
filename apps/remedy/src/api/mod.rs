//! # Remedy HTTP API Module
//!
//! This module implements the HTTP REST API server using axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /categories` - List categories
//! - `GET /categories/{category}/faults` - List the faults of a category
//! - `GET /categories/{category}/faults/{fault}` - Fault details and planned procedures
//! - `POST /session` - Start a session for a fault (replaces the active one)
//! - `GET /session` - Current session view
//! - `DELETE /session` - Discard the active session
//! - `POST /session/steps/{index}` - Complete a step
//! - `DELETE /session/steps/{index}` - Uncomplete a step
//! - `POST /session/outcome` - Record resolved/persists
//! - `POST /session/reset` - Reset progress
//!
//! ## Status Codes
//!
//! - 404 for unknown categories, faults and procedures, or no active session
//! - 409 for session events the session rejects; the body carries the
//!   authoritative session view
//!
//! ## Configuration (Environment Variables)
//!
//! - `REMEDY_CORS_ORIGINS`: Comma-separated list of allowed origins, or "*" for all (default: localhost only)

mod handlers;
mod types;

// Re-export handlers and types for integration tests (via `remedy::api::*`)
#[allow(unused_imports)]
pub use handlers::{
    categories_handler, complete_step_handler, end_session_handler, fault_handler,
    faults_handler, get_session_handler, health_handler, outcome_handler, reset_handler,
    start_session_handler, uncomplete_step_handler,
};
#[allow(unused_imports)]
pub use types::{
    CategoriesResponse, CategorySummary, ErrorResponse, FaultDetailResponse, FaultSummary,
    FaultsResponse, HealthResponse, OutcomeRequest, SessionResponse, StartSessionRequest,
    error_kind,
};

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use remedy_core::{RemedyError, Session, Troubleshooter};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Environment variable holding the allowed CORS origins.
pub const CORS_ENV: &str = "REMEDY_CORS_ORIGINS";

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state: the deployment and the single active session.
#[derive(Clone)]
pub struct AppState {
    /// The read-only deployment.
    pub troubleshooter: Arc<Troubleshooter>,
    /// The active session, if a fault has been selected.
    pub session: Arc<RwLock<Option<Session>>>,
}

impl AppState {
    /// Create new app state with no active session.
    #[must_use]
    pub fn new(troubleshooter: Troubleshooter) -> Self {
        Self {
            troubleshooter: Arc::new(troubleshooter),
            session: Arc::new(RwLock::new(None)),
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build CORS layer from environment configuration.
///
/// Reads `REMEDY_CORS_ORIGINS`:
/// - If "*": allows all origins
/// - If not set: localhost only
/// - Otherwise: comma-separated list of allowed origins
fn build_cors_layer() -> CorsLayer {
    let origins_env = std::env::var(CORS_ENV).ok();

    match origins_env.as_deref() {
        Some("*") => {
            tracing::warn!("CORS: Allowing ALL origins ({}=*)", CORS_ENV);
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed_origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) => {
                            tracing::info!("CORS: Allowing origin: {}", trimmed);
                            Some(hv)
                        }
                        Err(e) => {
                            tracing::warn!("CORS: Invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!(
                    "CORS: No valid origins in {}, defaulting to localhost only",
                    CORS_ENV
                );
                build_localhost_cors()
            } else {
                restricted_cors(allowed_origins)
            }
        }
        None => {
            tracing::info!("CORS: No {} set, defaulting to localhost only", CORS_ENV);
            build_localhost_cors()
        }
    }
}

/// Build a restrictive CORS layer that only allows localhost origins.
fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8080",
    ]
    .iter()
    .filter_map(|o| o.parse::<HeaderValue>().ok())
    .collect();

    restricted_cors(origins)
}

fn restricted_cors(origins: Vec<HeaderValue>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing - logs all requests
/// 2. CORS - handles preflight requests
pub fn create_router(state: AppState) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer());

    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/categories", get(handlers::categories_handler))
        .route("/categories/{category}/faults", get(handlers::faults_handler))
        .route(
            "/categories/{category}/faults/{fault}",
            get(handlers::fault_handler),
        )
        .route(
            "/session",
            post(handlers::start_session_handler)
                .get(handlers::get_session_handler)
                .delete(handlers::end_session_handler),
        )
        .route(
            "/session/steps/{index}",
            post(handlers::complete_step_handler).delete(handlers::uncomplete_step_handler),
        )
        .route("/session/outcome", post(handlers::outcome_handler))
        .route("/session/reset", post(handlers::reset_handler))
        .layer(axum::extract::DefaultBodyLimit::max(64 * 1024))
        .layer(middleware)
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server and run until Ctrl+C.
pub async fn run_server(addr: &str, troubleshooter: Troubleshooter) -> Result<(), RemedyError> {
    let state = AppState::new(troubleshooter);
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| RemedyError::Io(format!("Bind failed: {}", e)))?;

    tracing::info!("Remedy HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| RemedyError::Io(format!("Server error: {}", e)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
