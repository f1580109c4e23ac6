//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API.

use remedy_core::{
    Fault, FollowUpAction, Outcome, Procedure, RemedyError, SessionView, Troubleshooter,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub deployment: String,
}

impl HealthResponse {
    /// Healthy response for a deployment.
    #[must_use]
    pub fn ok(deployment: &str) -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            deployment: deployment.to_string(),
        }
    }
}

// =============================================================================
// TAXONOMY RESPONSES
// =============================================================================

/// One category in a listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySummary {
    pub name: String,
    pub fault_count: usize,
}

/// Category listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoriesResponse {
    pub deployment: String,
    pub categories: Vec<CategorySummary>,
}

impl CategoriesResponse {
    /// Build from a deployment.
    #[must_use]
    pub fn from_troubleshooter(troubleshooter: &Troubleshooter) -> Self {
        Self {
            deployment: troubleshooter.name().to_string(),
            categories: troubleshooter
                .store()
                .list_categories()
                .iter()
                .map(|c| CategorySummary {
                    name: c.name().to_string(),
                    fault_count: c.faults().len(),
                })
                .collect(),
        }
    }
}

/// One fault in a listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaultSummary {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Fault listing for a category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaultsResponse {
    pub category: String,
    pub faults: Vec<FaultSummary>,
}

impl FaultsResponse {
    /// Build from a category's faults.
    #[must_use]
    pub fn new(category: &str, faults: &[Arc<Fault>]) -> Self {
        Self {
            category: category.to_string(),
            faults: faults
                .iter()
                .map(|f| FaultSummary {
                    name: f.name.clone(),
                    code: f.code.clone(),
                })
                .collect(),
        }
    }
}

/// Everything about one fault, including the procedures a session would use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaultDetailResponse {
    pub category: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub indication: String,
    pub causes: Vec<String>,
    pub impact: String,
    /// Direct steps; empty together with `steps_documented == false`.
    pub steps: Vec<String>,
    pub steps_documented: bool,
    /// Why `steps` is empty, for the "no steps documented" message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps_missing: Option<ErrorResponse>,
    pub procedures: Vec<Procedure>,
}

impl FaultDetailResponse {
    /// Build from a fault, its direct-step lookup and its planned procedures.
    ///
    /// `EmptyStepSet` becomes `steps_missing`; any other lookup error is returned.
    pub fn new(
        fault: &Fault,
        direct_steps: Result<&[String], RemedyError>,
        procedures: &[Arc<Procedure>],
    ) -> Result<Self, RemedyError> {
        let (steps, steps_missing) = match direct_steps {
            Ok(steps) => (steps.to_vec(), None),
            Err(e @ RemedyError::EmptyStepSet { .. }) => {
                (Vec::new(), Some(ErrorResponse::from_error(&e, None)))
            }
            Err(e) => return Err(e),
        };
        Ok(Self {
            category: fault.category.clone(),
            name: fault.name.clone(),
            code: fault.code.clone(),
            indication: fault.indication.clone(),
            causes: fault.causes.clone(),
            impact: fault.impact.clone(),
            steps_documented: steps_missing.is_none(),
            steps,
            steps_missing,
            procedures: procedures.iter().map(|p| (**p).clone()).collect(),
        })
    }
}

// =============================================================================
// SESSION REQUESTS/RESPONSES
// =============================================================================

/// Start a session for a fault.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartSessionRequest {
    pub category: String,
    pub fault: String,
}

/// Record the final outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeRequest {
    pub outcome: Outcome,
}

/// The active session, with follow-up once an outcome exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub session: SessionView,
    #[serde(default)]
    pub follow_up: Vec<FollowUpAction>,
}

// =============================================================================
// ERROR RESPONSE
// =============================================================================

/// Error body.
///
/// For rejected session events `session` carries the authoritative state the
/// client should re-render from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionView>,
}

impl ErrorResponse {
    /// Build from an engine error.
    #[must_use]
    pub fn from_error(err: &RemedyError, session: Option<SessionView>) -> Self {
        Self {
            error: err.to_string(),
            kind: error_kind(err).to_string(),
            session,
        }
    }

    /// No session is active.
    #[must_use]
    pub fn no_session() -> Self {
        Self {
            error: "No active session".to_string(),
            kind: "no_session".to_string(),
            session: None,
        }
    }
}

/// Stable machine-readable name of an error.
#[must_use]
pub fn error_kind(err: &RemedyError) -> &'static str {
    match err {
        RemedyError::CategoryNotFound(_)
        | RemedyError::FaultNotFound { .. }
        | RemedyError::ProcedureNotFound(_) => "not_found",
        RemedyError::OutOfOrderStep { .. } => "out_of_order_step",
        RemedyError::StepOutOfRange { .. } => "step_out_of_range",
        RemedyError::SessionTerminal => "session_terminal",
        RemedyError::OutcomeNotReady { .. } => "outcome_not_ready",
        RemedyError::EmptyStepSet { .. } => "empty_step_set",
        RemedyError::InvalidTaxonomy(_)
        | RemedyError::InvalidProcedure(_)
        | RemedyError::InvalidRule(_)
        | RemedyError::Config(_) => "invalid",
        RemedyError::Io(_) => "io",
    }
}

// =============================================================================
// TESTS
// =============================================================================
