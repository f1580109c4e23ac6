//! # Core Type Definitions
//!
//! This module contains the shared vocabulary of the Remedy engine:
//! - Identifiers (`ProcedureId`, `StepRef`)
//! - Session results (`Outcome`, `FollowUpAction`)
//! - Error types (`RemedyError`)
//!
//! ## Determinism Guarantees
//!
//! All identifier types:
//! - Implement `Ord` for deterministic ordering in `BTreeMap`/`BTreeSet`
//! - Compare by exact string value (no normalisation hidden in `Eq`)

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Identifier of a generic remediation procedure (e.g. `power_cycle`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcedureId(pub String);

impl ProcedureId {
    /// Create a new procedure id from a string.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProcedureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProcedureId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// One checkbox of a session's flattened step list.
///
/// `index` is the position of the step inside its own procedure,
/// not the global position in the flattened list.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StepRef {
    /// The procedure this step belongs to.
    pub procedure: ProcedureId,
    /// Position of the step within the procedure.
    pub index: usize,
}

impl StepRef {
    /// Create a new step reference.
    #[must_use]
    pub fn new(procedure: ProcedureId, index: usize) -> Self {
        Self { procedure, index }
    }
}

// =============================================================================
// OUTCOME
// =============================================================================

/// Terminal decision the operator records once every step is complete.
///
/// "Unresolved" is not a variant: it is the absence of an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The issue has been fixed.
    Resolved,
    /// The issue persists after all steps were followed.
    Persists,
}

impl Outcome {
    /// Human-readable label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Resolved => "Issue resolved",
            Outcome::Persists => "Issue persists",
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for Outcome {
    type Err = RemedyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "resolved" | "yes" => Ok(Outcome::Resolved),
            "persists" | "no" | "unresolved" => Ok(Outcome::Persists),
            other => Err(RemedyError::Config(format!(
                "Unknown outcome '{}'. Use: resolved, persists",
                other
            ))),
        }
    }
}

// =============================================================================
// FOLLOW-UP ACTION
// =============================================================================

/// One line of guidance shown after an outcome is recorded.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FollowUpAction(pub String);

impl FollowUpAction {
    /// Create a new follow-up action.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the action text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the Remedy engine.
///
/// - No silent failures
/// - Use `Result<T, RemedyError>` for fallible operations
/// - Nothing here is fatal; every variant is a local, recoverable condition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemedyError {
    /// The requested category is not in the taxonomy.
    #[error("Category not found: {0}")]
    CategoryNotFound(String),

    /// The requested fault is not in the given category.
    #[error("Fault not found: '{fault}' in category '{category}'")]
    FaultNotFound { category: String, fault: String },

    /// The requested procedure id is not in the catalog.
    #[error("Procedure not found: {0}")]
    ProcedureNotFound(ProcedureId),

    /// A step was toggled away from the completion frontier.
    #[error("Step {index} is out of order ({completed} steps complete)")]
    OutOfOrderStep { index: usize, completed: usize },

    /// A step index beyond the end of the flattened step list.
    #[error("Step {index} is out of range ({total} steps)")]
    StepOutOfRange { index: usize, total: usize },

    /// The session already carries a terminal outcome.
    #[error("Session already has a terminal outcome")]
    SessionTerminal,

    /// An outcome was recorded before every step was complete.
    #[error("Outcome not ready: {completed} of {total} steps complete")]
    OutcomeNotReady { completed: usize, total: usize },

    /// The fault documents no direct remediation steps.
    #[error("No troubleshooting steps documented for '{fault}' in '{category}'")]
    EmptyStepSet { category: String, fault: String },

    /// Taxonomy data is malformed.
    #[error("Invalid taxonomy: {0}")]
    InvalidTaxonomy(String),

    /// A procedure definition is malformed.
    #[error("Invalid procedure: {0}")]
    InvalidProcedure(String),

    /// A selection rule is malformed.
    #[error("Invalid rule: {0}")]
    InvalidRule(String),

    /// Deployment configuration could not be used.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An I/O error occurred outside the core.
    #[error("I/O error: {0}")]
    Io(String),
}

impl RemedyError {
    /// True for the NotFound family (category, fault, procedure).
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            RemedyError::CategoryNotFound(_)
                | RemedyError::FaultNotFound { .. }
                | RemedyError::ProcedureNotFound(_)
        )
    }

    /// True when the presentation layer sent an event the session cannot accept.
    ///
    /// The caller should drop the event and re-render from the session state.
    #[must_use]
    pub fn is_ui_desync(&self) -> bool {
        matches!(
            self,
            RemedyError::OutOfOrderStep { .. }
                | RemedyError::StepOutOfRange { .. }
                | RemedyError::SessionTerminal
                | RemedyError::OutcomeNotReady { .. }
        )
    }
}

// =============================================================================
// TESTS
// =============================================================================
