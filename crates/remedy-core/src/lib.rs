//! # remedy-core
//!
//! The deterministic guided-diagnostic engine for Remedy - THE LOGIC.
//!
//! Given a taxonomy of equipment categories and faults, this crate selects
//! the remediation procedures that apply to a fault, walks an operator
//! through them as one flattened checklist, and records the outcome.
//!
//! ## Flow
//!
//! ```text
//! TaxonomyStore ──fault──▶ ProcedureSelector ──procedures──▶ Session
//!                                                              │
//!                                      ResolutionRecorder ◀────┘ outcome
//! ```
//!
//! ## Architectural Constraints
//!
//! - Pure Rust: NO async, NO network, NO file I/O
//! - Taxonomy, catalog and rules are immutable after construction
//! - A Session owns its progress and only references shared data
//! - Every failure is a local `RemedyError`; nothing here panics

// =============================================================================
// MODULES
// =============================================================================

pub mod catalog;
pub mod ingestor;
pub mod machine;
pub mod primitives;
pub mod resolution;
pub mod selector;
pub mod session;
pub mod taxonomy;
pub mod troubleshooter;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{FollowUpAction, Outcome, ProcedureId, RemedyError, StepRef};

// =============================================================================
// RE-EXPORTS: Engine
// =============================================================================

pub use catalog::{Procedure, ProcedureCatalog};
pub use ingestor::{Sheet, ingest_sheet, ingest_workbook};
pub use machine::Machine;
pub use resolution::{FollowUpPreset, ResolutionRecorder};
pub use selector::{Fallback, MatchRule, ProcedureSelector, RuleSet};
pub use session::{
    ProcedureBoundary, ProcedureView, Progress, Session, SessionState, SessionView, StepView,
};
pub use taxonomy::{Category, CategoryData, Fault, FaultData, TaxonomyBuilder, TaxonomyStore};
pub use troubleshooter::Troubleshooter;
