//! # Session Module
//!
//! Live progress tracking for one troubleshooting attempt.
//!
//! A Session is created when a fault is selected and dropped when the
//! operator switches fault. It owns its flattened step list and counter,
//! and only references the fault and the procedures.
//!
//! ## States
//!
//! | State | Condition |
//! |-------|-----------|
//! | `InProgress` | `completed < total` |
//! | `AwaitingResolution` | `completed == total`, no outcome |
//! | `Resolved` | outcome = resolved |
//! | `Persists` | outcome = persists |
//!
//! The state is derived from `(completed, total, outcome)`; it is never
//! stored separately, so it cannot drift from the counter.
//!
//! ## Transitions
//!
//! - `complete_step(i)`: only `i == completed`
//! - `uncomplete_step(i)`: only `i == completed - 1`
//! - `record_outcome(o)`: only from `AwaitingResolution`
//! - `reset()`: from anywhere, back to the initial state

use crate::catalog::Procedure;
use crate::taxonomy::Fault;
use crate::{Outcome, ProcedureId, RemedyError, StepRef};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// =============================================================================
// SESSION STATE
// =============================================================================

/// Where a session stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    InProgress,
    AwaitingResolution,
    Resolved,
    Persists,
}

impl SessionState {
    /// Get the state name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::InProgress => "In progress",
            SessionState::AwaitingResolution => "Awaiting resolution",
            SessionState::Resolved => "Resolved",
            SessionState::Persists => "Persists",
        }
    }

    /// Check if a terminal outcome was recorded.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Resolved | SessionState::Persists)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// PROGRESS
// =============================================================================

/// Completion progress of a session.
///
/// Integer fields are exact; `ratio()` is a convenience for renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
    /// Whole percent, rounded down. 100 when `total == 0`.
    pub percent: u8,
    /// `completed / total` as fixed-point millionths. 1_000_000 when `total == 0`.
    pub ratio_millionths: u32,
}

impl Progress {
    fn new(completed: usize, total: usize) -> Self {
        let (percent, ratio_millionths) = if total == 0 {
            (100, 1_000_000)
        } else {
            let c = completed as u64;
            let t = total as u64;
            (
                (c.saturating_mul(100) / t) as u8,
                (c.saturating_mul(1_000_000) / t) as u32,
            )
        };
        Self {
            completed,
            total,
            percent,
            ratio_millionths,
        }
    }

    /// Completion ratio in `[0.0, 1.0]`; 1.0 when there are no steps.
    #[allow(clippy::float_arithmetic)]
    #[must_use]
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        self.completed as f64 / self.total as f64
    }

    /// Check whether every step is complete.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed >= self.total
    }
}

// =============================================================================
// SESSION
// =============================================================================

/// A single troubleshooting attempt against one fault.
///
/// Note: Session does NOT implement Default. It only exists bound to a fault.
#[derive(Debug, Clone)]
pub struct Session {
    fault: Arc<Fault>,
    procedures: Vec<Arc<Procedure>>,
    steps: Vec<StepRef>,
    completed: usize,
    outcome: Option<Outcome>,
}

impl Session {
    /// Create a session for a fault and its selected procedures.
    ///
    /// The flattened step list is built here, once, in procedure order.
    #[must_use]
    pub fn new(fault: Arc<Fault>, procedures: Vec<Arc<Procedure>>) -> Self {
        let steps = procedures
            .iter()
            .flat_map(|p| (0..p.steps.len()).map(move |i| StepRef::new(p.id.clone(), i)))
            .collect();
        Self {
            fault,
            procedures,
            steps,
            completed: 0,
            outcome: None,
        }
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    /// The fault under investigation.
    #[must_use]
    pub fn fault(&self) -> &Fault {
        &self.fault
    }

    /// The selected procedures in order.
    #[must_use]
    pub fn procedures(&self) -> &[Arc<Procedure>] {
        &self.procedures
    }

    /// The flattened step list.
    #[must_use]
    pub fn steps(&self) -> &[StepRef] {
        &self.steps
    }

    /// Total number of checkboxes.
    #[must_use]
    pub fn total(&self) -> usize {
        self.steps.len()
    }

    /// Number of completed steps (the first N of the flattened list).
    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed
    }

    /// The recorded outcome, if any.
    #[must_use]
    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    /// Derive the current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        match self.outcome {
            Some(Outcome::Resolved) => SessionState::Resolved,
            Some(Outcome::Persists) => SessionState::Persists,
            None if self.completed >= self.steps.len() => SessionState::AwaitingResolution,
            None => SessionState::InProgress,
        }
    }

    /// Completion progress.
    #[must_use]
    pub fn progress(&self) -> Progress {
        Progress::new(self.completed, self.steps.len())
    }

    /// Check whether a flattened step is complete.
    #[must_use]
    pub fn is_step_complete(&self, index: usize) -> bool {
        index < self.completed
    }

    /// Per-step completion flags in flattened order.
    #[must_use]
    pub fn step_flags(&self) -> Vec<bool> {
        (0..self.steps.len()).map(|i| i < self.completed).collect()
    }

    /// The next step to complete, if any.
    #[must_use]
    pub fn current_step(&self) -> Option<&StepRef> {
        if self.state().is_terminal() {
            return None;
        }
        self.steps.get(self.completed)
    }

    /// Text of a flattened step.
    #[must_use]
    pub fn step_text(&self, index: usize) -> Option<&str> {
        let step = self.steps.get(index)?;
        self.procedures
            .iter()
            .find(|p| p.id == step.procedure)
            .and_then(|p| p.steps.get(step.index))
            .map(String::as_str)
    }

    /// Span of each procedure in the flattened list, with its completion.
    #[must_use]
    pub fn procedure_boundaries(&self) -> Vec<ProcedureBoundary> {
        let mut start = 0usize;
        self.procedures
            .iter()
            .map(|p| {
                let end = start.saturating_add(p.steps.len());
                let boundary = ProcedureBoundary {
                    id: p.id.clone(),
                    start,
                    end,
                    complete: end <= self.completed,
                };
                start = end;
                boundary
            })
            .collect()
    }

    // =========================================================================
    // TRANSITIONS
    // =========================================================================

    /// Mark the step at the completion frontier as done.
    pub fn complete_step(&mut self, index: usize) -> Result<SessionState, RemedyError> {
        self.ensure_open()?;
        if index >= self.steps.len() {
            return Err(RemedyError::StepOutOfRange {
                index,
                total: self.steps.len(),
            });
        }
        if index != self.completed {
            return Err(RemedyError::OutOfOrderStep {
                index,
                completed: self.completed,
            });
        }
        self.completed = self.completed.saturating_add(1);
        Ok(self.state())
    }

    /// Retract the most recently completed step.
    pub fn uncomplete_step(&mut self, index: usize) -> Result<SessionState, RemedyError> {
        self.ensure_open()?;
        if index >= self.steps.len() {
            return Err(RemedyError::StepOutOfRange {
                index,
                total: self.steps.len(),
            });
        }
        if self.completed.checked_sub(1) != Some(index) {
            return Err(RemedyError::OutOfOrderStep {
                index,
                completed: self.completed,
            });
        }
        self.completed = index;
        Ok(self.state())
    }

    /// Record the operator's final decision.
    pub fn record_outcome(&mut self, outcome: Outcome) -> Result<SessionState, RemedyError> {
        match self.state() {
            SessionState::AwaitingResolution => {
                self.outcome = Some(outcome);
                Ok(self.state())
            }
            SessionState::InProgress => Err(RemedyError::OutcomeNotReady {
                completed: self.completed,
                total: self.steps.len(),
            }),
            SessionState::Resolved | SessionState::Persists => Err(RemedyError::SessionTerminal),
        }
    }

    /// Return to the initial state, clearing progress and outcome.
    pub fn reset(&mut self) -> SessionState {
        self.completed = 0;
        self.outcome = None;
        self.state()
    }

    fn ensure_open(&self) -> Result<(), RemedyError> {
        if self.outcome.is_some() {
            return Err(RemedyError::SessionTerminal);
        }
        Ok(())
    }

    // =========================================================================
    // VIEW
    // =========================================================================

    /// Read-only snapshot for renderers.
    #[must_use]
    pub fn view(&self) -> SessionView {
        let mut flat = 0usize;
        let procedures = self
            .procedures
            .iter()
            .map(|p| {
                let steps = p
                    .steps
                    .iter()
                    .map(|text| {
                        let view = StepView {
                            index: flat,
                            text: text.clone(),
                            complete: flat < self.completed,
                        };
                        flat = flat.saturating_add(1);
                        view
                    })
                    .collect();
                ProcedureView {
                    id: p.id.clone(),
                    title: p.title.clone(),
                    steps,
                }
            })
            .collect();

        SessionView {
            category: self.fault.category.clone(),
            fault: self.fault.name.clone(),
            state: self.state(),
            progress: self.progress(),
            procedures,
            outcome: self.outcome,
        }
    }
}

// =============================================================================
// VIEW OBJECTS
// =============================================================================

/// Where a procedure sits in the flattened step list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcedureBoundary {
    pub id: ProcedureId,
    /// First flattened index of the procedure.
    pub start: usize,
    /// One past the last flattened index.
    pub end: usize,
    pub complete: bool,
}

/// One checkbox as a renderer sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepView {
    /// Position in the flattened list.
    pub index: usize,
    pub text: String,
    pub complete: bool,
}

/// A selected procedure with its checkboxes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcedureView {
    pub id: ProcedureId,
    pub title: String,
    pub steps: Vec<StepView>,
}

/// Serializable snapshot of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionView {
    pub category: String,
    pub fault: String,
    pub state: SessionState,
    pub progress: Progress,
    pub procedures: Vec<ProcedureView>,
    pub outcome: Option<Outcome>,
}

// =============================================================================
// TESTS
// =============================================================================
