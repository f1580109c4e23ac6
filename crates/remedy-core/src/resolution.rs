//! # Resolution Recorder
//!
//! Captures the operator's final decision and returns the follow-up
//! guidance for it.
//!
//! Follow-up lists are static per deployment. They never depend on the
//! fault being worked on.

use crate::session::{Session, SessionState};
use crate::{FollowUpAction, Outcome, RemedyError};
use serde::{Deserialize, Serialize};

/// Built-in follow-up lists, selectable from deployment configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowUpPreset {
    #[default]
    General,
    Clinical,
    Power,
    Monitor,
}

impl FollowUpPreset {
    /// Build the recorder for this preset.
    #[must_use]
    pub fn recorder(self) -> ResolutionRecorder {
        match self {
            FollowUpPreset::General => ResolutionRecorder::general(),
            FollowUpPreset::Clinical => ResolutionRecorder::clinical(),
            FollowUpPreset::Power => ResolutionRecorder::power(),
            FollowUpPreset::Monitor => ResolutionRecorder::monitor(),
        }
    }
}

/// Maps an outcome to its fixed follow-up list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionRecorder {
    resolved: Vec<FollowUpAction>,
    persists: Vec<FollowUpAction>,
}

impl ResolutionRecorder {
    /// Create a recorder from explicit lists.
    #[must_use]
    pub fn new(resolved: Vec<FollowUpAction>, persists: Vec<FollowUpAction>) -> Self {
        Self { resolved, persists }
    }

    /// Follow-up used with general equipment.
    #[must_use]
    pub fn general() -> Self {
        Self::new(
            actions(&["Document this repair in the maintenance log"]),
            actions(&ESCALATION),
        )
    }

    /// Follow-up used where a patient is connected to the machine.
    #[must_use]
    pub fn clinical() -> Self {
        let mut resolved = actions(&["Document this repair in the maintenance log"]);
        resolved.extend(actions(&[
            "Before resuming treatment, verify all connections are secure",
            "Before resuming treatment, verify dialysate temperature and conductivity are within range",
            "Before resuming treatment, verify blood flow rate is set correctly",
            "Before resuming treatment, verify all alarms are functioning properly",
        ]));
        let mut persists = actions(&ESCALATION);
        persists.push(FollowUpAction::new(
            "In case of patient emergency, follow clinical protocol for returning blood and discontinuing treatment",
        ));
        Self::new(resolved, persists)
    }

    /// Follow-up used with power management systems.
    #[must_use]
    pub fn power() -> Self {
        Self::new(
            actions(&["Document this incident in the maintenance log"]),
            actions(&FIELD_ESCALATION),
        )
    }

    /// Follow-up used with bedside patient monitors.
    #[must_use]
    pub fn monitor() -> Self {
        let mut resolved = actions(&["Document this incident in the maintenance log"]);
        resolved.extend(actions(&[
            "Before returning to patient care, verify all waveforms are displaying normally",
            "Before returning to patient care, verify alarms are properly configured and functional",
            "Before returning to patient care, verify sensor readings are accurate",
            "Before returning to patient care, verify data recording is functioning",
        ]));
        let mut persists = actions(&FIELD_ESCALATION[..3]);
        persists.extend(actions(&[
            "Replace the affected component or module",
            "Consider using backup monitoring equipment for critical patients",
        ]));
        Self::new(resolved, persists)
    }

    /// Follow-up list for an outcome.
    #[must_use]
    pub fn follow_up(&self, outcome: Outcome) -> &[FollowUpAction] {
        match outcome {
            Outcome::Resolved => &self.resolved,
            Outcome::Persists => &self.persists,
        }
    }

    /// Record the outcome on the session and return the follow-up list.
    ///
    /// Fails exactly when the session rejects the outcome; the session is
    /// then left unchanged.
    pub fn record(
        &self,
        session: &mut Session,
        outcome: Outcome,
    ) -> Result<(SessionState, Vec<FollowUpAction>), RemedyError> {
        let state = session.record_outcome(outcome)?;
        Ok((state, self.follow_up(outcome).to_vec()))
    }
}

impl Default for ResolutionRecorder {
    fn default() -> Self {
        Self::general()
    }
}

const ESCALATION: [&str; 5] = [
    "Escalate to a senior biomedical engineer",
    "Refer to the manufacturer service manual",
    "Contact technical support",
    "Check for additional error codes",
    "Replace the affected component",
];

const FIELD_ESCALATION: [&str; 4] = [
    "Escalate to technical support",
    "Check for additional error codes",
    "Refer to the manufacturer service manual",
    "Replace the affected component",
];

fn actions(lines: &[&str]) -> Vec<FollowUpAction> {
    lines.iter().map(|l| FollowUpAction::new(*l)).collect()
}

// =============================================================================
// TESTS
// =============================================================================
