//! # Procedure Catalog
//!
//! A fixed library of generic remediation checklists.
//!
//! Procedures do not belong to any fault. The selector picks them by id and
//! sessions hold shared `Arc<Procedure>` handles; the steps are never copied.

use crate::primitives::{MAX_NAME_LENGTH, MAX_PROCEDURE_STEPS, SAFETY_PROCEDURE_ID};
use crate::{ProcedureId, RemedyError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// An ordered, non-empty remediation checklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Procedure {
    pub id: ProcedureId,
    pub title: String,
    pub steps: Vec<String>,
}

impl Procedure {
    /// Create a procedure from string slices.
    #[must_use]
    pub fn new(id: &str, title: &str, steps: &[&str]) -> Self {
        Self {
            id: ProcedureId::new(id),
            title: title.to_string(),
            steps: steps.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    /// Number of steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always false for a validated procedure.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    fn validate(&self) -> Result<(), RemedyError> {
        let id = self.id.as_str();
        if id.trim().is_empty() || id.len() > MAX_NAME_LENGTH {
            return Err(RemedyError::InvalidProcedure(format!(
                "bad procedure id '{}'",
                id
            )));
        }
        if self.steps.is_empty() {
            return Err(RemedyError::InvalidProcedure(format!(
                "procedure '{}' has no steps",
                id
            )));
        }
        if self.steps.len() > MAX_PROCEDURE_STEPS {
            return Err(RemedyError::InvalidProcedure(format!(
                "procedure '{}' has {} steps, maximum is {}",
                id,
                self.steps.len(),
                MAX_PROCEDURE_STEPS
            )));
        }
        if self.steps.iter().any(|s| s.trim().is_empty()) {
            return Err(RemedyError::InvalidProcedure(format!(
                "procedure '{}' has a blank step",
                id
            )));
        }
        Ok(())
    }
}

/// Immutable set of procedures, known at construction.
#[derive(Debug, Clone, Default)]
pub struct ProcedureCatalog {
    order: Vec<Arc<Procedure>>,
    by_id: BTreeMap<ProcedureId, usize>,
}

impl ProcedureCatalog {
    /// Build a catalog, validating every procedure.
    ///
    /// Declaration order is kept for iteration and for the
    /// "all non-safety procedures" fallback.
    pub fn new(procedures: impl IntoIterator<Item = Procedure>) -> Result<Self, RemedyError> {
        let mut catalog = Self::default();
        for procedure in procedures {
            procedure.validate()?;
            if catalog.by_id.contains_key(&procedure.id) {
                return Err(RemedyError::InvalidProcedure(format!(
                    "duplicate procedure id '{}'",
                    procedure.id
                )));
            }
            catalog
                .by_id
                .insert(procedure.id.clone(), catalog.order.len());
            catalog.order.push(Arc::new(procedure));
        }
        Ok(catalog)
    }

    /// Look up a procedure by id.
    pub fn get_procedure(&self, id: &ProcedureId) -> Result<&Arc<Procedure>, RemedyError> {
        self.by_id
            .get(id)
            .map(|&i| &self.order[i])
            .ok_or_else(|| RemedyError::ProcedureNotFound(id.clone()))
    }

    /// Check whether an id is known.
    #[must_use]
    pub fn contains(&self, id: &ProcedureId) -> bool {
        self.by_id.contains_key(id)
    }

    /// Procedures in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Procedure>> {
        self.order.iter()
    }

    /// Number of procedures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Check whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    // =========================================================================
    // PRESETS
    // =========================================================================

    /// General-purpose library used by power systems and patient monitors.
    #[must_use]
    pub fn general() -> Self {
        Self::from_trusted(vec![
            Procedure::new(
                "power_cycle",
                "Power Cycling Procedure",
                &[
                    "Ensure the machine is safe to restart",
                    "Power off the machine using the main power switch",
                    "Wait 30 seconds for capacitors to discharge",
                    "Turn the machine back on and observe the boot sequence",
                    "Check if the alarm persists after restart",
                ],
            ),
            Procedure::new(
                "system_check",
                "System Diagnostic Check",
                &[
                    "Enter diagnostic mode (if applicable)",
                    "Run system self-test",
                    "Check for error codes or messages",
                    "Verify sensor readings against normal ranges",
                    "Document all abnormal values",
                ],
            ),
            Procedure::new(
                "connections_check",
                "Connection Verification",
                &[
                    "Inspect all cable connections",
                    "Check for loose or damaged connectors",
                    "Verify proper seating of all modular components",
                    "Test continuity of suspect cables with multimeter",
                    "Clean connectors if needed",
                ],
            ),
            Procedure::new(
                SAFETY_PROCEDURE_ID,
                "Safety Systems Check",
                &[
                    "Verify safety systems are functioning",
                    "Test alarm functionality",
                    "Check sensor calibration",
                    "Verify bypass mechanisms work correctly",
                    "Ensure all indicators and displays function properly",
                ],
            ),
        ])
    }

    /// Library used with hemodialysis machines, with patient-side precautions.
    #[must_use]
    pub fn hemodialysis() -> Self {
        Self::from_trusted(vec![
            Procedure::new(
                "power_cycle",
                "Power Cycling Procedure",
                &[
                    "Ensure the patient is stable and inform medical staff before proceeding",
                    "Put the machine in bypass mode if applicable",
                    "Power off the machine using the main power switch",
                    "Wait 30 seconds for capacitors to discharge",
                    "Turn the machine back on and observe the boot sequence",
                    "Check if the alarm persists after restart",
                ],
            ),
            Procedure::new(
                "fluid_system",
                "Fluid System Check",
                &[
                    "Check all fluid lines for kinks or restrictions",
                    "Inspect dialysate concentrate connections",
                    "Verify water supply connections are secure",
                    "Check for air in the fluid pathways",
                    "Inspect drains for proper flow",
                    "Verify all valves are in correct positions",
                ],
            ),
            Procedure::new(
                "pressure_test",
                "Pressure System Testing",
                &[
                    "Enter service mode (if applicable)",
                    "Navigate to pressure test menu",
                    "Follow on-screen instructions to test each pressure sensor",
                    "Record any pressure deviations",
                    "Check transducer connections",
                    "Replace failed pressure components if needed",
                ],
            ),
            Procedure::new(
                SAFETY_PROCEDURE_ID,
                "Safety Systems Check",
                &[
                    "Verify blood leak detector is functioning",
                    "Test air detector functionality",
                    "Check temperature sensors",
                    "Verify conductivity sensors operation",
                    "Test bypass valve operation",
                    "Ensure alarms trigger appropriately",
                ],
            ),
        ])
    }

    /// Build from presets that are known to be valid.
    fn from_trusted(procedures: Vec<Procedure>) -> Self {
        let mut catalog = Self::default();
        for procedure in procedures {
            catalog
                .by_id
                .insert(procedure.id.clone(), catalog.order.len());
            catalog.order.push(Arc::new(procedure));
        }
        catalog
    }
}

// =============================================================================
// TESTS
// =============================================================================
