//! # Troubleshooter
//!
//! Entry point tying the read-only parts together.
//!
//! The store, catalog, selector and recorder are built once and shared.
//! Every fault selection gets a fresh [`Session`]; switching fault means
//! starting a new one and dropping the old.

use crate::catalog::{Procedure, ProcedureCatalog};
use crate::resolution::ResolutionRecorder;
use crate::selector::ProcedureSelector;
use crate::session::{Session, SessionState};
use crate::taxonomy::{Fault, TaxonomyStore};
use crate::{FollowUpAction, Outcome, RemedyError};
use std::sync::Arc;

/// Shared, immutable troubleshooting deployment.
#[derive(Debug, Clone)]
pub struct Troubleshooter {
    name: String,
    store: Arc<TaxonomyStore>,
    catalog: Arc<ProcedureCatalog>,
    selector: Arc<ProcedureSelector>,
    recorder: Arc<ResolutionRecorder>,
}

impl Troubleshooter {
    /// Assemble a deployment.
    ///
    /// The selector must have been validated against the same catalog.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        store: TaxonomyStore,
        catalog: ProcedureCatalog,
        selector: ProcedureSelector,
        recorder: ResolutionRecorder,
    ) -> Self {
        Self {
            name: name.into(),
            store: Arc::new(store),
            catalog: Arc::new(catalog),
            selector: Arc::new(selector),
            recorder: Arc::new(recorder),
        }
    }

    /// Deployment display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The taxonomy store.
    #[must_use]
    pub fn store(&self) -> &TaxonomyStore {
        &self.store
    }

    /// The procedure catalog.
    #[must_use]
    pub fn catalog(&self) -> &ProcedureCatalog {
        &self.catalog
    }

    /// The procedure selector.
    #[must_use]
    pub fn selector(&self) -> &ProcedureSelector {
        &self.selector
    }

    /// The resolution recorder.
    #[must_use]
    pub fn recorder(&self) -> &ResolutionRecorder {
        &self.recorder
    }

    /// Look up a fault.
    pub fn fault(&self, category: &str, fault: &str) -> Result<&Fault, RemedyError> {
        self.store.get_fault(category, fault)
    }

    /// Procedures that would be selected for a fault, without starting a session.
    pub fn plan(&self, category: &str, fault: &str) -> Result<Vec<Arc<Procedure>>, RemedyError> {
        let fault = self.store.get_fault(category, fault)?;
        self.selector.select(&self.catalog, fault)
    }

    /// The fault's own steps, or `EmptyStepSet` if it documents none.
    pub fn direct_steps(&self, category: &str, fault: &str) -> Result<&[String], RemedyError> {
        self.store.direct_steps(category, fault)
    }

    /// Start a fresh session for a fault.
    pub fn start_session(&self, category: &str, fault: &str) -> Result<Session, RemedyError> {
        let fault = Arc::clone(self.store.fault_arc(category, fault)?);
        let procedures = self.selector.select(&self.catalog, &fault)?;
        Ok(Session::new(fault, procedures))
    }

    /// Record the outcome and return the follow-up guidance.
    pub fn conclude(
        &self,
        session: &mut Session,
        outcome: Outcome,
    ) -> Result<(SessionState, Vec<FollowUpAction>), RemedyError> {
        self.recorder.record(session, outcome)
    }
}

// =============================================================================
// TESTS
// =============================================================================
