//! # Taxonomy Store
//!
//! Equipment categories and the faults documented under them.
//!
//! - Built once from already-parsed data, immutable afterwards
//! - Categories and faults keep their declaration order
//! - Lookups are exact on the trimmed name
//! - Faults are shared as `Arc<Fault>` so sessions reference, never copy

use crate::RemedyError;
use crate::primitives::MAX_NAME_LENGTH;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

// =============================================================================
// INPUT DATA
// =============================================================================

/// Raw fault record as handed over by a loader.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaultData {
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub indication: String,
    #[serde(default)]
    pub causes: Vec<String>,
    #[serde(default)]
    pub impact: String,
    #[serde(default)]
    pub steps: Vec<String>,
}

impl FaultData {
    /// A fault with only a name and direct steps.
    #[must_use]
    pub fn with_steps(name: impl Into<String>, steps: Vec<String>) -> Self {
        Self {
            name: name.into(),
            steps,
            ..Self::default()
        }
    }
}

/// Raw category record: a name and its ordered faults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryData {
    pub name: String,
    #[serde(default)]
    pub faults: Vec<FaultData>,
}

// =============================================================================
// FAULT
// =============================================================================

/// A named alarm or issue documented under exactly one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fault {
    /// Name of the owning category.
    pub category: String,
    /// Fault name, unique within its category.
    pub name: String,
    /// Optional short display code (e.g. `E01`).
    pub code: Option<String>,
    /// How the fault presents itself (LEDs, tones, messages).
    pub indication: String,
    /// Probable causes, most likely first.
    pub causes: Vec<String>,
    /// Consequence of leaving the fault unaddressed.
    pub impact: String,
    /// The fault's own remediation steps. May be empty.
    pub steps: Vec<String>,
}

impl Fault {
    /// Whether the fault documents any direct steps.
    #[must_use]
    pub fn has_steps(&self) -> bool {
        !self.steps.is_empty()
    }
}

// =============================================================================
// CATEGORY
// =============================================================================

/// A grouping of faults by machine state or subsystem.
#[derive(Debug, Clone)]
pub struct Category {
    name: String,
    faults: Vec<Arc<Fault>>,
    index: BTreeMap<String, usize>,
}

impl Category {
    /// The category name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Faults in declaration order.
    #[must_use]
    pub fn faults(&self) -> &[Arc<Fault>] {
        &self.faults
    }

    /// Fault names in declaration order.
    pub fn fault_names(&self) -> impl Iterator<Item = &str> {
        self.faults.iter().map(|f| f.name.as_str())
    }

    fn find(&self, name: &str) -> Option<&Arc<Fault>> {
        self.index.get(name.trim()).map(|&i| &self.faults[i])
    }
}

// =============================================================================
// TAXONOMY STORE
// =============================================================================

/// Read-only store of categories and faults.
#[derive(Debug, Clone, Default)]
pub struct TaxonomyStore {
    categories: Vec<Category>,
    index: BTreeMap<String, usize>,
}

impl TaxonomyStore {
    /// Start building a store.
    #[must_use]
    pub fn builder() -> TaxonomyBuilder {
        TaxonomyBuilder::default()
    }

    /// Build a store from raw category records in one call.
    pub fn from_data(data: impl IntoIterator<Item = CategoryData>) -> Result<Self, RemedyError> {
        let mut builder = Self::builder();
        for category in data {
            builder = builder.category(category)?;
        }
        Ok(builder.build())
    }

    /// All categories in declaration order.
    #[must_use]
    pub fn list_categories(&self) -> &[Category] {
        &self.categories
    }

    /// Look up a category by name.
    pub fn category(&self, name: &str) -> Result<&Category, RemedyError> {
        self.index
            .get(name.trim())
            .map(|&i| &self.categories[i])
            .ok_or_else(|| RemedyError::CategoryNotFound(name.trim().to_string()))
    }

    /// Faults of a category in declaration order.
    pub fn list_faults(&self, category: &str) -> Result<&[Arc<Fault>], RemedyError> {
        Ok(self.category(category)?.faults())
    }

    /// Look up a fault by category and name.
    pub fn get_fault(&self, category: &str, name: &str) -> Result<&Fault, RemedyError> {
        self.fault_arc(category, name).map(Arc::as_ref)
    }

    /// Look up a fault and return the shared handle a session holds on to.
    pub fn fault_arc(&self, category: &str, name: &str) -> Result<&Arc<Fault>, RemedyError> {
        let cat = self.category(category)?;
        cat.find(name).ok_or_else(|| RemedyError::FaultNotFound {
            category: cat.name.clone(),
            fault: name.trim().to_string(),
        })
    }

    /// The fault's own remediation steps for direct display.
    ///
    /// Returns `RemedyError::EmptyStepSet` when none are documented, so the
    /// caller shows an explicit message instead of an empty checklist.
    pub fn direct_steps(&self, category: &str, name: &str) -> Result<&[String], RemedyError> {
        let fault = self.get_fault(category, name)?;
        if fault.steps.is_empty() {
            return Err(RemedyError::EmptyStepSet {
                category: fault.category.clone(),
                fault: fault.name.clone(),
            });
        }
        Ok(&fault.steps)
    }

    /// Total number of faults across all categories.
    #[must_use]
    pub fn fault_count(&self) -> usize {
        self.categories.iter().map(|c| c.faults.len()).sum()
    }

    /// Check whether the store holds no categories.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

// =============================================================================
// BUILDER
// =============================================================================

/// Validating builder for [`TaxonomyStore`].
#[derive(Debug, Default)]
pub struct TaxonomyBuilder {
    store: TaxonomyStore,
}

impl TaxonomyBuilder {
    /// Add a category and its faults.
    ///
    /// Names are trimmed. Fails on blank or oversized names, a repeated
    /// category, or a fault name repeated within the category.
    pub fn category(mut self, data: CategoryData) -> Result<Self, RemedyError> {
        let name = validate_name(&data.name, "category")?;
        if self.store.index.contains_key(&name) {
            return Err(RemedyError::InvalidTaxonomy(format!(
                "duplicate category '{}'",
                name
            )));
        }

        let mut category = Category {
            name: name.clone(),
            faults: Vec::with_capacity(data.faults.len()),
            index: BTreeMap::new(),
        };

        for raw in data.faults {
            let fault_name = validate_name(&raw.name, "fault")?;
            if category.index.contains_key(&fault_name) {
                return Err(RemedyError::InvalidTaxonomy(format!(
                    "duplicate fault '{}' in category '{}'",
                    fault_name, name
                )));
            }
            category
                .index
                .insert(fault_name.clone(), category.faults.len());
            category.faults.push(Arc::new(Fault {
                category: name.clone(),
                name: fault_name,
                code: raw.code.map(|c| c.trim().to_string()).filter(|c| !c.is_empty()),
                indication: raw.indication.trim().to_string(),
                causes: clean_lines(raw.causes),
                impact: raw.impact.trim().to_string(),
                steps: clean_lines(raw.steps),
            }));
        }

        self.store
            .index
            .insert(name, self.store.categories.len());
        self.store.categories.push(category);
        Ok(self)
    }

    /// Finish building.
    #[must_use]
    pub fn build(self) -> TaxonomyStore {
        self.store
    }
}

fn validate_name(raw: &str, what: &str) -> Result<String, RemedyError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(RemedyError::InvalidTaxonomy(format!("blank {} name", what)));
    }
    if name.len() > MAX_NAME_LENGTH {
        return Err(RemedyError::InvalidTaxonomy(format!(
            "{} name exceeds {} bytes",
            what, MAX_NAME_LENGTH
        )));
    }
    Ok(name.to_string())
}

fn clean_lines(lines: Vec<String>) -> Vec<String> {
    lines
        .into_iter()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================
