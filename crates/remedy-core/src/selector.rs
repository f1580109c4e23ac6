//! # Procedure Selector
//!
//! Deterministic rule table mapping a fault to the procedures worth running.
//!
//! Evaluation:
//! 1. Every rule is tested in declaration order; a fault may match several.
//! 2. Matching rules append their procedure ids; repeats after the first
//!    occurrence are dropped.
//! 3. If nothing matched, the fallback supplies the list.
//! 4. The safety procedure is moved or appended to the end.
//!
//! The result is never empty and always ends with the safety procedure.
//! Selection has no side effects and runs once per session.

use crate::catalog::{Procedure, ProcedureCatalog};
use crate::primitives::SAFETY_PROCEDURE_ID;
use crate::taxonomy::Fault;
use crate::{ProcedureId, RemedyError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

// =============================================================================
// MATCH RULE
// =============================================================================

/// One row of the rule table: predicate over the fault, procedures to append.
///
/// The predicate holds when:
/// - `category` is unset, or equals the fault's category (case-insensitive), and
/// - `keywords` is empty, or one of them is a case-insensitive substring of
///   the fault name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRule {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub procedures: Vec<ProcedureId>,
}

impl MatchRule {
    /// Rule keyed on the fault's category.
    #[must_use]
    pub fn for_category(category: &str, procedures: &[&str]) -> Self {
        Self {
            category: Some(category.to_string()),
            keywords: Vec::new(),
            procedures: procedures.iter().map(|p| ProcedureId::new(*p)).collect(),
        }
    }

    /// Rule keyed on words in the fault name.
    #[must_use]
    pub fn for_keywords(keywords: &[&str], procedures: &[&str]) -> Self {
        Self {
            category: None,
            keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
            procedures: procedures.iter().map(|p| ProcedureId::new(*p)).collect(),
        }
    }

    /// Evaluate the predicate against a fault.
    #[must_use]
    pub fn matches(&self, fault: &Fault) -> bool {
        let category_ok = self
            .category_key()
            .is_none_or(|c| c.to_lowercase() == fault.category.to_lowercase());
        if !category_ok {
            return false;
        }
        if self.keywords.is_empty() {
            return true;
        }
        let name = fault.name.to_lowercase();
        self.keywords
            .iter()
            .any(|k| name.contains(&k.trim().to_lowercase()))
    }

    /// The category predicate; a blank category counts as none.
    fn category_key(&self) -> Option<&str> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    fn validate(&self, catalog: &ProcedureCatalog) -> Result<(), RemedyError> {
        if self.category_key().is_none() && self.keywords.is_empty() {
            return Err(RemedyError::InvalidRule(
                "rule needs a category or at least one keyword".to_string(),
            ));
        }
        if self.keywords.iter().any(|k| k.trim().is_empty()) {
            return Err(RemedyError::InvalidRule("blank keyword".to_string()));
        }
        if self.procedures.is_empty() {
            return Err(RemedyError::InvalidRule(
                "rule selects no procedures".to_string(),
            ));
        }
        for id in &self.procedures {
            if !catalog.contains(id) {
                return Err(RemedyError::InvalidRule(format!(
                    "unknown procedure '{}'",
                    id
                )));
            }
        }
        Ok(())
    }
}

// =============================================================================
// FALLBACK
// =============================================================================

/// What to select when no rule matched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fallback {
    /// Every catalog procedure except the safety one, in catalog order.
    #[default]
    AllNonSafety,
    /// A fixed list of procedure ids.
    Fixed(Vec<ProcedureId>),
}

// =============================================================================
// RULE SET
// =============================================================================

/// Ordered rules plus the fallback, as a deployment declares them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    #[serde(default)]
    pub rules: Vec<MatchRule>,
    #[serde(default)]
    pub fallback: Fallback,
}

impl RuleSet {
    /// Category table for hemodialysis machines. Pairs with [`ProcedureCatalog::general`].
    #[must_use]
    pub fn hemodialysis_categories() -> Self {
        Self {
            rules: vec![
                MatchRule::for_category(
                    "Water System Errors",
                    &["system_check", "connections_check"],
                ),
                MatchRule::for_category(
                    "Blood Circuit Errors",
                    &[SAFETY_PROCEDURE_ID, "connections_check"],
                ),
                MatchRule::for_category(
                    "Dialysate Circuit Issues",
                    &["system_check", "connections_check"],
                ),
                MatchRule::for_category("Pump and Motor Errors", &["power_cycle", "system_check"]),
                MatchRule::for_category(
                    "Sensor and Detector Issues",
                    &["connections_check", "system_check"],
                ),
            ],
            fallback: Fallback::Fixed(vec![
                ProcedureId::new("power_cycle"),
                ProcedureId::new("system_check"),
            ]),
        }
    }

    /// Category table for power management systems. Pairs with [`ProcedureCatalog::general`].
    #[must_use]
    pub fn power_categories() -> Self {
        Self {
            rules: vec![
                MatchRule::for_category(
                    "Power Supply Errors",
                    &["power_cycle", "connections_check"],
                ),
                MatchRule::for_category(
                    "Temperature-Related Errors",
                    &["system_check", "connections_check"],
                ),
                MatchRule::for_category(
                    "Current & Load-Related Errors",
                    &["power_cycle", "system_check"],
                ),
                MatchRule::for_category(
                    "System Control & Communication Errors",
                    &["power_cycle", "connections_check"],
                ),
                MatchRule::for_category(
                    "Network/Remote Monitoring Errors",
                    &["connections_check", "system_check"],
                ),
            ],
            fallback: Fallback::Fixed(vec![ProcedureId::new("system_check")]),
        }
    }

    /// Category table for patient monitors. Pairs with [`ProcedureCatalog::general`].
    #[must_use]
    pub fn monitor_categories() -> Self {
        let sensing = ["connections_check", "system_check"];
        Self {
            rules: vec![
                MatchRule::for_category("Display Issues", &["power_cycle", "connections_check"]),
                MatchRule::for_category("ECG Issues", &sensing),
                MatchRule::for_category("NIBP (Blood Pressure) Issues", &sensing),
                MatchRule::for_category("SpO₂ (Oxygen Saturation) Issues", &sensing),
                MatchRule::for_category("CO₂ Monitoring Issues", &sensing),
                MatchRule::for_category("Printer Issues", &["power_cycle", "connections_check"]),
            ],
            fallback: Fallback::Fixed(vec![
                ProcedureId::new("system_check"),
                ProcedureId::new("connections_check"),
            ]),
        }
    }

    /// Keyword table over fault names. Pairs with [`ProcedureCatalog::hemodialysis`].
    #[must_use]
    pub fn keywords() -> Self {
        Self {
            rules: vec![
                MatchRule::for_keywords(
                    &["pressure", "flow", "leak"],
                    &["pressure_test", "fluid_system"],
                ),
                MatchRule::for_keywords(
                    &["power", "electrical", "display", "system"],
                    &["power_cycle"],
                ),
                MatchRule::for_keywords(
                    &["alarm", "safety", "detector", "temp"],
                    &[SAFETY_PROCEDURE_ID],
                ),
            ],
            fallback: Fallback::AllNonSafety,
        }
    }
}

// =============================================================================
// SELECTOR
// =============================================================================

/// Validated rule table bound to a safety procedure id.
#[derive(Debug, Clone)]
pub struct ProcedureSelector {
    rules: Vec<MatchRule>,
    fallback: Fallback,
    safety: ProcedureId,
}

impl ProcedureSelector {
    /// Build a selector, checking every referenced id against the catalog.
    pub fn new(
        rule_set: RuleSet,
        safety: ProcedureId,
        catalog: &ProcedureCatalog,
    ) -> Result<Self, RemedyError> {
        if !catalog.contains(&safety) {
            return Err(RemedyError::ProcedureNotFound(safety));
        }
        for rule in &rule_set.rules {
            rule.validate(catalog)?;
        }
        if let Fallback::Fixed(ids) = &rule_set.fallback {
            for id in ids {
                if !catalog.contains(id) {
                    return Err(RemedyError::InvalidRule(format!(
                        "unknown fallback procedure '{}'",
                        id
                    )));
                }
            }
        }
        Ok(Self {
            rules: rule_set.rules,
            fallback: rule_set.fallback,
            safety,
        })
    }

    /// Build with the standard safety procedure id.
    pub fn with_default_safety(
        rule_set: RuleSet,
        catalog: &ProcedureCatalog,
    ) -> Result<Self, RemedyError> {
        Self::new(rule_set, ProcedureId::new(SAFETY_PROCEDURE_ID), catalog)
    }

    /// The mandatory safety procedure id.
    #[must_use]
    pub fn safety(&self) -> &ProcedureId {
        &self.safety
    }

    /// The rule table in evaluation order.
    #[must_use]
    pub fn rules(&self) -> &[MatchRule] {
        &self.rules
    }

    /// The configured fallback.
    #[must_use]
    pub fn fallback(&self) -> &Fallback {
        &self.fallback
    }

    /// Positions of the rules whose predicate holds for the fault.
    #[must_use]
    pub fn matching_rules(&self, fault: &Fault) -> Vec<usize> {
        self.rules
            .iter()
            .enumerate()
            .filter(|(_, rule)| rule.matches(fault))
            .map(|(i, _)| i)
            .collect()
    }

    /// Ordered, de-duplicated procedure ids for a fault, safety last.
    #[must_use]
    pub fn select_ids(&self, catalog: &ProcedureCatalog, fault: &Fault) -> Vec<ProcedureId> {
        let mut seen = BTreeSet::new();
        let mut ids = Vec::new();
        let mut push = |id: &ProcedureId| {
            if seen.insert(id.clone()) {
                ids.push(id.clone());
            }
        };

        let mut matched = false;
        for rule in self.rules.iter().filter(|r| r.matches(fault)) {
            matched = true;
            rule.procedures.iter().for_each(&mut push);
        }

        if !matched {
            match &self.fallback {
                Fallback::AllNonSafety => catalog
                    .iter()
                    .filter(|p| p.id != self.safety)
                    .for_each(|p| push(&p.id)),
                Fallback::Fixed(list) => list.iter().for_each(&mut push),
            }
        }

        ids.retain(|id| id != &self.safety);
        ids.push(self.safety.clone());
        ids
    }

    /// Resolve the selection to shared procedure handles.
    ///
    /// Fails with `ProcedureNotFound` only when given a catalog other than
    /// the one the selector was validated against.
    pub fn select(
        &self,
        catalog: &ProcedureCatalog,
        fault: &Fault,
    ) -> Result<Vec<Arc<Procedure>>, RemedyError> {
        self.select_ids(catalog, fault)
            .iter()
            .map(|id| catalog.get_procedure(id).map(Arc::clone))
            .collect()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::{CategoryData, FaultData, TaxonomyStore};

    fn fault(category: &str, name: &str) -> Fault {
        let store = TaxonomyStore::from_data(vec![CategoryData {
            name: category.into(),
            faults: vec![FaultData::with_steps(name, vec![])],
        }])
        .expect("build");
        store.get_fault(category, name).expect("fault").clone()
    }

    fn ids(list: &[ProcedureId]) -> Vec<&str> {
        list.iter().map(ProcedureId::as_str).collect()
    }

    #[test]
    fn category_rule_selects_and_appends_safety() {
        let catalog = ProcedureCatalog::general();
        let selector =
            ProcedureSelector::with_default_safety(RuleSet::hemodialysis_categories(), &catalog)
                .expect("selector");

        let f = fault("Water System Errors", "Water Pressure Low");
        assert_eq!(
            ids(&selector.select_ids(&catalog, &f)),
            vec!["system_check", "connections_check", "safety_systems"]
        );
    }

    #[test]
    fn safety_listed_by_rule_moves_to_end() {
        let catalog = ProcedureCatalog::general();
        let selector =
            ProcedureSelector::with_default_safety(RuleSet::hemodialysis_categories(), &catalog)
                .expect("selector");

        let f = fault("Blood Circuit Errors", "Air Detector Alarm");
        assert_eq!(
            ids(&selector.select_ids(&catalog, &f)),
            vec!["connections_check", "safety_systems"]
        );
    }

    #[test]
    fn category_match_ignores_case() {
        let catalog = ProcedureCatalog::general();
        let selector =
            ProcedureSelector::with_default_safety(RuleSet::hemodialysis_categories(), &catalog)
                .expect("selector");

        let f = fault("pump and motor errors", "Blood Pump Error");
        assert_eq!(
            ids(&selector.select_ids(&catalog, &f)),
            vec!["power_cycle", "system_check", "safety_systems"]
        );
    }

    #[test]
    fn fixed_fallback_when_nothing_matches() {
        let catalog = ProcedureCatalog::general();
        let selector =
            ProcedureSelector::with_default_safety(RuleSet::hemodialysis_categories(), &catalog)
                .expect("selector");

        let f = fault("System Control Errors", "Software Error");
        assert_eq!(
            ids(&selector.select_ids(&catalog, &f)),
            vec!["power_cycle", "system_check", "safety_systems"]
        );
    }

    #[test]
    fn keyword_rules_accumulate_in_rule_order() {
        let catalog = ProcedureCatalog::hemodialysis();
        let selector = ProcedureSelector::with_default_safety(RuleSet::keywords(), &catalog)
            .expect("selector");

        // "pressure" and "alarm" both hit.
        let f = fault("Blood Circuit Errors", "Venous Pressure Alarm");
        assert_eq!(
            ids(&selector.select_ids(&catalog, &f)),
            vec!["pressure_test", "fluid_system", "safety_systems"]
        );
        assert_eq!(selector.matching_rules(&f), vec![0, 2]);

        let f = fault("System Control Errors", "Power Failure");
        assert_eq!(
            ids(&selector.select_ids(&catalog, &f)),
            vec!["power_cycle", "safety_systems"]
        );
    }

    #[test]
    fn keyword_match_is_case_insensitive_substring() {
        let catalog = ProcedureCatalog::hemodialysis();
        let selector = ProcedureSelector::with_default_safety(RuleSet::keywords(), &catalog)
            .expect("selector");

        let f = fault("Dialysate Circuit Issues", "ULTRAFILTRATION ERROR");
        // "filtration" does not contain "flow"; nothing else matches either.
        assert!(selector.matching_rules(&f).is_empty());

        let f = fault("Dialysate Circuit Issues", "Dialysate FLOW Error");
        assert_eq!(selector.matching_rules(&f), vec![0]);
    }

    #[test]
    fn all_non_safety_fallback_uses_catalog_order() {
        let catalog = ProcedureCatalog::hemodialysis();
        let selector = ProcedureSelector::with_default_safety(RuleSet::keywords(), &catalog)
            .expect("selector");

        let f = fault("Pump and Motor Errors", "UF Pump Error");
        assert_eq!(
            ids(&selector.select_ids(&catalog, &f)),
            vec![
                "power_cycle",
                "fluid_system",
                "pressure_test",
                "safety_systems"
            ]
        );
    }

    #[test]
    fn duplicates_are_dropped_after_first_occurrence() {
        let catalog = ProcedureCatalog::general();
        let rules = RuleSet {
            rules: vec![
                MatchRule::for_keywords(&["error"], &["system_check", "power_cycle"]),
                MatchRule::for_keywords(&["pump"], &["power_cycle", "connections_check"]),
            ],
            fallback: Fallback::AllNonSafety,
        };
        let selector = ProcedureSelector::with_default_safety(rules, &catalog).expect("selector");

        let f = fault("Pump and Motor Errors", "Blood Pump Error");
        assert_eq!(
            ids(&selector.select_ids(&catalog, &f)),
            vec![
                "system_check",
                "power_cycle",
                "connections_check",
                "safety_systems"
            ]
        );
    }

    #[test]
    fn empty_fixed_fallback_still_yields_safety() {
        let catalog = ProcedureCatalog::general();
        let rules = RuleSet {
            rules: vec![],
            fallback: Fallback::Fixed(vec![]),
        };
        let selector = ProcedureSelector::with_default_safety(rules, &catalog).expect("selector");
        let f = fault("Anything", "Anything");
        let selected = selector.select(&catalog, &f).expect("select");
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].id.as_str(), SAFETY_PROCEDURE_ID);
    }

    #[test]
    fn blank_category_acts_as_keyword_only_rule() {
        let catalog = ProcedureCatalog::general();
        let rules = RuleSet {
            rules: vec![MatchRule {
                category: Some("   ".to_string()),
                keywords: vec!["pump".to_string()],
                procedures: vec![ProcedureId::new("power_cycle")],
            }],
            fallback: Fallback::Fixed(vec![]),
        };
        let selector = ProcedureSelector::with_default_safety(rules, &catalog).expect("selector");

        let f = fault("Pump and Motor Errors", "Blood Pump Error");
        assert_eq!(
            ids(&selector.select_ids(&catalog, &f)),
            vec!["power_cycle", "safety_systems"]
        );
    }

    #[test]
    fn power_table_and_fallback() {
        let catalog = ProcedureCatalog::general();
        let selector =
            ProcedureSelector::with_default_safety(RuleSet::power_categories(), &catalog)
                .expect("selector");

        let f = fault("Power Supply Errors", "Low Battery Voltage");
        assert_eq!(
            ids(&selector.select_ids(&catalog, &f)),
            vec!["power_cycle", "connections_check", "safety_systems"]
        );
        let f = fault("Maintenance & Predictive Alerts", "Battery Health Warning");
        assert_eq!(
            ids(&selector.select_ids(&catalog, &f)),
            vec!["system_check", "safety_systems"]
        );
    }

    #[test]
    fn monitor_table_and_fallback() {
        let catalog = ProcedureCatalog::general();
        let selector =
            ProcedureSelector::with_default_safety(RuleSet::monitor_categories(), &catalog)
                .expect("selector");

        let f = fault("SpO₂ (Oxygen Saturation) Issues", "Probe Off Alarm");
        assert_eq!(
            ids(&selector.select_ids(&catalog, &f)),
            vec!["connections_check", "system_check", "safety_systems"]
        );
        let f = fault("Waveform Problems", "Freezing or No Movement");
        assert_eq!(
            ids(&selector.select_ids(&catalog, &f)),
            vec!["system_check", "connections_check", "safety_systems"]
        );
    }

    #[test]
    fn unknown_procedure_rejected_at_construction() {
        let catalog = ProcedureCatalog::general();
        let rules = RuleSet {
            rules: vec![MatchRule::for_category("X", &["fluid_system"])],
            fallback: Fallback::AllNonSafety,
        };
        assert!(matches!(
            ProcedureSelector::with_default_safety(rules, &catalog),
            Err(RemedyError::InvalidRule(_))
        ));
    }

    #[test]
    fn rule_without_predicate_rejected() {
        let catalog = ProcedureCatalog::general();
        let rules = RuleSet {
            rules: vec![MatchRule {
                category: None,
                keywords: vec![],
                procedures: vec![ProcedureId::new("power_cycle")],
            }],
            fallback: Fallback::AllNonSafety,
        };
        assert!(matches!(
            ProcedureSelector::with_default_safety(rules, &catalog),
            Err(RemedyError::InvalidRule(_))
        ));
    }

    #[test]
    fn unknown_safety_rejected() {
        let catalog = ProcedureCatalog::general();
        let result =
            ProcedureSelector::new(RuleSet::default(), ProcedureId::new("nope"), &catalog);
        assert!(matches!(result, Err(RemedyError::ProcedureNotFound(_))));
    }

    #[test]
    fn category_and_keyword_must_both_hold() {
        let rule = MatchRule {
            category: Some("Blood Circuit Errors".into()),
            keywords: vec!["pressure".into()],
            procedures: vec![ProcedureId::new("power_cycle")],
        };
        assert!(rule.matches(&fault("Blood Circuit Errors", "Venous Pressure Alarm")));
        assert!(!rule.matches(&fault("Blood Circuit Errors", "Air Detector Alarm")));
        assert!(!rule.matches(&fault("Water System Errors", "Water Pressure Low")));
    }
}
