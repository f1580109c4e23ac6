//! # Machine Presets
//!
//! The equipment families Remedy ships with. Each one bundles a procedure
//! library, a rule table with its fallback, and a follow-up list, so a
//! deployment only has to provide its taxonomy.

use crate::catalog::ProcedureCatalog;
use crate::resolution::FollowUpPreset;
use crate::selector::RuleSet;
use crate::RemedyError;
use serde::{Deserialize, Serialize};

/// A built-in equipment family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Machine {
    /// Power management systems (batteries, inverters, load control).
    Pms,
    /// Hemodialysis machines.
    Hemodialysis,
    /// UP-7000 bedside patient monitors.
    Up7000,
}

impl Machine {
    /// Every preset, in menu order.
    pub const ALL: [Machine; 3] = [Machine::Pms, Machine::Hemodialysis, Machine::Up7000];

    /// Short name used on the command line and in deployment files.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Machine::Pms => "pms",
            Machine::Hemodialysis => "hemodialysis",
            Machine::Up7000 => "up7000",
        }
    }

    /// Procedure library.
    #[must_use]
    pub fn catalog(self) -> ProcedureCatalog {
        ProcedureCatalog::general()
    }

    /// Category rules and fallback.
    #[must_use]
    pub fn rule_set(self) -> RuleSet {
        match self {
            Machine::Pms => RuleSet::power_categories(),
            Machine::Hemodialysis => RuleSet::hemodialysis_categories(),
            Machine::Up7000 => RuleSet::monitor_categories(),
        }
    }

    /// Follow-up lists.
    #[must_use]
    pub fn follow_up(self) -> FollowUpPreset {
        match self {
            Machine::Pms => FollowUpPreset::Power,
            Machine::Hemodialysis => FollowUpPreset::Clinical,
            Machine::Up7000 => FollowUpPreset::Monitor,
        }
    }
}

impl std::fmt::Display for Machine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Machine {
    type Err = RemedyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pms" => Ok(Machine::Pms),
            "hemodialysis" | "hemo" => Ok(Machine::Hemodialysis),
            "up7000" | "up-7000" => Ok(Machine::Up7000),
            other => Err(RemedyError::Config(format!(
                "Unknown machine '{}'. Use: pms, hemodialysis, up7000",
                other
            ))),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
