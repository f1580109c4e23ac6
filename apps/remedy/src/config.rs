//! # Deployment Configuration
//!
//! Loads a deployment (procedures, rules, taxonomy, follow-up) from TOML and
//! assembles it into a [`Troubleshooter`].
//!
//! ## Resolution Order
//!
//! 1. `--machine <name>` or `--config <path|name>` on the command line
//! 2. `REMEDY_CONFIG` environment variable (a path or a built-in name)
//! 3. The built-in hemodialysis deployment compiled into the binary
//!
//! A `--config`/`REMEDY_CONFIG` value that names no existing file but does
//! name a machine (`pms`, `hemodialysis`, `up7000`) loads that built-in.
//!
//! ## File Layout
//!
//! ```toml
//! [deployment]
//! name = "Hemodialysis Machine"
//! machine = "hemodialysis"              # optional preset for everything below
//! safety_procedure = "safety_systems"   # optional
//! fallback = "all_non_safety"           # or { fixed = ["power_cycle"] }
//! follow_up = "clinical"                # general, clinical, power, monitor
//!
//! [[procedures]]    # id, title, steps (replaces the preset library)
//! [[rules]]         # category and/or keywords, procedures (replaces the preset rules)
//! [[categories]]    # name, [[categories.faults]]
//! [[sheets]]        # name, headers, rows (tabular faults)
//! ```

use remedy_core::primitives::SAFETY_PROCEDURE_ID;
use remedy_core::{
    CategoryData, Fallback, FollowUpPreset, Machine, MatchRule, Procedure, ProcedureCatalog,
    ProcedureId, ProcedureSelector, RemedyError, RuleSet, Sheet, TaxonomyStore, Troubleshooter,
    ingest_workbook,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming the deployment file.
pub const CONFIG_ENV: &str = "REMEDY_CONFIG";

/// Machine loaded when nothing else is named.
pub const DEFAULT_MACHINE: Machine = Machine::Hemodialysis;

/// Text of a built-in deployment.
#[must_use]
pub fn builtin_deployment(machine: Machine) -> &'static str {
    match machine {
        Machine::Pms => include_str!("../assets/pms.toml"),
        Machine::Hemodialysis => include_str!("../assets/hemodialysis.toml"),
        Machine::Up7000 => include_str!("../assets/up7000.toml"),
    }
}

/// Maximum deployment file size (4 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 4 * 1024 * 1024;

// =============================================================================
// FILE MODEL
// =============================================================================

/// The `[deployment]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentSection {
    pub name: String,

    /// Preset supplying procedures, rules, fallback and follow-up that the
    /// file does not declare itself.
    #[serde(default)]
    pub machine: Option<Machine>,

    /// Id of the procedure always placed last.
    #[serde(default = "default_safety_procedure")]
    pub safety_procedure: ProcedureId,

    /// Selection when no rule matches.
    #[serde(default)]
    pub fallback: Option<Fallback>,

    /// Follow-up list preset.
    #[serde(default)]
    pub follow_up: Option<FollowUpPreset>,
}

fn default_safety_procedure() -> ProcedureId {
    ProcedureId::new(SAFETY_PROCEDURE_ID)
}

/// A whole deployment file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentConfig {
    pub deployment: DeploymentSection,

    #[serde(default)]
    pub procedures: Vec<Procedure>,

    #[serde(default)]
    pub rules: Vec<MatchRule>,

    #[serde(default)]
    pub categories: Vec<CategoryData>,

    /// Tabular categories, appended after `categories`.
    #[serde(default)]
    pub sheets: Vec<Sheet>,
}

/// Where a deployment comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Builtin(Machine),
    File(PathBuf),
}

impl ConfigSource {
    /// Interpret a `--config`/`REMEDY_CONFIG` value.
    ///
    /// An existing file always wins; otherwise a machine name selects the
    /// built-in, and anything else is treated as a (missing) file path.
    #[must_use]
    pub fn from_arg(value: &Path) -> Self {
        let builtin = value
            .to_str()
            .filter(|_| !value.exists())
            .and_then(|v| v.parse::<Machine>().ok());
        match builtin {
            Some(machine) => ConfigSource::Builtin(machine),
            None => ConfigSource::File(value.to_path_buf()),
        }
    }
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Builtin(machine) => write!(f, "built-in {}", machine),
            ConfigSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

// =============================================================================
// LOADING
// =============================================================================

impl DeploymentConfig {
    /// Parse a deployment from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, RemedyError> {
        toml::from_str(text).map_err(|e| RemedyError::Config(format!("Invalid deployment: {}", e)))
    }

    /// A built-in deployment.
    pub fn builtin(machine: Machine) -> Result<Self, RemedyError> {
        Self::from_toml(builtin_deployment(machine))
    }

    /// Read a deployment file.
    pub fn from_file(path: &Path) -> Result<Self, RemedyError> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            RemedyError::Io(format!("Cannot read '{}': {}", path.display(), e))
        })?;
        if !metadata.is_file() {
            return Err(RemedyError::Io(format!(
                "'{}' is not a regular file",
                path.display()
            )));
        }
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(RemedyError::Config(format!(
                "File size {} bytes exceeds maximum allowed {} bytes",
                metadata.len(),
                MAX_CONFIG_FILE_SIZE
            )));
        }

        let text = std::fs::read_to_string(path)
            .map_err(|e| RemedyError::Io(format!("Read '{}': {}", path.display(), e)))?;
        Self::from_toml(&text)
    }

    /// Load from an explicit source, then `REMEDY_CONFIG`, then the default built-in.
    pub fn load(explicit: Option<&ConfigSource>) -> Result<(Self, ConfigSource), RemedyError> {
        let source = explicit.cloned().unwrap_or_else(|| {
            std::env::var_os(CONFIG_ENV)
                .map(|v| ConfigSource::from_arg(Path::new(&v)))
                .unwrap_or(ConfigSource::Builtin(DEFAULT_MACHINE))
        });

        let config = match &source {
            ConfigSource::File(path) => {
                let config = Self::from_file(path)?;
                tracing::info!(
                    "Loaded deployment '{}' from {}",
                    config.deployment.name,
                    path.display()
                );
                config
            }
            ConfigSource::Builtin(machine) => {
                let config = Self::builtin(*machine)?;
                tracing::debug!("Using built-in deployment '{}'", config.deployment.name);
                config
            }
        };
        Ok((config, source))
    }

    // =========================================================================
    // ASSEMBLY
    // =========================================================================

    /// Validate everything and build the shared troubleshooter.
    ///
    /// Declared procedures, rules, fallback and follow-up each replace the
    /// matching part of the machine preset.
    pub fn build(self) -> Result<Troubleshooter, RemedyError> {
        let machine = self.deployment.machine;

        let catalog = match (self.procedures.is_empty(), machine) {
            (false, _) => ProcedureCatalog::new(self.procedures)?,
            (true, Some(machine)) => machine.catalog(),
            (true, None) => {
                return Err(RemedyError::Config(
                    "deployment declares no procedures and no machine".to_string(),
                ));
            }
        };

        let mut categories = self.categories;
        categories.extend(ingest_workbook(&self.sheets)?);
        let store = TaxonomyStore::from_data(categories)?;

        let preset = machine.map(Machine::rule_set).unwrap_or_default();
        let rule_set = RuleSet {
            rules: if self.rules.is_empty() {
                preset.rules
            } else {
                self.rules
            },
            fallback: self.deployment.fallback.unwrap_or(preset.fallback),
        };
        let selector = ProcedureSelector::new(rule_set, self.deployment.safety_procedure, &catalog)?;

        let follow_up = self
            .deployment
            .follow_up
            .or_else(|| machine.map(Machine::follow_up))
            .unwrap_or_default();

        tracing::debug!(
            "Deployment '{}': {} categories, {} faults, {} procedures, {} rules",
            self.deployment.name,
            store.list_categories().len(),
            store.fault_count(),
            catalog.len(),
            selector.rules().len()
        );

        Ok(Troubleshooter::new(
            self.deployment.name,
            store,
            catalog,
            selector,
            follow_up.recorder(),
        ))
    }
}

/// Load and build in one step.
pub fn load_troubleshooter(
    explicit: Option<&ConfigSource>,
) -> Result<(Troubleshooter, ConfigSource), RemedyError> {
    let (config, source) = DeploymentConfig::load(explicit)?;
    Ok((config.build()?, source))
}

// =============================================================================
// TESTS
// =============================================================================
