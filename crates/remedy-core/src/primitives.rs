//! # Engine Primitives
//!
//! Fixed constants of the Remedy engine.
//!
//! These are compiled into the binary and immutable at runtime.
//! Deployments change procedures, rules and follow-ups through data,
//! never through these values.

/// Id of the mandatory safety procedure appended to every selection.
pub const SAFETY_PROCEDURE_ID: &str = "safety_systems";

// =============================================================================
// SHEET LAYOUT
// =============================================================================

/// Column holding the fault name in a tabular sheet (after header trimming).
pub const NAME_COLUMN: &str = "Alarms / Reasons";

/// Prefix of the numbered step columns (`Reason 1`, `Reason 2`, ...).
pub const STEP_COLUMN_PREFIX: &str = "Reason ";

/// Number of numbered step columns read from a sheet.
pub const MAX_STEP_COLUMNS: usize = 10;

/// Row value that opens the secondary block of additional fault names.
pub const ISSUES_SENTINEL: &str = "Issues";

/// Sheet that lists machine states rather than faults; skipped on ingest.
pub const STATES_SHEET: &str = "States";

/// Cell values that stand for "no value" in exported spreadsheets.
pub const PLACEHOLDER_VALUES: &[&str] = &["nan", "NaN", "NAN", "None", "null", "N/A", "n/a"];

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum length of a category, fault or procedure name.
pub const MAX_NAME_LENGTH: usize = 256;

/// Maximum number of steps in a single procedure.
pub const MAX_PROCEDURE_STEPS: usize = 64;

/// Check whether a raw cell counts as "no value".
#[must_use]
pub fn is_placeholder(cell: &str) -> bool {
    let trimmed = cell.trim();
    trimmed.is_empty() || PLACEHOLDER_VALUES.contains(&trimmed)
}
