//! # Sheet Ingestor
//!
//! Turns tabular fault sheets into taxonomy input.
//!
//! A sheet is one category. Each row names a fault in the name column and
//! lists its direct steps in the numbered step columns. A row whose name is
//! the `Issues` sentinel opens a secondary block of additional faults; those
//! rows are flattened into the same ordered list.
//!
//! ```text
//! | Alarms / Reasons  | Reason 1          | Reason 2 | ...
//! |-------------------|-------------------|----------|
//! | Air Detector Alarm| Check venous line | ...      |
//! | Issues            |                   |          |
//! | Low Flow          | Check tubing      |          |
//! ```
//!
//! Parsing the file format itself is the caller's job; this module only
//! sees already-decoded cells.

use crate::RemedyError;
use crate::primitives::{
    ISSUES_SENTINEL, MAX_STEP_COLUMNS, NAME_COLUMN, STATES_SHEET, STEP_COLUMN_PREFIX,
    is_placeholder,
};
use crate::taxonomy::{CategoryData, FaultData};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// An in-memory tabular sheet. Row cells line up with `headers` by position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    pub headers: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<Option<String>>>,
}

impl Sheet {
    /// Create a sheet from string slices; empty strings become `None`.
    #[must_use]
    pub fn from_strs(name: &str, headers: &[&str], rows: &[&[&str]]) -> Self {
        Self {
            name: name.to_string(),
            headers: headers.iter().map(|h| (*h).to_string()).collect(),
            rows: rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|c| (!c.is_empty()).then(|| (*c).to_string()))
                        .collect()
                })
                .collect(),
        }
    }
}

/// Column positions resolved from trimmed headers.
struct Layout {
    name: usize,
    steps: Vec<usize>,
}

impl Layout {
    fn resolve(sheet: &Sheet) -> Result<Self, RemedyError> {
        let find = |key: &str| sheet.headers.iter().position(|h| h.trim() == key);

        let name = find(NAME_COLUMN).ok_or_else(|| {
            RemedyError::InvalidTaxonomy(format!(
                "sheet '{}' has no '{}' column",
                sheet.name.trim(),
                NAME_COLUMN
            ))
        })?;
        let steps = (1..=MAX_STEP_COLUMNS)
            .filter_map(|i| find(&format!("{}{}", STEP_COLUMN_PREFIX, i)))
            .collect();

        Ok(Self { name, steps })
    }
}

fn cell(row: &[Option<String>], col: usize) -> Option<&str> {
    row.get(col)
        .and_then(Option::as_deref)
        .filter(|c| !is_placeholder(c))
        .map(str::trim)
}

fn is_empty_row(row: &[Option<String>]) -> bool {
    row.iter().all(|c| c.as_deref().is_none_or(is_placeholder))
}

/// Ingest one sheet as a category.
///
/// Fully-empty rows are dropped. A fault named more than once keeps the
/// steps of its first row. Rows without a usable name are skipped.
pub fn ingest_sheet(sheet: &Sheet) -> Result<CategoryData, RemedyError> {
    let layout = Layout::resolve(sheet)?;
    let mut seen = BTreeSet::new();
    let mut faults = Vec::new();

    for row in sheet.rows.iter().filter(|r| !is_empty_row(r)) {
        let Some(name) = cell(row, layout.name) else {
            continue;
        };
        if name == ISSUES_SENTINEL || !seen.insert(name.to_string()) {
            continue;
        }
        let steps = layout
            .steps
            .iter()
            .filter_map(|&col| cell(row, col))
            .map(str::to_string)
            .collect();
        faults.push(FaultData::with_steps(name, steps));
    }

    Ok(CategoryData {
        name: sheet.name.trim().to_string(),
        faults,
    })
}

/// Ingest every sheet except the machine-states sheet, in order.
pub fn ingest_workbook<'a>(
    sheets: impl IntoIterator<Item = &'a Sheet>,
) -> Result<Vec<CategoryData>, RemedyError> {
    sheets
        .into_iter()
        .filter(|s| s.name.trim() != STATES_SHEET)
        .map(ingest_sheet)
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================
