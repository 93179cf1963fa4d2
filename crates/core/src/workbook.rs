//! Workbook reader abstraction.
//!
//! The engine never opens spreadsheet files itself. Everything it needs from
//! a workbook goes through [`WorkbookSource`]: sheet enumeration, the used
//! range of a sheet, and trimmed cell text. [`MemoryWorkbook`] is the
//! in-memory implementation used by the worker job files and the tests.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{ColumnIndex, RowIndex};

/// Errors a workbook reader may report.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkbookError {
    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    #[error("Workbook unreadable: {0}")]
    Unreadable(String),
}

/// Bounds of the populated area of a sheet (1-based, inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsedRange {
    pub first_row: RowIndex,
    pub last_row: RowIndex,
    pub last_column: ColumnIndex,
}

impl UsedRange {
    /// A range covering no rows.
    pub const EMPTY: UsedRange = UsedRange {
        first_row: 1,
        last_row: 0,
        last_column: 0,
    };

    pub fn is_empty(&self) -> bool {
        self.last_row < self.first_row
    }

    /// Iterate the row indices covered by the range.
    pub fn rows(&self) -> impl Iterator<Item = RowIndex> {
        self.first_row..=self.last_row
    }
}

/// Read-only access to a workbook.
pub trait WorkbookSource: Send + Sync {
    /// Names of all sheets in workbook order.
    fn sheet_names(&self) -> Result<Vec<String>, WorkbookError>;

    /// Used range of `sheet`.
    fn used_range(&self, sheet: &str) -> Result<UsedRange, WorkbookError>;

    /// Trimmed text of one cell. Cells outside the used range are empty.
    fn cell_text(
        &self,
        sheet: &str,
        row: RowIndex,
        column: ColumnIndex,
    ) -> Result<String, WorkbookError>;

    fn has_sheet(&self, sheet: &str) -> bool {
        self.sheet_names()
            .map(|names| names.iter().any(|n| n == sheet))
            .unwrap_or(false)
    }
}

/// Read a cell, treating any failure or the "no column" index as empty text.
pub fn read_cell(
    source: &dyn WorkbookSource,
    sheet: &str,
    row: RowIndex,
    column: ColumnIndex,
) -> String {
    if column == 0 {
        return String::new();
    }
    source
        .cell_text(sheet, row, column)
        .map(|text| text.trim().to_string())
        .unwrap_or_default()
}

/// Concatenate the first `max_columns` non-empty cells of a row, joined by a
/// single space.
pub fn row_text(
    source: &dyn WorkbookSource,
    sheet: &str,
    row: RowIndex,
    max_columns: ColumnIndex,
) -> String {
    (1..=max_columns)
        .map(|col| read_cell(source, sheet, row, col))
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

// ---------------------------------------------------------------------------
// In-memory workbook
// ---------------------------------------------------------------------------

/// A workbook held entirely in memory: sheet name -> rows -> cell text.
///
/// Sheet order is the insertion order of [`MemoryWorkbook::with_sheet`];
/// when deserialized from JSON the keys are kept in sorted order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoryWorkbook {
    sheets: BTreeMap<String, Vec<Vec<String>>>,
}

impl MemoryWorkbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a sheet. Row 1 is the first entry of `rows`.
    pub fn with_sheet<R, C>(mut self, name: impl Into<String>, rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();
        self.sheets.insert(name.into(), rows);
        self
    }

    /// Parse a workbook from its JSON form (`{"Sheet": [["a", "b"], ...]}`).
    pub fn from_json(json: &str) -> Result<Self, WorkbookError> {
        serde_json::from_str(json).map_err(|e| WorkbookError::Unreadable(e.to_string()))
    }

    fn sheet(&self, name: &str) -> Result<&Vec<Vec<String>>, WorkbookError> {
        self.sheets
            .get(name)
            .ok_or_else(|| WorkbookError::SheetNotFound(name.to_string()))
    }
}

impl WorkbookSource for MemoryWorkbook {
    fn sheet_names(&self) -> Result<Vec<String>, WorkbookError> {
        Ok(self.sheets.keys().cloned().collect())
    }

    fn used_range(&self, sheet: &str) -> Result<UsedRange, WorkbookError> {
        let rows = self.sheet(sheet)?;
        if rows.is_empty() {
            return Ok(UsedRange::EMPTY);
        }
        let last_column = rows.iter().map(Vec::len).max().unwrap_or(0);
        Ok(UsedRange {
            first_row: 1,
            last_row: rows.len() as RowIndex,
            last_column: last_column as ColumnIndex,
        })
    }

    fn cell_text(
        &self,
        sheet: &str,
        row: RowIndex,
        column: ColumnIndex,
    ) -> Result<String, WorkbookError> {
        let rows = self.sheet(sheet)?;
        if row == 0 || column == 0 {
            return Ok(String::new());
        }
        let text = rows
            .get(row as usize - 1)
            .and_then(|cells| cells.get(column as usize - 1))
            .map(|cell| cell.trim().to_string())
            .unwrap_or_default();
        Ok(text)
    }

    fn has_sheet(&self, sheet: &str) -> bool {
        self.sheets.contains_key(sheet)
    }
}
