use serde::{Deserialize, Serialize};

/// Spreadsheet rows are 1-based.
pub type RowIndex = u32;

/// Spreadsheet columns are 1-based; `0` means "no column".
pub type ColumnIndex = u32;

/// Position of a record in the source workbook.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceRef {
    pub sheet: String,
    pub row: RowIndex,
}

impl SourceRef {
    pub fn new(sheet: impl Into<String>, row: RowIndex) -> Self {
        Self {
            sheet: sheet.into(),
            row,
        }
    }
}

impl std::fmt::Display for SourceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}!{}", self.sheet, self.row)
    }
}
