use crate::workbook::WorkbookError;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Workbook error: {0}")]
    Workbook(#[from] WorkbookError),

    #[error("Diagram error: {0}")]
    Diagram(String),
}
