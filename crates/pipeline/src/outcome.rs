//! Result of one pipeline run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use termplan_core::layout::LayoutResult;
use termplan_core::model::{LineItem, PrioritizedItem, TableRow};
use termplan_core::terminals::OrderedRow;
use uuid::Uuid;

/// A workbook whose processing was abandoned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFailure {
    pub file: String,
    pub message: String,
}

/// Everything a run produced. Each run builds a fresh outcome; nothing is
/// merged into a previous one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutcome {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub hit_count: usize,
    /// Flat `(sheet, name, quantity)` list for tabular display.
    pub line_items: Vec<LineItem>,
    /// Wide rows of the table-oriented aggregation.
    pub table_rows: Vec<TableRow>,
    /// Line items with priorities, ascending.
    pub prioritized: Vec<PrioritizedItem>,
    /// Terminal table.
    pub ordered_rows: Vec<OrderedRow>,
    /// Placement commands per diagram page.
    pub pages: Vec<LayoutResult>,
    pub failures: Vec<FileFailure>,
}

impl RunOutcome {
    /// No line items at all: the "no results" outcome.
    pub fn is_empty(&self) -> bool {
        self.line_items.is_empty()
    }

    pub fn placement_count(&self) -> usize {
        self.pages.iter().map(|p| p.commands.len()).sum()
    }

    /// Shape names the catalog could not resolve, across all pages.
    pub fn skipped_shapes(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .pages
            .iter()
            .flat_map(|p| p.skipped.iter().map(String::as_str))
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}
