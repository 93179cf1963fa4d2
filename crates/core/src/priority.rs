//! Priority table loading and lookup.
//!
//! The priority table lives on a fixed sheet of the auxiliary workbook: one
//! label column and one value column. The value's digits become the numeric
//! priority; a value without digits falls back to `row * 100`, which keeps
//! the fallback order equal to the sheet order.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::model::{LineItem, PrioritizedItem, DEFAULT_PRIORITY};
use crate::rules::column_index;
use crate::types::RowIndex;
use crate::workbook::{read_cell, WorkbookError, WorkbookSource};

/// Where the priority table is found in the auxiliary workbook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorityTableConfig {
    pub sheet: String,
    pub label_column: String,
    pub value_column: String,
    /// First row after the header.
    pub first_data_row: RowIndex,
}

impl Default for PriorityTableConfig {
    fn default() -> Self {
        Self {
            sheet: "Priority".to_string(),
            label_column: "A".to_string(),
            value_column: "B".to_string(),
            first_data_row: 2,
        }
    }
}

impl PriorityTableConfig {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.first_data_row == 0 {
            return Err(CoreError::Validation(
                "priority table first_data_row must be at least 1".to_string(),
            ));
        }
        if self.sheet.trim().is_empty() {
            return Err(CoreError::Validation(
                "priority table sheet name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// One `(label, priority)` pair. The label is stored lower-cased.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityEntry {
    pub label: String,
    pub priority: i64,
}

/// Label -> priority lookup, in registration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriorityTable {
    entries: Vec<PriorityEntry>,
}

impl PriorityTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan the configured sheet of `source`.
    ///
    /// Fails only when the sheet itself cannot be read; blank labels are
    /// skipped.
    pub fn load(
        source: &dyn WorkbookSource,
        config: &PriorityTableConfig,
    ) -> Result<Self, WorkbookError> {
        let range = source.used_range(&config.sheet)?;
        let label_col = column_index(&config.label_column);
        let value_col = column_index(&config.value_column);

        let mut table = Self::new();
        for row in config.first_data_row.max(range.first_row)..=range.last_row {
            let label = read_cell(source, &config.sheet, row, label_col);
            if label.is_empty() {
                continue;
            }
            let value = read_cell(source, &config.sheet, row, value_col);
            table.insert(&label, priority_from_text(&value, row));
        }
        Ok(table)
    }

    /// Register a label. An already registered label keeps its priority.
    pub fn insert(&mut self, label: &str, priority: i64) {
        let label = label.trim().to_lowercase();
        if label.is_empty() || self.entries.iter().any(|e| e.label == label) {
            return;
        }
        self.entries.push(PriorityEntry { label, priority });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[PriorityEntry] {
        &self.entries
    }

    /// Priority for `name`.
    ///
    /// Exact case-insensitive match first, then the longest label contained
    /// in the name (equal lengths: first registered wins), then
    /// [`DEFAULT_PRIORITY`].
    pub fn lookup(&self, name: &str) -> i64 {
        let needle = name.trim().to_lowercase();
        if let Some(entry) = self.entries.iter().find(|e| e.label == needle) {
            return entry.priority;
        }

        let mut best: Option<&PriorityEntry> = None;
        for entry in &self.entries {
            if !needle.contains(entry.label.as_str()) {
                continue;
            }
            if best.map_or(true, |b| entry.label.len() > b.label.len()) {
                best = Some(entry);
            }
        }
        best.map(|e| e.priority).unwrap_or(DEFAULT_PRIORITY)
    }

    /// Annotate every item with its priority, keeping item order.
    pub fn resolve(&self, items: Vec<LineItem>) -> Vec<PrioritizedItem> {
        items
            .into_iter()
            .map(|item| {
                let priority = self.lookup(&item.name);
                PrioritizedItem { item, priority }
            })
            .collect()
    }
}

/// Numeric priority from a value cell: its digits, else `row * 100`.
pub fn priority_from_text(text: &str, row: RowIndex) -> i64 {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    digits
        .parse::<i64>()
        .unwrap_or_else(|_| i64::from(row) * 100)
}

/// Stable sort by ascending priority.
pub fn sort_by_priority(items: &mut [PrioritizedItem]) {
    items.sort_by_key(|p| p.priority);
}
