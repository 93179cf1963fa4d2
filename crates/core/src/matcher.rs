//! Rule matching against spreadsheet rows.
//!
//! [`match_rule`] evaluates one rule against one row. [`scan_sheet`] runs a
//! whole rule set over a sheet and turns every match into a [`RawHit`],
//! resolving auxiliary-table values and per-row quantities on the way.
//! Unreadable cells count as empty text; nothing here aborts on a bad cell.

use serde::{Deserialize, Serialize};

use crate::model::{RawHit, ShapeRef};
use crate::rules::{column_index, ExcludedRows, ResultSource, Rule, RuleSet, DEFAULT_SCAN_COLUMNS};
use crate::types::{ColumnIndex, RowIndex, SourceRef};
use crate::workbook::{read_cell, row_text, WorkbookError, WorkbookSource};

/// Scan settings shared by all rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanOptions {
    /// Leading cells concatenated when a rule has no search column.
    pub max_scan_columns: ColumnIndex,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            max_scan_columns: DEFAULT_SCAN_COLUMNS,
        }
    }
}

/// Outcome of evaluating one rule against one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    pub matched: bool,
    pub resolved_text: String,
}

impl MatchResult {
    pub fn miss() -> Self {
        Self {
            matched: false,
            resolved_text: String::new(),
        }
    }

    pub fn hit(resolved_text: impl Into<String>) -> Self {
        Self {
            matched: true,
            resolved_text: resolved_text.into(),
        }
    }
}

/// Cell accessor for a single row of a sheet.
#[derive(Clone, Copy)]
pub struct SheetRow<'a> {
    pub source: &'a dyn WorkbookSource,
    pub sheet: &'a str,
    pub row: RowIndex,
}

impl<'a> SheetRow<'a> {
    pub fn new(source: &'a dyn WorkbookSource, sheet: &'a str, row: RowIndex) -> Self {
        Self { source, sheet, row }
    }

    pub fn cell(&self, column: ColumnIndex) -> String {
        read_cell(self.source, self.sheet, self.row, column)
    }

    pub fn text(&self, max_columns: ColumnIndex) -> String {
        row_text(self.source, self.sheet, self.row, max_columns)
    }
}

// ---------------------------------------------------------------------------
// Compiled rule
// ---------------------------------------------------------------------------

/// A rule with its column references, keywords and exclusions pre-parsed.
#[derive(Debug, Clone)]
pub struct CompiledRule<'r> {
    pub rule: &'r Rule,
    search_column: ColumnIndex,
    condition_column: ColumnIndex,
    quantity_column: ColumnIndex,
    keywords: Vec<String>,
    exclusions: ExcludedRows,
}

impl<'r> CompiledRule<'r> {
    pub fn new(rule: &'r Rule) -> Self {
        Self {
            rule,
            search_column: column_index(&rule.search_column),
            condition_column: column_index(&rule.condition_column),
            quantity_column: column_index(&rule.quantity_column),
            keywords: rule.keywords().iter().map(|k| k.to_lowercase()).collect(),
            exclusions: rule.exclusions(),
        }
    }

    fn condition_holds(&self, row: &SheetRow<'_>) -> bool {
        row.cell(self.condition_column).to_lowercase()
            == self.rule.effective_condition_value().to_lowercase()
    }

    /// Evaluate the rule against `row`.
    pub fn evaluate(&self, row: &SheetRow<'_>, options: &ScanOptions) -> MatchResult {
        if self.exclusions.contains(row.row) {
            return MatchResult::miss();
        }

        if self.rule.search_by_value {
            return if self.condition_holds(row) {
                MatchResult::hit(row.cell(self.search_column))
            } else {
                MatchResult::miss()
            };
        }

        if self.keywords.is_empty() {
            return MatchResult::miss();
        }
        if self.rule.use_condition && !self.condition_holds(row) {
            return MatchResult::miss();
        }

        let text = if self.search_column > 0 {
            row.cell(self.search_column)
        } else {
            row.text(options.max_scan_columns)
        };
        let haystack = text.to_lowercase();
        if self.keywords.iter().any(|k| haystack.contains(k.as_str())) {
            MatchResult::hit(text)
        } else {
            MatchResult::miss()
        }
    }

    /// Evaluate the rule and build the resulting hit, if any.
    ///
    /// Returns `None` for a miss and for a soft miss (empty resolved name,
    /// absent auxiliary table or cell).
    pub fn hit(
        &self,
        rule_index: usize,
        row: &SheetRow<'_>,
        auxiliary: Option<&dyn WorkbookSource>,
        options: &ScanOptions,
    ) -> Option<RawHit> {
        let result = self.evaluate(row, options);
        if !result.matched {
            return None;
        }

        let name = match self.rule.result_source {
            ResultSource::AuxiliaryTable => {
                let aux = SheetRow::new(auxiliary?, row.sheet, row.row);
                if self.search_column > 0 {
                    aux.cell(self.search_column)
                } else {
                    aux.text(options.max_scan_columns)
                }
            }
            ResultSource::InlineValue if self.rule.search_by_value => {
                if result.resolved_text.is_empty() {
                    self.rule.canonical_name().to_string()
                } else {
                    result.resolved_text.clone()
                }
            }
            ResultSource::InlineValue => self.rule.canonical_name().to_string(),
        };
        if name.is_empty() {
            return None;
        }

        let column_tag = match &self.rule.column_tag {
            Some(tag) if !tag.trim().is_empty() => tag.trim().to_string(),
            _ => name.clone(),
        };

        Some(RawHit {
            source: SourceRef::new(row.sheet, row.row),
            rule_index,
            name,
            context: result.resolved_text,
            quantity: self.quantity(row),
            is_limited: self.rule.limit_quantity,
            condition_met: self.rule.use_condition || self.rule.search_by_value,
            column_tag,
            shape: ShapeRef::from_rule(self.rule),
        })
    }

    fn quantity(&self, row: &SheetRow<'_>) -> u32 {
        if self.quantity_column == 0 {
            return 1;
        }
        parse_quantity(&row.cell(self.quantity_column))
    }
}

/// Parse a quantity cell. Empty or unparsable text counts as 1.
pub fn parse_quantity(text: &str) -> u32 {
    let text = text.trim();
    if let Ok(q) = text.parse::<u32>() {
        return q;
    }
    match text.replace(',', ".").parse::<f64>() {
        Ok(q) if q.is_finite() && q >= 0.0 && q <= u32::MAX as f64 => q.round() as u32,
        _ => 1,
    }
}

/// Evaluate one rule against one row.
pub fn match_rule(rule: &Rule, row: &SheetRow<'_>, options: &ScanOptions) -> MatchResult {
    CompiledRule::new(rule).evaluate(row, options)
}

// ---------------------------------------------------------------------------
// Sheet scan
// ---------------------------------------------------------------------------

/// Run every rule of `rules` over every used row of `sheet`.
///
/// Hits are returned in row order, and within a row in rule order. Fails
/// only when the sheet's used range cannot be read (e.g. missing sheet).
pub fn scan_sheet(
    rules: &RuleSet,
    main: &dyn WorkbookSource,
    auxiliary: Option<&dyn WorkbookSource>,
    sheet: &str,
    options: &ScanOptions,
) -> Result<Vec<RawHit>, WorkbookError> {
    let range = main.used_range(sheet)?;
    let compiled: Vec<(usize, CompiledRule<'_>)> = rules
        .rules
        .iter()
        .enumerate()
        .filter(|(_, r)| r.can_match())
        .map(|(i, r)| (i, CompiledRule::new(r)))
        .collect();

    let mut hits = Vec::new();
    for row_index in range.rows() {
        let row = SheetRow::new(main, sheet, row_index);
        for (rule_index, rule) in &compiled {
            if let Some(hit) = rule.hit(*rule_index, &row, auxiliary, options) {
                hits.push(hit);
            }
        }
    }
    Ok(hits)
}
