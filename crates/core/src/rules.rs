//! Extraction rules and their configuration helpers.
//!
//! A [`Rule`] says what to look for in a spreadsheet row, which condition
//! must hold, where the resulting value comes from, and which diagram shape
//! the resulting line item maps to. Rules are evaluated in [`RuleSet`] order.

use serde::{Deserialize, Serialize};

use crate::layout::{Anchor, PlacementType};
use crate::types::{ColumnIndex, RowIndex};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Condition value used when a rule leaves `condition_value` empty.
pub const DEFAULT_CONDITION_VALUE: &str = "1";

/// Number of leading cells concatenated when a rule has no search column.
pub const DEFAULT_SCAN_COLUMNS: ColumnIndex = 20;

/// Separators accepted between keywords and between exclusion tokens.
const LIST_SEPARATORS: &[char] = &[';', ','];

// ---------------------------------------------------------------------------
// Rule
// ---------------------------------------------------------------------------

/// Where the final value of a hit is read from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultSource {
    /// The matched row of the main workbook.
    #[default]
    InlineValue,
    /// The same sheet/row/column of the auxiliary workbook.
    AuxiliaryTable,
}

/// A configurable matcher/aggregator unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rule {
    /// Keyword, or `;`/`,`-separated keyword list.
    pub search_term: String,
    /// Column letters or number; empty scans the first cells of the row.
    pub search_column: String,
    pub use_condition: bool,
    pub condition_column: String,
    pub condition_value: String,
    /// Match on `condition_column == condition_value` instead of a substring.
    pub search_by_value: bool,
    /// Cap the aggregated quantity at 1.
    pub limit_quantity: bool,
    /// e.g. `"5, 10-12; 229-"`.
    pub excluded_rows: String,
    pub result_source: ResultSource,
    pub target_shape_name: String,
    pub anchor: Anchor,
    pub placement: PlacementType,
    pub coordinates_xy: Option<(f64, f64)>,
    /// Canonical line item name; defaults to the trimmed search term.
    pub display_name: Option<String>,
    /// Column supplying the per-row quantity; empty means 1 per hit.
    pub quantity_column: String,
    /// Slot name in the table-oriented aggregation.
    pub column_tag: Option<String>,
}

impl Rule {
    /// Substring rule for `search_term` with default settings.
    pub fn new(search_term: impl Into<String>) -> Self {
        Self {
            search_term: search_term.into(),
            ..Self::default()
        }
    }

    /// Canonical name used for grouping hits of this rule.
    pub fn canonical_name(&self) -> &str {
        match &self.display_name {
            Some(name) if !name.trim().is_empty() => name.trim(),
            _ => self.search_term.trim(),
        }
    }

    /// Slot tag used by the table-oriented aggregation.
    pub fn slot_tag(&self) -> &str {
        match &self.column_tag {
            Some(tag) if !tag.trim().is_empty() => tag.trim(),
            _ => self.canonical_name(),
        }
    }

    /// Keywords of `search_term`, trimmed, empty entries removed.
    pub fn keywords(&self) -> Vec<&str> {
        self.search_term
            .split(LIST_SEPARATORS)
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .collect()
    }

    /// Effective condition value (`"1"` when left empty).
    pub fn effective_condition_value(&self) -> &str {
        let value = self.condition_value.trim();
        if value.is_empty() {
            DEFAULT_CONDITION_VALUE
        } else {
            value
        }
    }

    /// Whether this rule can ever produce a hit.
    pub fn can_match(&self) -> bool {
        self.search_by_value || !self.keywords().is_empty()
    }

    pub fn exclusions(&self) -> ExcludedRows {
        ExcludedRows::parse(&self.excluded_rows)
    }
}

/// An ordered collection of rules plus the sheets they apply to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSet {
    pub rules: Vec<Rule>,
    /// Sheets to scan; empty scans every sheet of the workbook.
    pub target_sheets: Vec<String>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self {
            rules,
            target_sheets: Vec::new(),
        }
    }

    pub fn with_target_sheets(mut self, sheets: Vec<String>) -> Self {
        self.target_sheets = sheets;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Whether `sheet` should be scanned.
    pub fn targets(&self, sheet: &str) -> bool {
        self.target_sheets.is_empty() || self.target_sheets.iter().any(|s| s == sheet)
    }
}

// ---------------------------------------------------------------------------
// Column references
// ---------------------------------------------------------------------------

/// Convert a column reference to a 1-based index.
///
/// Letters use base-26 (`A` = 1, `Z` = 26, `AA` = 27), a bare number is used
/// literally, anything else yields `0` ("no column").
///
/// ```
/// use termplan_core::rules::column_index;
///
/// assert_eq!(column_index("A"), 1);
/// assert_eq!(column_index("AA"), 27);
/// assert_eq!(column_index("7"), 7);
/// assert_eq!(column_index(""), 0);
/// ```
pub fn column_index(reference: &str) -> ColumnIndex {
    let reference = reference.trim();
    if reference.is_empty() {
        return 0;
    }
    if reference.chars().all(|c| c.is_ascii_digit()) {
        return reference.parse().unwrap_or(0);
    }

    let mut index: ColumnIndex = 0;
    for c in reference.chars() {
        if !c.is_ascii_alphabetic() {
            return 0;
        }
        let digit = (c.to_ascii_uppercase() as u8 - b'A' + 1) as ColumnIndex;
        index = match index.checked_mul(26).and_then(|v| v.checked_add(digit)) {
            Some(v) => v,
            None => return 0,
        };
    }
    index
}

// ---------------------------------------------------------------------------
// Row exclusions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exclusion {
    Row(RowIndex),
    Range(RowIndex, RowIndex),
    From(RowIndex),
}

/// Parsed form of a rule's `excluded_rows` text.
///
/// Tokens are separated by `,` or `;`: a literal row (`"5"`), a closed range
/// (`"10-12"`) or an open-ended range (`"229-"`, every row from 229 on).
/// Malformed tokens are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExcludedRows {
    entries: Vec<Exclusion>,
}

impl ExcludedRows {
    pub fn parse(text: &str) -> Self {
        let entries = text
            .split(LIST_SEPARATORS)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .filter_map(parse_exclusion)
            .collect();
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, row: RowIndex) -> bool {
        self.entries.iter().any(|e| match *e {
            Exclusion::Row(r) => r == row,
            Exclusion::Range(lo, hi) => (lo..=hi).contains(&row),
            Exclusion::From(lo) => row >= lo,
        })
    }
}

fn parse_exclusion(token: &str) -> Option<Exclusion> {
    match token.split_once('-') {
        None => token.parse().ok().map(Exclusion::Row),
        Some((start, end)) => {
            let start: RowIndex = start.trim().parse().ok()?;
            let end = end.trim();
            if end.is_empty() {
                Some(Exclusion::From(start))
            } else {
                let end: RowIndex = end.parse().ok()?;
                Some(Exclusion::Range(start.min(end), start.max(end)))
            }
        }
    }
}
