//! Value types handed from one stage of the engine to the next.

use serde::{Deserialize, Serialize};

use crate::layout::{Anchor, PlacementType};
use crate::rules::Rule;
use crate::types::SourceRef;

/// Priority assigned to items with no entry in the priority table.
pub const DEFAULT_PRIORITY: i64 = 9999;

/// Diagram shape a line item maps to, copied from its rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShapeRef {
    pub target_shape_name: String,
    pub anchor: Anchor,
    pub placement: PlacementType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates_xy: Option<(f64, f64)>,
}

impl ShapeRef {
    pub fn from_rule(rule: &Rule) -> Self {
        Self {
            target_shape_name: rule.target_shape_name.trim().to_string(),
            anchor: rule.anchor,
            placement: rule.placement,
            coordinates_xy: rule.coordinates_xy,
        }
    }

    pub fn has_shape(&self) -> bool {
        !self.target_shape_name.is_empty()
    }
}

/// One rule match on one row. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawHit {
    pub source: SourceRef,
    /// Index of the matching rule in its rule set.
    pub rule_index: usize,
    /// Canonical name the hit aggregates under.
    pub name: String,
    /// Text the rule matched against (row text or matched cell).
    pub context: String,
    pub quantity: u32,
    pub is_limited: bool,
    pub condition_met: bool,
    /// Slot name for the table-oriented aggregation.
    pub column_tag: String,
    pub shape: ShapeRef,
}

/// An aggregated `(sheet, name, quantity)` unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub sheet: String,
    pub name: String,
    pub quantity: u32,
    /// Row of the first contributing hit.
    pub first_row: u32,
    /// Context of the first contributing hit.
    pub context: String,
    pub shape: ShapeRef,
}

impl LineItem {
    pub fn source(&self) -> SourceRef {
        SourceRef::new(self.sheet.clone(), self.first_row)
    }
}

/// A line item annotated with its sort priority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrioritizedItem {
    #[serde(flatten)]
    pub item: LineItem,
    pub priority: i64,
}

/// One named value inside a [`TableRow`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSlot {
    pub tag: String,
    pub value: String,
    pub quantity: u32,
}

/// A wide row produced by the table-oriented aggregation: every rule column
/// that hit the same `(sheet, row)` becomes a named slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub source: SourceRef,
    pub context: String,
    pub slots: Vec<TableSlot>,
}

impl TableRow {
    /// Value of the slot named `tag`, if present.
    pub fn slot(&self, tag: &str) -> Option<&str> {
        self.slots
            .iter()
            .find(|s| s.tag == tag)
            .map(|s| s.value.as_str())
    }
}
