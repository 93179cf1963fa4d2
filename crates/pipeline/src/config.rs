//! Pipeline configuration.
//!
//! One immutable [`PipelineConfig`] value drives a run. Every section has
//! defaults, so a JSON job file only needs to spell out what it changes.

use serde::{Deserialize, Serialize};
use termplan_core::error::CoreError;
use termplan_core::layout::PageLayout;
use termplan_core::matcher::ScanOptions;
use termplan_core::priority::PriorityTableConfig;
use termplan_core::rules::RuleSet;
use termplan_core::terminals::{SlotPair, TerminalMarkers, MAX_ORDER_SLOTS};

/// Where the terminal walk takes its rows from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OrderSource {
    /// One row per prioritized line item.
    #[default]
    Items,
    /// Name/priority slot pairs of the table-oriented aggregation.
    TableSlots { pairs: Vec<SlotPair> },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderingConfig {
    pub markers: TerminalMarkers,
    pub source: OrderSource,
}

/// Everything a run needs besides its input workbooks and shape catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub rules: RuleSet,
    pub scan: ScanOptions,
    /// Priority sheet in the auxiliary workbook; `None` gives every item the
    /// default priority.
    pub priority: Option<PriorityTableConfig>,
    pub ordering: OrderingConfig,
    /// Diagram pages to lay out; empty skips the layout stage.
    pub pages: Vec<PageLayout>,
}

impl PipelineConfig {
    pub fn new(rules: RuleSet) -> Self {
        Self {
            rules,
            ..Self::default()
        }
    }

    /// Reject configurations no run could make sense of.
    ///
    /// Malformed rule details (bad column letters, odd exclusion tokens) are
    /// not errors; they fall back to defaults during matching.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.scan.max_scan_columns == 0 {
            return Err(CoreError::Validation(
                "max_scan_columns must be at least 1".to_string(),
            ));
        }
        if let Some(priority) = &self.priority {
            priority.validate()?;
        }
        self.ordering.markers.validate()?;
        if let OrderSource::TableSlots { pairs } = &self.ordering.source {
            if pairs.is_empty() || pairs.len() > MAX_ORDER_SLOTS {
                return Err(CoreError::Validation(format!(
                    "table ordering needs 1 to {MAX_ORDER_SLOTS} slot pairs, got {}",
                    pairs.len()
                )));
            }
        }
        for page in &self.pages {
            page.layout.validate().map_err(|e| match e {
                CoreError::Validation(msg) => {
                    CoreError::Validation(format!("page '{}': {msg}", page.page))
                }
                other => other,
            })?;
        }
        Ok(())
    }
}
