//! The extraction run: scan -> aggregate -> prioritize -> order -> layout.
//!
//! [`run`] is synchronous and self-contained; [`run_async`] moves it onto
//! the blocking pool so an interactive caller can await it. Every call
//! starts from empty state.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use termplan_core::aggregation::{aggregate, aggregate_table};
use termplan_core::diagram::{render, DiagramSink};
use termplan_core::error::CoreError;
use termplan_core::layout::{layout_page, LayoutItem, LayoutResult, ShapeCatalog};
use termplan_core::matcher::scan_sheet;
use termplan_core::model::RawHit;
use termplan_core::priority::{sort_by_priority, PriorityTable};
use termplan_core::terminals::{OrderInputRow, TerminalAssigner};
use termplan_core::workbook::{WorkbookError, WorkbookSource};
use uuid::Uuid;

use crate::config::{OrderSource, PipelineConfig};
use crate::error::PipelineError;
use crate::outcome::{FileFailure, RunOutcome};

/// Shape catalog shareable with the blocking pool.
pub type SharedCatalog = Arc<dyn ShapeCatalog + Send + Sync>;

/// One input file: the main workbook and its optional auxiliary workbook.
#[derive(Clone)]
pub struct WorkbookFile {
    pub name: String,
    pub main: Arc<dyn WorkbookSource>,
    pub auxiliary: Option<Arc<dyn WorkbookSource>>,
}

impl WorkbookFile {
    pub fn new(name: impl Into<String>, main: Arc<dyn WorkbookSource>) -> Self {
        Self {
            name: name.into(),
            main,
            auxiliary: None,
        }
    }

    pub fn with_auxiliary(mut self, auxiliary: Arc<dyn WorkbookSource>) -> Self {
        self.auxiliary = Some(auxiliary);
        self
    }
}

impl std::fmt::Debug for WorkbookFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkbookFile")
            .field("name", &self.name)
            .field("has_auxiliary", &self.auxiliary.is_some())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

/// Run the whole pipeline over `files`.
///
/// Fails only on invalid configuration. A file whose sheets cannot be
/// enumerated is recorded in [`RunOutcome::failures`] and contributes no
/// hits; missing target sheets are skipped with a warning.
pub fn run(
    config: &PipelineConfig,
    files: &[WorkbookFile],
    catalog: &dyn ShapeCatalog,
) -> Result<RunOutcome, PipelineError> {
    config.validate()?;
    let assigner = TerminalAssigner::new(config.ordering.markers.clone())?;

    let run_id = Uuid::now_v7();
    let started_at = Utc::now();
    let timer = Instant::now();
    let span = tracing::info_span!("extraction_run", %run_id, files = files.len());
    let _guard = span.enter();

    let mut hits: Vec<RawHit> = Vec::new();
    let mut failures = Vec::new();
    for file in files {
        match scan_file(config, file) {
            Ok(file_hits) => {
                tracing::debug!(file = %file.name, hits = file_hits.len(), "File scanned");
                hits.extend(file_hits);
            }
            Err(err) => {
                tracing::warn!(file = %file.name, error = %err, "File skipped");
                failures.push(FileFailure {
                    file: file.name.clone(),
                    message: err.to_string(),
                });
            }
        }
    }

    // In table mode only name slots are equipment; priority slots stay in
    // the wide rows.
    let line_items = match &config.ordering.source {
        OrderSource::Items => aggregate(&hits),
        OrderSource::TableSlots { pairs } => {
            let named: Vec<RawHit> = hits
                .iter()
                .filter(|h| pairs.iter().any(|p| p.name_tag == h.column_tag))
                .cloned()
                .collect();
            aggregate(&named)
        }
    };
    let table_rows = aggregate_table(&hits);

    let priorities = load_priorities(config, files);
    let mut prioritized = priorities.resolve(line_items.clone());
    sort_by_priority(&mut prioritized);

    let order_input: Vec<OrderInputRow> = match &config.ordering.source {
        OrderSource::Items => prioritized.iter().map(OrderInputRow::from_item).collect(),
        OrderSource::TableSlots { pairs } => table_rows
            .iter()
            .map(|row| OrderInputRow::from_table_row(row, pairs))
            .collect(),
    };
    let ordered_rows = assigner.order(&order_input);

    let pages: Vec<LayoutResult> = config
        .pages
        .iter()
        .map(|page| {
            let items: Vec<LayoutItem> = prioritized
                .iter()
                .filter(|p| page.accepts(&p.item.sheet))
                .filter_map(LayoutItem::from_prioritized)
                .collect();
            let result = layout_page(page, &items, catalog);
            if !result.skipped.is_empty() {
                tracing::warn!(page = %page.page, skipped = ?result.skipped, "Unknown shapes skipped");
            }
            result
        })
        .collect();

    let outcome = RunOutcome {
        run_id,
        started_at,
        duration_ms: timer.elapsed().as_millis() as u64,
        hit_count: hits.len(),
        line_items,
        table_rows,
        prioritized,
        ordered_rows,
        pages,
        failures,
    };

    if outcome.is_empty() {
        tracing::info!(duration_ms = outcome.duration_ms, "Run finished with no results");
    } else {
        tracing::info!(
            hits = outcome.hit_count,
            line_items = outcome.line_items.len(),
            ordered_rows = outcome.ordered_rows.len(),
            placements = outcome.placement_count(),
            failures = outcome.failures.len(),
            duration_ms = outcome.duration_ms,
            "Run finished",
        );
    }
    Ok(outcome)
}

/// Run the pipeline on the blocking pool and hand the outcome back.
pub async fn run_async(
    config: Arc<PipelineConfig>,
    files: Vec<WorkbookFile>,
    catalog: SharedCatalog,
) -> Result<RunOutcome, PipelineError> {
    tokio::task::spawn_blocking(move || run(&config, &files, catalog.as_ref())).await?
}

/// Deliver every page of `outcome` to `sink`. Returns the command count.
pub fn render_outcome(
    outcome: &RunOutcome,
    sink: &mut dyn DiagramSink,
) -> Result<usize, CoreError> {
    let mut delivered = 0;
    for page in &outcome.pages {
        delivered += render(page, sink)?;
    }
    Ok(delivered)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Scan the target sheets of one file (every sheet when none are named).
fn scan_file(config: &PipelineConfig, file: &WorkbookFile) -> Result<Vec<RawHit>, WorkbookError> {
    let available = file.main.sheet_names()?;
    let sheets: Vec<String> = if config.rules.target_sheets.is_empty() {
        available
    } else {
        config.rules.target_sheets.clone()
    };

    let auxiliary = file.auxiliary.as_deref();
    let mut hits = Vec::new();
    for sheet in &sheets {
        match scan_sheet(&config.rules, file.main.as_ref(), auxiliary, sheet, &config.scan) {
            Ok(sheet_hits) => {
                tracing::debug!(file = %file.name, sheet = %sheet, hits = sheet_hits.len(), "Sheet scanned");
                hits.extend(sheet_hits);
            }
            Err(err) => {
                tracing::warn!(file = %file.name, sheet = %sheet, error = %err, "Sheet skipped");
            }
        }
    }
    Ok(hits)
}

/// Priority table from the first auxiliary workbook that has the sheet.
fn load_priorities(config: &PipelineConfig, files: &[WorkbookFile]) -> PriorityTable {
    let Some(table_config) = &config.priority else {
        return PriorityTable::new();
    };
    for file in files {
        let Some(aux) = &file.auxiliary else {
            continue;
        };
        match PriorityTable::load(aux.as_ref(), table_config) {
            Ok(table) => {
                tracing::debug!(file = %file.name, entries = table.len(), "Priority table loaded");
                return table;
            }
            Err(err) => {
                tracing::warn!(file = %file.name, error = %err, "Priority table unavailable");
            }
        }
    }
    PriorityTable::new()
}

