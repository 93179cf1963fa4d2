//! Interactive session state.
//!
//! A session keeps the configuration, the shape catalog and the outcome of
//! the most recent load. Each load discards the previous outcome before
//! starting, so results never accumulate across loads.

use std::sync::Arc;

use termplan_core::diagram::DiagramSink;
use termplan_core::error::CoreError;

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::outcome::RunOutcome;
use crate::run::{render_outcome, run_async, SharedCatalog, WorkbookFile};

pub struct ExtractionSession {
    config: Arc<PipelineConfig>,
    catalog: SharedCatalog,
    last: Option<RunOutcome>,
}

impl ExtractionSession {
    pub fn new(config: PipelineConfig, catalog: SharedCatalog) -> Self {
        Self {
            config: Arc::new(config),
            catalog,
            last: None,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the pipeline over `files` and keep the outcome as the current one.
    ///
    /// The previous outcome is cleared first; on error the session holds no
    /// outcome at all.
    pub async fn load(&mut self, files: Vec<WorkbookFile>) -> Result<&RunOutcome, PipelineError> {
        self.last = None;
        let outcome = run_async(Arc::clone(&self.config), files, Arc::clone(&self.catalog)).await?;
        let outcome: &RunOutcome = self.last.insert(outcome);
        Ok(outcome)
    }

    /// Outcome of the most recent successful load.
    pub fn last(&self) -> Option<&RunOutcome> {
        self.last.as_ref()
    }

    /// Forget the current outcome.
    pub fn clear(&mut self) {
        self.last = None;
    }

    /// Send the current outcome's placements to `sink`. Nothing loaded
    /// delivers nothing.
    pub fn render(&self, sink: &mut dyn DiagramSink) -> Result<usize, CoreError> {
        match &self.last {
            Some(outcome) => render_outcome(outcome, sink),
            None => Ok(0),
        }
    }
}
