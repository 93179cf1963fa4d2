//! JSON job files.
//!
//! A job bundles the pipeline configuration, the workbooks to scan (held
//! as sheet -> rows of cell text) and the shape catalog of the target
//! diagram.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use termplan_core::layout::ShapeSize;
use termplan_core::workbook::MemoryWorkbook;
use termplan_pipeline::{PipelineConfig, RunOutcome, SharedCatalog, WorkbookFile};

#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("Cannot read job file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid job file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// One input workbook of a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobWorkbook {
    pub name: String,
    pub main: MemoryWorkbook,
    #[serde(default)]
    pub auxiliary: Option<MemoryWorkbook>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JobFile {
    pub config: PipelineConfig,
    pub workbooks: Vec<JobWorkbook>,
    pub shapes: BTreeMap<String, ShapeSize>,
}

impl JobFile {
    /// Read and parse a job file.
    pub fn load(path: &Path) -> Result<Self, JobError> {
        let text = std::fs::read_to_string(path).map_err(|source| JobError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| JobError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Split the job into the inputs of a pipeline run.
    pub fn into_parts(self) -> (PipelineConfig, Vec<WorkbookFile>, SharedCatalog) {
        let files = self
            .workbooks
            .into_iter()
            .map(|wb| {
                let file = WorkbookFile::new(wb.name, Arc::new(wb.main));
                match wb.auxiliary {
                    Some(aux) => file.with_auxiliary(Arc::new(aux)),
                    None => file,
                }
            })
            .collect();
        (self.config, files, Arc::new(self.shapes))
    }
}

/// Serialize a run outcome for output.
pub fn outcome_json(outcome: &RunOutcome, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(outcome)
    } else {
        serde_json::to_string(outcome)
    }
}
