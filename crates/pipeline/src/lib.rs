//! Extraction run orchestration.
//!
//! Drives the `termplan_core` stages over a set of workbooks:
//! scan -> aggregate -> prioritize -> order terminals -> lay out pages.
//! [`run::run`] is the synchronous entry point, [`run::run_async`] moves it
//! onto the blocking pool, and [`session::ExtractionSession`] keeps the
//! latest outcome for interactive callers.

pub mod config;
pub mod error;
pub mod outcome;
pub mod run;
pub mod session;

pub use config::{OrderSource, OrderingConfig, PipelineConfig};
pub use error::PipelineError;
pub use outcome::{FileFailure, RunOutcome};
pub use run::{render_outcome, run, run_async, SharedCatalog, WorkbookFile};
pub use session::ExtractionSession;
