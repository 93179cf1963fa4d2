use termplan_core::error::CoreError;

/// Errors that abort a whole pipeline run.
///
/// Per-row and per-file problems never surface here; they are soft misses
/// or [`FileFailure`](crate::outcome::FileFailure) entries of the outcome.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Configuration rejected or a diagram sink failure from `termplan_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The blocking task running the pipeline panicked or was cancelled.
    #[error("Pipeline task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
