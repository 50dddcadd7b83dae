use atelier_core::error::CoreError;

/// Error type for the synchronous edges of the pipeline (`start`,
/// `retry_single`). Background-task failures never surface here; they are
/// persisted to the owning painting row instead.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A domain-level error (bad quantity, missing idea, ...).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}
