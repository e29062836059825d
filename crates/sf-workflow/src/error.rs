//! Error types for sf-workflow

use sf_core::CoreError;
use sf_db::DbError;
use sf_quality::QualityError;
use thiserror::Error;

/// Why a single task attempt failed
#[derive(Error, Debug)]
pub enum TaskError {
    /// Reading from storage or copying into a staging table failed (W001)
    #[error("[W001] Failed to copy {source_uri} into {table}: {message}")]
    StorageCopy {
        table: String,
        source_uri: String,
        message: String,
    },

    /// A load statement failed; passed through unchanged
    #[error(transparent)]
    Database(#[from] DbError),

    /// One or more quality checks failed
    #[error(transparent)]
    QualityCheck(#[from] QualityError),

    /// The task's future panicked or was aborted (W002)
    #[error("[W002] Task {task_id} did not complete: {message}")]
    Aborted { task_id: String, message: String },
}

/// Errors building or running a workflow
#[derive(Error, Debug)]
pub enum WorkflowError {
    /// Graph or configuration error
    #[error(transparent)]
    Core(#[from] CoreError),

    /// No data interval has completed for the schedule yet (W003)
    #[error("[W003] No completed {schedule} interval since {start_date}")]
    NoCompletedInterval { schedule: String, start_date: String },
}

/// Result type alias for WorkflowError
pub type WorkflowResult<T> = Result<T, WorkflowError>;
