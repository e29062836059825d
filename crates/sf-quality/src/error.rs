//! Error types for sf-quality

use thiserror::Error;

/// Data-quality errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QualityError {
    /// One or more checks failed (Q001)
    #[error("[Q001] Data quality check failed: {failed} of {total} checks failed: {}", .failing_queries.join(" | "))]
    CheckFailure {
        failed: usize,
        total: usize,
        /// Literal SQL of every failing check, in check-list order
        failing_queries: Vec<String>,
    },
}
