//! Database trait definition

use crate::error::DbResult;
use async_trait::async_trait;
use sf_core::ScalarValue;

/// The warehouse connection every task executes against
///
/// Implementations must be Send + Sync: tasks in the same level share one
/// handle concurrently.
#[async_trait]
pub trait Database: Send + Sync {
    /// Execute one statement, returning affected rows
    async fn execute(&self, sql: &str) -> DbResult<usize>;

    /// Execute multiple `;`-separated statements
    async fn execute_batch(&self, sql: &str) -> DbResult<()>;

    /// Run a query and return the first column of its first row.
    ///
    /// `Ok(None)` when the query returns no rows.
    async fn query_first(&self, sql: &str) -> DbResult<Option<ScalarValue>>;

    /// Check if a table or view exists
    async fn relation_exists(&self, name: &str) -> DbResult<bool>;

    /// Database type identifier for logging
    fn db_type(&self) -> &'static str;
}
