//! Fact and dimension load tasks
//!
//! Both run `INSERT INTO <table> <select>`. A dimension load may first
//! delete every row of its table. The delete and the insert are separate
//! statements with no transaction around them: if the insert fails the table
//! is left empty until the next successful run.

use crate::error::TaskError;
use crate::task::{Task, TaskContext, TaskKind};
use async_trait::async_trait;
use sf_core::{TableName, TaskId};
use sf_db::Database;
use sf_sql::templates::{delete_all, insert_into};

/// What to load and how
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadSpec {
    pub table: TableName,
    /// SELECT producing the rows to insert
    pub select: String,
    /// Delete existing rows first
    pub truncate: bool,
}

impl LoadSpec {
    pub fn new(table: TableName, select: impl Into<String>, truncate: bool) -> Self {
        Self {
            table,
            select: select.into(),
            truncate,
        }
    }
}

/// Execute a load spec. Database errors are returned unchanged.
async fn run_load(db: &dyn Database, spec: &LoadSpec) -> Result<usize, TaskError> {
    if spec.truncate {
        let deleted = db.execute(&delete_all(&spec.table)).await?;
        log::debug!("Deleted {} rows from {}", deleted, spec.table);
    }
    let inserted = db.execute(&insert_into(&spec.table, &spec.select)).await?;
    Ok(inserted)
}

/// Appends rows to the fact table. Never truncates.
#[derive(Debug, Clone)]
pub struct FactLoadTask {
    id: TaskId,
    spec: LoadSpec,
}

impl FactLoadTask {
    pub fn new(id: TaskId, table: TableName, select: impl Into<String>) -> Self {
        Self {
            id,
            spec: LoadSpec::new(table, select, false),
        }
    }

    pub fn spec(&self) -> &LoadSpec {
        &self.spec
    }
}

#[async_trait]
impl Task for FactLoadTask {
    fn task_id(&self) -> &TaskId {
        &self.id
    }

    fn kind(&self) -> TaskKind {
        TaskKind::FactLoad
    }

    fn target_table(&self) -> Option<&TableName> {
        Some(&self.spec.table)
    }

    fn queries(&self) -> Vec<&str> {
        vec![self.spec.select.as_str()]
    }

    async fn execute(&self, ctx: &TaskContext<'_>) -> Result<(), TaskError> {
        log::info!("Loading data into the fact table '{}'", self.spec.table);
        let inserted = run_load(ctx.db, &self.spec).await?;
        log::info!("Inserted {} rows into {}", inserted, self.spec.table);
        Ok(())
    }
}

/// Rebuilds a dimension table from its load statement
#[derive(Debug, Clone)]
pub struct DimensionLoadTask {
    id: TaskId,
    spec: LoadSpec,
}

impl DimensionLoadTask {
    pub fn new(id: TaskId, spec: LoadSpec) -> Self {
        Self { id, spec }
    }

    pub fn spec(&self) -> &LoadSpec {
        &self.spec
    }
}

#[async_trait]
impl Task for DimensionLoadTask {
    fn task_id(&self) -> &TaskId {
        &self.id
    }

    fn kind(&self) -> TaskKind {
        TaskKind::DimensionLoad
    }

    fn target_table(&self) -> Option<&TableName> {
        Some(&self.spec.table)
    }

    fn queries(&self) -> Vec<&str> {
        vec![self.spec.select.as_str()]
    }

    async fn execute(&self, ctx: &TaskContext<'_>) -> Result<(), TaskError> {
        log::info!(
            "Loading dimension table '{}' (truncate: {})",
            self.spec.table,
            self.spec.truncate
        );
        let inserted = run_load(ctx.db, &self.spec).await?;
        log::info!("Inserted {} rows into {}", inserted, self.spec.table);
        Ok(())
    }
}

#[cfg(test)]
#[path = "load_test.rs"]
mod tests;
