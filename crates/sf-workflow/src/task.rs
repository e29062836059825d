//! The task contract shared by every node of a workflow

use crate::error::TaskError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sf_core::{TableName, TaskId};
use sf_db::Database;
use std::fmt;

/// What a task does, used for display and validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// No-op start or end node
    Marker,
    /// Copy raw records from storage into a staging table
    Staging,
    /// Append rows to the fact table
    FactLoad,
    /// Replace the rows of a dimension table
    DimensionLoad,
    /// Evaluate scalar quality checks
    DataQuality,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskKind::Marker => "marker",
            TaskKind::Staging => "staging",
            TaskKind::FactLoad => "fact_load",
            TaskKind::DimensionLoad => "dimension_load",
            TaskKind::DataQuality => "data_quality",
        };
        f.write_str(s)
    }
}

/// Per-attempt execution context handed to [`Task::execute`]
#[derive(Clone, Copy)]
pub struct TaskContext<'a> {
    pub dag_id: &'a str,
    pub run_id: &'a str,
    /// Start of the data interval the run covers
    pub logical_date: DateTime<Utc>,
    /// 1 for the first attempt, incremented on every retry
    pub try_number: u32,
    pub db: &'a dyn Database,
}

impl fmt::Debug for TaskContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskContext")
            .field("dag_id", &self.dag_id)
            .field("run_id", &self.run_id)
            .field("logical_date", &self.logical_date)
            .field("try_number", &self.try_number)
            .field("db", &self.db.db_type())
            .finish()
    }
}

/// A unit of work in a workflow graph.
///
/// Dependencies are declared on the graph, not on the task. A task never
/// retries internally; a failed attempt is reported and the driver decides.
#[async_trait]
pub trait Task: Send + Sync + fmt::Debug {
    fn task_id(&self) -> &TaskId;

    fn kind(&self) -> TaskKind;

    /// Table the task writes, if any
    fn target_table(&self) -> Option<&TableName> {
        None
    }

    /// SQL queries the task runs verbatim (load selects, check queries)
    fn queries(&self) -> Vec<&str> {
        Vec::new()
    }

    async fn execute(&self, ctx: &TaskContext<'_>) -> Result<(), TaskError>;
}
