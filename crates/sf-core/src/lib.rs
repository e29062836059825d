//! sf-core - Core library for Sparkify ETL
//!
//! This crate provides shared types used by every other crate: workflow
//! configuration, task and table identifiers, scalar values compared by
//! quality checks, schedule handling, the task dependency DAG, and the
//! per-run state record.

pub mod config;
pub mod dag;
pub mod error;
mod newtype_string;
pub mod run_state;
pub mod scalar;
pub mod schedule;
pub mod sql_utils;
pub mod task_id;

pub use config::{
    DefaultArgs, QualityCheckConfig, RecordFormat, StagingConfig, StagingSource, StorageConfig,
    StorageCredentials, StorageLocation, WarehouseConfig, WorkflowConfig,
};
pub use dag::TaskDag;
pub use error::{CoreError, CoreResult};
pub use run_state::{CompletedTask, FailedTask, RunState, RunStateSummary, RunStatus, TaskState};
pub use scalar::ScalarValue;
pub use schedule::Schedule;
pub use task_id::{TableName, TaskId};
