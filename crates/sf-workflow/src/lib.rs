//! sf-workflow - Task types, workflow graph and single-run driver
//!
//! The four task types (staging copy, fact load, dimension load, data-quality
//! check) plus no-op markers, the builder that wires them into the Sparkify
//! graph, and a driver that executes one run of a graph level by level.

pub mod builder;
pub mod error;
pub mod graph;
pub mod load;
pub mod marker;
pub mod quality;
pub mod runner;
pub mod staging;
pub mod task;

pub use builder::sparkify_workflow;
pub use error::{TaskError, WorkflowError, WorkflowResult};
pub use graph::{WorkflowBuilder, WorkflowGraph};
pub use load::{DimensionLoadTask, FactLoadTask, LoadSpec};
pub use marker::MarkerTask;
pub use quality::DataQualityTask;
pub use runner::{
    logical_date_for, ProgressCallback, RetryPolicy, RunOptions, RunReport, TaskRunResult,
    WorkflowRunner,
};
pub use staging::{StagingSpec, StagingTask};
pub use task::{Task, TaskContext, TaskKind};
