//! Run state tracking for a single workflow run
//!
//! The driver records every task transition here and persists the record
//! after each one, so an interrupted run leaves behind which tasks finished,
//! which failed and which never started.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};

/// State of a run in progress or completed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunState {
    /// Unique identifier for this run
    pub run_id: String,

    /// Workflow the run belongs to
    pub dag_id: String,

    /// Start of the data interval this run covers
    pub logical_date: DateTime<Utc>,

    /// When the run started
    pub started_at: DateTime<Utc>,

    /// When the state was last updated
    pub last_updated_at: DateTime<Utc>,

    /// Current status of the run
    pub status: RunStatus,

    /// Latest state of every task in the run
    pub task_states: BTreeMap<String, TaskState>,

    /// Tasks that have been successfully completed
    pub completed_tasks: Vec<CompletedTask>,

    /// Tasks that failed after exhausting their retries
    pub failed_tasks: Vec<FailedTask>,

    /// Tasks that have not finished
    pub pending_tasks: Vec<String>,

    /// The selection criteria used for this run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selection: Option<String>,
}

/// Status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    /// Every task succeeded
    Completed,
    /// At least one task failed or was skipped
    Failed,
    Cancelled,
}

/// Lifecycle state of one task within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Pending,
    Running,
    /// Waiting out the retry delay after a failed attempt
    UpForRetry,
    Success,
    Failed,
    /// Never started because an upstream task failed
    UpstreamFailed,
}

/// A task that completed successfully
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedTask {
    pub task_id: String,

    pub completed_at: DateTime<Utc>,

    /// Wall time of the successful attempt (in milliseconds)
    pub duration_ms: u64,

    /// Number of attempts used, including the successful one
    pub attempts: u32,
}

/// A task that failed during execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedTask {
    pub task_id: String,

    pub failed_at: DateTime<Utc>,

    /// Error message of the last attempt
    pub error: String,

    pub attempts: u32,
}

impl RunState {
    /// Create a new run state with every task pending
    pub fn new(
        dag_id: impl Into<String>,
        logical_date: DateTime<Utc>,
        pending_tasks: Vec<String>,
        selection: Option<String>,
    ) -> Self {
        let now = Utc::now();
        let task_states = pending_tasks
            .iter()
            .map(|t| (t.clone(), TaskState::Pending))
            .collect();
        Self {
            run_id: Uuid::new_v4().to_string(),
            dag_id: dag_id.into(),
            logical_date,
            started_at: now,
            last_updated_at: now,
            status: RunStatus::Running,
            task_states,
            completed_tasks: Vec::new(),
            failed_tasks: Vec::new(),
            pending_tasks,
            selection,
        }
    }

    /// Load run state from a file path
    pub fn load(path: &Path) -> CoreResult<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let state: RunState = serde_json::from_str(&content)?;
        Ok(Some(state))
    }

    /// Save run state to a file path atomically
    ///
    /// Writes to a sibling temp file, then renames over the target
    pub fn save(&self, path: &Path) -> CoreResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&temp_path, json)?;
        fs::rename(&temp_path, path)?;

        Ok(())
    }

    /// Record a state transition for a task
    pub fn set_task_state(&mut self, task_id: &str, state: TaskState) {
        self.task_states.insert(task_id.to_string(), state);
        self.last_updated_at = Utc::now();
    }

    /// Latest state of a task, if it is part of this run
    pub fn task_state(&self, task_id: &str) -> Option<TaskState> {
        self.task_states.get(task_id).copied()
    }

    /// Mark a task as completed
    pub fn mark_completed(&mut self, task_id: &str, duration_ms: u64, attempts: u32) {
        self.pending_tasks.retain(|n| n != task_id);
        self.completed_tasks.push(CompletedTask {
            task_id: task_id.to_string(),
            completed_at: Utc::now(),
            duration_ms,
            attempts,
        });
        self.set_task_state(task_id, TaskState::Success);
    }

    /// Mark a task as failed
    pub fn mark_failed(&mut self, task_id: &str, error: &str, attempts: u32) {
        self.pending_tasks.retain(|n| n != task_id);
        self.failed_tasks.push(FailedTask {
            task_id: task_id.to_string(),
            failed_at: Utc::now(),
            error: error.to_string(),
            attempts,
        });
        self.set_task_state(task_id, TaskState::Failed);
    }

    /// Mark a task as skipped because an upstream task failed
    pub fn mark_upstream_failed(&mut self, task_id: &str) {
        self.pending_tasks.retain(|n| n != task_id);
        self.set_task_state(task_id, TaskState::UpstreamFailed);
    }

    /// Mark the run as finished
    pub fn mark_run_completed(&mut self) {
        let all_succeeded = self
            .task_states
            .values()
            .all(|s| *s == TaskState::Success);
        self.status = if all_succeeded {
            RunStatus::Completed
        } else {
            RunStatus::Failed
        };
        self.last_updated_at = Utc::now();
    }

    /// Mark the run as cancelled
    pub fn mark_run_cancelled(&mut self) {
        self.status = RunStatus::Cancelled;
        self.last_updated_at = Utc::now();
    }

    /// Ids of tasks skipped because of an upstream failure
    pub fn upstream_failed_tasks(&self) -> Vec<String> {
        self.task_states
            .iter()
            .filter(|(_, s)| **s == TaskState::UpstreamFailed)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Get summary statistics
    pub fn summary(&self) -> RunStateSummary {
        RunStateSummary {
            completed: self.completed_tasks.len(),
            failed: self.failed_tasks.len(),
            upstream_failed: self.upstream_failed_tasks().len(),
            pending: self.pending_tasks.len(),
            total_duration_ms: self.completed_tasks.iter().map(|t| t.duration_ms).sum(),
        }
    }
}

/// Summary statistics for a run state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunStateSummary {
    pub completed: usize,
    pub failed: usize,
    pub upstream_failed: usize,
    pub pending: usize,
    pub total_duration_ms: u64,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Running => write!(f, "running"),
            RunStatus::Completed => write!(f, "completed"),
            RunStatus::Failed => write!(f, "failed"),
            RunStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TaskState::Pending => "pending",
            TaskState::Running => "running",
            TaskState::UpForRetry => "up_for_retry",
            TaskState::Success => "success",
            TaskState::Failed => "failed",
            TaskState::UpstreamFailed => "upstream_failed",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
#[path = "run_state_test.rs"]
mod tests;
