//! Single-run driver
//!
//! Executes one run of a [`WorkflowGraph`] against a warehouse: tasks are
//! grouped into dependency levels, each level runs concurrently (bounded by
//! a semaphore), and a level starts only after the previous one finished.
//! A failed attempt is retried according to the [`RetryPolicy`]; a task
//! that exhausts its retries fails, and everything downstream of it is
//! marked upstream-failed without running.
//!
//! There is no schedule loop. The caller picks the logical date, usually
//! with [`logical_date_for`].

use crate::error::{TaskError, WorkflowError, WorkflowResult};
use crate::graph::WorkflowGraph;
use crate::task::{Task, TaskContext, TaskKind};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sf_core::{DefaultArgs, RunState, TaskId, TaskState, WorkflowConfig};
use sf_db::Database;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

/// How often and how far apart a failed task is retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub retries: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(retries: u32, delay: Duration) -> Self {
        Self { retries, delay }
    }

    /// Single attempt, no retries
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    pub fn from_default_args(args: &DefaultArgs) -> Self {
        Self::new(args.retries, args.retry_delay())
    }

    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_default_args(&DefaultArgs::default())
    }
}

/// Per-run options
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Upper bound on concurrently executing tasks
    pub threads: usize,
    /// `task`, `+task`, `task+` or `+task+`; tasks outside the selection
    /// are treated as already satisfied
    pub selection: Option<String>,
    /// Where to persist run state after every transition
    pub state_path: Option<PathBuf>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            threads: 4,
            selection: None,
            state_path: None,
        }
    }
}

/// Final outcome of one task
#[derive(Debug, Clone, Serialize)]
pub struct TaskRunResult {
    pub task_id: String,
    pub kind: TaskKind,
    pub state: TaskState,
    /// Attempts made; 0 when the task never started
    pub attempts: u32,
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    pub duration: Duration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

/// Everything a run produced
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub state: RunState,
    /// One entry per selected task that reached a final state, in level order
    pub results: Vec<TaskRunResult>,
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    pub duration: Duration,
}

impl RunReport {
    /// True when every selected task succeeded
    pub fn succeeded(&self) -> bool {
        self.state.status == sf_core::RunStatus::Completed
    }

    pub fn result(&self, task_id: &str) -> Option<&TaskRunResult> {
        self.results.iter().find(|r| r.task_id == task_id)
    }

    pub fn failed(&self) -> Vec<&TaskRunResult> {
        self.results
            .iter()
            .filter(|r| r.state == TaskState::Failed)
            .collect()
    }

    /// True when the only failures are data-quality failures
    pub fn only_quality_failed(&self) -> bool {
        let failed = self.failed();
        !failed.is_empty() && failed.iter().all(|r| r.kind == TaskKind::DataQuality)
    }
}

/// Called once per task as soon as it reaches a final state
pub type ProgressCallback = Arc<dyn Fn(&TaskRunResult) + Send + Sync>;

/// Start of the data interval the next run should cover.
///
/// Catch-up is never performed: with `catchup` enabled the run still
/// covers only the latest completed interval.
pub fn logical_date_for(
    config: &WorkflowConfig,
    now: DateTime<Utc>,
) -> WorkflowResult<DateTime<Utc>> {
    let start_date = config.default_args.start_date;
    if config.catchup {
        log::warn!(
            "catchup is enabled but backfilling is not supported; running the latest interval only"
        );
    }
    config
        .schedule
        .latest_logical_date(start_date, now)
        .ok_or_else(|| WorkflowError::NoCompletedInterval {
            schedule: config.schedule.to_string(),
            start_date: start_date.to_rfc3339(),
        })
}

/// Drives one run of a workflow graph
pub struct WorkflowRunner {
    graph: Arc<WorkflowGraph>,
    db: Arc<dyn Database>,
    retry: RetryPolicy,
    cancelled: Arc<AtomicBool>,
    on_task_finished: Option<ProgressCallback>,
}

impl std::fmt::Debug for WorkflowRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowRunner")
            .field("dag_id", &self.graph.dag_id())
            .field("db", &self.db.db_type())
            .field("retry", &self.retry)
            .finish()
    }
}

/// Shared run state, persisted after each transition when a path is set
#[derive(Clone)]
struct StateHandle {
    state: Arc<Mutex<RunState>>,
    path: Option<Arc<PathBuf>>,
}

impl StateHandle {
    fn update(&self, f: impl FnOnce(&mut RunState)) {
        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        f(&mut state);
        if let Some(path) = &self.path {
            save_state(&state, path);
        }
    }

    fn task_state(&self, task_id: &str) -> Option<TaskState> {
        self.state
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .task_state(task_id)
    }

    fn snapshot(&self) -> RunState {
        self.state.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

fn save_state(state: &RunState, path: &Path) {
    if let Err(e) = state.save(path) {
        log::warn!("Failed to save run state to {}: {}", path.display(), e);
    }
}

/// Everything a spawned task attempt loop needs, owned
struct AttemptLoop {
    task: Arc<dyn Task>,
    db: Arc<dyn Database>,
    dag_id: String,
    run_id: String,
    logical_date: DateTime<Utc>,
    retry: RetryPolicy,
    cancelled: Arc<AtomicBool>,
    state: StateHandle,
}

impl AttemptLoop {
    async fn run(self) -> TaskRunResult {
        let task_id = self.task.task_id().to_string();
        let started = Instant::now();
        let max_attempts = self.retry.max_attempts();
        let mut attempt = 0;

        loop {
            attempt += 1;
            self.state
                .update(|s| s.set_task_state(&task_id, TaskState::Running));
            log::info!(
                "Running task {} (attempt {}/{})",
                task_id,
                attempt,
                max_attempts
            );

            let ctx = TaskContext {
                dag_id: &self.dag_id,
                run_id: &self.run_id,
                logical_date: self.logical_date,
                try_number: attempt,
                db: self.db.as_ref(),
            };

            let error = match self.task.execute(&ctx).await {
                Ok(()) => {
                    let duration = started.elapsed();
                    log::info!("Task {} succeeded in {}ms", task_id, duration.as_millis());
                    self.state.update(|s| {
                        s.mark_completed(&task_id, duration.as_millis() as u64, attempt)
                    });
                    return TaskRunResult {
                        task_id,
                        kind: self.task.kind(),
                        state: TaskState::Success,
                        attempts: attempt,
                        duration,
                        error: None,
                    };
                }
                Err(e) => e,
            };

            if attempt < max_attempts && !self.cancelled.load(Ordering::SeqCst) {
                log::warn!(
                    "Task {} failed on attempt {}/{}: {}. Retrying in {}s",
                    task_id,
                    attempt,
                    max_attempts,
                    error,
                    self.retry.delay.as_secs()
                );
                self.state
                    .update(|s| s.set_task_state(&task_id, TaskState::UpForRetry));
                tokio::time::sleep(self.retry.delay).await;
                if !self.cancelled.load(Ordering::SeqCst) {
                    continue;
                }
                log::warn!("Run cancelled while task {} was waiting to retry", task_id);
            }

            let message = error.to_string();
            log::error!("Task {} failed after {} attempt(s): {}", task_id, attempt, message);
            self.state
                .update(|s| s.mark_failed(&task_id, &message, attempt));
            return TaskRunResult {
                task_id,
                kind: self.task.kind(),
                state: TaskState::Failed,
                attempts: attempt,
                duration: started.elapsed(),
                error: Some(message),
            };
        }
    }
}

impl WorkflowRunner {
    pub fn new(graph: Arc<WorkflowGraph>, db: Arc<dyn Database>, retry: RetryPolicy) -> Self {
        Self {
            graph,
            db,
            retry,
            cancelled: Arc::new(AtomicBool::new(false)),
            on_task_finished: None,
        }
    }

    /// Invoke `callback` whenever a task reaches a final state
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.on_task_finished = Some(callback);
        self
    }

    /// Flag that, once set, stops the run before the next level starts.
    ///
    /// Tasks already running finish their current attempt but are not
    /// retried.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    fn notify(&self, result: &TaskRunResult) {
        if let Some(callback) = &self.on_task_finished {
            callback(result);
        }
    }

    /// Execute one run for `logical_date`
    pub async fn run(
        &self,
        logical_date: DateTime<Utc>,
        options: &RunOptions,
    ) -> WorkflowResult<RunReport> {
        let run_start = Instant::now();
        let dag = self.graph.dag();

        let selected: Vec<TaskId> = match &options.selection {
            Some(selector) => dag.select(selector)?,
            None => dag.topological_order()?,
        };
        let selected_set: HashSet<&str> = selected.iter().map(|t| t.as_str()).collect();
        let levels = dag.execution_levels()?;

        let initial = RunState::new(
            self.graph.dag_id(),
            logical_date,
            selected.iter().map(|t| t.to_string()).collect(),
            options.selection.clone(),
        );
        let run_id = initial.run_id.clone();
        let state = StateHandle {
            state: Arc::new(Mutex::new(initial)),
            path: options.state_path.clone().map(Arc::new),
        };
        state.update(|_| {});

        log::info!(
            "Starting run {} of {} for {} ({} tasks, {} levels, {} threads)",
            run_id,
            self.graph.dag_id(),
            logical_date.to_rfc3339(),
            selected.len(),
            levels.len(),
            options.threads
        );

        let semaphore = Arc::new(Semaphore::new(options.threads.max(1)));
        let mut results = Vec::with_capacity(selected.len());

        for level in &levels {
            if self.cancelled.load(Ordering::SeqCst) {
                log::warn!("Run {} cancelled; remaining tasks stay pending", run_id);
                break;
            }

            let mut handles = Vec::new();
            for task_id in level {
                if !selected_set.contains(task_id.as_str()) {
                    continue;
                }
                let Some(task) = self.graph.task(task_id) else {
                    continue;
                };

                let blocked = dag.dependencies(task_id).into_iter().find(|dep| {
                    selected_set.contains(dep.as_str())
                        && state.task_state(dep) != Some(TaskState::Success)
                });
                if let Some(dep) = blocked {
                    log::warn!("Skipping {}: upstream task {} did not succeed", task_id, dep);
                    state.update(|s| s.mark_upstream_failed(task_id));
                    let result = TaskRunResult {
                        task_id: task_id.to_string(),
                        kind: task.kind(),
                        state: TaskState::UpstreamFailed,
                        attempts: 0,
                        duration: Duration::ZERO,
                        error: None,
                    };
                    self.notify(&result);
                    results.push(result);
                    continue;
                }

                let attempt_loop = AttemptLoop {
                    task: Arc::clone(task),
                    db: Arc::clone(&self.db),
                    dag_id: self.graph.dag_id().to_string(),
                    run_id: run_id.clone(),
                    logical_date,
                    retry: self.retry,
                    cancelled: Arc::clone(&self.cancelled),
                    state: state.clone(),
                };
                let semaphore = Arc::clone(&semaphore);
                let callback = self.on_task_finished.clone();
                let kind = task.kind();

                let handle = tokio::spawn(async move {
                    let result = match semaphore.acquire_owned().await {
                        Ok(_permit) => attempt_loop.run().await,
                        Err(e) => TaskRunResult {
                            task_id: attempt_loop.task.task_id().to_string(),
                            kind: attempt_loop.task.kind(),
                            state: TaskState::Failed,
                            attempts: 0,
                            duration: Duration::ZERO,
                            error: Some(e.to_string()),
                        },
                    };
                    if let Some(callback) = callback {
                        callback(&result);
                    }
                    result
                });
                handles.push((task_id.clone(), kind, handle));
            }

            // Wait for the whole level before starting the next one
            for (task_id, kind, handle) in handles {
                let result = match handle.await {
                    Ok(result) => result,
                    Err(join_error) => {
                        let error = TaskError::Aborted {
                            task_id: task_id.to_string(),
                            message: join_error.to_string(),
                        };
                        log::error!("{}", error);
                        let message = error.to_string();
                        state.update(|s| s.mark_failed(&task_id, &message, 1));
                        let result = TaskRunResult {
                            task_id: task_id.to_string(),
                            kind,
                            state: TaskState::Failed,
                            attempts: 1,
                            duration: Duration::ZERO,
                            error: Some(message),
                        };
                        self.notify(&result);
                        result
                    }
                };
                results.push(result);
            }
        }

        // A cancel that arrives after the last task finished changes nothing
        let cancelled = self.cancelled.load(Ordering::SeqCst);
        state.update(|s| {
            if cancelled && !s.pending_tasks.is_empty() {
                s.mark_run_cancelled()
            } else {
                s.mark_run_completed()
            }
        });

        let final_state = state.snapshot();
        let summary = final_state.summary();
        log::info!(
            "Run {} finished with status {:?}: {} succeeded, {} failed, {} upstream failed, {} pending",
            run_id,
            final_state.status,
            summary.completed,
            summary.failed,
            summary.upstream_failed,
            summary.pending
        );

        Ok(RunReport {
            state: final_state,
            results,
            duration: run_start.elapsed(),
        })
    }
}

#[cfg(test)]
#[path = "runner_test.rs"]
mod tests;
