//! Workflow graph: task nodes plus their dependency DAG

use crate::error::WorkflowResult;
use crate::task::Task;
use sf_core::{CoreError, TaskDag, TaskId};
use std::collections::HashMap;
use std::sync::Arc;

/// Collects tasks and edges, then checks the graph invariants once in
/// [`WorkflowBuilder::build`].
#[derive(Debug)]
pub struct WorkflowBuilder {
    dag_id: String,
    tasks: HashMap<TaskId, Arc<dyn Task>>,
    /// Insertion order, so node indices are stable across builds
    order: Vec<TaskId>,
    edges: Vec<(String, String)>,
}

impl WorkflowBuilder {
    pub fn new(dag_id: impl Into<String>) -> Self {
        Self {
            dag_id: dag_id.into(),
            tasks: HashMap::new(),
            order: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Register a task. Fails if another task already uses the same id.
    pub fn add_task(&mut self, task: Arc<dyn Task>) -> WorkflowResult<&mut Self> {
        let id = task.task_id().clone();
        if self.tasks.contains_key(&id) {
            return Err(CoreError::DuplicateTask {
                name: id.to_string(),
            }
            .into());
        }
        self.order.push(id.clone());
        self.tasks.insert(id, task);
        Ok(self)
    }

    /// Declare that `upstream` must succeed before `downstream` starts.
    ///
    /// Unknown ids are reported by [`build`](Self::build).
    pub fn set_downstream(&mut self, upstream: &str, downstream: &str) -> &mut Self {
        self.edges
            .push((upstream.to_string(), downstream.to_string()));
        self
    }

    /// Fan out: `upstream` before every task in `downstream`
    pub fn set_downstream_all(&mut self, upstream: &str, downstream: &[&str]) -> &mut Self {
        for d in downstream {
            self.set_downstream(upstream, d);
        }
        self
    }

    /// Fan in: every task in `upstream` before `downstream`
    pub fn set_upstream_all(&mut self, downstream: &str, upstream: &[&str]) -> &mut Self {
        for u in upstream {
            self.set_downstream(u, downstream);
        }
        self
    }

    /// Build the immutable graph.
    ///
    /// Rejects edges naming unknown tasks, cycles, and graphs without
    /// exactly one start task and one end task.
    pub fn build(self) -> WorkflowResult<WorkflowGraph> {
        let mut dag = TaskDag::new();
        for id in &self.order {
            dag.add_task(id.as_str())?;
        }
        for (upstream, downstream) in &self.edges {
            dag.add_dependency(downstream, upstream)?;
        }
        dag.validate()?;
        dag.validate_single_entry_exit()?;

        log::debug!(
            "Built workflow '{}' with {} tasks and {} edges",
            self.dag_id,
            dag.len(),
            dag.edges().len()
        );

        Ok(WorkflowGraph {
            dag_id: self.dag_id,
            dag,
            tasks: self.tasks,
        })
    }
}

/// An immutable, validated workflow
#[derive(Debug, Clone)]
pub struct WorkflowGraph {
    dag_id: String,
    dag: TaskDag,
    tasks: HashMap<TaskId, Arc<dyn Task>>,
}

impl WorkflowGraph {
    pub fn dag_id(&self) -> &str {
        &self.dag_id
    }

    pub fn dag(&self) -> &TaskDag {
        &self.dag
    }

    pub fn task(&self, id: &str) -> Option<&Arc<dyn Task>> {
        self.tasks.get(id)
    }

    /// Tasks in topological order
    pub fn tasks(&self) -> WorkflowResult<Vec<Arc<dyn Task>>> {
        Ok(self
            .dag
            .topological_order()?
            .iter()
            .filter_map(|id| self.tasks.get(id).cloned())
            .collect())
    }

    /// Ids of the tasks `task` waits on
    pub fn upstream_of(&self, task: &str) -> Vec<TaskId> {
        self.dag.dependencies(task)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
#[path = "graph_test.rs"]
mod tests;
