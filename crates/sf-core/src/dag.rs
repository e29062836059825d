//! Task dependency graph, topological ordering and execution levels

use crate::error::{CoreError, CoreResult};
use crate::task_id::TaskId;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{HashMap, HashSet};

/// A directed acyclic graph of task dependencies.
///
/// Edges point from a task to the tasks that run after it, so a
/// topological sort yields upstream tasks first. Node indices follow
/// insertion order, which is also the tie-break order everywhere a set of
/// tasks is returned.
#[derive(Debug, Clone)]
pub struct TaskDag {
    graph: DiGraph<TaskId, ()>,
    node_map: HashMap<TaskId, NodeIndex>,
}

impl TaskDag {
    /// Create a new empty DAG
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            node_map: HashMap::new(),
        }
    }

    /// Add a task to the DAG, returning the existing node if already present
    pub fn add_task(&mut self, name: &str) -> CoreResult<NodeIndex> {
        if let Some(&idx) = self.node_map.get(name) {
            return Ok(idx);
        }
        let id = TaskId::try_new(name).ok_or_else(|| CoreError::EmptyName {
            context: "task id in DAG".into(),
        })?;
        let idx = self.graph.add_node(id.clone());
        self.node_map.insert(id, idx);
        Ok(idx)
    }

    /// Record that `downstream` runs after `upstream`.
    ///
    /// Both tasks must already be in the DAG. Adding the same edge twice is
    /// a no-op.
    pub fn add_dependency(&mut self, downstream: &str, upstream: &str) -> CoreResult<()> {
        let up = self.index_of(upstream)?;
        let down = self.index_of(downstream)?;
        if self.graph.find_edge(up, down).is_none() {
            self.graph.add_edge(up, down, ());
        }
        Ok(())
    }

    fn index_of(&self, name: &str) -> CoreResult<NodeIndex> {
        self.node_map
            .get(name)
            .copied()
            .ok_or_else(|| CoreError::TaskNotFound {
                name: name.to_string(),
            })
    }

    /// Validate the DAG has no cycles
    pub fn validate(&self) -> CoreResult<()> {
        toposort(&self.graph, None).map(|_| ()).map_err(|cycle| {
            CoreError::CircularDependency {
                cycle: self.find_cycle_path(cycle.node_id()),
            }
        })
    }

    /// Validate that the DAG has exactly one entry task and one exit task
    pub fn validate_single_entry_exit(&self) -> CoreResult<()> {
        if self.graph.node_count() == 0 {
            return Err(CoreError::InvalidGraphShape {
                message: "workflow has no tasks".to_string(),
            });
        }
        let sources = self.sources();
        if sources.len() != 1 {
            return Err(CoreError::InvalidGraphShape {
                message: format!(
                    "expected exactly one start task, found {}: {}",
                    sources.len(),
                    join_ids(&sources)
                ),
            });
        }
        let sinks = self.sinks();
        if sinks.len() != 1 {
            return Err(CoreError::InvalidGraphShape {
                message: format!(
                    "expected exactly one end task, found {}: {}",
                    sinks.len(),
                    join_ids(&sinks)
                ),
            });
        }
        Ok(())
    }

    /// Find a cycle path starting from a node for error reporting
    fn find_cycle_path(&self, start: NodeIndex) -> String {
        let mut path = vec![self.graph[start].to_string()];
        let mut current = start;
        let mut visited = HashSet::new();
        visited.insert(current);

        while let Some(edge) = self.graph.edges(current).next() {
            let target = edge.target();
            path.push(self.graph[target].to_string());
            if target == start || !visited.insert(target) {
                break;
            }
            current = target;
        }

        path.join(" -> ")
    }

    /// Get tasks in topological order (upstream first)
    pub fn topological_order(&self) -> CoreResult<Vec<TaskId>> {
        let levels = self.execution_levels()?;
        Ok(levels.into_iter().flatten().collect())
    }

    /// Group tasks into levels that can run concurrently.
    ///
    /// A task's level is one more than the deepest of its upstream tasks, so
    /// every task in level `n` depends only on tasks in levels below `n`.
    pub fn execution_levels(&self) -> CoreResult<Vec<Vec<TaskId>>> {
        let order = toposort(&self.graph, None).map_err(|cycle| CoreError::CircularDependency {
            cycle: self.find_cycle_path(cycle.node_id()),
        })?;

        let mut depth: HashMap<NodeIndex, usize> = HashMap::new();
        for idx in &order {
            let level = self
                .graph
                .neighbors_directed(*idx, Direction::Incoming)
                .filter_map(|up| depth.get(&up))
                .map(|d| d + 1)
                .max()
                .unwrap_or(0);
            depth.insert(*idx, level);
        }

        let level_count = depth.values().max().map_or(0, |d| d + 1);
        let mut levels: Vec<Vec<NodeIndex>> = vec![Vec::new(); level_count];
        for (idx, level) in depth {
            levels[level].push(idx);
        }

        Ok(levels
            .into_iter()
            .map(|mut level| {
                level.sort();
                level.into_iter().map(|idx| self.graph[idx].clone()).collect()
            })
            .collect())
    }

    /// Tasks with no upstream dependencies
    pub fn sources(&self) -> Vec<TaskId> {
        self.boundary(Direction::Incoming)
    }

    /// Tasks nothing depends on
    pub fn sinks(&self) -> Vec<TaskId> {
        self.boundary(Direction::Outgoing)
    }

    fn boundary(&self, direction: Direction) -> Vec<TaskId> {
        self.graph
            .node_indices()
            .filter(|idx| {
                self.graph
                    .neighbors_directed(*idx, direction)
                    .next()
                    .is_none()
            })
            .map(|idx| self.graph[idx].clone())
            .collect()
    }

    /// Direct upstream tasks of `task`
    pub fn dependencies(&self, task: &str) -> Vec<TaskId> {
        self.neighbors(task, Direction::Incoming)
    }

    fn neighbors(&self, task: &str, direction: Direction) -> Vec<TaskId> {
        let Some(&idx) = self.node_map.get(task) else {
            return Vec::new();
        };
        let mut found: Vec<NodeIndex> = self.graph.neighbors_directed(idx, direction).collect();
        found.sort();
        found.into_iter().map(|n| self.graph[n].clone()).collect()
    }

    /// All transitive upstream tasks of `task`
    pub fn ancestors(&self, task: &str) -> Vec<TaskId> {
        self.reachable(task, Direction::Incoming)
    }

    /// All transitive downstream tasks of `task`
    pub fn descendants(&self, task: &str) -> Vec<TaskId> {
        self.reachable(task, Direction::Outgoing)
    }

    fn reachable(&self, task: &str, direction: Direction) -> Vec<TaskId> {
        let Some(&start) = self.node_map.get(task) else {
            return Vec::new();
        };
        let mut visited = HashSet::new();
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            for neighbor in self.graph.neighbors_directed(current, direction) {
                if visited.insert(neighbor) {
                    stack.push(neighbor);
                }
            }
        }
        let mut found: Vec<NodeIndex> = visited.into_iter().collect();
        found.sort();
        found.into_iter().map(|n| self.graph[n].clone()).collect()
    }

    /// Get tasks matching a selector, in topological order.
    ///
    /// Supports `task`, `+task` (task and everything upstream) and `task+`
    /// (task and everything downstream). Both markers may be combined.
    pub fn select(&self, selector: &str) -> CoreResult<Vec<TaskId>> {
        let upstream = selector.starts_with('+');
        let downstream = selector.len() > 1 && selector.ends_with('+');
        let name = selector.trim_start_matches('+').trim_end_matches('+');

        if name.is_empty() {
            return Err(CoreError::InvalidSelector {
                selector: selector.to_string(),
                reason: "selector does not name a task".to_string(),
            });
        }
        if !self.contains(name) {
            return Err(CoreError::TaskNotFound {
                name: name.to_string(),
            });
        }

        let mut selected: HashSet<TaskId> = HashSet::new();
        selected.insert(TaskId::new(name));
        if upstream {
            selected.extend(self.ancestors(name));
        }
        if downstream {
            selected.extend(self.descendants(name));
        }

        Ok(self
            .topological_order()?
            .into_iter()
            .filter(|t| selected.contains(t))
            .collect())
    }

    /// All task ids, in insertion order
    pub fn tasks(&self) -> Vec<TaskId> {
        self.graph
            .node_indices()
            .map(|idx| self.graph[idx].clone())
            .collect()
    }

    /// Check if a task exists in the DAG
    pub fn contains(&self, task: &str) -> bool {
        self.node_map.contains_key(task)
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Every edge as (upstream, downstream), in insertion order
    pub fn edges(&self) -> Vec<(TaskId, TaskId)> {
        self.graph
            .edge_references()
            .map(|e| (self.graph[e.source()].clone(), self.graph[e.target()].clone()))
            .collect()
    }
}

impl Default for TaskDag {
    fn default() -> Self {
        Self::new()
    }
}

fn join_ids(ids: &[TaskId]) -> String {
    ids.iter().map(|id| id.as_str()).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
#[path = "dag_test.rs"]
mod tests;
