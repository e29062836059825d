//! No-op start and end nodes

use crate::error::TaskError;
use crate::task::{Task, TaskContext, TaskKind};
use async_trait::async_trait;
use sf_core::TaskId;

/// A task that does nothing, giving the graph a single entry and exit
#[derive(Debug, Clone)]
pub struct MarkerTask {
    id: TaskId,
}

impl MarkerTask {
    pub fn new(id: TaskId) -> Self {
        Self { id }
    }
}

#[async_trait]
impl Task for MarkerTask {
    fn task_id(&self) -> &TaskId {
        &self.id
    }

    fn kind(&self) -> TaskKind {
        TaskKind::Marker
    }

    async fn execute(&self, _ctx: &TaskContext<'_>) -> Result<(), TaskError> {
        Ok(())
    }
}
