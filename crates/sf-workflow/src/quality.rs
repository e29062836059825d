//! Data-quality task

use crate::error::TaskError;
use crate::task::{Task, TaskContext, TaskKind};
use async_trait::async_trait;
use sf_core::{QualityCheckConfig, TaskId};
use sf_quality::CheckRunner;

/// Runs every configured check and fails if any of them failed
#[derive(Debug, Clone)]
pub struct DataQualityTask {
    id: TaskId,
    checks: Vec<QualityCheckConfig>,
}

impl DataQualityTask {
    pub fn new(id: TaskId, checks: Vec<QualityCheckConfig>) -> Self {
        Self { id, checks }
    }

    pub fn checks(&self) -> &[QualityCheckConfig] {
        &self.checks
    }
}

#[async_trait]
impl Task for DataQualityTask {
    fn task_id(&self) -> &TaskId {
        &self.id
    }

    fn kind(&self) -> TaskKind {
        TaskKind::DataQuality
    }

    fn queries(&self) -> Vec<&str> {
        self.checks.iter().map(|c| c.check_sql.as_str()).collect()
    }

    async fn execute(&self, ctx: &TaskContext<'_>) -> Result<(), TaskError> {
        CheckRunner::new(ctx.db)
            .run_checks(&self.checks)
            .await
            .into_result()?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "quality_test.rs"]
mod tests;
