//! The Sparkify workflow definition

use crate::error::WorkflowResult;
use crate::graph::{WorkflowBuilder, WorkflowGraph};
use crate::load::{DimensionLoadTask, FactLoadTask, LoadSpec};
use crate::marker::MarkerTask;
use crate::quality::DataQualityTask;
use crate::staging::{StagingSpec, StagingTask};
use sf_core::{StagingSource, StorageConfig, TableName, TaskId, WorkflowConfig};
use sf_sql::templates;
use std::sync::Arc;

pub const START_EXECUTION: &str = "start_execution";
pub const STAGE_EVENTS: &str = "Stage_events";
pub const STAGE_SONGS: &str = "Stage_songs";
pub const LOAD_SONGPLAYS: &str = "Load_songplays_table";
pub const LOAD_USERS: &str = "Load_users_table";
pub const LOAD_SONGS: &str = "Load_songs_table";
pub const LOAD_ARTISTS: &str = "Load_artists_table";
pub const LOAD_TIME: &str = "Load_time_table";
pub const RUN_QUALITY_CHECKS: &str = "Run_data_quality_checks";
pub const END_EXECUTION: &str = "end_execution";

/// Dimension loads: task id, table, SELECT
const DIMENSIONS: [(&str, &str, &str); 4] = [
    (LOAD_USERS, templates::USERS, templates::USER_TABLE_INSERT),
    (LOAD_SONGS, templates::SONGS, templates::SONG_TABLE_INSERT),
    (LOAD_ARTISTS, templates::ARTISTS, templates::ARTIST_TABLE_INSERT),
    (LOAD_TIME, templates::TIME, templates::TIME_TABLE_INSERT),
];

fn staging_task(
    id: &str,
    table: &str,
    source: &StagingSource,
    storage: &StorageConfig,
) -> Arc<StagingTask> {
    let spec = StagingSpec {
        table: TableName::new(table),
        source: source.source.clone(),
        format: source.format.clone(),
        region: storage.region.clone(),
        copy_options: source.copy_options.clone(),
    };
    Arc::new(StagingTask::new(TaskId::new(id), spec, storage.clone()))
}

/// Build the Sparkify ETL graph:
///
/// ```text
/// start_execution
///   -> Stage_events, Stage_songs
///   -> Load_songplays_table
///   -> Load_users_table, Load_songs_table, Load_artists_table, Load_time_table
///   -> Run_data_quality_checks
///   -> end_execution
/// ```
pub fn sparkify_workflow(config: &WorkflowConfig) -> WorkflowResult<WorkflowGraph> {
    let mut builder = WorkflowBuilder::new(config.name.clone());

    builder.add_task(Arc::new(MarkerTask::new(TaskId::new(START_EXECUTION))))?;
    builder.add_task(staging_task(
        STAGE_EVENTS,
        templates::STAGING_EVENTS,
        &config.staging.events,
        &config.storage,
    ))?;
    builder.add_task(staging_task(
        STAGE_SONGS,
        templates::STAGING_SONGS,
        &config.staging.songs,
        &config.storage,
    ))?;
    builder.add_task(Arc::new(FactLoadTask::new(
        TaskId::new(LOAD_SONGPLAYS),
        TableName::new(templates::SONGPLAYS),
        templates::SONGPLAY_TABLE_INSERT,
    )))?;
    for (id, table, select) in DIMENSIONS {
        builder.add_task(Arc::new(DimensionLoadTask::new(
            TaskId::new(id),
            LoadSpec::new(TableName::new(table), select, true),
        )))?;
    }
    builder.add_task(Arc::new(DataQualityTask::new(
        TaskId::new(RUN_QUALITY_CHECKS),
        config.quality_checks.clone(),
    )))?;
    builder.add_task(Arc::new(MarkerTask::new(TaskId::new(END_EXECUTION))))?;

    let dimension_ids = DIMENSIONS.map(|(id, _, _)| id);
    builder
        .set_downstream_all(START_EXECUTION, &[STAGE_EVENTS, STAGE_SONGS])
        .set_upstream_all(LOAD_SONGPLAYS, &[STAGE_EVENTS, STAGE_SONGS])
        .set_downstream_all(LOAD_SONGPLAYS, &dimension_ids)
        .set_upstream_all(RUN_QUALITY_CHECKS, &dimension_ids)
        .set_downstream(RUN_QUALITY_CHECKS, END_EXECUTION);

    builder.build()
}

#[cfg(test)]
#[path = "builder_test.rs"]
mod tests;
