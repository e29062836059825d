use super::*;
use crate::task::TaskKind;
use sf_core::RecordFormat;

fn ids(tasks: &[TaskId]) -> Vec<&str> {
    tasks.iter().map(|t| t.as_str()).collect()
}

#[test]
fn test_sparkify_graph_levels() {
    let graph = sparkify_workflow(&WorkflowConfig::default()).unwrap();
    assert_eq!(graph.dag_id(), "sparkify_etl");
    assert_eq!(graph.len(), 10);

    let levels = graph.dag().execution_levels().unwrap();
    let levels: Vec<Vec<&str>> = levels.iter().map(|l| ids(l)).collect();
    assert_eq!(
        levels,
        vec![
            vec![START_EXECUTION],
            vec![STAGE_EVENTS, STAGE_SONGS],
            vec![LOAD_SONGPLAYS],
            vec![LOAD_USERS, LOAD_SONGS, LOAD_ARTISTS, LOAD_TIME],
            vec![RUN_QUALITY_CHECKS],
            vec![END_EXECUTION],
        ]
    );
}

#[test]
fn test_fact_load_precedes_every_dimension() {
    let graph = sparkify_workflow(&WorkflowConfig::default()).unwrap();
    for (id, _, _) in DIMENSIONS {
        assert_eq!(ids(&graph.upstream_of(id)), vec![LOAD_SONGPLAYS]);
    }
    assert_eq!(
        ids(&graph.upstream_of(LOAD_SONGPLAYS)),
        vec![STAGE_EVENTS, STAGE_SONGS]
    );
}

#[test]
fn test_task_kinds_and_tables() {
    let graph = sparkify_workflow(&WorkflowConfig::default()).unwrap();

    let kind = |id: &str| graph.task(id).unwrap().kind();
    assert_eq!(kind(START_EXECUTION), TaskKind::Marker);
    assert_eq!(kind(STAGE_EVENTS), TaskKind::Staging);
    assert_eq!(kind(LOAD_SONGPLAYS), TaskKind::FactLoad);
    assert_eq!(kind(LOAD_TIME), TaskKind::DimensionLoad);
    assert_eq!(kind(RUN_QUALITY_CHECKS), TaskKind::DataQuality);
    assert_eq!(kind(END_EXECUTION), TaskKind::Marker);

    let table = |id: &str| graph.task(id).unwrap().target_table().map(|t| t.to_string());
    assert_eq!(table(STAGE_EVENTS).as_deref(), Some("staging_events"));
    assert_eq!(table(STAGE_SONGS).as_deref(), Some("staging_songs"));
    assert_eq!(table(LOAD_SONGPLAYS).as_deref(), Some("songplays"));
    assert_eq!(table(LOAD_TIME).as_deref(), Some("time"));
    assert_eq!(table(RUN_QUALITY_CHECKS), None);
}

#[test]
fn test_quality_task_carries_configured_checks() {
    let graph = sparkify_workflow(&WorkflowConfig::default()).unwrap();
    let checks = graph.task(RUN_QUALITY_CHECKS).unwrap();
    assert_eq!(checks.queries().len(), 7);
}

#[test]
fn test_staging_specs_follow_config() {
    let mut config = WorkflowConfig::default();
    config.storage.region = "eu-west-1".to_string();
    config.staging.songs.copy_options = vec!["maximum_depth = 2".to_string()];

    let task = staging_task(
        STAGE_SONGS,
        templates::STAGING_SONGS,
        &config.staging.songs,
        &config.storage,
    );
    let spec = task.spec();

    assert_eq!(spec.region, "eu-west-1");
    assert_eq!(spec.format, RecordFormat::Auto);
    assert_eq!(spec.copy_options, vec!["maximum_depth = 2".to_string()]);
    assert_eq!(spec.source.uri(), "s3://udacity-dend/song_data");
}
