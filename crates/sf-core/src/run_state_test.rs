use super::*;
use chrono::TimeZone;
use tempfile::tempdir;

fn new_state(tasks: &[&str]) -> RunState {
    RunState::new(
        "sparkify_etl",
        Utc.with_ymd_and_hms(2020, 1, 1, 9, 0, 0).unwrap(),
        tasks.iter().map(|t| t.to_string()).collect(),
        None,
    )
}

#[test]
fn test_run_state_new() {
    let state = new_state(&["Stage_events", "Stage_songs"]);

    assert_eq!(state.pending_tasks.len(), 2);
    assert!(state.completed_tasks.is_empty());
    assert!(state.failed_tasks.is_empty());
    assert_eq!(state.status, RunStatus::Running);
    assert_eq!(state.task_state("Stage_events"), Some(TaskState::Pending));
    assert_eq!(state.task_state("Load_time_table"), None);
}

#[test]
fn test_mark_completed() {
    let mut state = new_state(&["Stage_events", "Stage_songs"]);

    state.mark_completed("Stage_events", 1500, 1);

    assert_eq!(state.pending_tasks, vec!["Stage_songs".to_string()]);
    assert_eq!(state.completed_tasks.len(), 1);
    assert_eq!(state.completed_tasks[0].task_id, "Stage_events");
    assert_eq!(state.completed_tasks[0].duration_ms, 1500);
    assert_eq!(state.task_state("Stage_events"), Some(TaskState::Success));
}

#[test]
fn test_failure_and_upstream_failed() {
    let mut state = new_state(&["Stage_events", "Load_songplays_table", "end_execution"]);

    state.mark_failed("Stage_events", "[W001] Failed to copy into staging_events", 5);
    state.mark_upstream_failed("Load_songplays_table");
    state.mark_upstream_failed("end_execution");
    state.mark_run_completed();

    assert_eq!(state.failed_tasks[0].task_id, "Stage_events");
    assert_eq!(state.failed_tasks[0].attempts, 5);
    assert_eq!(
        state.upstream_failed_tasks(),
        vec!["Load_songplays_table".to_string(), "end_execution".to_string()]
    );
    assert!(state.pending_tasks.is_empty());
    assert_eq!(state.status, RunStatus::Failed);
}

#[test]
fn test_run_completed_when_all_succeed() {
    let mut state = new_state(&["start_execution", "end_execution"]);
    state.mark_completed("start_execution", 0, 1);
    state.mark_completed("end_execution", 0, 1);
    state.mark_run_completed();
    assert_eq!(state.status, RunStatus::Completed);
}

#[test]
fn test_save_and_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("target").join("run_state.json");

    let mut state = new_state(&["Stage_events", "Stage_songs"]);
    state.set_task_state("Stage_songs", TaskState::UpForRetry);
    state.mark_completed("Stage_events", 1500, 2);
    state.save(&path).unwrap();

    assert!(!path.with_extension("json.tmp").exists());

    let loaded = RunState::load(&path).unwrap().unwrap();
    assert_eq!(loaded.run_id, state.run_id);
    assert_eq!(loaded.dag_id, "sparkify_etl");
    assert_eq!(loaded.logical_date, state.logical_date);
    assert_eq!(loaded.completed_tasks[0].attempts, 2);
    assert_eq!(loaded.task_state("Stage_songs"), Some(TaskState::UpForRetry));
}

#[test]
fn test_load_missing_returns_none() {
    let dir = tempdir().unwrap();
    assert!(RunState::load(&dir.path().join("nope.json")).unwrap().is_none());
}

#[test]
fn test_task_state_serializes_snake_case() {
    let json = serde_json::to_string(&TaskState::UpstreamFailed).unwrap();
    assert_eq!(json, "\"upstream_failed\"");
    assert_eq!(TaskState::UpForRetry.to_string(), "up_for_retry");
}

#[test]
fn test_summary() {
    let mut state = new_state(&["a", "b", "c", "d"]);

    state.mark_completed("a", 1000, 1);
    state.mark_completed("b", 2000, 1);
    state.mark_failed("c", "error", 5);

    let summary = state.summary();
    assert_eq!(
        summary,
        RunStateSummary {
            completed: 2,
            failed: 1,
            upstream_failed: 0,
            pending: 1,
            total_duration_ms: 3000,
        }
    );
}
