use super::*;
use crate::error::WorkflowError;
use crate::marker::MarkerTask;

fn marker(id: &str) -> Arc<dyn Task> {
    Arc::new(MarkerTask::new(TaskId::new(id)))
}

fn builder_with(ids: &[&str]) -> WorkflowBuilder {
    let mut builder = WorkflowBuilder::new("test_dag");
    for id in ids {
        builder.add_task(marker(id)).unwrap();
    }
    builder
}

#[test]
fn test_build_linear_graph() {
    let mut builder = builder_with(&["start", "middle", "end"]);
    builder
        .set_downstream("start", "middle")
        .set_downstream("middle", "end");
    let graph = builder.build().unwrap();

    assert_eq!(graph.dag_id(), "test_dag");
    assert_eq!(graph.len(), 3);
    let order: Vec<String> = graph
        .tasks()
        .unwrap()
        .iter()
        .map(|t| t.task_id().to_string())
        .collect();
    assert_eq!(order, vec!["start", "middle", "end"]);
    assert_eq!(graph.upstream_of("end"), vec![TaskId::new("middle")]);
    assert!(graph.task("middle").is_some());
    assert!(graph.task("missing").is_none());
}

#[test]
fn test_fan_out_and_fan_in() {
    let mut builder = builder_with(&["start", "a", "b", "end"]);
    builder
        .set_downstream_all("start", &["a", "b"])
        .set_upstream_all("end", &["a", "b"]);
    let graph = builder.build().unwrap();

    let levels = graph.dag().execution_levels().unwrap();
    assert_eq!(levels.len(), 3);
    assert_eq!(levels[1].len(), 2);
}

#[test]
fn test_duplicate_task_rejected() {
    let mut builder = builder_with(&["start"]);
    let err = builder.add_task(marker("start")).unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::Core(CoreError::DuplicateTask { ref name }) if name == "start"
    ));
}

#[test]
fn test_unknown_task_rejected() {
    let mut builder = builder_with(&["start", "end"]);
    builder
        .set_downstream("start", "end")
        .set_downstream("start", "ghost");
    let err = builder.build().unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::Core(CoreError::TaskNotFound { ref name }) if name == "ghost"
    ));
}

#[test]
fn test_cycle_rejected() {
    let mut builder = builder_with(&["start", "a", "b", "end"]);
    builder
        .set_downstream("start", "a")
        .set_downstream("a", "b")
        .set_downstream("b", "a")
        .set_downstream("b", "end");
    let err = builder.build().unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::Core(CoreError::CircularDependency { .. })
    ));
}

#[test]
fn test_multiple_sources_rejected() {
    let mut builder = builder_with(&["start", "other_start", "end"]);
    builder
        .set_downstream("start", "end")
        .set_downstream("other_start", "end");
    let err = builder.build().unwrap_err();
    assert!(err.to_string().contains("[E008]"));
}

#[test]
fn test_multiple_sinks_rejected() {
    let mut builder = builder_with(&["start", "end", "other_end"]);
    builder
        .set_downstream("start", "end")
        .set_downstream("start", "other_end");
    let err = builder.build().unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::Core(CoreError::InvalidGraphShape { .. })
    ));
}

#[test]
fn test_empty_graph_rejected() {
    assert!(WorkflowBuilder::new("empty").build().is_err());
}
