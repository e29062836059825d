use super::*;

fn ids(tasks: &[TaskId]) -> Vec<&str> {
    tasks.iter().map(|t| t.as_str()).collect()
}

/// start -> {stage_a, stage_b} -> fact -> {dim_a, dim_b} -> check -> end
fn build_diamond_dag() -> TaskDag {
    let mut dag = TaskDag::new();
    for t in [
        "start", "stage_a", "stage_b", "fact", "dim_a", "dim_b", "check", "end",
    ] {
        dag.add_task(t).unwrap();
    }
    for (down, up) in [
        ("stage_a", "start"),
        ("stage_b", "start"),
        ("fact", "stage_a"),
        ("fact", "stage_b"),
        ("dim_a", "fact"),
        ("dim_b", "fact"),
        ("check", "dim_a"),
        ("check", "dim_b"),
        ("end", "check"),
    ] {
        dag.add_dependency(down, up).unwrap();
    }
    dag
}

#[test]
fn test_unknown_dependency_rejected() {
    let mut dag = TaskDag::new();
    dag.add_task("fact").unwrap();

    let result = dag.add_dependency("fact", "missing");
    assert!(matches!(result, Err(CoreError::TaskNotFound { name }) if name == "missing"));
}

#[test]
fn test_circular_dependency() {
    let mut dag = TaskDag::new();
    for t in ["a", "b", "c"] {
        dag.add_task(t).unwrap();
    }
    dag.add_dependency("a", "b").unwrap();
    dag.add_dependency("b", "c").unwrap();
    dag.add_dependency("c", "a").unwrap();

    assert!(matches!(
        dag.validate().unwrap_err(),
        CoreError::CircularDependency { .. }
    ));
    assert!(dag.topological_order().is_err());
}

#[test]
fn test_empty_task_id_rejected() {
    let mut dag = TaskDag::new();
    assert!(matches!(dag.add_task(""), Err(CoreError::EmptyName { .. })));
}

#[test]
fn test_execution_levels() {
    let dag = build_diamond_dag();
    let levels = dag.execution_levels().unwrap();
    let levels: Vec<Vec<&str>> = levels.iter().map(|l| ids(l)).collect();

    assert_eq!(
        levels,
        vec![
            vec!["start"],
            vec!["stage_a", "stage_b"],
            vec!["fact"],
            vec!["dim_a", "dim_b"],
            vec!["check"],
            vec!["end"],
        ]
    );
}

#[test]
fn test_levels_respect_longest_path() {
    // c depends on a directly and through b, so it must sit below b
    let mut dag = TaskDag::new();
    for t in ["a", "b", "c"] {
        dag.add_task(t).unwrap();
    }
    dag.add_dependency("b", "a").unwrap();
    dag.add_dependency("c", "a").unwrap();
    dag.add_dependency("c", "b").unwrap();

    let levels = dag.execution_levels().unwrap();
    assert_eq!(levels.len(), 3);
    assert_eq!(ids(&levels[2]), vec!["c"]);
}

#[test]
fn test_sources_and_sinks() {
    let dag = build_diamond_dag();
    assert_eq!(ids(&dag.sources()), vec!["start"]);
    assert_eq!(ids(&dag.sinks()), vec!["end"]);
    assert!(dag.validate_single_entry_exit().is_ok());
}

#[test]
fn test_multiple_sources_rejected() {
    let mut dag = TaskDag::new();
    for t in ["a", "b", "end"] {
        dag.add_task(t).unwrap();
    }
    dag.add_dependency("end", "a").unwrap();
    dag.add_dependency("end", "b").unwrap();

    let err = dag.validate_single_entry_exit().unwrap_err();
    assert!(matches!(err, CoreError::InvalidGraphShape { .. }));
    assert!(err.to_string().contains("start task"));
}

#[test]
fn test_multiple_sinks_rejected() {
    let mut dag = TaskDag::new();
    for t in ["start", "a", "b"] {
        dag.add_task(t).unwrap();
    }
    dag.add_dependency("a", "start").unwrap();
    dag.add_dependency("b", "start").unwrap();

    let err = dag.validate_single_entry_exit().unwrap_err();
    assert!(err.to_string().contains("end task"));
}

#[test]
fn test_empty_dag_rejected() {
    assert!(matches!(
        TaskDag::new().validate_single_entry_exit(),
        Err(CoreError::InvalidGraphShape { .. })
    ));
}

#[test]
fn test_duplicate_edge_is_noop() {
    let mut dag = TaskDag::new();
    dag.add_task("a").unwrap();
    dag.add_task("b").unwrap();
    dag.add_dependency("b", "a").unwrap();
    dag.add_dependency("b", "a").unwrap();
    assert_eq!(dag.edges().len(), 1);
}

#[test]
fn test_dependencies() {
    let dag = build_diamond_dag();
    assert_eq!(ids(&dag.dependencies("fact")), vec!["stage_a", "stage_b"]);
    assert_eq!(ids(&dag.dependencies("end")), vec!["check"]);
    assert!(dag.dependencies("missing").is_empty());
}

#[test]
fn test_ancestors_and_descendants() {
    let dag = build_diamond_dag();
    assert_eq!(
        ids(&dag.ancestors("fact")),
        vec!["start", "stage_a", "stage_b"]
    );
    assert_eq!(
        ids(&dag.descendants("dim_a")),
        vec!["check", "end"]
    );
}

#[test]
fn test_selector_ancestors() {
    let dag = build_diamond_dag();
    let selected = dag.select("+fact").unwrap();
    assert_eq!(ids(&selected), vec!["start", "stage_a", "stage_b", "fact"]);
}

#[test]
fn test_selector_descendants() {
    let dag = build_diamond_dag();
    let selected = dag.select("dim_b+").unwrap();
    assert_eq!(ids(&selected), vec!["dim_b", "check", "end"]);
}

#[test]
fn test_selector_single_task() {
    let dag = build_diamond_dag();
    assert_eq!(ids(&dag.select("check").unwrap()), vec!["check"]);
}

#[test]
fn test_selector_errors() {
    let dag = build_diamond_dag();
    assert!(matches!(
        dag.select("+"),
        Err(CoreError::InvalidSelector { .. })
    ));
    assert!(matches!(
        dag.select("nope+"),
        Err(CoreError::TaskNotFound { .. })
    ));
}
