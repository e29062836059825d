use super::*;
use chrono::Utc;
use sf_db::{Database, DuckDbBackend};
use sf_quality::QualityError;

fn ctx(db: &dyn Database) -> TaskContext<'_> {
    TaskContext {
        dag_id: "test_dag",
        run_id: "run-1",
        logical_date: Utc::now(),
        try_number: 1,
        db,
    }
}

fn task(checks: Vec<QualityCheckConfig>) -> DataQualityTask {
    DataQualityTask::new(TaskId::new("Run_data_quality_checks"), checks)
}

#[tokio::test]
async fn test_empty_check_list_succeeds() {
    let db = DuckDbBackend::in_memory().unwrap();
    assert!(task(vec![]).execute(&ctx(&db)).await.is_ok());
}

#[tokio::test]
async fn test_all_checks_evaluated_before_failing() {
    let db = DuckDbBackend::in_memory().unwrap();
    db.execute_batch("CREATE TABLE users (userid INTEGER); INSERT INTO users VALUES (1), (NULL);")
        .await
        .unwrap();

    let checks = vec![
        QualityCheckConfig::new("SELECT COUNT(*) FROM users WHERE userid IS NULL", 0_i64),
        QualityCheckConfig::new("SELECT COUNT(*) FROM missing_table", 0_i64),
        QualityCheckConfig::new("SELECT COUNT(*) FROM users", 2_i64),
    ];
    let err = task(checks).execute(&ctx(&db)).await.unwrap_err();

    match err {
        TaskError::QualityCheck(QualityError::CheckFailure {
            failed,
            total,
            failing_queries,
        }) => {
            assert_eq!(failed, 2);
            assert_eq!(total, 3);
            assert_eq!(
                failing_queries,
                vec![
                    "SELECT COUNT(*) FROM users WHERE userid IS NULL".to_string(),
                    "SELECT COUNT(*) FROM missing_table".to_string(),
                ]
            );
        }
        other => panic!("expected quality failure, got {other:?}"),
    }
}

#[test]
fn test_queries_are_check_sql() {
    let task = task(vec![QualityCheckConfig::new("SELECT 1", 1_i64)]);
    assert_eq!(task.kind(), TaskKind::DataQuality);
    assert_eq!(task.queries(), vec!["SELECT 1"]);
    assert!(task.target_table().is_none());
}
