use super::*;
use sf_db::DuckDbBackend;

async fn warehouse() -> DuckDbBackend {
    let db = DuckDbBackend::in_memory().unwrap();
    db.execute_batch(
        "CREATE TABLE songplays (playid VARCHAR, userid INTEGER, \"level\" VARCHAR);
         INSERT INTO songplays VALUES ('a', 1, 'free'), ('b', 2, 'paid'), ('c', NULL, 'paid');
         CREATE TABLE users (userid INTEGER, first_name VARCHAR);
         INSERT INTO users VALUES (1, 'Ann'), (2, 'Bob');",
    )
    .await
    .unwrap();
    db
}

fn check(sql: &str, expected: impl Into<ScalarValue>) -> QualityCheckConfig {
    QualityCheckConfig::new(sql, expected)
}

#[tokio::test]
async fn test_check_passes() {
    let db = warehouse().await;
    let runner = CheckRunner::new(&db);

    let result = runner
        .run_check(&check(r#"SELECT COUNT(DISTINCT "level") FROM songplays"#, 2_i64))
        .await;

    assert!(result.passed());
}

#[tokio::test]
async fn test_check_mismatch_records_actual() {
    let db = warehouse().await;
    let runner = CheckRunner::new(&db);

    let result = runner
        .run_check(&check("SELECT COUNT(*) FROM songplays WHERE userid IS NULL", 0_i64))
        .await;

    assert_eq!(
        result.outcome,
        CheckOutcome::Mismatch {
            actual: Some(ScalarValue::Int(1))
        }
    );
}

#[tokio::test]
async fn test_no_rows_is_a_failure() {
    let db = warehouse().await;
    let runner = CheckRunner::new(&db);

    let result = runner
        .run_check(&check("SELECT userid FROM users WHERE userid > 100", 0_i64))
        .await;

    assert_eq!(result.outcome, CheckOutcome::Mismatch { actual: None });
}

#[tokio::test]
async fn test_error_does_not_stop_remaining_checks() {
    let db = warehouse().await;
    let runner = CheckRunner::new(&db);

    let checks = vec![
        check("SELECT COUNT(*) FROM missing_table", 0_i64),
        check("SELECT COUNT(*) FROM users WHERE first_name IS NULL", 0_i64),
        check("SELECT COUNT(*) FROM songplays WHERE userid IS NULL", 0_i64),
    ];
    let report = runner.run_checks(&checks).await;

    assert_eq!(report.total(), 3);
    assert_eq!(report.passed_count(), 1);
    assert_eq!(report.failed_count(), 2);
    assert_eq!(report.error_count(), 1);
    assert_eq!(
        report.failing_queries(),
        vec![
            "SELECT COUNT(*) FROM missing_table".to_string(),
            "SELECT COUNT(*) FROM songplays WHERE userid IS NULL".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_into_result_carries_failures() {
    let db = warehouse().await;
    let runner = CheckRunner::new(&db);

    let checks = vec![
        check("SELECT COUNT(*) FROM users", 2_i64),
        check("SELECT COUNT(*) FROM songplays", 99_i64),
    ];
    let err = runner.run_checks(&checks).await.into_result().unwrap_err();

    assert_eq!(
        err,
        QualityError::CheckFailure {
            failed: 1,
            total: 2,
            failing_queries: vec!["SELECT COUNT(*) FROM songplays".to_string()],
        }
    );
    assert!(err.to_string().starts_with("[Q001]"));
}

#[tokio::test]
async fn test_empty_check_list_succeeds() {
    let db = warehouse().await;
    let report = CheckRunner::new(&db).run_checks(&[]).await;
    assert!(report.all_passed());
    assert!(report.into_result().is_ok());
}

#[tokio::test]
async fn test_text_expected_value() {
    let db = warehouse().await;
    let runner = CheckRunner::new(&db);
    let result = runner
        .run_check(&check("SELECT first_name FROM users WHERE userid = 1", "Ann"))
        .await;
    assert!(result.passed());
}

#[tokio::test]
async fn test_report_serializes_outcomes() {
    let db = warehouse().await;
    let report = CheckRunner::new(&db)
        .run_checks(&[check("SELECT COUNT(*) FROM users", 5_i64)])
        .await;

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["results"][0]["outcome"]["status"], "mismatch");
    assert_eq!(json["results"][0]["outcome"]["actual"], 2);
    assert_eq!(json["results"][0]["expected"], 5);
}
