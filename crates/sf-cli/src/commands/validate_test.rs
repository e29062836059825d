use super::*;
use sf_core::QualityCheckConfig;

/// Default config with credentials read from variables no test sets
fn config() -> WorkflowConfig {
    let mut config = WorkflowConfig::default();
    config.storage.access_key_id_env = "SF_VALIDATE_TEST_UNSET_KEY_ID".to_string();
    config.storage.secret_access_key_env = "SF_VALIDATE_TEST_UNSET_SECRET".to_string();
    config
}

fn local_source(path: &str) -> StagingSource {
    StagingSource {
        source: StorageLocation::Local {
            path: path.to_string(),
        },
        format: RecordFormat::Auto,
        copy_options: vec![],
    }
}

fn codes(ctx: &ValidationContext) -> Vec<&str> {
    ctx.issues.iter().map(|i| i.code.as_str()).collect()
}

#[test]
fn test_default_config_only_warns_about_anonymous_access() {
    let mut ctx = ValidationContext::new();
    validate_config(&config(), &mut ctx);

    assert_eq!(ctx.error_count(), 0);
    assert_eq!(codes(&ctx), vec!["W001", "W001"]);
    assert!(ctx.issues[0].message.contains("read anonymously"));
    assert_eq!(ctx.issues[0].location.as_deref(), Some("staging_events"));
}

#[test]
fn test_non_query_check_is_error() {
    let mut config = config();
    config
        .quality_checks
        .push(QualityCheckConfig::new("DELETE FROM users", 0_i64));

    let mut ctx = ValidationContext::new();
    validate_config(&config, &mut ctx);

    assert_eq!(ctx.error_count(), 1);
    let issue = ctx.issues.iter().find(|i| i.code == "E002").unwrap();
    assert_eq!(issue.location.as_deref(), Some("Run_data_quality_checks"));
}

#[test]
fn test_check_on_unknown_table_warns() {
    let mut config = config();
    config
        .quality_checks
        .push(QualityCheckConfig::new("SELECT COUNT(*) FROM plays", 0_i64));

    let mut ctx = ValidationContext::new();
    validate_config(&config, &mut ctx);

    assert_eq!(ctx.error_count(), 0);
    let issue = ctx.issues.iter().find(|i| i.code == "W003").unwrap();
    assert!(issue.message.contains("'plays'"));
}

#[test]
fn test_missing_local_source_warns() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config();
    config.staging.events = local_source(&dir.path().join("missing").display().to_string());
    config.staging.songs = local_source(&dir.path().display().to_string());

    let mut ctx = ValidationContext::new();
    validate_staging(&config, &mut ctx);

    assert_eq!(codes(&ctx), vec!["W002"]);
    assert_eq!(ctx.issues[0].location.as_deref(), Some("staging_events"));
}

#[test]
fn test_catchup_and_empty_checks_warn() {
    let mut config = config();
    config.catchup = true;
    config.quality_checks.clear();

    let mut ctx = ValidationContext::new();
    validate_schedule(&config, &mut ctx);

    assert_eq!(codes(&ctx), vec!["W004", "W005"]);
}

#[test]
fn test_bundled_ddl_is_valid() {
    let mut ctx = ValidationContext::new();
    validate_table_ddl(&mut ctx);
    assert!(ctx.issues.is_empty());
}

#[test]
fn test_strict_mode_fails_on_warnings() {
    let mut ctx = ValidationContext::new();
    ctx.warning("W004", "catchup", None);

    assert!(print_issues_and_summary(&ctx, false).is_ok());
    let err = print_issues_and_summary(&ctx, true).unwrap_err();
    assert_eq!(err.downcast_ref::<ExitCode>().map(|c| c.0), Some(1));
}

#[test]
fn test_issue_display() {
    let mut ctx = ValidationContext::new();
    ctx.error("E002", "bad query", Some("Load_users_table".to_string()));
    assert_eq!(
        ctx.issues[0].to_string(),
        "[ERROR] E002: bad query (Load_users_table)"
    );
}
