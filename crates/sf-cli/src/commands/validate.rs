//! Validate command implementation

use anyhow::Result;
use sf_core::{RecordFormat, StagingSource, StorageLocation, WorkflowConfig};
use sf_sql::extractor::unqualified;
use sf_sql::templates::{table_definitions, STAGING_EVENTS, STAGING_SONGS};
use sf_sql::validator::validate_create_table;
use sf_sql::{extract_dependencies, validate_select, SqlParser};
use sf_workflow::WorkflowGraph;
use std::collections::HashSet;
use std::path::Path;

use crate::cli::{GlobalArgs, ValidateArgs};
use crate::commands::common::{build_graph, load_workspace, ExitCode};

/// Validation result severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Severity {
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Warning => write!(f, "WARNING"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// A single validation issue
struct ValidationIssue {
    severity: Severity,
    code: String,
    message: String,
    /// Task or table the issue belongs to
    location: Option<String>,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.location {
            Some(location) => write!(
                f,
                "[{}] {}: {} ({})",
                self.severity, self.code, self.message, location
            ),
            None => write!(f, "[{}] {}: {}", self.severity, self.code, self.message),
        }
    }
}

/// Collect validation issues
struct ValidationContext {
    issues: Vec<ValidationIssue>,
}

impl ValidationContext {
    fn new() -> Self {
        Self { issues: Vec::new() }
    }

    fn error(&mut self, code: &str, message: impl Into<String>, location: Option<String>) {
        self.issues.push(ValidationIssue {
            severity: Severity::Error,
            code: code.to_string(),
            message: message.into(),
            location,
        });
    }

    fn warning(&mut self, code: &str, message: impl Into<String>, location: Option<String>) {
        self.issues.push(ValidationIssue {
            severity: Severity::Warning,
            code: code.to_string(),
            message: message.into(),
            location,
        });
    }

    fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count()
    }

    fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .count()
    }
}

/// Execute the validate command
pub async fn execute(args: &ValidateArgs, global: &GlobalArgs) -> Result<()> {
    let ws = load_workspace(global)?;

    println!("Validating workflow: {}\n", ws.config.name);

    let mut ctx = ValidationContext::new();
    validate_config(&ws.config, &mut ctx);

    print_issues_and_summary(&ctx, args.strict)
}

/// Run every check against a loaded config
fn validate_config(config: &WorkflowConfig, ctx: &mut ValidationContext) {
    if let Some(graph) = validate_graph(config, ctx) {
        validate_task_sql(&graph, ctx);
    }
    validate_table_ddl(ctx);
    validate_staging(config, ctx);
    validate_schedule(config, ctx);
}

/// Build the workflow graph, reporting why it cannot be built
fn validate_graph(config: &WorkflowConfig, ctx: &mut ValidationContext) -> Option<WorkflowGraph> {
    print!("Checking workflow graph... ");
    match build_graph(config) {
        Ok(graph) => {
            println!("✓ ({} tasks)", graph.len());
            Some(graph)
        }
        Err(e) => {
            ctx.error("E001", format!("{:#}", e), None);
            println!("✗");
            None
        }
    }
}

/// Every load select and quality check must be a single query over known
/// tables
fn validate_task_sql(graph: &WorkflowGraph, ctx: &mut ValidationContext) {
    print!("Checking task SQL... ");
    let parser = SqlParser::duckdb();
    let known: HashSet<&str> = table_definitions().into_iter().map(|d| d.name).collect();
    let mut sql_errors = 0;

    let tasks = match graph.tasks() {
        Ok(tasks) => tasks,
        Err(e) => {
            ctx.error("E001", e.to_string(), None);
            println!("✗");
            return;
        }
    };

    for task in tasks {
        let task_name = task.task_id().to_string();
        for sql in task.queries() {
            if let Err(e) = validate_select(sql) {
                ctx.error("E002", e.to_string(), Some(task_name.clone()));
                sql_errors += 1;
                continue;
            }

            let Ok(statements) = parser.parse(sql) else {
                continue;
            };
            for table in extract_dependencies(&statements) {
                if !known.contains(unqualified(&table).to_lowercase().as_str()) {
                    ctx.warning(
                        "W003",
                        format!("Query reads '{}', which the workflow never creates", table),
                        Some(task_name.clone()),
                    );
                }
            }
        }
    }

    if sql_errors == 0 {
        println!("✓");
    } else {
        println!("✗ ({} errors)", sql_errors);
    }
}

/// The bundled DDL must parse as CREATE TABLE statements
fn validate_table_ddl(ctx: &mut ValidationContext) {
    print!("Checking table definitions... ");
    let mut ddl_errors = 0;
    for def in table_definitions() {
        if let Err(e) = validate_create_table(def.ddl) {
            ctx.error("E003", e.to_string(), Some(def.name.to_string()));
            ddl_errors += 1;
        }
    }

    if ddl_errors == 0 {
        println!("✓");
    } else {
        println!("✗ ({} errors)", ddl_errors);
    }
}

/// Warn about sources that will be read anonymously or do not exist locally
fn validate_staging(config: &WorkflowConfig, ctx: &mut ValidationContext) {
    print!("Checking staging sources... ");
    let before = ctx.issues.len();
    let has_credentials = config.storage.credentials_from_env().is_some();

    for (table, source) in [
        (STAGING_EVENTS, &config.staging.events),
        (STAGING_SONGS, &config.staging.songs),
    ] {
        let remote = source.source.is_remote() || json_paths_uri(source).is_some_and(is_s3_uri);
        if remote && !has_credentials {
            ctx.warning(
                "W001",
                format!(
                    "{} and {} are not set, {} will be read anonymously",
                    config.storage.access_key_id_env,
                    config.storage.secret_access_key_env,
                    source.source
                ),
                Some(table.to_string()),
            );
        }

        if let StorageLocation::Local { path } = &source.source {
            if !path.contains('*') && !Path::new(path).exists() {
                ctx.warning(
                    "W002",
                    format!("Local source '{}' does not exist", path),
                    Some(table.to_string()),
                );
            }
        }
        if let Some(uri) = json_paths_uri(source) {
            if !is_s3_uri(uri) && !Path::new(uri).exists() {
                ctx.warning(
                    "W002",
                    format!("JSONPaths document '{}' does not exist", uri),
                    Some(table.to_string()),
                );
            }
        }
    }

    let found = ctx.issues.len() - before;
    if found == 0 {
        println!("✓");
    } else {
        println!("{} warnings", found);
    }
}

fn json_paths_uri(source: &StagingSource) -> Option<&str> {
    match &source.format {
        RecordFormat::JsonPaths { uri } => Some(uri.as_str()),
        RecordFormat::Auto => None,
    }
}

fn is_s3_uri(uri: &str) -> bool {
    uri.starts_with("s3://")
}

fn validate_schedule(config: &WorkflowConfig, ctx: &mut ValidationContext) {
    print!("Checking schedule and checks... ");
    let before = ctx.issues.len();

    if config.catchup {
        ctx.warning(
            "W004",
            "catchup is enabled, but each run covers only the latest interval",
            None,
        );
    }
    if config.quality_checks.is_empty() {
        ctx.warning(
            "W005",
            "No quality checks configured, the check task will always pass",
            None,
        );
    }

    if ctx.issues.len() == before {
        println!("✓");
    } else {
        println!("{} warnings", ctx.issues.len() - before);
    }
}

/// Print all issues and the summary; errors (or warnings in strict mode)
/// exit with status 1
fn print_issues_and_summary(ctx: &ValidationContext, strict: bool) -> Result<()> {
    println!();
    for issue in &ctx.issues {
        println!("{}", issue);
    }

    let error_count = ctx.error_count();
    let warning_count = ctx.warning_count();

    println!();
    if error_count == 0 && (warning_count == 0 || !strict) {
        println!(
            "Validation passed: {} errors, {} warnings",
            error_count, warning_count
        );
        Ok(())
    } else if strict && error_count == 0 {
        println!(
            "Validation failed (strict mode): {} errors, {} warnings",
            error_count, warning_count
        );
        Err(ExitCode(1).into())
    } else {
        println!(
            "Validation failed: {} errors, {} warnings",
            error_count, warning_count
        );
        Err(ExitCode(1).into())
    }
}

#[cfg(test)]
#[path = "validate_test.rs"]
mod tests;
