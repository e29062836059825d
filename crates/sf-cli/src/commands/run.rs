//! Run command implementation

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use sf_core::{RunStatus, TaskState};
use sf_workflow::{
    logical_date_for, RetryPolicy, RunOptions, RunReport, TaskRunResult, WorkflowRunner,
};
use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::cli::{GlobalArgs, OutputFormat, RunArgs};
use crate::commands::common::{
    build_graph, create_missing_tables, load_workspace, open_warehouse, ExitCode, Workspace,
    EXIT_QUALITY_FAILED, EXIT_TASK_FAILED,
};

/// Execute the run command
pub async fn execute(args: &RunArgs, global: &GlobalArgs) -> Result<()> {
    let ws = load_workspace(global)?;
    let graph = Arc::new(build_graph(&ws.config)?);

    let logical_date = match &args.logical_date {
        Some(value) => parse_logical_date(value)?,
        None => logical_date_for(&ws.config, Utc::now())?,
    };

    let selected = match &args.select {
        Some(selector) => graph
            .dag()
            .select(selector)
            .context("Invalid selector")?
            .len(),
        None => graph.len(),
    };

    let db = open_warehouse(&ws, global)?;
    if args.create_tables {
        let created = create_missing_tables(db.as_ref()).await?;
        if args.output == OutputFormat::Text && created > 0 {
            println!("Created {} table(s)", created);
        }
    }

    let mut retry = RetryPolicy::from_default_args(&ws.config.default_args);
    if let Some(retries) = args.retries {
        retry.retries = retries;
    }

    if args.output == OutputFormat::Text {
        println!(
            "Running {} of {} tasks for {} ({} retries, {}s apart)\n",
            selected,
            graph.len(),
            logical_date.to_rfc3339(),
            retry.retries,
            retry.delay.as_secs()
        );
    }

    let progress = (args.output == OutputFormat::Text && !global.verbose).then(|| {
        let pb = ProgressBar::new(selected as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({msg})",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Arc::new(pb)
    });

    let mut runner = WorkflowRunner::new(graph, db, retry);
    if let Some(pb) = &progress {
        let pb = Arc::clone(pb);
        runner = runner.with_progress(Arc::new(move |result: &TaskRunResult| {
            pb.inc(1);
            pb.set_message(format!("{} {}", result.task_id, result.state));
        }));
    }

    let cancel = runner.cancel_flag();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupted, waiting for running tasks to finish");
            cancel.store(true, Ordering::SeqCst);
        }
    });

    let options = RunOptions {
        threads: args.threads,
        selection: args.select.clone(),
        state_path: Some(ws.run_state_path()),
    };
    let result = runner.run(logical_date, &options).await;
    interrupt.abort();
    if let Some(pb) = &progress {
        pb.finish_and_clear();
    }
    let report = result?;

    write_run_results(&ws, &report)?;

    match args.output {
        OutputFormat::Text => print_text(&report),
        OutputFormat::Json => {
            let json =
                serde_json::to_string_pretty(&report).context("Failed to serialize run report")?;
            println!("{}", json);
        }
    }

    if report.succeeded() {
        Ok(())
    } else if report.only_quality_failed() {
        Err(ExitCode(EXIT_QUALITY_FAILED).into())
    } else {
        Err(ExitCode(EXIT_TASK_FAILED).into())
    }
}

/// Parse `--logical-date`: RFC 3339, or a bare date meaning midnight UTC
pub(crate) fn parse_logical_date(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        Ok(date) => match date.and_hms_opt(0, 0, 0) {
            Some(dt) => Ok(dt.and_utc()),
            None => bail!("Invalid logical date '{}'", value),
        },
        Err(_) => bail!(
            "Invalid logical date '{}': expected RFC 3339 or YYYY-MM-DD",
            value
        ),
    }
}

fn print_text(report: &RunReport) {
    for result in &report.results {
        match result.state {
            TaskState::Success => println!(
                "  ✓ {} ({}) [{}ms]",
                result.task_id,
                result.kind,
                result.duration.as_millis()
            ),
            TaskState::Failed => println!(
                "  ✗ {} ({}, {} attempt(s)) - {} [{}ms]",
                result.task_id,
                result.kind,
                result.attempts,
                result.error.as_deref().unwrap_or("unknown error"),
                result.duration.as_millis()
            ),
            TaskState::UpstreamFailed => {
                println!("  - {} (skipped: upstream failed)", result.task_id)
            }
            other => println!("  ? {} ({})", result.task_id, other),
        }
    }

    let summary = report.state.summary();
    println!();
    if report.state.status == RunStatus::Cancelled {
        println!("Run cancelled: {} task(s) not started", summary.pending);
    }
    println!(
        "Completed: {} succeeded, {} failed, {} skipped",
        summary.completed, summary.failed, summary.upstream_failed
    );
    println!("Run id: {}", report.state.run_id);
    println!("Total time: {}ms", report.duration.as_millis());
}

/// Write `run_results.json` next to the run state
fn write_run_results(ws: &Workspace, report: &RunReport) -> Result<()> {
    let target = ws.target_dir();
    std::fs::create_dir_all(&target)
        .with_context(|| format!("Failed to create {}", target.display()))?;
    let path = target.join("run_results.json");
    let json = serde_json::to_string_pretty(report).context("Failed to serialize run report")?;
    std::fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "run_test.rs"]
mod tests;
