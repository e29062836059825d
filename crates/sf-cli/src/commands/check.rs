//! Check command implementation

use anyhow::{Context, Result};
use sf_quality::{CheckOutcome, CheckReport, CheckRunner};

use crate::cli::{CheckArgs, GlobalArgs, OutputFormat};
use crate::commands::common::{
    load_workspace, open_warehouse, warehouse_path, ExitCode, EXIT_QUALITY_FAILED,
};

/// Execute the check command
pub async fn execute(args: &CheckArgs, global: &GlobalArgs) -> Result<()> {
    let ws = load_workspace(global)?;
    let db = open_warehouse(&ws, global)?;

    if args.output == OutputFormat::Text {
        println!(
            "Running {} quality checks against {}\n",
            ws.config.quality_checks.len(),
            warehouse_path(&ws, global)
        );
    }

    let report = CheckRunner::new(db.as_ref())
        .run_checks(&ws.config.quality_checks)
        .await;

    match args.output {
        OutputFormat::Text => print_text(&report),
        OutputFormat::Json => {
            let json =
                serde_json::to_string_pretty(&report).context("Failed to serialize check report")?;
            println!("{}", json);
        }
    }

    if report.all_passed() {
        Ok(())
    } else {
        Err(ExitCode(EXIT_QUALITY_FAILED).into())
    }
}

fn print_text(report: &CheckReport) {
    for result in &report.results {
        let ms = result.duration.as_millis();
        match &result.outcome {
            CheckOutcome::Passed => println!("  ✓ {} [{}ms]", result.check_sql, ms),
            CheckOutcome::Mismatch { actual } => println!(
                "  ✗ {} - expected {}, got {} [{}ms]",
                result.check_sql,
                result.expected,
                actual
                    .as_ref()
                    .map_or_else(|| "no rows".to_string(), |v| v.to_string()),
                ms
            ),
            CheckOutcome::Error { message } => {
                println!("  ✗ {} - {} [{}ms]", result.check_sql, message, ms)
            }
        }
    }

    println!();
    println!(
        "Checks: {} passed, {} failed ({} could not run)",
        report.passed_count(),
        report.failed_count(),
        report.error_count()
    );
    println!("Total time: {}ms", report.duration.as_millis());
}
