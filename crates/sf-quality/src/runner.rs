//! Quality check execution

use crate::error::QualityError;
use serde::Serialize;
use sf_core::{QualityCheckConfig, ScalarValue};
use sf_db::Database;
use std::time::{Duration, Instant};

/// How a single check ended
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CheckOutcome {
    Passed,
    /// The query ran but returned a different value, or no row at all
    Mismatch { actual: Option<ScalarValue> },
    /// The query could not be executed
    Error { message: String },
}

/// Result of a single check execution
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub check_sql: String,

    pub expected: ScalarValue,

    pub outcome: CheckOutcome,

    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    pub duration: Duration,
}

impl CheckResult {
    pub fn passed(&self) -> bool {
        self.outcome == CheckOutcome::Passed
    }
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

/// Outcome of evaluating a whole check list
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub results: Vec<CheckResult>,

    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    pub duration: Duration,
}

impl CheckReport {
    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|r| r.passed()).count()
    }

    /// Checks that mismatched or errored
    pub fn failed_count(&self) -> usize {
        self.total() - self.passed_count()
    }

    /// Checks whose query errored
    pub fn error_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, CheckOutcome::Error { .. }))
            .count()
    }

    pub fn all_passed(&self) -> bool {
        self.failed_count() == 0
    }

    /// Literal SQL of every failing check, in check-list order
    pub fn failing_queries(&self) -> Vec<String> {
        self.results
            .iter()
            .filter(|r| !r.passed())
            .map(|r| r.check_sql.clone())
            .collect()
    }

    /// Turn the report into an error if any check failed
    pub fn into_result(self) -> Result<CheckReport, QualityError> {
        if self.all_passed() {
            Ok(self)
        } else {
            Err(QualityError::CheckFailure {
                failed: self.failed_count(),
                total: self.total(),
                failing_queries: self.failing_queries(),
            })
        }
    }
}

/// Runs scalar quality checks against the warehouse
pub struct CheckRunner<'a> {
    db: &'a dyn Database,
}

impl<'a> CheckRunner<'a> {
    pub fn new(db: &'a dyn Database) -> Self {
        Self { db }
    }

    /// Run a single check. Execution errors become a failed result.
    pub async fn run_check(&self, check: &QualityCheckConfig) -> CheckResult {
        let start = Instant::now();
        log::info!("Running query: {}", check.check_sql);

        let outcome = match self.db.query_first(&check.check_sql).await {
            Ok(Some(actual)) if actual.matches(&check.expected_result) => CheckOutcome::Passed,
            Ok(actual) => {
                log::warn!(
                    "Check returned {} (expected {}): {}",
                    actual
                        .as_ref()
                        .map_or_else(|| "no rows".to_string(), |v| v.to_string()),
                    check.expected_result,
                    check.check_sql
                );
                CheckOutcome::Mismatch { actual }
            }
            Err(e) => {
                log::error!("Query failed with exception: {}", e);
                CheckOutcome::Error {
                    message: e.to_string(),
                }
            }
        };

        CheckResult {
            check_sql: check.check_sql.clone(),
            expected: check.expected_result.clone(),
            outcome,
            duration: start.elapsed(),
        }
    }

    /// Run every check in order, regardless of earlier failures
    pub async fn run_checks(&self, checks: &[QualityCheckConfig]) -> CheckReport {
        let start = Instant::now();

        if checks.is_empty() {
            log::info!("No data quality checks provided");
        }

        let mut results = Vec::with_capacity(checks.len());
        for check in checks {
            results.push(self.run_check(check).await);
        }

        let report = CheckReport {
            results,
            duration: start.elapsed(),
        };

        if report.all_passed() {
            if !checks.is_empty() {
                log::info!("All data quality checks passed");
            }
        } else {
            log::info!(
                "{} data quality check(s) failed: {:?}",
                report.failed_count(),
                report.failing_queries()
            );
        }

        report
    }
}

#[cfg(test)]
#[path = "runner_test.rs"]
mod tests;
