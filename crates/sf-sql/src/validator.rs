//! SQL validation utilities

use crate::error::{SqlError, SqlResult};
use crate::parser::SqlParser;
use sqlparser::ast::Statement;

/// Validate that `sql` is exactly one read-only query.
///
/// Load statements and quality checks must both be a single SELECT (or a
/// set operation / VALUES query). Returns the parsed statement.
pub fn validate_select(sql: &str) -> SqlResult<Statement> {
    let statement = SqlParser::duckdb().parse_single(sql)?;
    match statement {
        Statement::Query(_) => Ok(statement),
        other => Err(SqlError::UnsupportedStatement(statement_kind(&other))),
    }
}

/// Validate that `sql` is exactly one CREATE TABLE statement
pub fn validate_create_table(sql: &str) -> SqlResult<Statement> {
    let statement = SqlParser::duckdb().parse_single(sql)?;
    match statement {
        Statement::CreateTable(_) => Ok(statement),
        other => Err(SqlError::UnsupportedStatement(statement_kind(&other))),
    }
}

/// Short name of a statement for error messages (e.g. `DELETE`)
fn statement_kind(statement: &Statement) -> String {
    let rendered = statement.to_string();
    let mut words = rendered.split_whitespace();
    match (words.next(), words.next()) {
        (Some(first), Some(second)) if first.eq_ignore_ascii_case("CREATE") => {
            format!("{} {}", first, second).to_uppercase()
        }
        (Some(first), _) => first.to_uppercase(),
        _ => "UNKNOWN".to_string(),
    }
}

#[cfg(test)]
#[path = "validator_test.rs"]
mod tests;
