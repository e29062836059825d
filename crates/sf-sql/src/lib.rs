//! sf-sql - SQL layer for Sparkify ETL
//!
//! This crate holds the SQL template library used by the load tasks, the
//! DDL for the staging and star-schema tables, and a sqlparser-based
//! wrapper used to validate templates and quality checks and to extract the
//! tables a statement reads.

pub mod dialect;
pub mod error;
pub mod extractor;
pub mod parser;
pub mod templates;
pub mod validator;

pub use dialect::{DuckDbDialect, SqlDialect};
pub use error::{SqlError, SqlResult};
pub use extractor::extract_dependencies;
pub use parser::SqlParser;
pub use templates::{delete_all, insert_into};
pub use validator::validate_select;
