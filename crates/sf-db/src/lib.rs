//! sf-db - Warehouse abstraction layer for Sparkify ETL
//!
//! This crate provides the `Database` trait every task talks to and its
//! DuckDB implementation.

pub mod duckdb;
pub mod error;
pub mod traits;

pub use duckdb::DuckDbBackend;
pub use error::{DbError, DbResult};
pub use traits::Database;
