//! DuckDB warehouse backend

use crate::error::{DbError, DbResult};
use crate::traits::Database;
use async_trait::async_trait;
use duckdb::types::Value;
use duckdb::Connection;
use sf_core::sql_utils::escape_sql_string;
use sf_core::ScalarValue;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// DuckDB warehouse backend
///
/// One connection behind a mutex: statements from concurrent tasks are
/// serialised.
pub struct DuckDbBackend {
    conn: Mutex<Connection>,
}

impl DuckDbBackend {
    /// Create a new in-memory DuckDB connection
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open (or create) a database file
    pub fn from_path(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| DbError::ConnectionError(format!("{}: {}", path.display(), e)))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory()
        } else {
            Self::from_path(Path::new(path))
        }
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))
    }

    fn execute_sync(&self, sql: &str) -> DbResult<usize> {
        log::debug!("Executing: {}", sql);
        let conn = self.lock()?;
        conn.execute(sql, [])
            .map_err(|e| DbError::ExecutionError(format!("{}: {}", e, sql)))
    }

    fn execute_batch_sync(&self, sql: &str) -> DbResult<()> {
        log::debug!("Executing batch: {}", sql);
        let conn = self.lock()?;
        conn.execute_batch(sql).map_err(DbError::from)
    }

    fn query_first_sync(&self, sql: &str) -> DbResult<Option<ScalarValue>> {
        log::debug!("Querying: {}", sql);
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query([])?;
        let first = match rows.next()? {
            Some(row) => Some(to_scalar(row.get::<_, Value>(0)?)),
            None => None,
        };
        Ok(first)
    }

    fn relation_exists_sync(&self, name: &str) -> DbResult<bool> {
        let (schema, table) = match name.rfind('.') {
            Some(pos) => (&name[..pos], &name[pos + 1..]),
            None => ("main", name),
        };

        let sql = format!(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = '{}' AND table_name = '{}'",
            escape_sql_string(schema),
            escape_sql_string(table)
        );

        let conn = self.lock()?;
        let count: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count > 0)
    }
}

/// Convert a DuckDB value into the scalar compared by quality checks
fn to_scalar(value: Value) -> ScalarValue {
    match value {
        Value::Null => ScalarValue::Null,
        Value::Boolean(b) => ScalarValue::Bool(b),
        Value::TinyInt(i) => ScalarValue::Int(i.into()),
        Value::SmallInt(i) => ScalarValue::Int(i.into()),
        Value::Int(i) => ScalarValue::Int(i.into()),
        Value::BigInt(i) => ScalarValue::Int(i),
        Value::UTinyInt(i) => ScalarValue::Int(i.into()),
        Value::USmallInt(i) => ScalarValue::Int(i.into()),
        Value::UInt(i) => ScalarValue::Int(i.into()),
        Value::UBigInt(i) => match i64::try_from(i) {
            Ok(v) => ScalarValue::Int(v),
            Err(_) => ScalarValue::Text(i.to_string()),
        },
        Value::HugeInt(i) => match i64::try_from(i) {
            Ok(v) => ScalarValue::Int(v),
            Err(_) => ScalarValue::Text(i.to_string()),
        },
        Value::Float(f) => ScalarValue::Float(f.into()),
        Value::Double(f) => ScalarValue::Float(f),
        Value::Decimal(d) => {
            let text = d.to_string();
            match text.parse::<f64>() {
                Ok(f) => ScalarValue::Float(f),
                Err(_) => ScalarValue::Text(text),
            }
        }
        Value::Text(s) => ScalarValue::Text(s),
        Value::Enum(s) => ScalarValue::Text(s),
        other => ScalarValue::Text(format!("{:?}", other)),
    }
}

#[async_trait]
impl Database for DuckDbBackend {
    async fn execute(&self, sql: &str) -> DbResult<usize> {
        self.execute_sync(sql)
    }

    async fn execute_batch(&self, sql: &str) -> DbResult<()> {
        self.execute_batch_sync(sql)
    }

    async fn query_first(&self, sql: &str) -> DbResult<Option<ScalarValue>> {
        self.query_first_sync(sql)
    }

    async fn relation_exists(&self, name: &str) -> DbResult<bool> {
        self.relation_exists_sync(name)
    }

    fn db_type(&self) -> &'static str {
        "duckdb"
    }
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
