//! Staging task: copy raw JSON records from storage into a staging table
//!
//! Every run performs a fresh bulk copy of every matching object; nothing
//! tracks which objects were copied before. The copy goes through the
//! warehouse's own JSON readers:
//!
//! - `auto` records are read with `read_json` and inserted by column name.
//! - `json_paths` records are read as raw JSON objects, and each path of
//!   the JSONPaths document becomes one column, matched to the staging
//!   table by position.
//!
//! Remote (S3) locations need the `httpfs` extension and a session secret
//! carrying the region and, when the configured environment variables are
//! set, the key pair. Without keys the bucket is read anonymously.

use crate::error::TaskError;
use crate::task::{Task, TaskContext, TaskKind};
use async_trait::async_trait;
use sf_core::sql_utils::quote_literal;
use sf_core::{
    RecordFormat, ScalarValue, StorageConfig, StorageCredentials, StorageLocation, TableName,
    TaskId,
};
use sf_db::Database;
use sf_sql::templates::render_table;

/// Everything needed to copy one dataset into its staging table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingSpec {
    pub table: TableName,
    pub source: StorageLocation,
    pub format: RecordFormat,
    pub region: String,
    /// Extra `name = value` arguments passed to the JSON reader
    pub copy_options: Vec<String>,
}

/// Copies one dataset from storage into a staging table
#[derive(Debug, Clone)]
pub struct StagingTask {
    id: TaskId,
    spec: StagingSpec,
    storage: StorageConfig,
}

impl StagingTask {
    pub fn new(id: TaskId, spec: StagingSpec, storage: StorageConfig) -> Self {
        Self { id, spec, storage }
    }

    pub fn spec(&self) -> &StagingSpec {
        &self.spec
    }

    fn copy_error(&self, message: impl Into<String>) -> TaskError {
        TaskError::StorageCopy {
            table: self.spec.table.to_string(),
            source_uri: self.spec.source.uri(),
            message: message.into(),
        }
    }

    /// Fetch and parse the JSONPaths document through the warehouse
    async fn load_json_paths(
        &self,
        db: &dyn Database,
        uri: &str,
    ) -> Result<Vec<String>, TaskError> {
        let sql = format!("SELECT content FROM read_text({})", quote_literal(uri));
        let content = match db.query_first(&sql).await {
            Ok(Some(ScalarValue::Text(content))) => content,
            Ok(other) => {
                return Err(self.copy_error(format!(
                    "JSONPaths document {} is empty or unreadable ({:?})",
                    uri, other
                )))
            }
            Err(e) => {
                return Err(self.copy_error(format!(
                    "failed to read JSONPaths document {}: {}",
                    uri, e
                )))
            }
        };
        parse_json_paths(&content)
            .map_err(|e| self.copy_error(format!("invalid JSONPaths document {}: {}", uri, e)))
    }
}

#[async_trait]
impl Task for StagingTask {
    fn task_id(&self) -> &TaskId {
        &self.id
    }

    fn kind(&self) -> TaskKind {
        TaskKind::Staging
    }

    fn target_table(&self) -> Option<&TableName> {
        Some(&self.spec.table)
    }

    async fn execute(&self, ctx: &TaskContext<'_>) -> Result<(), TaskError> {
        log::info!(
            "Copying data from '{}' to staging table '{}'",
            self.spec.source,
            self.spec.table
        );

        let remote_paths =
            matches!(&self.spec.format, RecordFormat::JsonPaths { uri } if uri.starts_with("s3://"));
        let needs_remote = self.spec.source.is_remote() || remote_paths;
        if needs_remote {
            let credentials = self.storage.credentials_from_env();
            if credentials.is_none() {
                log::debug!("No storage credentials in environment, reading anonymously");
            }
            let setup = storage_setup_sql(&self.spec.region, credentials.as_ref());
            ctx.db
                .execute_batch(&setup)
                .await
                .map_err(|e| self.copy_error(format!("storage access setup failed: {}", e)))?;
        }

        let pattern = self.spec.source.object_pattern();
        let sql = match &self.spec.format {
            RecordFormat::Auto => {
                copy_auto_sql(&self.spec.table, &pattern, &self.spec.copy_options)
            }
            RecordFormat::JsonPaths { uri } => {
                let paths = self.load_json_paths(ctx.db, uri).await?;
                log::debug!("Loaded {} JSONPaths from {}", paths.len(), uri);
                copy_json_paths_sql(&self.spec.table, &pattern, &paths, &self.spec.copy_options)
            }
        };

        let copied = ctx
            .db
            .execute(&sql)
            .await
            .map_err(|e| self.copy_error(e.to_string()))?;
        log::info!("Copied {} records into {}", copied, self.spec.table);
        Ok(())
    }
}

/// Statements that enable S3 reads for this session
pub fn storage_setup_sql(region: &str, credentials: Option<&StorageCredentials>) -> String {
    let mut secret = format!("TYPE S3, REGION {}", quote_literal(region));
    if let Some(creds) = credentials {
        secret.push_str(&format!(
            ", KEY_ID {}, SECRET {}",
            quote_literal(&creds.access_key_id),
            quote_literal(&creds.secret_access_key)
        ));
    }
    format!(
        "INSTALL httpfs;\nLOAD httpfs;\nCREATE OR REPLACE SECRET sparkify_storage ({});",
        secret
    )
}

fn reader_options(base: &[&str], extra: &[String]) -> String {
    base.iter()
        .map(|s| s.to_string())
        .chain(extra.iter().map(|s| s.trim().to_string()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Insert every record matched by `pattern`, mapping keys to columns by name
pub fn copy_auto_sql(table: &TableName, pattern: &str, copy_options: &[String]) -> String {
    format!(
        "INSERT INTO {} BY NAME\nSELECT * FROM read_json({}, {});",
        render_table(table),
        quote_literal(pattern),
        reader_options(&["format = 'auto'", "union_by_name = true"], copy_options)
    )
}

/// Insert every record matched by `pattern`, one column per JSON path, in order.
///
/// Empty strings load as NULL.
pub fn copy_json_paths_sql(
    table: &TableName,
    pattern: &str,
    paths: &[String],
    copy_options: &[String],
) -> String {
    let columns = paths
        .iter()
        .map(|p| format!("NULLIF(json_extract_string(json, {}), '')", quote_literal(p)))
        .collect::<Vec<_>>()
        .join(",\n    ");
    format!(
        "INSERT INTO {}\nSELECT\n    {}\nFROM read_json_objects({}, {});",
        render_table(table),
        columns,
        quote_literal(pattern),
        reader_options(&["format = 'auto'"], copy_options)
    )
}

/// Parse a JSONPaths document (`{"jsonpaths": ["$['artist']", ...]}`) into
/// warehouse JSON paths.
pub fn parse_json_paths(document: &str) -> Result<Vec<String>, String> {
    let value: serde_json::Value = serde_json::from_str(document).map_err(|e| e.to_string())?;
    let entries = value
        .get("jsonpaths")
        .and_then(|v| v.as_array())
        .ok_or_else(|| "missing \"jsonpaths\" array".to_string())?;
    if entries.is_empty() {
        return Err("\"jsonpaths\" array is empty".to_string());
    }
    entries
        .iter()
        .map(|entry| {
            entry
                .as_str()
                .ok_or_else(|| format!("path {} is not a string", entry))
                .and_then(convert_json_path)
        })
        .collect()
}

/// Convert a bracket- or dot-notation path into the warehouse's dot notation.
///
/// `$['artist']` -> `$.artist`, `$['a b']` -> `$."a b"`, `$.a[0]` stays.
pub fn convert_json_path(path: &str) -> Result<String, String> {
    let path = path.trim();
    let mut rest = path
        .strip_prefix('$')
        .ok_or_else(|| format!("path '{}' must start with '$'", path))?;
    let mut out = String::from("$");

    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix('.') {
            let end = after.find(['.', '[']).unwrap_or(after.len());
            let key = &after[..end];
            if key.is_empty() {
                return Err(format!("empty key in path '{}'", path));
            }
            push_key(&mut out, key);
            rest = &after[end..];
        } else if let Some(after) = rest.strip_prefix('[') {
            let close = after
                .find(']')
                .ok_or_else(|| format!("unclosed '[' in path '{}'", path))?;
            let inner = after[..close].trim();
            let quoted = inner
                .strip_prefix('\'')
                .and_then(|s| s.strip_suffix('\''))
                .or_else(|| inner.strip_prefix('"').and_then(|s| s.strip_suffix('"')));
            match quoted {
                Some(key) => push_key(&mut out, key),
                None if !inner.is_empty() && inner.chars().all(|c| c.is_ascii_digit()) => {
                    out.push('[');
                    out.push_str(inner);
                    out.push(']');
                }
                None => return Err(format!("unsupported segment '[{}]' in path '{}'", inner, path)),
            }
            rest = &after[close + 1..];
        } else {
            return Err(format!("unexpected '{}' in path '{}'", rest, path));
        }
    }

    if out == "$" {
        return Err(format!("path '{}' selects the whole record", path));
    }
    Ok(out)
}

fn push_key(out: &mut String, key: &str) {
    out.push('.');
    if !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        out.push_str(key);
    } else {
        out.push('"');
        out.push_str(&key.replace('"', "\\\""));
        out.push('"');
    }
}

#[cfg(test)]
#[path = "staging_test.rs"]
mod tests;
