//! Configuration types and parsing for sparkify.yml
//!
//! Every field has a default, and the defaults reproduce the production
//! workflow: hourly schedule without catch-up, four retries five minutes
//! apart, event and song data read from the `udacity-dend` bucket in
//! `us-west-2`, and the seven post-load quality checks.

use crate::error::{CoreError, CoreResult};
use crate::scalar::ScalarValue;
use crate::schedule::Schedule;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable that overrides the warehouse path
pub const WAREHOUSE_ENV_VAR: &str = "SF_WAREHOUSE";

/// Config file names searched for in a project directory, in order
pub const CONFIG_FILE_NAMES: &[&str] = &["sparkify.yml", "sparkify.yaml"];

/// Top-level workflow configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkflowConfig {
    /// Workflow (DAG) identifier
    #[serde(default = "default_name")]
    pub name: String,

    /// Human-readable description
    #[serde(default = "default_description")]
    pub description: String,

    /// Arguments applied to every task
    #[serde(default)]
    pub default_args: DefaultArgs,

    /// Schedule preset
    #[serde(default)]
    pub schedule: Schedule,

    /// Whether missed intervals since the start date should be run.
    ///
    /// Only the latest interval is ever targeted by `sparkify run`; the flag
    /// is carried so the declared workflow matches the deployed one.
    #[serde(default)]
    pub catchup: bool,

    /// Warehouse connection
    #[serde(default)]
    pub warehouse: WarehouseConfig,

    /// Object storage access
    #[serde(default)]
    pub storage: StorageConfig,

    /// Raw data sources copied into the staging tables
    #[serde(default)]
    pub staging: StagingConfig,

    /// Post-load data-quality checks, evaluated in order
    #[serde(default = "default_quality_checks")]
    pub quality_checks: Vec<QualityCheckConfig>,

    /// Output directory for run state
    #[serde(default = "default_target_path")]
    pub target_path: String,
}

/// Task defaults shared by every node of the workflow
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefaultArgs {
    #[serde(default = "default_owner")]
    pub owner: String,

    /// First logical date the schedule is aligned to
    #[serde(default = "default_start_date")]
    pub start_date: DateTime<Utc>,

    /// Whether a task waits for its previous run to succeed
    #[serde(default)]
    pub depends_on_past: bool,

    #[serde(default)]
    pub email_on_retry: bool,

    /// Additional attempts after the first failure
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Pause between attempts, in seconds
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
}

impl Default for DefaultArgs {
    fn default() -> Self {
        Self {
            owner: default_owner(),
            start_date: default_start_date(),
            depends_on_past: false,
            email_on_retry: false,
            retries: default_retries(),
            retry_delay_secs: default_retry_delay_secs(),
        }
    }
}

impl DefaultArgs {
    /// Retry delay as a `Duration`
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

/// Warehouse connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WarehouseConfig {
    /// Database file path, or `:memory:`
    #[serde(default = "default_warehouse_path")]
    pub path: String,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            path: default_warehouse_path(),
        }
    }
}

/// Object storage access configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Region the source bucket lives in
    #[serde(default = "default_region")]
    pub region: String,

    /// Name of the environment variable holding the access key id
    #[serde(default = "default_access_key_env")]
    pub access_key_id_env: String,

    /// Name of the environment variable holding the secret access key
    #[serde(default = "default_secret_key_env")]
    pub secret_access_key_env: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            access_key_id_env: default_access_key_env(),
            secret_access_key_env: default_secret_key_env(),
        }
    }
}

impl StorageConfig {
    /// Read the access key pair from the configured environment variables.
    ///
    /// Returns `None` unless both variables are set and non-empty, in which
    /// case storage is accessed anonymously.
    pub fn credentials_from_env(&self) -> Option<StorageCredentials> {
        let key_id = std::env::var(&self.access_key_id_env).ok()?;
        let secret = std::env::var(&self.secret_access_key_env).ok()?;
        if key_id.is_empty() || secret.is_empty() {
            return None;
        }
        Some(StorageCredentials {
            access_key_id: key_id,
            secret_access_key: secret,
        })
    }
}

/// An access key pair for object storage
#[derive(Clone, PartialEq, Eq)]
pub struct StorageCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl std::fmt::Debug for StorageCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .finish()
    }
}

/// The two raw datasets staged by every run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StagingConfig {
    /// User activity log records
    #[serde(default = "default_events_source")]
    pub events: StagingSource,

    /// Song metadata records
    #[serde(default = "default_songs_source")]
    pub songs: StagingSource,
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            events: default_events_source(),
            songs: default_songs_source(),
        }
    }
}

/// Where one raw dataset lives and how its records are shaped
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StagingSource {
    pub source: StorageLocation,

    pub format: RecordFormat,

    /// Extra `name = value` arguments for the JSON reader
    #[serde(default)]
    pub copy_options: Vec<String>,
}

/// A location in object storage, or a local path for development
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StorageLocation {
    /// A bucket and a key prefix
    S3 { bucket: String, key: String },
    /// A local file or directory
    Local { path: String },
}

impl StorageLocation {
    /// The location as a URI (`s3://bucket/key` or the local path)
    pub fn uri(&self) -> String {
        match self {
            StorageLocation::S3 { bucket, key } => {
                format!("s3://{}/{}", bucket, key.trim_start_matches('/'))
            }
            StorageLocation::Local { path } => path.clone(),
        }
    }

    /// Glob matching every JSON record file under this location.
    ///
    /// A location that already names a `.json` file or contains a glob is
    /// used as is; a prefix expands to every `.json` object below it.
    pub fn object_pattern(&self) -> String {
        let uri = self.uri();
        if uri.ends_with(".json") || uri.contains('*') {
            uri
        } else {
            format!("{}/**/*.json", uri.trim_end_matches('/'))
        }
    }

    /// Whether reading this location needs remote storage access
    pub fn is_remote(&self) -> bool {
        matches!(self, StorageLocation::S3 { .. })
    }
}

impl std::fmt::Display for StorageLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.uri())
    }
}

/// How raw JSON records map onto staging table columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecordFormat {
    /// Fields selected positionally by the JSONPaths document at `uri`
    JsonPaths { uri: String },
    /// Keys matched to column names automatically
    Auto,
}

impl std::fmt::Display for RecordFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordFormat::JsonPaths { uri } => write!(f, "json paths ({})", uri),
            RecordFormat::Auto => write!(f, "json auto"),
        }
    }
}

/// A single quality check: a query returning one scalar and its expected value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QualityCheckConfig {
    pub check_sql: String,
    pub expected_result: ScalarValue,
}

impl QualityCheckConfig {
    pub fn new(check_sql: impl Into<String>, expected_result: impl Into<ScalarValue>) -> Self {
        Self {
            check_sql: check_sql.into(),
            expected_result: expected_result.into(),
        }
    }
}

fn default_name() -> String {
    "sparkify_etl".to_string()
}

fn default_description() -> String {
    "Load and transform song play data in the warehouse".to_string()
}

fn default_owner() -> String {
    "sparkify".to_string()
}

fn default_start_date() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

fn default_retries() -> u32 {
    4
}

fn default_retry_delay_secs() -> u64 {
    5 * 60
}

fn default_warehouse_path() -> String {
    "warehouse.duckdb".to_string()
}

fn default_region() -> String {
    "us-west-2".to_string()
}

fn default_access_key_env() -> String {
    "AWS_ACCESS_KEY_ID".to_string()
}

fn default_secret_key_env() -> String {
    "AWS_SECRET_ACCESS_KEY".to_string()
}

fn default_target_path() -> String {
    "target".to_string()
}

const SOURCE_BUCKET: &str = "udacity-dend";

fn default_events_source() -> StagingSource {
    StagingSource {
        source: StorageLocation::S3 {
            bucket: SOURCE_BUCKET.to_string(),
            key: "log_data".to_string(),
        },
        format: RecordFormat::JsonPaths {
            uri: format!("s3://{}/log_json_path.json", SOURCE_BUCKET),
        },
        copy_options: Vec::new(),
    }
}

fn default_songs_source() -> StagingSource {
    StagingSource {
        source: StorageLocation::S3 {
            bucket: SOURCE_BUCKET.to_string(),
            key: "song_data".to_string(),
        },
        format: RecordFormat::Auto,
        copy_options: Vec::new(),
    }
}

/// The checks run after every load
pub fn default_quality_checks() -> Vec<QualityCheckConfig> {
    vec![
        QualityCheckConfig::new("SELECT COUNT(*) FROM songs WHERE title IS NULL", 0_i64),
        QualityCheckConfig::new("SELECT COUNT(*) FROM songplays WHERE userid IS NULL", 0_i64),
        QualityCheckConfig::new(r#"SELECT COUNT(DISTINCT "level") FROM songplays"#, 2_i64),
        QualityCheckConfig::new(r#"SELECT COUNT(*) FROM "time" WHERE weekday IS NULL"#, 0_i64),
        QualityCheckConfig::new("SELECT COUNT(*) FROM artists WHERE name IS NULL", 0_i64),
        QualityCheckConfig::new("SELECT COUNT(*) FROM users WHERE first_name IS NULL", 0_i64),
        QualityCheckConfig::new(
            "SELECT COUNT(*) FROM songplays sp LEFT OUTER JOIN users us ON us.userid = sp.userid WHERE us.userid IS NULL",
            0_i64,
        ),
    ]
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            description: default_description(),
            default_args: DefaultArgs::default(),
            schedule: Schedule::default(),
            catchup: false,
            warehouse: WarehouseConfig::default(),
            storage: StorageConfig::default(),
            staging: StagingConfig::default(),
            quality_checks: default_quality_checks(),
            target_path: default_target_path(),
        }
    }
}

impl WorkflowConfig {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config = Self::from_yaml(&content).map_err(|e| match e {
            CoreError::ConfigParseError { message, .. } => CoreError::ConfigParseError {
                path: path.display().to_string(),
                message,
            },
            other => other,
        })?;
        log::debug!("Loaded workflow config '{}' from {}", config.name, path.display());
        Ok(config)
    }

    /// Parse and validate configuration from YAML text
    pub fn from_yaml(content: &str) -> CoreResult<Self> {
        // An empty file is a valid config: every field falls back to its default
        let config: WorkflowConfig = if content.trim().is_empty() {
            WorkflowConfig::default()
        } else {
            serde_yaml::from_str(content).map_err(|e| CoreError::ConfigParseError {
                path: "<inline>".to_string(),
                message: e.to_string(),
            })?
        };
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a project directory
    /// Looks for sparkify.yml or sparkify.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        for name in CONFIG_FILE_NAMES {
            let candidate = dir.join(name);
            if candidate.exists() {
                return Self::load(&candidate);
            }
        }
        Err(CoreError::ConfigNotFound {
            path: dir.join(CONFIG_FILE_NAMES[0]).display().to_string(),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> CoreResult<()> {
        if self.name.trim().is_empty() {
            return Err(invalid("Workflow name cannot be empty"));
        }

        if self.storage.region.trim().is_empty() {
            return Err(invalid("storage.region cannot be empty"));
        }

        for (label, source) in [("events", &self.staging.events), ("songs", &self.staging.songs)] {
            validate_source(label, source)?;
        }

        for (i, check) in self.quality_checks.iter().enumerate() {
            if check.check_sql.trim().is_empty() {
                return Err(invalid(format!(
                    "quality_checks[{}].check_sql cannot be empty",
                    i
                )));
            }
        }

        Ok(())
    }

    /// Anchor relative local sources and JSONPaths documents at `root`.
    ///
    /// Object storage locations and URIs with a scheme are left alone.
    pub fn resolve_relative_paths(&mut self, root: &Path) {
        for source in [&mut self.staging.events, &mut self.staging.songs] {
            if let StorageLocation::Local { path } = &mut source.source {
                *path = resolve_against(root, path);
            }
            if let RecordFormat::JsonPaths { uri } = &mut source.format {
                if !uri.contains("://") {
                    *uri = resolve_against(root, uri);
                }
            }
        }
    }

    /// Get absolute target path relative to a project root
    pub fn target_path_absolute(&self, root: &Path) -> PathBuf {
        root.join(&self.target_path)
    }

    /// Resolve the warehouse path from CLI flag, SF_WAREHOUSE, or config
    ///
    /// Priority: CLI flag > SF_WAREHOUSE env var > `warehouse.path`
    pub fn resolve_warehouse_path(&self, cli_path: Option<&str>) -> String {
        cli_path
            .map(String::from)
            .or_else(|| std::env::var(WAREHOUSE_ENV_VAR).ok().filter(|v| !v.is_empty()))
            .unwrap_or_else(|| self.warehouse.path.clone())
    }
}

fn validate_source(label: &str, source: &StagingSource) -> CoreResult<()> {
    match &source.source {
        StorageLocation::S3 { bucket, key } => {
            if bucket.trim().is_empty() || key.trim().is_empty() {
                return Err(invalid(format!(
                    "staging.{}.source needs a non-empty bucket and key",
                    label
                )));
            }
        }
        StorageLocation::Local { path } => {
            if path.trim().is_empty() {
                return Err(invalid(format!(
                    "staging.{}.source.path cannot be empty",
                    label
                )));
            }
        }
    }

    if let RecordFormat::JsonPaths { uri } = &source.format {
        if uri.trim().is_empty() {
            return Err(invalid(format!(
                "staging.{}.format.uri cannot be empty",
                label
            )));
        }
    }

    if let Some(bad) = source.copy_options.iter().find(|opt| !opt.contains('=')) {
        return Err(invalid(format!(
            "staging.{}.copy_options entry '{}' must have the form name = value",
            label, bad
        )));
    }

    Ok(())
}

fn resolve_against(root: &Path, path: &str) -> String {
    if Path::new(path).is_absolute() {
        path.to_string()
    } else {
        root.join(path).display().to_string()
    }
}

fn invalid(message: impl Into<String>) -> CoreError {
    CoreError::ConfigInvalid {
        message: message.into(),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
