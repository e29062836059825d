//! Error types for sf-core

use thiserror::Error;

/// Core error type for Sparkify ETL
#[derive(Error, Debug)]
pub enum CoreError {
    /// E001: Configuration file not found
    #[error("[E001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// E002: Failed to parse configuration file
    #[error("[E002] Failed to parse config {path}: {message}")]
    ConfigParseError { path: String, message: String },

    /// E003: Invalid configuration value
    #[error("[E003] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// E004: Invalid schedule expression
    #[error("[E004] Invalid schedule '{expression}': expected one of @once, @hourly, @daily, @weekly, @monthly, @yearly")]
    InvalidSchedule { expression: String },

    /// E005: Task referenced but never added to the graph
    #[error("[E005] Task not found: {name}")]
    TaskNotFound { name: String },

    /// E006: Two tasks registered under the same id
    #[error("[E006] Duplicate task id: {name}")]
    DuplicateTask { name: String },

    /// E007: Circular dependency detected
    #[error("[E007] Circular dependency detected: {cycle}")]
    CircularDependency { cycle: String },

    /// E008: Graph does not have exactly one start and one end node
    #[error("[E008] Invalid workflow graph: {message}")]
    InvalidGraphShape { message: String },

    /// E009: Invalid selector
    #[error("[E009] Invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    /// E010: Empty identifier
    #[error("[E010] Empty name for {context}")]
    EmptyName { context: String },

    /// E014: IO error
    #[error("[E014] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// E016: IO error with file path context
    #[error("[E016] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
