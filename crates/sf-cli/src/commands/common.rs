//! Shared helpers for CLI commands

use anyhow::{Context, Result};
use sf_core::config::CONFIG_FILE_NAMES;
use sf_core::WorkflowConfig;
use sf_db::{Database, DuckDbBackend};
use sf_sql::templates::table_definitions;
use sf_workflow::{sparkify_workflow, WorkflowGraph};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cli::GlobalArgs;

/// Exit code for a failed data quality check
pub(crate) const EXIT_QUALITY_FAILED: u8 = 2;

/// Exit code for any other failed task
pub(crate) const EXIT_TASK_FAILED: u8 = 4;

/// Non-zero process exit without an error message.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that RAII destructors run and cleanup happens properly.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) u8);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Control flow only, never shown to the user
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// Loaded configuration and the directory relative paths resolve against
pub(crate) struct Workspace {
    pub(crate) config: WorkflowConfig,
    pub(crate) root: PathBuf,
}

impl Workspace {
    pub(crate) fn target_dir(&self) -> PathBuf {
        self.config.target_path_absolute(&self.root)
    }

    pub(crate) fn run_state_path(&self) -> PathBuf {
        self.target_dir().join("run_state.json")
    }
}

/// Load the workflow config.
///
/// An explicit `--config` must exist. Without one, `sparkify.yml` (or
/// `.yaml`) in the current directory is used if present, and the built-in
/// defaults otherwise. Relative local paths in the config are resolved
/// against the directory holding it.
pub(crate) fn load_workspace(global: &GlobalArgs) -> Result<Workspace> {
    let (mut config, root) = match &global.config {
        Some(path) => {
            let path = Path::new(path);
            let config = WorkflowConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?;
            let root = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            (config, root)
        }
        None => {
            let root = PathBuf::from(".");
            let has_file = CONFIG_FILE_NAMES.iter().any(|n| root.join(n).exists());
            let config = if has_file {
                WorkflowConfig::load_from_dir(&root).context("Failed to load config")?
            } else {
                log::info!(
                    "No {} found, using the default workflow configuration",
                    CONFIG_FILE_NAMES[0]
                );
                WorkflowConfig::default()
            };
            (config, root)
        }
    };

    config.resolve_relative_paths(&root);
    Ok(Workspace { config, root })
}

/// Resolve the warehouse path: `--warehouse`, then `SF_WAREHOUSE`, then
/// config. Relative paths are taken relative to the config directory.
pub(crate) fn warehouse_path(ws: &Workspace, global: &GlobalArgs) -> String {
    let path = ws.config.resolve_warehouse_path(global.warehouse.as_deref());
    if path == ":memory:" || Path::new(&path).is_absolute() {
        path
    } else {
        ws.root.join(path).display().to_string()
    }
}

/// Open the warehouse connection
pub(crate) fn open_warehouse(ws: &Workspace, global: &GlobalArgs) -> Result<Arc<dyn Database>> {
    let path = warehouse_path(ws, global);
    log::debug!("Opening warehouse at {}", path);
    let db = DuckDbBackend::new(&path)
        .with_context(|| format!("Failed to open warehouse {}", path))?;
    Ok(Arc::new(db))
}

/// Build the workflow graph from config
pub(crate) fn build_graph(config: &WorkflowConfig) -> Result<WorkflowGraph> {
    sparkify_workflow(config).context("Invalid workflow graph")
}

/// Create every staging, fact and dimension table that does not exist yet.
///
/// Returns the number of tables created.
pub(crate) async fn create_missing_tables(db: &dyn Database) -> Result<usize> {
    let mut created = 0;
    for def in table_definitions() {
        if db.relation_exists(def.name).await? {
            log::debug!("Table {} already exists", def.name);
            continue;
        }
        db.execute_batch(def.ddl)
            .await
            .with_context(|| format!("Failed to create table {}", def.name))?;
        log::info!("Created table {}", def.name);
        created += 1;
    }
    Ok(created)
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;
