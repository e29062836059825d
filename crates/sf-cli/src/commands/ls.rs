//! List command implementation

use anyhow::{Context, Result};
use sf_sql::{extract_dependencies, SqlParser};
use sf_workflow::{TaskKind, WorkflowGraph};
use std::collections::{BTreeSet, HashSet};

use crate::cli::{GlobalArgs, LsArgs, LsOutput};
use crate::commands::common::{build_graph, load_workspace};

/// Execute the ls command
pub async fn execute(args: &LsArgs, global: &GlobalArgs) -> Result<()> {
    let ws = load_workspace(global)?;
    let graph = build_graph(&ws.config)?;

    let tasks = collect_task_info(&graph)?;

    let filtered_names: HashSet<String> = match &args.select {
        Some(selector) => graph
            .dag()
            .select(selector)
            .context("Invalid selector")?
            .into_iter()
            .map(|t| t.to_string())
            .collect(),
        None => tasks.iter().map(|t| t.name.clone()).collect(),
    };
    let filtered: Vec<&TaskInfo> = tasks
        .iter()
        .filter(|t| filtered_names.contains(&t.name))
        .collect();

    match args.output {
        LsOutput::Table => print_table(&filtered),
        LsOutput::Json => print_json(&filtered)?,
        LsOutput::Tree => print_tree(&filtered),
    }

    Ok(())
}

/// Task information for display
#[derive(Debug, serde::Serialize)]
struct TaskInfo {
    name: String,
    kind: TaskKind,
    target_table: Option<String>,
    depends_on: Vec<String>,
    /// Tables read by the task's SQL
    reads: Vec<String>,
}

/// Gather display info for every task, in topological order
fn collect_task_info(graph: &WorkflowGraph) -> Result<Vec<TaskInfo>> {
    let parser = SqlParser::duckdb();
    let mut infos = Vec::with_capacity(graph.len());

    for task in graph.tasks()? {
        let name = task.task_id().to_string();
        let mut reads = BTreeSet::new();
        for sql in task.queries() {
            let statements = parser
                .parse(sql)
                .with_context(|| format!("Failed to parse SQL for task: {}", name))?;
            reads.extend(extract_dependencies(&statements));
        }

        infos.push(TaskInfo {
            depends_on: graph
                .upstream_of(&name)
                .into_iter()
                .map(|t| t.to_string())
                .collect(),
            kind: task.kind(),
            target_table: task.target_table().map(|t| t.to_string()),
            reads: reads.into_iter().collect(),
            name,
        });
    }

    Ok(infos)
}

/// Print tasks in table format
fn print_table(tasks: &[&TaskInfo]) {
    let name_width = tasks
        .iter()
        .map(|t| t.name.len())
        .max()
        .unwrap_or(4)
        .max(4);
    let kind_width = 14;
    let table_width = tasks
        .iter()
        .map(|t| t.target_table.as_ref().map_or(1, |s| s.len()))
        .max()
        .unwrap_or(5)
        .max(5);

    println!(
        "{:<name_width$}  {:<kind_width$}  {:<table_width$}  DEPENDS_ON",
        "NAME", "KIND", "TABLE",
    );
    println!(
        "{:-<name_width$}  {:-<kind_width$}  {:-<table_width$}  {}",
        "",
        "",
        "",
        "-".repeat(40),
    );

    for task in tasks {
        let deps = if task.depends_on.is_empty() {
            "-".to_string()
        } else {
            task.depends_on.join(", ")
        };
        println!(
            "{:<name_width$}  {:<kind_width$}  {:<table_width$}  {}",
            task.name,
            task.kind.to_string(),
            task.target_table.as_deref().unwrap_or("-"),
            deps,
        );
    }

    println!();
    println!("{} tasks found", tasks.len());
}

/// Print tasks in JSON format
fn print_json(tasks: &[&TaskInfo]) -> Result<()> {
    let json = serde_json::to_string_pretty(tasks).context("Failed to serialize to JSON")?;
    println!("{}", json);
    Ok(())
}

/// Print tasks as a tree, each task followed by the tasks waiting on it.
///
/// A task with several upstream tasks appears once under each of them.
fn print_tree(tasks: &[&TaskInfo]) {
    let names: HashSet<&str> = tasks.iter().map(|t| t.name.as_str()).collect();
    let roots: Vec<&&TaskInfo> = tasks
        .iter()
        .filter(|t| t.depends_on.iter().all(|d| !names.contains(d.as_str())))
        .collect();

    println!("Dependency Tree:");
    println!();

    for (i, root) in roots.iter().enumerate() {
        print_tree_node(&root.name, tasks, "", i == roots.len() - 1);
    }
}

fn print_tree_node(name: &str, tasks: &[&TaskInfo], prefix: &str, is_last: bool) {
    let connector = if is_last { "└── " } else { "├── " };
    println!("{}{}{}", prefix, connector, name);

    let dependents: Vec<&&TaskInfo> = tasks
        .iter()
        .filter(|t| t.depends_on.iter().any(|d| d == name))
        .collect();

    let new_prefix = format!("{}{}   ", prefix, if is_last { " " } else { "│" });
    for (i, dependent) in dependents.iter().enumerate() {
        print_tree_node(&dependent.name, tasks, &new_prefix, i == dependents.len() - 1);
    }
}

#[cfg(test)]
#[path = "ls_test.rs"]
mod tests;
