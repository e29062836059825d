//! Create-tables command implementation

use anyhow::Result;
use sf_sql::templates::table_definitions;

use crate::cli::{CreateTablesArgs, GlobalArgs};
use crate::commands::common::{
    create_missing_tables, load_workspace, open_warehouse, warehouse_path,
};

/// Execute the create-tables command
pub async fn execute(args: &CreateTablesArgs, global: &GlobalArgs) -> Result<()> {
    if args.dry_run {
        for def in table_definitions() {
            println!("-- {}\n{}\n", def.name, def.ddl.trim());
        }
        return Ok(());
    }

    let ws = load_workspace(global)?;
    let db = open_warehouse(&ws, global)?;
    let created = create_missing_tables(db.as_ref()).await?;

    let total = table_definitions().len();
    println!(
        "Created {} of {} tables in {} ({} already existed)",
        created,
        total,
        warehouse_path(&ws, global),
        total - created
    );
    Ok(())
}
