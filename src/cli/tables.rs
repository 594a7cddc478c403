//! CLI `tables` command: list the schema's tables.

use anyhow::Result;

use crate::db::ConnectionProvider;
use crate::schema::SchemaAdmin;

/// Print a numbered table listing, or the whole inventory as JSON.
pub fn tables<P: ConnectionProvider>(admin: &SchemaAdmin<P>, json: bool) -> Result<()> {
    let inventory = admin.list_inventory()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&inventory)?);
        return Ok(());
    }

    if inventory.tables.is_empty() {
        println!("No tables found in schema.");
        return Ok(());
    }

    println!("Found {} tables:", inventory.tables.len());
    for (i, table) in inventory.tables.iter().enumerate() {
        println!("{:>3}. {}", i + 1, table.name);
    }
    println!();
    println!(
        "Sequences: {}   Constraints: {} ({} foreign keys)",
        inventory.sequences.len(),
        inventory.constraints.len(),
        inventory.foreign_keys().count()
    );
    Ok(())
}
