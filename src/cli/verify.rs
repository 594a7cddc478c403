//! CLI `verify` command: check that Flyway ran and created the expected tables.

use anyhow::Result;

use crate::db::ConnectionProvider;
use crate::schema::SchemaAdmin;

pub fn verify<P: ConnectionProvider>(admin: &SchemaAdmin<P>, expected: &[String]) -> Result<()> {
    println!("Checking migrations and schema...");

    if !admin.is_migration_history_present()? {
        println!("FLYWAY_SCHEMA_HISTORY not found.");
        println!("Flyway has not been initialized on this schema.");
        return Ok(());
    }
    println!("FLYWAY_SCHEMA_HISTORY found.");

    println!("\nApplication tables:");
    let checks = admin.check_tables(expected)?;
    for (name, exists) in &checks {
        if *exists {
            println!("  [ok]      {name}");
        } else {
            println!("  [missing] {name}");
        }
    }

    let missing = checks.iter().filter(|(_, exists)| !exists).count();
    if missing > 0 {
        println!("\n{missing} of {} expected tables are missing.", checks.len());
    } else {
        println!("\nAll {} expected tables exist.", checks.len());
    }
    Ok(())
}
