//! CLI `history` command: check Flyway's control table and list its migrations.

use anyhow::Result;

use crate::db::ConnectionProvider;
use crate::schema::history::MigrationRecord;
use crate::schema::SchemaAdmin;

pub fn format_migration(record: &MigrationRecord) -> String {
    let installed = record
        .installed_on
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".into());
    let status = if record.success { "Success" } else { "FAILED" };
    format!(
        "Version:      {}\n  Description:  {}\n  Type:         {}\n  Script:       {}\n  Installed on: {}\n  Status:       {}",
        record.version.as_deref().unwrap_or("(repeatable)"),
        record.description,
        record.kind,
        record.script,
        installed,
        status
    )
}

pub fn history<P: ConnectionProvider>(admin: &SchemaAdmin<P>) -> Result<()> {
    println!("Checking Flyway control...");

    let Some(records) = admin.migration_history()? else {
        println!("FLYWAY_SCHEMA_HISTORY not found.");
        println!("Flyway has not been initialized on this schema.");
        return Ok(());
    };

    println!("FLYWAY_SCHEMA_HISTORY found.");
    if records.is_empty() {
        println!("No migrations recorded in Flyway history.");
        return Ok(());
    }

    println!("\nFound {} migrations:", records.len());
    for record in &records {
        println!("\n{}", format_migration(record));
    }

    let failed = records.iter().filter(|r| !r.success).count();
    if failed > 0 {
        println!("\nWARNING: {failed} migration(s) failed. Run `flyway repair` before migrating again.");
    }
    Ok(())
}
