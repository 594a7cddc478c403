//! CLI `clean` command: drop every table and sequence in the schema.

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeSet;
use std::io::BufRead;
use std::time::Duration;

use super::InterruptSlot;
use crate::db::ConnectionProvider;
use crate::error::QueryError;
use crate::schema::teardown::{self, TeardownEvent, TeardownOptions};
use crate::schema::types::{OperationRecord, Outcome, TeardownReport};
use crate::schema::SchemaAdmin;

#[derive(Debug, Clone, Default)]
pub struct CleanArgs {
    /// Skip the confirmation prompt.
    pub force: bool,
    /// Only these tables; empty means everything.
    pub tables: Vec<String>,
    /// Show the inventory and stop.
    pub list_only: bool,
    pub dry_run: bool,
    /// Print the final report as JSON.
    pub json: bool,
}

/// One progress line for a completed operation.
pub fn format_record(record: &OperationRecord) -> String {
    match &record.outcome {
        Outcome::Succeeded => format!("  ok       {}", record.operation),
        Outcome::Planned => format!("  planned  {}", record.operation),
        Outcome::Failed(reason) => {
            let mut line = format!("  FAILED   {}: {reason}", record.operation);
            if let Some(hint) = QueryError::new(reason.as_str(), None).hint() {
                line.push_str(&format!("\n           hint: {hint}"));
            }
            line
        }
    }
}

/// Closing line of a run.
pub fn format_summary(report: &TeardownReport) -> String {
    let mut summary = if report.dry_run {
        format!("Dry run: {} statements planned, none executed.", report.planned())
    } else {
        format!("{} succeeded, {} failed.", report.succeeded(), report.failed())
    };
    if report.interrupted {
        summary.push_str(&format!(" Interrupted while {}.", report.phase));
    }
    summary
}

/// Inventory, confirm, then tear down with live progress.
///
/// The run executes exactly the plan shown before the prompt; tables created
/// while the operator is answering are not touched.
///
/// Returns `Ok` even when individual statements fail; only connection and
/// catalog failures are errors.
pub fn clean<P: ConnectionProvider>(
    admin: &SchemaAdmin<P>,
    args: &CleanArgs,
    interrupts: &InterruptSlot,
    input: &mut impl BufRead,
) -> Result<()> {
    println!("Checking tables in schema...");
    let inventory = admin.list_inventory()?;

    if inventory.tables.is_empty() && inventory.sequences.is_empty() {
        println!("Schema is already empty. No tables or sequences found.");
        return Ok(());
    }

    println!("Found {} tables:", inventory.tables.len());
    for table in &inventory.tables {
        println!("  - {}", table.name);
    }
    if !inventory.sequences.is_empty() {
        println!("Found {} sequences.", inventory.sequences.len());
    }

    if args.list_only {
        println!("\nListed only (--list). Nothing was dropped.");
        return Ok(());
    }

    let only: BTreeSet<String> = args.tables.iter().cloned().collect();
    let preview = teardown::plan(&inventory, &only);
    for name in &preview.unmatched {
        println!("WARNING: table {name} is not in this schema.");
    }
    if preview.is_empty() {
        println!("Nothing selected for removal.");
        return Ok(());
    }

    println!(
        "\n{} tables and {} sequences selected for removal ({} foreign keys to disable).",
        preview.tables.len(),
        preview.sequences.len(),
        preview.disable.len()
    );

    if !args.force && !args.dry_run {
        println!("WARNING: this cannot be undone.");
        if !super::confirm("Continue?", input)? {
            println!("Cancelled. Nothing was dropped.");
            return Ok(());
        }
    }

    let armed = interrupts.arm();
    let options = TeardownOptions {
        dry_run: args.dry_run,
        only_tables: only,
        cancel: armed.token().clone(),
    };

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner} {msg}")
            .expect("valid template"),
    );
    pb.enable_steady_tick(Duration::from_millis(120));

    let report = admin.execute_plan(&preview, &options, &mut |event| match event {
        TeardownEvent::Phase { phase, planned } => {
            pb.set_message(format!("{phase} ({planned})"));
        }
        TeardownEvent::Operation(record) => {
            pb.suspend(|| println!("{}", format_record(record)));
        }
    });
    pb.finish_and_clear();
    drop(armed);
    let report = report?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    println!("\n{}", format_summary(&report));
    Ok(())
}
