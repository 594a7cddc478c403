//! Schema teardown: inventory, then foreign-key disable, then drops.
//!
//! The run works from a single catalog snapshot taken before the first DDL
//! statement. The snapshot is not re-read or re-validated while statements
//! execute, even though every drop makes it more stale; objects created during
//! the run are not discovered. Do not turn this into a re-query loop.
//!
//! Every foreign key in scope is disabled before any table is dropped, which
//! makes table drop order irrelevant: no dependency graph is built. Foreign keys
//! are never re-enabled and primary keys are never dropped explicitly, because
//! `CASCADE CONSTRAINTS` removes them along with their table.
//!
//! Individual statement failures are recorded and the run moves on. Only a
//! failed catalog read aborts.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::db::QueryExecutor;
use crate::error::SchemaError;

use super::inventory::read_inventory;
use super::types::{
    Inventory, Operation, OperationRecord, Outcome, TeardownPhase, TeardownReport,
    MIGRATION_HISTORY_TABLE,
};

/// Shared flag checked before every statement. Setting it never interrupts a
/// statement that is already running.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TeardownOptions {
    /// Plan and report, but send no DISABLE/DROP statement.
    pub dry_run: bool,
    /// Restrict the run to these tables (case-insensitive). Empty means the
    /// whole schema, sequences included.
    pub only_tables: BTreeSet<String>,
    pub cancel: CancelToken,
}

/// Progress notifications, delivered as each step happens.
#[derive(Debug)]
pub enum TeardownEvent<'a> {
    Phase { phase: TeardownPhase, planned: usize },
    Operation(&'a OperationRecord),
}

/// Ordered statements for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeardownPlan {
    pub disable: Vec<Operation>,
    pub tables: Vec<Operation>,
    pub sequences: Vec<Operation>,
    /// Requested table names that are not in the snapshot.
    pub unmatched: Vec<String>,
}

impl TeardownPlan {
    pub fn len(&self) -> usize {
        self.disable.len() + self.tables.len() + self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Turn a snapshot into the statements a run will issue.
pub fn plan(inventory: &Inventory, only_tables: &BTreeSet<String>) -> TeardownPlan {
    let requested: BTreeSet<String> = only_tables.iter().map(|t| t.to_uppercase()).collect();
    let in_scope = |table: &str| requested.is_empty() || requested.contains(&table.to_uppercase());

    let disable = inventory
        .foreign_keys()
        .filter(|c| in_scope(&c.owner_table))
        .map(|c| Operation::DisableConstraint {
            table: c.owner_table.clone(),
            constraint: c.name.clone(),
        })
        .collect();

    // The migration-history table goes first so its removal is visible on its own.
    let mut scoped: Vec<&str> = inventory
        .tables
        .iter()
        .map(|t| t.name.as_str())
        .filter(|name| in_scope(name))
        .collect();
    if let Some(pos) = scoped.iter().position(|t| *t == MIGRATION_HISTORY_TABLE) {
        let history = scoped.remove(pos);
        scoped.insert(0, history);
    }
    let tables = scoped
        .into_iter()
        .map(|t| Operation::DropTable { table: t.to_string() })
        .collect();

    let sequences = if requested.is_empty() {
        inventory
            .sequences
            .iter()
            .map(|s| Operation::DropSequence {
                sequence: s.name.clone(),
            })
            .collect()
    } else {
        Vec::new()
    };

    let unmatched = requested
        .iter()
        .filter(|r| !inventory.tables.iter().any(|t| t.name.to_uppercase() == **r))
        .cloned()
        .collect();

    TeardownPlan {
        disable,
        tables,
        sequences,
        unmatched,
    }
}

/// Issue every planned statement once, in phase order.
pub fn execute_plan(
    exec: &mut impl QueryExecutor,
    plan: &TeardownPlan,
    options: &TeardownOptions,
    observer: &mut dyn FnMut(TeardownEvent<'_>),
) -> TeardownReport {
    let mut report = TeardownReport::new(options.dry_run);
    report.phase = TeardownPhase::InventoryRead;

    let phases = [
        (TeardownPhase::ConstraintsDisabling, &plan.disable),
        (TeardownPhase::TablesDropping, &plan.tables),
        (TeardownPhase::SequencesDropping, &plan.sequences),
    ];

    for (phase, operations) in phases {
        report.phase = phase;
        info!(%phase, planned = operations.len(), "teardown phase");
        observer(TeardownEvent::Phase {
            phase,
            planned: operations.len(),
        });

        for operation in operations {
            if options.cancel.is_cancelled() {
                warn!(%phase, next = %operation, "teardown interrupted");
                report.interrupted = true;
                return report;
            }

            let outcome = if options.dry_run {
                Outcome::Planned
            } else {
                match exec.execute(&operation.sql(), &[]) {
                    Ok(_) => {
                        info!(object = operation.object_name(), "{operation}: ok");
                        Outcome::Succeeded
                    }
                    Err(e) => {
                        warn!(object = operation.object_name(), error = %e, "{operation}: failed");
                        Outcome::Failed(e.message)
                    }
                }
            };

            report.records.push(OperationRecord {
                operation: operation.clone(),
                outcome,
            });
            if let Some(record) = report.records.last() {
                observer(TeardownEvent::Operation(record));
            }
        }
    }

    report.phase = TeardownPhase::Done;
    info!(
        succeeded = report.succeeded(),
        failed = report.failed(),
        planned = report.planned(),
        "teardown finished"
    );
    report
}

/// Snapshot the catalog, plan, and execute.
///
/// Fails only when the catalog cannot be read; no statement has been sent then.
pub fn teardown(
    exec: &mut impl QueryExecutor,
    options: &TeardownOptions,
    observer: &mut dyn FnMut(TeardownEvent<'_>),
) -> Result<TeardownReport, SchemaError> {
    let inventory = read_inventory(exec).map_err(|e| {
        warn!(phase = %TeardownPhase::Aborted, error = %e, "catalog read failed");
        SchemaError::CatalogRead(e)
    })?;

    let plan = plan(&inventory, &options.only_tables);
    for name in &plan.unmatched {
        debug!(table = %name, "requested table not found in schema");
    }

    Ok(execute_plan(exec, &plan, options, observer))
}
