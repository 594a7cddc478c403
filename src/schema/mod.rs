//! Schema administration over a [`ConnectionProvider`].
//!
//! [`SchemaAdmin`] is what the CLI talks to. Every call leases one session for
//! its own duration and returns it on every exit path.

pub mod history;
pub mod inventory;
pub mod teardown;
pub mod types;

use crate::db::{ConnectionProvider, QueryExecutor, QueryOutcome};
use crate::error::SchemaError;

use history::MigrationRecord;
use teardown::{TeardownEvent, TeardownOptions, TeardownPlan};
use types::{Inventory, TeardownReport, MIGRATION_HISTORY_TABLE};

pub struct SchemaAdmin<P> {
    provider: P,
}

impl<P: ConnectionProvider> SchemaAdmin<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Tables, sequences and constraints owned by the connected user.
    pub fn list_inventory(&self) -> Result<Inventory, SchemaError> {
        let mut conn = self.provider.lease()?;
        inventory::read_inventory(&mut *conn).map_err(SchemaError::CatalogRead)
    }

    /// Drop the schema (or the tables in `options.only_tables`).
    pub fn teardown(
        &self,
        options: &TeardownOptions,
        observer: &mut dyn FnMut(TeardownEvent<'_>),
    ) -> Result<TeardownReport, SchemaError> {
        let mut conn = self.provider.lease()?;
        teardown::teardown(&mut *conn, options, observer)
    }

    /// Execute a plan built from an earlier [`list_inventory`](Self::list_inventory)
    /// snapshot. The catalog is not read again, so objects created since the
    /// snapshot are left alone.
    pub fn execute_plan(
        &self,
        plan: &TeardownPlan,
        options: &TeardownOptions,
        observer: &mut dyn FnMut(TeardownEvent<'_>),
    ) -> Result<TeardownReport, SchemaError> {
        let mut conn = self.provider.lease()?;
        Ok(teardown::execute_plan(&mut *conn, plan, options, observer))
    }

    /// True only when a table named exactly `FLYWAY_SCHEMA_HISTORY` exists.
    pub fn is_migration_history_present(&self) -> Result<bool, SchemaError> {
        let mut conn = self.provider.lease()?;
        let tables = inventory::list_tables(&mut *conn).map_err(SchemaError::CatalogRead)?;
        Ok(tables.iter().any(|t| t.name == MIGRATION_HISTORY_TABLE))
    }

    /// Flyway history rows, or `None` when Flyway never ran against this schema.
    pub fn migration_history(&self) -> Result<Option<Vec<MigrationRecord>>, SchemaError> {
        if !self.is_migration_history_present()? {
            return Ok(None);
        }
        let mut conn = self.provider.lease()?;
        let records = history::read_history(&mut *conn).map_err(SchemaError::CatalogRead)?;
        Ok(Some(records))
    }

    /// Presence of each named table, in the order given.
    pub fn check_tables(&self, names: &[String]) -> Result<Vec<(String, bool)>, SchemaError> {
        let mut conn = self.provider.lease()?;
        names
            .iter()
            .map(|name| {
                inventory::table_exists(&mut *conn, name)
                    .map(|exists| (name.clone(), exists))
                    .map_err(SchemaError::CatalogRead)
            })
            .collect()
    }

    /// Run one operator-supplied statement.
    pub fn run_sql(&self, sql: &str) -> Result<QueryOutcome, SchemaError> {
        let mut conn = self.provider.lease()?;
        conn.execute(sql, &[]).map_err(SchemaError::Statement)
    }
}
