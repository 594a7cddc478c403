//! Database access seams.
//!
//! Everything above this module talks to the database through two traits:
//! [`ConnectionProvider`] hands out sessions and [`QueryExecutor`] runs a single
//! statement on one. The Oracle implementation lives in [`driver`] behind the
//! `oracle` cargo feature.

#[cfg(feature = "oracle")]
pub mod driver;

use std::ops::{Deref, DerefMut};

use crate::error::{ConnectionError, QueryError};

/// Result of running one statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    /// A query that produced a result set (possibly empty).
    Rows(RowSet),
    /// DML or DDL; the driver's affected-row count (0 for DDL).
    RowsAffected(u64),
}

/// A result set with its column names. Values are rendered as text by the
/// driver; `None` is SQL `NULL`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl RowSet {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        Self { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column, compared case-insensitively.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
    }

    /// Value of `column` in row `row`, `None` for NULL or unknown column.
    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)?.as_deref()
    }

    /// Every value of a column the caller requires to be present and non-null.
    pub fn required_column(&self, column: &str) -> Result<Vec<String>, QueryError> {
        let idx = self
            .column_index(column)
            .ok_or_else(|| QueryError::new(format!("result set has no column {column}"), None))?;
        self.rows
            .iter()
            .map(|row| {
                row.get(idx)
                    .cloned()
                    .flatten()
                    .ok_or_else(|| QueryError::new(format!("NULL in column {column}"), None))
            })
            .collect()
    }
}

/// Runs statements against one open session.
pub trait QueryExecutor {
    /// Execute a single statement. Positional binds map to `:1`, `:2`, ...
    fn execute(&mut self, sql: &str, binds: &[&str]) -> Result<QueryOutcome, QueryError>;

    /// Execute a statement that must return rows.
    fn query(&mut self, sql: &str, binds: &[&str]) -> Result<RowSet, QueryError> {
        match self.execute(sql, binds)? {
            QueryOutcome::Rows(rows) => Ok(rows),
            QueryOutcome::RowsAffected(_) => Err(QueryError::new(
                format!("statement did not return rows: {}", sql.trim()),
                None,
            )),
        }
    }
}

impl<E: QueryExecutor + ?Sized> QueryExecutor for &mut E {
    fn execute(&mut self, sql: &str, binds: &[&str]) -> Result<QueryOutcome, QueryError> {
        (**self).execute(sql, binds)
    }
}

/// Hands out sessions and takes them back.
pub trait ConnectionProvider {
    type Conn: QueryExecutor;

    fn acquire(&self) -> Result<Self::Conn, ConnectionError>;

    fn release(&self, conn: Self::Conn);

    /// Acquire a session that is released when the returned guard drops.
    fn lease(&self) -> Result<Lease<'_, Self>, ConnectionError>
    where
        Self: Sized,
    {
        let conn = self.acquire()?;
        tracing::trace!("connection acquired");
        Ok(Lease {
            provider: self,
            conn: Some(conn),
        })
    }
}

/// A borrowed session, returned to its provider on drop.
pub struct Lease<'p, P: ConnectionProvider> {
    provider: &'p P,
    conn: Option<P::Conn>,
}

impl<P: ConnectionProvider> Deref for Lease<'_, P> {
    type Target = P::Conn;

    fn deref(&self) -> &Self::Target {
        self.conn.as_ref().expect("lease holds its connection until dropped")
    }
}

impl<P: ConnectionProvider> DerefMut for Lease<'_, P> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.conn.as_mut().expect("lease holds its connection until dropped")
    }
}

impl<P: ConnectionProvider> Drop for Lease<'_, P> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.provider.release(conn);
            tracing::trace!("connection released");
        }
    }
}

/// Quote an identifier taken from the catalog so mixed-case names survive.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
