//! Oracle driver adapter over the `oracle` crate (ODPI-C).
//!
//! Requires Oracle Instant Client at runtime. Sessions come from a small
//! session pool and run with autocommit on, so every DDL commits on its own.

use oracle::pool::{Pool, PoolBuilder};
use oracle::sql_type::ToSql;
use oracle::Connection;
use tracing::{debug, info, warn};

use super::{ConnectionProvider, QueryExecutor, QueryOutcome, RowSet};
use crate::config::ConnectionConfig;
use crate::error::{ConnectionError, QueryError};

/// Session pool for one schema credential.
pub struct OraclePool {
    pool: Pool,
}

impl OraclePool {
    /// Create the pool. Fails on bad credentials or an unreachable listener.
    pub fn connect(config: &ConnectionConfig) -> Result<Self, ConnectionError> {
        info!(
            user = %config.user,
            connect_string = %config.connect_string,
            "initializing Oracle session pool"
        );
        let pool = PoolBuilder::new(
            config.user.as_str(),
            config.password.as_str(),
            config.connect_string.as_str(),
        )
        .min_connections(config.pool_min)
        .max_connections(config.pool_max)
        .connection_increment(config.pool_increment)
        .build()
        .map_err(|e| ConnectionError::new(e.to_string()))?;
        info!("Oracle session pool ready");
        Ok(Self { pool })
    }
}

impl ConnectionProvider for OraclePool {
    type Conn = OracleSession;

    fn acquire(&self) -> Result<OracleSession, ConnectionError> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e| ConnectionError::new(e.to_string()))?;
        conn.set_autocommit(true);
        Ok(OracleSession { conn })
    }

    fn release(&self, session: OracleSession) {
        if let Err(e) = session.conn.close() {
            warn!(error = %e, "failed to return session to pool");
        }
    }
}

/// One pooled session.
pub struct OracleSession {
    conn: Connection,
}

impl QueryExecutor for OracleSession {
    fn execute(&mut self, sql: &str, binds: &[&str]) -> Result<QueryOutcome, QueryError> {
        debug!(sql = %sql.trim(), "execute");
        let params: Vec<&dyn ToSql> = binds.iter().map(|b| b as &dyn ToSql).collect();
        let mut stmt = self.conn.statement(sql).build().map_err(query_error)?;

        if !stmt.is_query() {
            stmt.execute(&params).map_err(query_error)?;
            let affected = stmt.row_count().map_err(query_error)?;
            return Ok(QueryOutcome::RowsAffected(affected));
        }

        let result_set = stmt.query(&params).map_err(query_error)?;
        let columns: Vec<String> = result_set
            .column_info()
            .iter()
            .map(|c| c.name().to_string())
            .collect();

        let mut rows = Vec::new();
        for row in result_set {
            let row = row.map_err(query_error)?;
            let values = (0..columns.len())
                .map(|i| row.get::<usize, Option<String>>(i))
                .collect::<Result<Vec<_>, _>>()
                .map_err(query_error)?;
            rows.push(values);
        }
        Ok(QueryOutcome::Rows(RowSet::new(columns, rows)))
    }
}

fn query_error(err: oracle::Error) -> QueryError {
    let code = match &err {
        oracle::Error::OciError(db) | oracle::Error::DpiError(db) => Some(db.code()),
        _ => None,
    };
    QueryError::new(err.to_string(), code)
}
