//! Read-only view of Flyway's migration history.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::db::{QueryExecutor, RowSet};
use crate::error::QueryError;

pub const HISTORY_SQL: &str = "SELECT version, description, type, script, \
     TO_CHAR(installed_on, 'YYYY-MM-DD HH24:MI:SS') AS installed_on, success \
     FROM flyway_schema_history ORDER BY installed_rank";

const INSTALLED_ON_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One applied (or failed) migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationRecord {
    /// `None` for repeatable migrations.
    pub version: Option<String>,
    pub description: String,
    pub kind: String,
    pub script: String,
    pub installed_on: Option<NaiveDateTime>,
    pub success: bool,
}

/// All history rows in install order. The caller checks the table exists first.
pub fn read_history(exec: &mut impl QueryExecutor) -> Result<Vec<MigrationRecord>, QueryError> {
    let rows = exec.query(HISTORY_SQL, &[])?;
    Ok((0..rows.len()).map(|i| parse_row(&rows, i)).collect())
}

fn parse_row(rows: &RowSet, i: usize) -> MigrationRecord {
    let text = |column: &str| rows.value(i, column).unwrap_or_default().to_string();
    MigrationRecord {
        version: rows.value(i, "VERSION").map(str::to_string),
        description: text("DESCRIPTION"),
        kind: text("TYPE"),
        script: text("SCRIPT"),
        installed_on: rows
            .value(i, "INSTALLED_ON")
            .and_then(|v| NaiveDateTime::parse_from_str(v, INSTALLED_ON_FORMAT).ok()),
        // NUMBER(1) rendered as text
        success: rows.value(i, "SUCCESS").map(str::trim) == Some("1"),
    }
}
