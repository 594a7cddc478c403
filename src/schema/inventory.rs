//! Catalog reads against the `USER_*` dictionary views.
//!
//! Only objects owned by the connected credential are visible; the database's
//! own access control does the filtering.

use crate::db::QueryExecutor;
use crate::error::QueryError;

use super::types::{
    ConstraintDescriptor, ConstraintKind, Inventory, SequenceDescriptor, TableDescriptor,
};

pub const TABLES_SQL: &str = "SELECT table_name FROM user_tables \
     WHERE table_name NOT LIKE 'BIN$%' ORDER BY table_name";

pub const SEQUENCES_SQL: &str = "SELECT sequence_name FROM user_sequences \
     ORDER BY sequence_name";

pub const CONSTRAINTS_SQL: &str = "SELECT constraint_name, table_name, constraint_type \
     FROM user_constraints \
     WHERE constraint_type IN ('R', 'P') AND table_name NOT LIKE 'BIN$%' \
     ORDER BY table_name, constraint_name";

pub const TABLE_EXISTS_SQL: &str = "SELECT COUNT(*) AS cnt FROM user_tables WHERE table_name = :1";

/// Table names in the schema, sorted.
pub fn list_tables(exec: &mut impl QueryExecutor) -> Result<Vec<TableDescriptor>, QueryError> {
    let mut names = exec.query(TABLES_SQL, &[])?.required_column("TABLE_NAME")?;
    names.sort();
    Ok(names.into_iter().map(|name| TableDescriptor { name }).collect())
}

pub fn list_sequences(
    exec: &mut impl QueryExecutor,
) -> Result<Vec<SequenceDescriptor>, QueryError> {
    let mut names = exec.query(SEQUENCES_SQL, &[])?.required_column("SEQUENCE_NAME")?;
    names.sort();
    Ok(names
        .into_iter()
        .map(|name| SequenceDescriptor { name })
        .collect())
}

pub fn list_constraints(
    exec: &mut impl QueryExecutor,
) -> Result<Vec<ConstraintDescriptor>, QueryError> {
    let rows = exec.query(CONSTRAINTS_SQL, &[])?;
    let names = rows.required_column("CONSTRAINT_NAME")?;
    let owners = rows.required_column("TABLE_NAME")?;
    let kinds = rows.required_column("CONSTRAINT_TYPE")?;

    names
        .into_iter()
        .zip(owners)
        .zip(kinds)
        .map(|((name, owner_table), kind)| {
            let kind = kind
                .parse::<ConstraintKind>()
                .map_err(|e| QueryError::new(format!("constraint {name}: {e}"), None))?;
            Ok(ConstraintDescriptor {
                name,
                owner_table,
                kind,
            })
        })
        .collect()
}

/// Full snapshot: tables, sequences and constraints, in reporting order.
pub fn read_inventory(exec: &mut impl QueryExecutor) -> Result<Inventory, QueryError> {
    let tables = list_tables(exec)?;
    let sequences = list_sequences(exec)?;
    let constraints = list_constraints(exec)?;
    tracing::debug!(
        tables = tables.len(),
        sequences = sequences.len(),
        constraints = constraints.len(),
        "inventory read"
    );
    Ok(Inventory {
        tables,
        sequences,
        constraints,
    }
    .sorted())
}

/// Whether a table with exactly this name exists.
pub fn table_exists(exec: &mut impl QueryExecutor, name: &str) -> Result<bool, QueryError> {
    let rows = exec.query(TABLE_EXISTS_SQL, &[name])?;
    let count = rows
        .value(0, "CNT")
        .and_then(|v| v.trim().parse::<u64>().ok())
        .ok_or_else(|| QueryError::new("COUNT(*) returned no value", None))?;
    Ok(count > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{QueryOutcome, RowSet};

    /// Answers the catalog queries with canned rows.
    struct Canned;

    fn rows(columns: &[&str], values: &[&[&str]]) -> QueryOutcome {
        QueryOutcome::Rows(RowSet::new(
            columns.iter().map(|c| c.to_string()).collect(),
            values
                .iter()
                .map(|r| r.iter().map(|v| Some(v.to_string())).collect())
                .collect(),
        ))
    }

    impl QueryExecutor for Canned {
        fn execute(&mut self, sql: &str, binds: &[&str]) -> Result<QueryOutcome, QueryError> {
            match sql {
                TABLES_SQL => Ok(rows(&["TABLE_NAME"], &[&["ORDERS"], &["CUSTOMERS"]])),
                SEQUENCES_SQL => Ok(rows(&["SEQUENCE_NAME"], &[&["SEQ_ORDERS"]])),
                CONSTRAINTS_SQL => Ok(rows(
                    &["CONSTRAINT_NAME", "TABLE_NAME", "CONSTRAINT_TYPE"],
                    &[
                        &["PK_ORDERS", "ORDERS", "P"],
                        &["FK_CUST", "ORDERS", "R"],
                        &["PK_CUSTOMERS", "CUSTOMERS", "P"],
                    ],
                )),
                TABLE_EXISTS_SQL if binds == ["ORDERS"] => Ok(rows(&["CNT"], &[&["1"]])),
                TABLE_EXISTS_SQL => Ok(rows(&["CNT"], &[&["0"]])),
                other => Err(QueryError::new(format!("unexpected sql: {other}"), None)),
            }
        }
    }

    #[test]
    fn inventory_is_sorted_regardless_of_catalog_order() {
        let inventory = read_inventory(&mut Canned).unwrap();
        let tables: Vec<_> = inventory.tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(tables, vec!["CUSTOMERS", "ORDERS"]);
        assert_eq!(inventory.sequences.len(), 1);
        let constraints: Vec<_> = inventory
            .constraints
            .iter()
            .map(|c| (c.owner_table.as_str(), c.name.as_str()))
            .collect();
        assert_eq!(
            constraints,
            vec![("CUSTOMERS", "PK_CUSTOMERS"), ("ORDERS", "FK_CUST"), ("ORDERS", "PK_ORDERS")]
        );
        assert_eq!(inventory.foreign_keys().count(), 1);
    }

    #[test]
    fn table_exists_reads_count() {
        assert!(table_exists(&mut Canned, "ORDERS").unwrap());
        assert!(!table_exists(&mut Canned, "NOPE").unwrap());
    }
}
