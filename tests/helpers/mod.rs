#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

use oraschema::db::{ConnectionProvider, QueryExecutor, QueryOutcome, RowSet};
use oraschema::error::{ConnectionError, QueryError};
use oraschema::schema::history::HISTORY_SQL;
use oraschema::schema::inventory::{
    CONSTRAINTS_SQL, SEQUENCES_SQL, TABLES_SQL, TABLE_EXISTS_SQL,
};

pub struct FakeConstraint {
    pub name: String,
    pub table: String,
    /// `P` or `R`
    pub kind: &'static str,
    pub references: Option<String>,
    pub enabled: bool,
}

/// In-memory stand-in for an Oracle schema. Understands the catalog queries
/// and the DDL a teardown sends, and records every statement it receives.
#[derive(Default)]
pub struct FakeOracle {
    pub tables: BTreeSet<String>,
    pub sequences: BTreeSet<String>,
    pub constraints: Vec<FakeConstraint>,
    pub history: Vec<Vec<Option<String>>>,
    pub calls: Vec<String>,
    /// Statements that fail with the given error instead of running.
    pub failures: HashMap<String, QueryError>,
    /// Every catalog query fails.
    pub catalog_down: bool,
    /// Tables removed by "someone else" right after the snapshot is taken.
    pub vanish_after_snapshot: Vec<String>,
}

fn ora(code: i32, text: &str) -> QueryError {
    QueryError::new(format!("ORA-{code:05}: {text}"), Some(code))
}

fn column(name: &str, values: impl IntoIterator<Item = String>) -> QueryOutcome {
    QueryOutcome::Rows(RowSet::new(
        vec![name.to_string()],
        values.into_iter().map(|v| vec![Some(v)]).collect(),
    ))
}

/// Identifiers between double quotes, in order.
fn quoted(sql: &str) -> Vec<String> {
    sql.split('"')
        .enumerate()
        .filter(|(i, _)| i % 2 == 1)
        .map(|(_, s)| s.to_string())
        .collect()
}

impl FakeOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tables(mut self, tables: &[&str]) -> Self {
        self.tables.extend(tables.iter().map(|t| t.to_string()));
        for table in tables {
            self.constraints.push(FakeConstraint {
                name: format!("PK_{table}"),
                table: table.to_string(),
                kind: "P",
                references: None,
                enabled: true,
            });
        }
        self
    }

    pub fn with_sequences(mut self, sequences: &[&str]) -> Self {
        self.sequences.extend(sequences.iter().map(|s| s.to_string()));
        self
    }

    pub fn with_foreign_key(mut self, table: &str, name: &str, references: &str) -> Self {
        self.constraints.push(FakeConstraint {
            name: name.to_string(),
            table: table.to_string(),
            kind: "R",
            references: Some(references.to_string()),
            enabled: true,
        });
        self
    }

    pub fn failing(mut self, sql: &str, error: QueryError) -> Self {
        self.failures.insert(sql.to_string(), error);
        self
    }

    /// Mutating statements only (DISABLE / DROP), in the order received.
    pub fn mutations(&self) -> Vec<String> {
        self.calls
            .iter()
            .filter(|c| c.starts_with("ALTER") || c.starts_with("DROP"))
            .cloned()
            .collect()
    }

    fn catalog(&mut self, sql: &str, binds: &[&str]) -> Option<Result<QueryOutcome, QueryError>> {
        let known = [TABLES_SQL, SEQUENCES_SQL, CONSTRAINTS_SQL, TABLE_EXISTS_SQL, HISTORY_SQL];
        if !known.contains(&sql) {
            return None;
        }
        if self.catalog_down {
            return Some(Err(ora(3113, "end-of-file on communication channel")));
        }

        let outcome = match sql {
            TABLES_SQL => column("TABLE_NAME", self.tables.iter().rev().cloned()),
            SEQUENCES_SQL => column("SEQUENCE_NAME", self.sequences.iter().cloned()),
            CONSTRAINTS_SQL => {
                let rows = self
                    .constraints
                    .iter()
                    .map(|c| vec![Some(c.name.clone()), Some(c.table.clone()), Some(c.kind.to_string())])
                    .collect();
                for table in std::mem::take(&mut self.vanish_after_snapshot) {
                    self.remove_table(&table);
                }
                QueryOutcome::Rows(RowSet::new(
                    vec!["CONSTRAINT_NAME".into(), "TABLE_NAME".into(), "CONSTRAINT_TYPE".into()],
                    rows,
                ))
            }
            TABLE_EXISTS_SQL => {
                let present = binds.first().is_some_and(|t| self.tables.contains(*t));
                QueryOutcome::Rows(RowSet::new(
                    vec!["CNT".into()],
                    vec![vec![Some(if present { "1" } else { "0" }.to_string())]],
                ))
            }
            _ => {
                if !self.tables.contains("FLYWAY_SCHEMA_HISTORY") {
                    return Some(Err(ora(942, "table or view does not exist")));
                }
                let columns = ["VERSION", "DESCRIPTION", "TYPE", "SCRIPT", "INSTALLED_ON", "SUCCESS"];
                QueryOutcome::Rows(RowSet::new(
                    columns.iter().map(|c| c.to_string()).collect(),
                    self.history.clone(),
                ))
            }
        };
        Some(Ok(outcome))
    }

    fn remove_table(&mut self, table: &str) {
        self.tables.remove(table);
        self.constraints
            .retain(|c| c.table != table && c.references.as_deref() != Some(table));
    }

    fn ddl(&mut self, sql: &str) -> Result<QueryOutcome, QueryError> {
        let names = quoted(sql);
        if sql.starts_with("ALTER TABLE") && sql.contains("DISABLE CONSTRAINT") {
            let (table, constraint) = (&names[0], &names[1]);
            if !self.tables.contains(table) {
                return Err(ora(942, "table or view does not exist"));
            }
            let c = self
                .constraints
                .iter_mut()
                .find(|c| &c.table == table && &c.name == constraint)
                .ok_or_else(|| ora(2431, "cannot disable constraint - no such constraint"))?;
            c.enabled = false;
        } else if sql.starts_with("DROP TABLE") {
            let table = names[0].clone();
            if !self.tables.contains(&table) {
                return Err(ora(942, "table or view does not exist"));
            }
            self.remove_table(&table);
        } else if sql.starts_with("DROP SEQUENCE") {
            if !self.sequences.remove(&names[0]) {
                return Err(ora(2289, "sequence does not exist"));
            }
        } else if sql.trim_start().to_uppercase().starts_with("SELECT") {
            return Ok(column("RESULT", ["42".to_string()]));
        }
        Ok(QueryOutcome::RowsAffected(0))
    }
}

impl QueryExecutor for FakeOracle {
    fn execute(&mut self, sql: &str, binds: &[&str]) -> Result<QueryOutcome, QueryError> {
        self.calls.push(sql.to_string());
        if let Some(err) = self.failures.get(sql) {
            return Err(err.clone());
        }
        if let Some(result) = self.catalog(sql, binds) {
            return result;
        }
        self.ddl(sql)
    }
}

/// Hands out sessions onto one shared [`FakeOracle`] and counts them.
pub struct FakeProvider {
    pub db: Rc<RefCell<FakeOracle>>,
    pub acquired: Cell<usize>,
    pub released: Cell<usize>,
    pub refuse: bool,
}

impl FakeProvider {
    pub fn new(db: FakeOracle) -> Self {
        Self {
            db: Rc::new(RefCell::new(db)),
            acquired: Cell::new(0),
            released: Cell::new(0),
            refuse: false,
        }
    }

    pub fn outstanding(&self) -> usize {
        self.acquired.get() - self.released.get()
    }
}

pub struct FakeSession {
    db: Rc<RefCell<FakeOracle>>,
}

impl QueryExecutor for FakeSession {
    fn execute(&mut self, sql: &str, binds: &[&str]) -> Result<QueryOutcome, QueryError> {
        self.db.borrow_mut().execute(sql, binds)
    }
}

impl ConnectionProvider for FakeProvider {
    type Conn = FakeSession;

    fn acquire(&self) -> Result<FakeSession, ConnectionError> {
        if self.refuse {
            return Err(ConnectionError::new("ORA-01017: invalid username/password; logon denied"));
        }
        self.acquired.set(self.acquired.get() + 1);
        Ok(FakeSession {
            db: Rc::clone(&self.db),
        })
    }

    fn release(&self, _conn: FakeSession) {
        self.released.set(self.released.get() + 1);
    }
}

/// ORDERS references CUSTOMERS through FK_CUST.
pub fn orders_and_customers() -> FakeOracle {
    FakeOracle::new()
        .with_tables(&["ORDERS", "CUSTOMERS"])
        .with_foreign_key("ORDERS", "FK_CUST", "CUSTOMERS")
}
