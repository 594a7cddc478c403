//! Schema snapshot and teardown report types.
//!
//! Defines the catalog descriptors ([`TableDescriptor`], [`SequenceDescriptor`],
//! [`ConstraintDescriptor`]), the [`Inventory`] snapshot they make up, the
//! [`Operation`]s a teardown plans, and the [`TeardownReport`] it produces.

use serde::Serialize;

use crate::db::quote_ident;

/// Flyway's control table.
pub const MIGRATION_HISTORY_TABLE: &str = "FLYWAY_SCHEMA_HISTORY";

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct TableDescriptor {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct SequenceDescriptor {
    pub name: String,
}

/// The constraint kinds the teardown cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    PrimaryKey,
    ForeignKey,
}

impl ConstraintKind {
    /// `USER_CONSTRAINTS.CONSTRAINT_TYPE` code.
    pub fn as_code(&self) -> &'static str {
        match self {
            Self::PrimaryKey => "P",
            Self::ForeignKey => "R",
        }
    }
}

impl std::str::FromStr for ConstraintKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "P" => Ok(Self::PrimaryKey),
            "R" => Ok(Self::ForeignKey),
            _ => Err(format!("unsupported constraint type: {s}")),
        }
    }
}

impl std::fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PrimaryKey => f.write_str("primary key"),
            Self::ForeignKey => f.write_str("foreign key"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConstraintDescriptor {
    pub name: String,
    pub owner_table: String,
    pub kind: ConstraintKind,
}

/// Catalog snapshot. Taken once, before any DDL, and never refreshed during a
/// run: it goes stale the moment the first statement executes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Inventory {
    pub tables: Vec<TableDescriptor>,
    pub sequences: Vec<SequenceDescriptor>,
    pub constraints: Vec<ConstraintDescriptor>,
}

impl Inventory {
    /// Sort into reporting order: names, constraints by owning table then name.
    pub fn sorted(mut self) -> Self {
        self.tables.sort();
        self.sequences.sort();
        self.constraints
            .sort_by(|a, b| (&a.owner_table, &a.name).cmp(&(&b.owner_table, &b.name)));
        self
    }

    pub fn foreign_keys(&self) -> impl Iterator<Item = &ConstraintDescriptor> {
        self.constraints
            .iter()
            .filter(|c| c.kind == ConstraintKind::ForeignKey)
    }
}

/// One DDL statement in a teardown plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    DisableConstraint { table: String, constraint: String },
    DropTable { table: String },
    DropSequence { sequence: String },
}

impl Operation {
    pub fn sql(&self) -> String {
        match self {
            Self::DisableConstraint { table, constraint } => format!(
                "ALTER TABLE {} DISABLE CONSTRAINT {}",
                quote_ident(table),
                quote_ident(constraint)
            ),
            Self::DropTable { table } => {
                format!("DROP TABLE {} CASCADE CONSTRAINTS", quote_ident(table))
            }
            Self::DropSequence { sequence } => format!("DROP SEQUENCE {}", quote_ident(sequence)),
        }
    }

    /// The object the operation is about, for report lines.
    pub fn object_name(&self) -> &str {
        match self {
            Self::DisableConstraint { constraint, .. } => constraint,
            Self::DropTable { table } => table,
            Self::DropSequence { sequence } => sequence,
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DisableConstraint { table, constraint } => {
                write!(f, "disable constraint {constraint} on {table}")
            }
            Self::DropTable { table } => write!(f, "drop table {table}"),
            Self::DropSequence { sequence } => write!(f, "drop sequence {sequence}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum Outcome {
    Succeeded,
    Failed(String),
    /// Dry run: the statement was not sent.
    Planned,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationRecord {
    pub operation: Operation,
    pub outcome: Outcome,
}

/// Pipeline phases. `Aborted` is only reachable from `InventoryRead`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TeardownPhase {
    Idle,
    InventoryRead,
    ConstraintsDisabling,
    TablesDropping,
    SequencesDropping,
    Done,
    Aborted,
}

impl std::fmt::Display for TeardownPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::InventoryRead => "inventory read",
            Self::ConstraintsDisabling => "disabling constraints",
            Self::TablesDropping => "dropping tables",
            Self::SequencesDropping => "dropping sequences",
            Self::Done => "done",
            Self::Aborted => "aborted",
        };
        f.write_str(s)
    }
}

/// Per-operation outcomes of one teardown run, in execution order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeardownReport {
    pub records: Vec<OperationRecord>,
    pub dry_run: bool,
    /// Set when a cancellation stopped the run before every operation was tried.
    pub interrupted: bool,
    /// Last phase entered.
    pub phase: TeardownPhase,
}

impl TeardownReport {
    pub fn new(dry_run: bool) -> Self {
        Self {
            records: Vec::new(),
            dry_run,
            interrupted: false,
            phase: TeardownPhase::Idle,
        }
    }

    pub fn succeeded(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Succeeded))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed(_)))
    }

    pub fn planned(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Planned))
    }

    /// Statements actually sent to the database.
    pub fn attempted(&self) -> usize {
        self.succeeded() + self.failed()
    }

    pub fn failures(&self) -> impl Iterator<Item = &OperationRecord> {
        self.records
            .iter()
            .filter(|r| matches!(r.outcome, Outcome::Failed(_)))
    }

    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.records.iter().filter(|r| pred(&r.outcome)).count()
    }
}
