//! Error taxonomy.
//!
//! Connection and catalog-read failures are fatal to a teardown run; failures of
//! individual object operations are never raised as errors but folded into the
//! [`TeardownReport`](crate::schema::types::TeardownReport).

use thiserror::Error;

/// The connection provider could not hand out a session.
#[derive(Debug, Error)]
#[error("connection failed: {message}")]
pub struct ConnectionError {
    pub message: String,
}

impl ConnectionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A statement was rejected by the database.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct QueryError {
    pub message: String,
    /// Native `ORA-nnnnn` code, when the driver reports one.
    pub code: Option<i32>,
}

impl QueryError {
    pub fn new(message: impl Into<String>, code: Option<i32>) -> Self {
        Self {
            message: message.into(),
            code,
        }
    }

    /// Operator guidance for the failures students hit most often.
    pub fn hint(&self) -> Option<&'static str> {
        if self.code == Some(1031) || self.message.contains("insufficient privileges") {
            Some(
                "you lack the privilege for this operation; in academic environments \
                 you can usually only operate on tables in your own schema",
            )
        } else if self.code == Some(942) || self.message.contains("ORA-00942") {
            Some("the table does not exist or you do not have access to it")
        } else {
            None
        }
    }
}

/// Failures surfaced by [`SchemaAdmin`](crate::schema::SchemaAdmin).
///
/// A teardown only ever fails with `Connection` or `CatalogRead`.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error("failed to read schema catalog: {0}")]
    CatalogRead(#[source] QueryError),

    #[error("statement failed: {0}")]
    Statement(#[source] QueryError),
}

impl SchemaError {
    /// The underlying database error, if the failure came from a statement.
    pub fn query_error(&self) -> Option<&QueryError> {
        match self {
            Self::Connection(_) => None,
            Self::CatalogRead(e) | Self::Statement(e) => Some(e),
        }
    }
}

/// Failures of the API-collection merge.
#[derive(Debug, Error)]
pub enum CollectionError {
    #[error("failed to read {path}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write {path}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("base collection has no top-level `item` array")]
    MissingItems,

    #[error("base collection has {available} folders, fragment {fragment} targets folder {index}")]
    FolderOutOfRange {
        fragment: String,
        index: usize,
        available: usize,
    },
}
