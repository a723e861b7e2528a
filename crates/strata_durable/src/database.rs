// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Asynchronous object-store API that [`DurableCache`](crate::DurableCache) builds on.

use std::fmt;

use serde_json::Value;

/// Why a database operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum DatabaseErrorKind {
    /// The database or object store could not be opened.
    Open,
    /// A transaction was aborted.
    Transaction,
}

impl fmt::Display for DatabaseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Open => "failed to open database",
            Self::Transaction => "database transaction aborted",
        })
    }
}

/// An error reported by a [`Database`] or [`ObjectStore`].
#[ohno::error]
#[display("{kind}")]
pub struct DatabaseError {
    kind: DatabaseErrorKind,
}

impl DatabaseError {
    /// Creates an error reporting a database that could not be opened.
    pub fn open(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(DatabaseErrorKind::Open, cause)
    }

    /// Creates an error reporting an aborted transaction.
    pub fn transaction(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(DatabaseErrorKind::Transaction, cause)
    }

    /// Returns what kind of failure this is.
    #[must_use]
    pub fn kind(&self) -> DatabaseErrorKind {
        self.kind
    }
}

/// A handle to one object store of an opened database.
///
/// Every method runs as its own transaction.
pub trait ObjectStore: Send + Sync {
    /// Returns the record stored under `key`.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Value>, DatabaseError>> + Send;

    /// Stores `record` under `key`, replacing any previous record.
    fn put(&self, key: &str, record: Value) -> impl Future<Output = Result<(), DatabaseError>> + Send;

    /// Removes the record stored under `key`. Removing an absent key succeeds.
    fn delete(&self, key: &str) -> impl Future<Output = Result<(), DatabaseError>> + Send;

    /// Removes every record.
    fn clear(&self) -> impl Future<Output = Result<(), DatabaseError>> + Send;

    /// Returns the keys of every record.
    fn keys(&self) -> impl Future<Output = Result<Vec<String>, DatabaseError>> + Send;
}

/// A database that hands out [`ObjectStore`] handles.
pub trait Database: Send + Sync {
    /// The object store handle type.
    type Store: ObjectStore;

    /// Opens object store `store` of database `database`, creating either if needed.
    fn open(&self, database: &str, store: &str) -> impl Future<Output = Result<Self::Store, DatabaseError>> + Send;
}
