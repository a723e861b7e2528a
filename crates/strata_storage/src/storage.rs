// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The synchronous key/value storage API that [`StorageCache`](crate::StorageCache) builds on.

use std::fmt::{self, Debug};

/// Why a storage operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum StorageErrorKind {
    /// The storage has no room left for the write.
    QuotaExceeded,
    /// The storage medium could not be read or written.
    Io,
    /// Persisted storage content could not be understood.
    Corrupted,
}

impl fmt::Display for StorageErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::QuotaExceeded => "storage quota exceeded",
            Self::Io => "storage i/o failed",
            Self::Corrupted => "storage content is corrupted",
        })
    }
}

/// An error reported by a [`KeyValueStorage`].
#[ohno::error]
#[display("{kind}")]
pub struct StorageError {
    kind: StorageErrorKind,
}

impl StorageError {
    /// Creates an error reporting that the storage is full.
    pub fn quota_exceeded(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(StorageErrorKind::QuotaExceeded, cause)
    }

    /// Creates an error reporting an unreadable or unwritable medium.
    pub fn io(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(StorageErrorKind::Io, cause)
    }

    /// Creates an error reporting unparsable persisted content.
    pub fn corrupted(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(StorageErrorKind::Corrupted, cause)
    }

    /// Returns what kind of failure this is.
    #[must_use]
    pub fn kind(&self) -> StorageErrorKind {
        self.kind
    }
}

/// A synchronous string key/value store.
///
/// Implementations are shared between caches, each of which confines itself to
/// keys under its own prefix.
pub trait KeyValueStorage: Debug + Send + Sync {
    /// Returns the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Fails if the medium cannot be read.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Fails with [`StorageErrorKind::QuotaExceeded`] when the storage is full.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes `key`. Removing an absent key succeeds.
    ///
    /// # Errors
    ///
    /// Fails if the medium cannot be written.
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;

    /// Returns every stored key.
    ///
    /// # Errors
    ///
    /// Fails if the medium cannot be read.
    fn keys(&self) -> Result<Vec<String>, StorageError>;

    /// Returns how many items are stored.
    ///
    /// # Errors
    ///
    /// Fails if the medium cannot be read.
    fn len(&self) -> Result<usize, StorageError> {
        self.keys().map(|keys| keys.len())
    }
}
