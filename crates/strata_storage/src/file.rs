// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::{KeyValueStorage, StorageError};

/// Local storage persisted as a JSON object in a single file.
///
/// The file is loaded once when the storage is opened. Every mutation rewrites it
/// through a sibling temporary file that is then renamed over the original, so a
/// reader never observes a partially written file.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    items: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Opens the storage at `path`, starting empty if the file does not exist yet.
    ///
    /// # Errors
    ///
    /// Fails if the file exists but cannot be read or does not hold a JSON object
    /// of strings.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let items = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(StorageError::corrupted)?,
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(StorageError::io(e)),
        };

        Ok(Self {
            path,
            items: Mutex::new(items),
        })
    }

    /// Returns the path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, items: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec(items).map_err(StorageError::io)?;
        let staging = self.path.with_extension("tmp");
        fs::write(&staging, bytes).map_err(StorageError::io)?;
        fs::rename(&staging, &self.path).map_err(StorageError::io)
    }
}

impl KeyValueStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.lock().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self.items.lock();
        let previous = items.insert(key.to_owned(), value.to_owned());

        if let Err(e) = self.persist(&items) {
            match previous {
                Some(previous) => items.insert(key.to_owned(), previous),
                None => items.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let mut items = self.items.lock();
        let Some(previous) = items.remove(key) else {
            return Ok(());
        };

        if let Err(e) = self.persist(&items) {
            items.insert(key.to_owned(), previous);
            return Err(e);
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.items.lock().keys().cloned().collect())
    }

    fn len(&self) -> Result<usize, StorageError> {
        Ok(self.items.lock().len())
    }
}
