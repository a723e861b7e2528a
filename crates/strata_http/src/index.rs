// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::BTreeMap;

use strata_tier::{Cache, Error, Result, Ttl};

/// Cache key under which the namespace index is stored.
///
/// The key is reserved: application entries must not use it in a cache shared
/// with a [`CachePolicy`](crate::CachePolicy).
pub const NAMESPACE_INDEX_KEY: &str = "__strata_policy_namespaces__";

/// Cache keys of the responses stored for each resource namespace.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct NamespaceIndex(BTreeMap<String, Vec<String>>);

impl NamespaceIndex {
    /// Loads the index, starting afresh when it is missing or unreadable.
    pub async fn load<C: Cache<String>>(cache: &C) -> Result<Self> {
        let Some(stored) = cache.get(NAMESPACE_INDEX_KEY).await? else {
            return Ok(Self::default());
        };

        match serde_json::from_str(&stored) {
            Ok(namespaces) => Ok(Self(namespaces)),
            Err(e) => {
                tracing::warn!(error = %e, "discarding unreadable namespace index");
                Ok(Self::default())
            }
        }
    }

    pub async fn store<C: Cache<String>>(&self, cache: &C) -> Result<bool> {
        let serialized = serde_json::to_string(&self.0).map_err(Error::serialization)?;
        cache.set(NAMESPACE_INDEX_KEY, serialized, Ttl::Never).await
    }

    /// Records `key` under `namespace`. Returns `false` if it was already there.
    pub fn insert(&mut self, namespace: &str, key: &str) -> bool {
        let keys = self.0.entry(namespace.to_owned()).or_default();
        if keys.iter().any(|known| known == key) {
            return false;
        }
        keys.push(key.to_owned());
        true
    }

    pub fn keys(&self, namespace: &str) -> &[String] {
        self.0.get(namespace).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn remove(&mut self, namespace: &str) -> Option<Vec<String>> {
        self.0.remove(namespace)
    }
}
