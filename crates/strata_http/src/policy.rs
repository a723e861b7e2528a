// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use futures::lock::Mutex;
use layered::Service;
use strata::telemetry::{CacheActivity, CacheOperation, CacheTelemetry};
use strata_tier::{Cache, Error, Result, Ttl};

use crate::index::NamespaceIndex;
use crate::{CachePolicyLayer, Request, Response, cache_key, resource_namespace};

const DEFAULT_CACHE_EXPIRATION: Duration = Duration::from_secs(120);
const DEFAULT_NAME: &str = "strata.http";

/// Decides which requests are answered from a cache and which evict it.
///
/// `GET` responses are stored for [`cache_expiration`](CachePolicyBuilder::cache_expiration)
/// and indexed under their resource namespace, the first path segment of the
/// URL. When the policy is strict, any other method on a namespace evicts every
/// response indexed for it before the request is sent.
///
/// The cache can be bound once, either by the builder or later with
/// [`set_cache`](Self::set_cache). Until then every request with a well-formed
/// URL goes straight to the transport. The cache stores serialized responses and
/// the namespace index under [`NAMESPACE_INDEX_KEY`](crate::NAMESPACE_INDEX_KEY).
///
/// Clones share the same cache binding.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use strata::{DynamicCache, DynamicCacheExt, NullCache};
/// use strata_http::CachePolicy;
///
/// let policy = CachePolicy::<DynamicCache<String>>::builder()
///     .cache_expiration(Duration::from_secs(30))
///     .strict(true)
///     .build();
///
/// policy.set_cache(NullCache::new().into_dynamic()).unwrap();
/// assert!(policy.set_cache(NullCache::new().into_dynamic()).is_err());
/// ```
#[derive(Debug)]
pub struct CachePolicy<C> {
    shared: Arc<Shared<C>>,
}

#[derive(Debug)]
struct Shared<C> {
    cache: OnceLock<C>,
    cache_expiration: Duration,
    strict: bool,
    name: &'static str,
    telemetry: CacheTelemetry,
    index_lock: Mutex<()>,
}

impl<C> Clone for CachePolicy<C> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<C> CachePolicy<C> {
    /// Starts configuring a policy.
    #[must_use]
    pub fn builder() -> CachePolicyBuilder<C> {
        CachePolicyBuilder {
            cache: None,
            cache_expiration: DEFAULT_CACHE_EXPIRATION,
            strict: false,
            name: DEFAULT_NAME,
            telemetry: CacheTelemetry::new(),
        }
    }

    /// Binds the cache.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::CacheOverride`](strata_tier::ErrorKind::CacheOverride)
    /// when a cache is already bound.
    pub fn set_cache(&self, cache: C) -> Result<()> {
        self.shared
            .cache
            .set(cache)
            .map_err(|_rejected| Error::cache_override("the policy cache is already set"))
    }

    /// Returns the bound cache.
    #[must_use]
    pub fn cache(&self) -> Option<&C> {
        self.shared.cache.get()
    }

    /// Returns how long responses stay cached.
    #[must_use]
    pub fn cache_expiration(&self) -> Duration {
        self.shared.cache_expiration
    }

    /// Returns whether mutations evict their namespace.
    #[must_use]
    pub fn is_strict(&self) -> bool {
        self.shared.strict
    }

    /// Returns a layer installing this policy in front of a transport.
    #[must_use]
    pub fn layer(&self) -> CachePolicyLayer<C> {
        CachePolicyLayer::new(self.clone())
    }

    fn record(&self, operation: CacheOperation, activity: CacheActivity) {
        self.shared.telemetry.record(self.shared.name, operation, activity);
    }

    fn record_error(&self, operation: CacheOperation, error: &Error) {
        self.shared.telemetry.record_error(self.shared.name, operation, error);
    }
}

impl<C> CachePolicy<C>
where
    C: Cache<String>,
{
    pub(crate) async fn handle<S>(&self, request: Request, transport: &S) -> Result<Response>
    where
        S: Service<Request, Out = Result<Response>>,
    {
        if !request.cache {
            self.record(CacheOperation::Get, CacheActivity::Bypass);
            return transport.execute(request).await;
        }

        let namespace = resource_namespace(&request.url, &request.base_url)?.to_owned();
        let Some(cache) = self.cache() else {
            self.record(CacheOperation::Get, CacheActivity::Bypass);
            return transport.execute(request).await;
        };

        let key = cache_key(&request.url, &request.params);

        if !request.is_read() {
            if self.shared.strict {
                self.invalidate(cache, &namespace).await;
            }
            return transport.execute(request).await;
        }

        if !request.force_update
            && let Some(response) = self.lookup(cache, &key).await
        {
            return Ok(response);
        }

        match transport.execute(request).await {
            Ok(response) => {
                self.remember(cache, &namespace, &key, &response).await;
                Ok(response)
            }
            Err(e) => {
                if let Err(evict) = cache.delete(&key).await {
                    self.record_error(CacheOperation::Delete, &evict);
                }
                Err(e)
            }
        }
    }

    async fn lookup(&self, cache: &C, key: &str) -> Option<Response> {
        let stored = match cache.get(key).await {
            Ok(stored) => stored,
            Err(e) => {
                self.record_error(CacheOperation::Get, &e);
                return None;
            }
        };

        let Some(stored) = stored else {
            self.record(CacheOperation::Get, CacheActivity::Miss);
            return None;
        };

        match serde_json::from_str(&stored) {
            Ok(response) => {
                self.record(CacheOperation::Get, CacheActivity::Hit);
                Some(response)
            }
            Err(e) => {
                tracing::warn!(cache.key = key, error = %e, "discarding unreadable cached response");
                self.record(CacheOperation::Get, CacheActivity::Miss);
                None
            }
        }
    }

    async fn remember(&self, cache: &C, namespace: &str, key: &str, response: &Response) {
        let serialized = match serde_json::to_string(response) {
            Ok(serialized) => serialized,
            Err(e) => {
                self.record_error(CacheOperation::Set, &Error::serialization(e));
                return;
            }
        };

        let (stored, indexed) = futures::join!(
            cache.set(key, serialized, Ttl::After(self.shared.cache_expiration)),
            self.index(cache, namespace, key),
        );

        match stored {
            Ok(true) => self.record(CacheOperation::Set, CacheActivity::Inserted),
            Ok(false) => {}
            Err(e) => self.record_error(CacheOperation::Set, &e),
        }

        // A response missing from the index would survive the next invalidation.
        if let Err(e) = indexed {
            self.record_error(CacheOperation::Set, &e);
            if let Err(evict) = cache.delete(key).await {
                self.record_error(CacheOperation::Delete, &evict);
            }
        }
    }

    async fn index(&self, cache: &C, namespace: &str, key: &str) -> Result<()> {
        let _guard = self.shared.index_lock.lock().await;
        let mut index = NamespaceIndex::load(cache).await?;
        if index.insert(namespace, key) && !index.store(cache).await? {
            return Err(Error::storage("the cache declined the namespace index"));
        }
        Ok(())
    }

    async fn invalidate(&self, cache: &C, namespace: &str) {
        match self.evict(cache, namespace).await {
            Ok(true) => self.record(CacheOperation::Invalidate, CacheActivity::Invalidated),
            Ok(false) => self.record(CacheOperation::Invalidate, CacheActivity::Ok),
            Err(e) => self.record_error(CacheOperation::Invalidate, &e),
        }
    }

    /// Evicts every response indexed under `namespace`. The index entry is kept
    /// unless every eviction succeeded, so a failed eviction is retried next time.
    async fn evict(&self, cache: &C, namespace: &str) -> Result<bool> {
        let _guard = self.shared.index_lock.lock().await;
        let mut index = NamespaceIndex::load(cache).await?;
        let keys = index.keys(namespace).to_vec();
        if keys.is_empty() {
            return Ok(false);
        }

        if !cache.delete_multiple(&keys).await? {
            return Err(Error::storage(format!("could not evict every response of {namespace}")));
        }

        index.remove(namespace);
        if !index.store(cache).await? {
            return Err(Error::storage("the cache declined the namespace index"));
        }
        Ok(true)
    }
}

/// Builder for a [`CachePolicy`].
#[derive(Debug)]
pub struct CachePolicyBuilder<C> {
    cache: Option<C>,
    cache_expiration: Duration,
    strict: bool,
    name: &'static str,
    telemetry: CacheTelemetry,
}

impl<C> CachePolicyBuilder<C> {
    /// Binds the cache up front.
    #[must_use]
    pub fn cache(mut self, cache: C) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Sets how long responses stay cached. Defaults to 120 seconds.
    ///
    /// A zero duration stores nothing.
    #[must_use]
    pub fn cache_expiration(mut self, cache_expiration: Duration) -> Self {
        self.cache_expiration = cache_expiration;
        self
    }

    /// Makes mutations evict the responses cached for their namespace. Defaults to `false`.
    #[must_use]
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Sets the name recorded with every telemetry event of the policy.
    #[must_use]
    pub fn name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Sets the telemetry collector.
    #[must_use]
    pub fn telemetry(mut self, telemetry: CacheTelemetry) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Builds the policy.
    #[must_use]
    pub fn build(self) -> CachePolicy<C> {
        CachePolicy {
            shared: Arc::new(Shared {
                cache: self.cache.map_or_else(OnceLock::new, OnceLock::from),
                cache_expiration: self.cache_expiration,
                strict: self.strict,
                name: self.name,
                telemetry: self.telemetry,
                index_lock: Mutex::new(()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use strata_tier::ErrorKind;
    use strata_tier::testing::MockCache;

    use super::*;

    #[test]
    fn defaults() {
        let policy = CachePolicy::<MockCache<String>>::builder().build();
        assert_eq!(policy.cache_expiration(), Duration::from_secs(120));
        assert!(!policy.is_strict());
        assert!(policy.cache().is_none());
    }

    #[test]
    fn cache_binds_once() {
        let policy = CachePolicy::builder().build();
        policy.set_cache(MockCache::<String>::new()).unwrap();

        let error = policy.set_cache(MockCache::new()).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::CacheOverride);
    }

    #[test]
    fn builder_binding_counts() {
        let policy = CachePolicy::builder().cache(MockCache::<String>::new()).build();

        let error = policy.clone().set_cache(MockCache::new()).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::CacheOverride);
    }
}
