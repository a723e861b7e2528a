// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use layered::{Layer, Service};
use strata_tier::{Cache, Result};

use crate::{CachePolicy, Request, Response};

/// Installs a [`CachePolicy`] in front of a transport service.
///
/// # Examples
///
/// ```
/// use layered::{Execute, Service, Stack};
/// use strata::{DynamicCacheExt, MemoryCache};
/// use strata_http::{CachePolicy, Request, Response};
/// use tick::ClockControl;
///
/// # futures::executor::block_on(async {
/// let policy = CachePolicy::builder()
///     .cache(MemoryCache::<String>::builder(ClockControl::new().to_clock()).build().into_dynamic())
///     .build();
///
/// let service = (
///     policy.layer(),
///     Execute::new(|_request: Request| async { Ok::<_, strata::Error>(Response::new(200, serde_json::json!({"id": 1}))) }),
/// )
///     .into_service();
///
/// let response = service.execute(Request::get("/users/1")).await.unwrap();
/// assert_eq!(response.status, 200);
/// # });
/// ```
#[derive(Debug)]
pub struct CachePolicyLayer<C> {
    policy: CachePolicy<C>,
}

impl<C> CachePolicyLayer<C> {
    /// Creates a layer applying `policy`.
    #[must_use]
    pub fn new(policy: CachePolicy<C>) -> Self {
        Self { policy }
    }
}

impl<C> Clone for CachePolicyLayer<C> {
    fn clone(&self) -> Self {
        Self::new(self.policy.clone())
    }
}

impl<C, S> Layer<S> for CachePolicyLayer<C> {
    type Service = CachingService<C, S>;

    fn layer(&self, inner: S) -> Self::Service {
        CachingService {
            policy: self.policy.clone(),
            inner,
        }
    }
}

/// A transport service behind a [`CachePolicy`].
#[derive(Debug)]
pub struct CachingService<C, S> {
    policy: CachePolicy<C>,
    inner: S,
}

impl<C, S> CachingService<C, S> {
    /// Returns the policy.
    #[must_use]
    pub fn policy(&self) -> &CachePolicy<C> {
        &self.policy
    }

    /// Returns the wrapped transport.
    #[must_use]
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<C, S: Clone> Clone for CachingService<C, S> {
    fn clone(&self) -> Self {
        Self {
            policy: self.policy.clone(),
            inner: self.inner.clone(),
        }
    }
}

impl<C, S> Service<Request> for CachingService<C, S>
where
    C: Cache<String>,
    S: Service<Request, Out = Result<Response>>,
{
    type Out = Result<Response>;

    async fn execute(&self, request: Request) -> Self::Out {
        self.policy.handle(request, &self.inner).await
    }
}
