// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Request caching for `layered` transport services.
//!
//! A [`CachePolicy`] sits between a caller and a service that sends [`Request`]s.
//! Reads (`GET`) are answered from a [`Cache`](strata_tier::Cache) of serialized
//! [`Response`]s when possible. Every cached response is indexed under the
//! resource it belongs to, so that a strict policy can evict all of them when a
//! mutating request touches the same resource.
//!
//! Cache keys are built by [`cache_key`] and resources by [`resource_namespace`].
//! A URL without a resource segment fails with
//! [`ErrorKind::MalformedUrl`](strata_tier::ErrorKind::MalformedUrl) before the
//! transport is called.
//!
//! Transport failures are returned untouched and never cached.

mod index;
mod key;
mod layer;
mod policy;
mod request;

#[doc(inline)]
pub use index::NAMESPACE_INDEX_KEY;
#[doc(inline)]
pub use key::{cache_key, resource_namespace};
#[doc(inline)]
pub use layer::{CachePolicyLayer, CachingService};
#[doc(inline)]
pub use policy::{CachePolicy, CachePolicyBuilder};
#[doc(inline)]
pub use request::{Request, Response};
