// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Tiered, TTL-aware key/value caching.
//!
//! Every backend implements the [`Cache`] contract from `strata_tier`: string
//! keys, per-entry lifetimes expressed as a [`Ttl`], and reads that never serve
//! an expired entry. Backends can be used on their own or composed into a
//! [`ChainCache`], which reads fastest tier first and copies values found in
//! slower tiers into the faster ones.
//!
//! # Backends
//!
//! | Backend | Feature | Persistence |
//! |---------|---------|-------------|
//! | [`MemoryCache`] | `memory` (default) | none |
//! | `StorageCache` | `storage` | a synchronous key/value storage |
//! | `DurableCache` | `durable` | an asynchronous object store |
//!
//! # Quick start
//!
//! ```
//! use std::time::Duration;
//!
//! use strata::{Cache, ChainCache, DynamicCacheExt, MemoryCache, Ttl};
//! use tick::ClockControl;
//!
//! # futures::executor::block_on(async {
//! let control = ClockControl::new();
//! let fast = MemoryCache::<u64>::builder(control.to_clock()).build();
//! let slow = MemoryCache::<u64>::builder(control.to_clock()).build();
//!
//! let cache = ChainCache::builder()
//!     .tier(fast.into_dynamic())
//!     .tier(slow.into_dynamic())
//!     .default_lifetime(Duration::from_secs(30))
//!     .build()
//!     .unwrap();
//!
//! cache.set("answer", 42, Ttl::After(Duration::from_secs(10))).await.unwrap();
//! assert_eq!(cache.get("answer").await.unwrap(), Some(42));
//!
//! control.advance(Duration::from_secs(10));
//! assert_eq!(cache.get("answer").await.unwrap(), None);
//! # });
//! ```
//!
//! # Telemetry
//!
//! Chain operations are reported through [`CacheTelemetry`](telemetry::CacheTelemetry)
//! as `tracing` events. Enable the `metrics` feature to also count them on an
//! OpenTelemetry meter.

pub mod builder;
mod chain;
pub mod telemetry;

#[doc(inline)]
pub use builder::ChainCacheBuilder;
#[doc(inline)]
pub use chain::ChainCache;
#[cfg(feature = "durable")]
#[cfg_attr(docsrs, doc(cfg(feature = "durable")))]
#[doc(inline)]
pub use strata_durable::{Database, DurableCache, DurableCacheBuilder, MemoryDatabase, ObjectStore};
#[cfg(feature = "memory")]
#[cfg_attr(docsrs, doc(cfg(feature = "memory")))]
#[doc(inline)]
pub use strata_memory::{MemoryCache, MemoryCacheBuilder};
#[cfg(feature = "storage")]
#[cfg_attr(docsrs, doc(cfg(feature = "storage")))]
#[doc(inline)]
pub use strata_storage::{FileStorage, KeyValueStorage, MemoryStorage, StorageCache, StorageCacheBuilder};
#[doc(inline)]
pub use strata_tier::{
    Cache, CacheExt, CacheSync, DynamicCache, DynamicCacheExt, Error, ErrorKind, Expiry, NullCache, Result, Ttl,
    ValueRepresentation,
};
