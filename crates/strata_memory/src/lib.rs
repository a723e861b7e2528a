// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! In-process cache backend.
//!
//! [`MemoryCache`] keeps entries in a concurrent moka cache and expires them against
//! an injected [`tick::Clock`], so expiry can be driven deterministically in tests
//! with `tick::ClockControl`. Nothing is persisted; the cache lives as long as the
//! value that owns it.

pub mod builder;
pub mod cache;

#[doc(inline)]
pub use builder::MemoryCacheBuilder;
#[doc(inline)]
pub use cache::MemoryCache;
