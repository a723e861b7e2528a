// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Cache backend over an asynchronous, transactional object store.
//!
//! A [`Database`] hands out [`ObjectStore`] handles; [`DurableCache`] keeps its
//! entries as `[value, expiry]` records in the store named [`STORE_NAME`] of the
//! database `STRATA_DB_<name>`. Values stay native JSON records, so the cache
//! reports [`ValueRepresentation::Native`](strata_tier::ValueRepresentation::Native).
//!
//! Batch writes and reads are issued concurrently and awaited together.

mod cache;
mod database;
mod memory;

#[doc(inline)]
pub use cache::{DATABASE_PREFIX, DurableCache, DurableCacheBuilder, STORE_NAME};
#[doc(inline)]
pub use database::{Database, DatabaseError, DatabaseErrorKind, ObjectStore};
#[doc(inline)]
pub use memory::{MemoryDatabase, MemoryObjectStore};
