// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Cache backend over a synchronous key/value storage.
//!
//! [`StorageCache`] namespaces its keys inside a shared [`KeyValueStorage`] and
//! stores each entry as a JSON `[value, expiry]` pair. Construction probes the
//! storage with a throwaway write and fails with
//! [`ErrorKind::BackendUnavailable`](strata_tier::ErrorKind::BackendUnavailable)
//! when it is unusable.
//!
//! Storages:
//!
//! - [`MemoryStorage`] lives as long as the process, like a browser session storage.
//! - [`FileStorage`] persists to a JSON file, like a browser local storage.

pub mod builder;
mod cache;
mod file;
mod memory;
mod storage;

#[doc(inline)]
pub use builder::StorageCacheBuilder;
#[doc(inline)]
pub use cache::{NAMESPACE_PREFIX, StorageCache};
#[doc(inline)]
pub use file::FileStorage;
#[doc(inline)]
pub use memory::MemoryStorage;
#[doc(inline)]
pub use storage::{KeyValueStorage, StorageError, StorageErrorKind};
