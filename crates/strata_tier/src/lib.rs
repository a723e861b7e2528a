// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! The contract shared by every strata cache backend.
//!
//! This crate defines the [`Cache`] trait that all backends implement, its blocking
//! mirror [`CacheSync`], the lifetime vocabulary ([`Ttl`], [`Expiry`], [`Lifetime`])
//! and the [`Error`] type returned by fallible operations.
//!
//! # Semantics
//!
//! - Reads return `Ok(None)` for absent or expired keys. [`CacheExt`] adds
//!   `get_or`/`get_multiple_or` for callers that prefer a default value.
//! - [`Ttl::Default`] uses the backend's default lifetime, [`Ttl::Never`] keeps the
//!   entry indefinitely, and a zero [`Ttl::After`] deletes the key.
//! - An entry is expired from its expiry instant onwards. Backends check this on
//!   every read path and delete expired entries they come across.
//! - Empty keys are rejected with [`ErrorKind::InvalidArgument`] before any I/O.
//!
//! # Implementing a backend
//!
//! ```
//! use std::collections::HashMap;
//! use std::sync::Mutex;
//!
//! use strata_tier::{Cache, Result, Ttl, validate_key, validate_keys};
//!
//! #[derive(Default)]
//! struct Unbounded(Mutex<HashMap<String, String>>);
//!
//! impl Cache<String> for Unbounded {
//!     async fn get(&self, key: &str) -> Result<Option<String>> {
//!         validate_key(key)?;
//!         Ok(self.0.lock().unwrap().get(key).cloned())
//!     }
//!
//!     async fn set(&self, key: &str, value: String, ttl: Ttl) -> Result<bool> {
//!         validate_key(key)?;
//!         self.0.lock().unwrap().insert(key.to_owned(), value);
//!         Ok(true)
//!     }
//!
//!     async fn delete(&self, key: &str) -> Result<bool> {
//!         validate_key(key)?;
//!         self.0.lock().unwrap().remove(key);
//!         Ok(true)
//!     }
//!
//!     async fn clear(&self) -> Result<bool> {
//!         self.0.lock().unwrap().clear();
//!         Ok(true)
//!     }
//!
//!     async fn get_multiple(&self, keys: &[String]) -> Result<HashMap<String, Option<String>>> {
//!         validate_keys(keys)?;
//!         let data = self.0.lock().unwrap();
//!         Ok(keys.iter().map(|k| (k.clone(), data.get(k).cloned())).collect())
//!     }
//!
//!     async fn set_multiple(&self, entries: HashMap<String, String>, _ttl: Ttl) -> Result<bool> {
//!         validate_keys(entries.keys())?;
//!         self.0.lock().unwrap().extend(entries);
//!         Ok(true)
//!     }
//!
//!     async fn delete_multiple(&self, keys: &[String]) -> Result<bool> {
//!         validate_keys(keys)?;
//!         let mut data = self.0.lock().unwrap();
//!         keys.iter().for_each(|k| { data.remove(k); });
//!         Ok(true)
//!     }
//!
//!     async fn has(&self, key: &str) -> Result<bool> {
//!         validate_key(key)?;
//!         Ok(self.0.lock().unwrap().contains_key(key))
//!     }
//! }
//! ```
//!
//! # Dynamic dispatch
//!
//! The `dynamic-cache` feature (on by default) provides [`DynamicCache`], a clonable
//! type-erased wrapper used to compose heterogeneous backends.

mod cache;
pub mod error;
mod null;
#[cfg(any(feature = "test-util", test))]
pub mod testing;
mod ttl;

#[cfg(any(test, feature = "dynamic-cache"))]
mod dynamic;

#[doc(inline)]
pub use cache::{Cache, CacheExt, CacheSync, ValueRepresentation, read_or_miss, validate_key, validate_keys};
#[cfg(any(test, feature = "dynamic-cache"))]
#[doc(inline)]
pub use dynamic::{DynamicCache, DynamicCacheExt};
#[doc(inline)]
pub use error::{Error, ErrorKind, Result};
#[doc(inline)]
pub use null::NullCache;
#[doc(inline)]
pub use ttl::{Expiry, Lifetime, Ttl};
