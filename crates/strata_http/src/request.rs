// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::BTreeMap;

use http::{HeaderMap, Method};
use serde::{Deserialize, Serialize};

/// An outgoing request as seen by the caching layer.
///
/// # Examples
///
/// ```
/// use http::Method;
/// use strata_http::Request;
///
/// let request = Request::get("https://api.test/v1/users")
///     .with_base_url("https://api.test/v1")
///     .with_param("page", "2")
///     .with_force_update(true);
///
/// assert_eq!(request.method, Method::GET);
/// assert!(request.cache);
/// ```
#[derive(Debug, Clone)]
pub struct Request {
    /// The HTTP method. Only `GET` is served from the cache.
    pub method: Method,
    /// The full request URL, possibly with a query string.
    pub url: String,
    /// The API root stripped from [`url`](Self::url) before deriving the resource.
    pub base_url: String,
    /// Query parameters appended to the URL, in any order.
    pub params: Vec<(String, String)>,
    /// Request headers. They are not part of the cache key.
    pub headers: HeaderMap,
    /// Whether the caching layer handles this request at all. Defaults to `true`.
    pub cache: bool,
    /// Whether a cached response is ignored and replaced by a fresh one.
    pub force_update: bool,
}

impl Request {
    /// Creates a request with no base URL, parameters or headers.
    #[must_use]
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            base_url: String::new(),
            params: Vec::new(),
            headers: HeaderMap::new(),
            cache: true,
            force_update: false,
        }
    }

    /// Creates a `GET` request.
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    /// Sets the API root.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Appends a query parameter.
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    /// Replaces the headers.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Enables or disables caching for this request only.
    #[must_use]
    pub fn with_cache(mut self, cache: bool) -> Self {
        self.cache = cache;
        self
    }

    /// Forces a fresh response that replaces the cached one.
    #[must_use]
    pub fn with_force_update(mut self, force_update: bool) -> Self {
        self.force_update = force_update;
        self
    }

    pub(crate) fn is_read(&self) -> bool {
        self.method == Method::GET
    }
}

/// A response in the form the caching layer stores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// The status code.
    pub status: u16,
    /// Response headers, by lowercase name.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// The decoded body.
    pub body: serde_json::Value,
}

impl Response {
    /// Creates a response with no headers.
    #[must_use]
    pub fn new(status: u16, body: serde_json::Value) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body,
        }
    }
}
