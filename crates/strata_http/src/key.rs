// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Derivation of cache keys and resource namespaces from request URLs.

use pct_str::{PctString, UriReserved};
use strata_tier::{Error, Result};

/// Returns the resource a URL addresses: its first path segment once `base_url`
/// is stripped, without any query string.
///
/// # Errors
///
/// Returns [`ErrorKind::MalformedUrl`](strata_tier::ErrorKind::MalformedUrl) when
/// the URL has no such segment.
///
/// # Examples
///
/// ```
/// use strata_http::resource_namespace;
///
/// let namespace = resource_namespace("https://api.test/v1/users/7?full", "https://api.test/v1").unwrap();
/// assert_eq!(namespace, "users");
/// assert!(resource_namespace("https://api.test/v1", "https://api.test/v1").is_err());
/// ```
pub fn resource_namespace<'a>(url: &'a str, base_url: &str) -> Result<&'a str> {
    let path = if base_url.is_empty() {
        url
    } else {
        url.strip_prefix(base_url).unwrap_or(url)
    };

    path.split('/')
        .nth(1)
        .map(|segment| segment.split(['?', '#']).next().unwrap_or_default())
        .filter(|segment| !segment.is_empty())
        .ok_or_else(|| Error::malformed_url(format!("no resource found in URL {url}")))
}

/// Builds the cache key of a request.
///
/// `params` are percent-encoded and appended to `url`, then every query
/// parameter is sorted so that parameter order does not change the key. A
/// fragment is dropped.
///
/// # Examples
///
/// ```
/// use strata_http::cache_key;
///
/// let by_params = cache_key("/users", &[("b".to_owned(), "2".to_owned()), ("a".to_owned(), "1".to_owned())]);
/// assert_eq!(by_params, "/users?a=1&b=2");
/// assert_eq!(cache_key("/users?b=2&a=1", &[]), by_params);
/// ```
#[must_use]
pub fn cache_key(url: &str, params: &[(String, String)]) -> String {
    let url = url.split_once('#').map_or(url, |(url, _fragment)| url);
    let (path, query) = url.split_once('?').unwrap_or((url, ""));

    let mut parts: Vec<String> = query
        .split('&')
        .filter(|part| !part.is_empty())
        .map(str::to_owned)
        .collect();
    parts.extend(params.iter().map(|(name, value)| format!("{}={}", encode(name), encode(value))));

    if parts.is_empty() {
        return path.to_owned();
    }

    parts.sort_unstable();
    format!("{path}?{}", parts.join("&"))
}

fn encode(component: &str) -> String {
    PctString::encode(component.chars(), UriReserved::Any).into_string()
}

#[cfg(test)]
mod tests {
    use strata_tier::ErrorKind;

    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect()
    }

    #[test]
    fn namespace_is_first_segment_after_base() {
        assert_eq!(resource_namespace("http://x/api/users/1", "http://x/api").unwrap(), "users");
        assert_eq!(resource_namespace("/orders?page=2", "").unwrap(), "orders");
        assert_eq!(resource_namespace("/orders#top", "").unwrap(), "orders");
    }

    #[test]
    fn unrelated_base_is_ignored() {
        assert_eq!(resource_namespace("/users/1", "http://elsewhere").unwrap(), "users");
    }

    #[test]
    fn missing_segment_is_malformed() {
        for url in ["", "users", "/", "/?x=1", "http://x/api"] {
            let error = resource_namespace(url, "http://x/api").unwrap_err();
            assert_eq!(error.kind(), ErrorKind::MalformedUrl, "url {url:?}");
        }
    }

    #[test]
    fn parameter_order_does_not_matter() {
        let ab = cache_key("/users", &params(&[("a", "1"), ("b", "2")]));
        let ba = cache_key("/users", &params(&[("b", "2"), ("a", "1")]));
        assert_eq!(ab, ba);
        assert_eq!(cache_key("/users?a&b", &[]), cache_key("/users?b&a", &[]));
    }

    #[test]
    fn params_merge_with_existing_query() {
        assert_eq!(cache_key("/users?z=9", &params(&[("a", "1")])), "/users?a=1&z=9");
    }

    #[test]
    fn params_are_percent_encoded() {
        assert_eq!(cache_key("/search", &params(&[("q", "a b&c")])), "/search?q=a%20b%26c");
    }

    #[test]
    fn plain_url_is_its_own_key() {
        assert_eq!(cache_key("/users/1", &[]), "/users/1");
        assert_eq!(cache_key("/users/1?", &[]), "/users/1");
        assert_eq!(cache_key("/users/1#frag", &[]), "/users/1");
    }
}
