// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Lifetimes of cache entries.
//!
//! A caller expresses how long an entry should live with a [`Ttl`]. Each backend
//! owns a [`Lifetime`] that resolves the request against its default lifetime and
//! the current time, producing the [`Expiry`] that is stored next to the value.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// How long a written entry should live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Ttl {
    /// Use the backend's configured default lifetime.
    #[default]
    Default,
    /// Keep the entry until it is deleted or the cache is cleared.
    Never,
    /// Expire the entry once this much time has passed.
    ///
    /// A zero duration turns the write into a delete.
    After(Duration),
}

impl From<Duration> for Ttl {
    fn from(duration: Duration) -> Self {
        Self::After(duration)
    }
}

impl From<Option<Duration>> for Ttl {
    fn from(duration: Option<Duration>) -> Self {
        duration.map_or(Self::Default, Self::After)
    }
}

/// The point in time after which a stored entry is no longer visible.
///
/// Persisted as epoch milliseconds, with `null` standing for [`Expiry::Never`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Expiry {
    /// The entry never expires.
    Never,
    /// The entry expires at this instant.
    At(SystemTime),
}

impl Expiry {
    /// Returns `true` when an entry with this expiry must not be served at `now`.
    ///
    /// An entry is expired from its expiry instant onwards; every backend applies
    /// this same rule on reads, presence checks and pruning. Pruning has to drop
    /// entries whose expiry equals `now`, so reads treat that instant as expired
    /// too, otherwise a prune could remove an entry a read would still serve.
    #[must_use]
    pub fn is_expired(&self, now: SystemTime) -> bool {
        match self {
            Self::Never => false,
            Self::At(at) => *at <= now,
        }
    }

    /// Returns the expiry as milliseconds since the Unix epoch, or `None` for [`Expiry::Never`].
    #[must_use]
    pub fn to_epoch_millis(&self) -> Option<u64> {
        match self {
            Self::Never => None,
            Self::At(at) => {
                let millis = at.duration_since(UNIX_EPOCH).map_or(0, |d| d.as_millis());
                Some(u64::try_from(millis).unwrap_or(u64::MAX))
            }
        }
    }

    /// Creates an expiry from milliseconds since the Unix epoch, `None` meaning never.
    #[must_use]
    pub fn from_epoch_millis(millis: Option<u64>) -> Self {
        match millis {
            None => Self::Never,
            Some(millis) => Self::At(UNIX_EPOCH + Duration::from_millis(millis)),
        }
    }
}

impl Serialize for Expiry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_epoch_millis().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Expiry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<u64>::deserialize(deserializer).map(Self::from_epoch_millis)
    }
}

/// Resolves requested [`Ttl`]s into stored [`Expiry`] values.
///
/// A default lifetime of `None` or zero means entries written with
/// [`Ttl::Default`] never expire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Lifetime {
    default: Option<Duration>,
}

impl Lifetime {
    /// Creates a lifetime policy with the given default lifetime.
    #[must_use]
    pub fn new(default: Option<Duration>) -> Self {
        Self {
            default: default.filter(|d| !d.is_zero()),
        }
    }

    /// Returns the default lifetime, `None` meaning entries never expire.
    #[must_use]
    pub fn default_lifetime(&self) -> Option<Duration> {
        self.default
    }

    /// Resolves `ttl` at `now`.
    ///
    /// Returns `None` when the write must be treated as a delete.
    #[must_use]
    pub fn resolve(&self, ttl: Ttl, now: SystemTime) -> Option<Expiry> {
        match ttl {
            Ttl::Never => Some(Expiry::Never),
            Ttl::Default => Some(self.default.map_or(Expiry::Never, |d| expires_after(now, d))),
            Ttl::After(d) if d.is_zero() => None,
            Ttl::After(d) => Some(expires_after(now, d)),
        }
    }
}

fn expires_after(now: SystemTime, duration: Duration) -> Expiry {
    now.checked_add(duration).map_or(Expiry::Never, Expiry::At)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: Duration = Duration::from_secs(1_000);

    fn now() -> SystemTime {
        UNIX_EPOCH + NOW
    }

    #[test]
    fn default_ttl_uses_default_lifetime() {
        let lifetime = Lifetime::new(Some(Duration::from_secs(5)));
        assert_eq!(
            lifetime.resolve(Ttl::Default, now()),
            Some(Expiry::At(now() + Duration::from_secs(5)))
        );
    }

    #[test]
    fn zero_default_lifetime_never_expires() {
        let lifetime = Lifetime::new(Some(Duration::ZERO));
        assert_eq!(lifetime.default_lifetime(), None);
        assert_eq!(lifetime.resolve(Ttl::Default, now()), Some(Expiry::Never));
    }

    #[test]
    fn zero_ttl_resolves_to_delete() {
        let lifetime = Lifetime::default();
        assert_eq!(lifetime.resolve(Ttl::After(Duration::ZERO), now()), None);
    }

    #[test]
    fn never_ttl_ignores_default_lifetime() {
        let lifetime = Lifetime::new(Some(Duration::from_secs(1)));
        assert_eq!(lifetime.resolve(Ttl::Never, now()), Some(Expiry::Never));
    }

    #[test]
    fn expiry_boundary_is_inclusive() {
        let expiry = Expiry::At(now());
        assert!(expiry.is_expired(now()));
        assert!(!expiry.is_expired(now() - Duration::from_millis(1)));
        assert!(!Expiry::Never.is_expired(now()));
    }

    #[test]
    fn expiry_serializes_as_epoch_millis_or_null() {
        let at = Expiry::At(UNIX_EPOCH + Duration::from_millis(1_500));
        assert_eq!(serde_json::to_string(&at).unwrap(), "1500");
        assert_eq!(serde_json::to_string(&Expiry::Never).unwrap(), "null");

        let parsed: Expiry = serde_json::from_str("1500").unwrap();
        assert_eq!(parsed, at);
        let parsed: Expiry = serde_json::from_str("null").unwrap();
        assert_eq!(parsed, Expiry::Never);
    }

    #[test]
    fn ttl_conversions() {
        assert_eq!(Ttl::from(Duration::from_secs(3)), Ttl::After(Duration::from_secs(3)));
        assert_eq!(Ttl::from(None), Ttl::Default);
        assert_eq!(Ttl::default(), Ttl::Default);
    }
}
