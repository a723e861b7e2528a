// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Builder for tiered caches.

use std::time::Duration;

use strata_tier::{DynamicCache, Result};

use crate::ChainCache;
use crate::chain::DEFAULT_NAME;
use crate::telemetry::CacheTelemetry;

/// Builder for a [`ChainCache`].
///
/// Tiers are added fastest first.
#[derive(Debug)]
pub struct ChainCacheBuilder<V> {
    tiers: Vec<DynamicCache<V>>,
    default_lifetime: Option<Duration>,
    name: &'static str,
    telemetry: CacheTelemetry,
}

impl<V> ChainCacheBuilder<V> {
    pub(crate) fn new() -> Self {
        Self {
            tiers: Vec::new(),
            default_lifetime: None,
            name: DEFAULT_NAME,
            telemetry: CacheTelemetry::new(),
        }
    }

    /// Appends a tier slower than every tier added so far.
    #[must_use]
    pub fn tier(mut self, tier: DynamicCache<V>) -> Self {
        self.tiers.push(tier);
        self
    }

    /// Appends `tiers` in order.
    #[must_use]
    pub fn tiers(mut self, tiers: impl IntoIterator<Item = DynamicCache<V>>) -> Self {
        self.tiers.extend(tiers);
        self
    }

    /// Sets the lifetime of values copied into faster tiers.
    ///
    /// Without one, each tier applies its own default lifetime.
    #[must_use]
    pub fn default_lifetime(mut self, lifetime: Duration) -> Self {
        self.default_lifetime = Some(lifetime);
        self
    }

    /// Sets the name recorded with every telemetry event of the chain.
    #[must_use]
    pub fn name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Sets the telemetry collector.
    #[must_use]
    pub fn telemetry(mut self, telemetry: CacheTelemetry) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Builds the chain.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidArgument`](strata_tier::ErrorKind::InvalidArgument)
    /// when no tier was added.
    pub fn build(self) -> Result<ChainCache<V>>
    where
        V: Send,
    {
        ChainCache::from_parts(self.tiers, self.default_lifetime, self.name, self.telemetry)
    }
}

#[cfg(test)]
mod tests {
    use strata_tier::testing::MockCache;
    use strata_tier::{Cache, DynamicCacheExt, ErrorKind, ValueRepresentation};

    use super::*;

    #[test]
    fn empty_builder_fails() {
        let error = ChainCache::<String>::builder().build().unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn tiers_keep_insertion_order() {
        let serialized = MockCache::<String>::new().with_representation(ValueRepresentation::Serialized);
        let chain = ChainCache::builder()
            .tier(MockCache::<String>::new().into_dynamic())
            .tiers([serialized.into_dynamic()])
            .name("ordered")
            .telemetry(CacheTelemetry::disabled())
            .build()
            .unwrap();

        assert_eq!(chain.tiers().len(), 2);
        assert_eq!(chain.tiers()[0].value_representation(), ValueRepresentation::Native);
        assert_eq!(chain.tiers()[1].value_representation(), ValueRepresentation::Serialized);
    }
}
