// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Structured logs and metrics for cache operations.
//!
//! Every event carries the cache name, the operation and what the operation
//! observed. Events are emitted through `tracing`; with the `metrics` feature
//! they are also counted on an OpenTelemetry meter.

pub(crate) mod attributes;
#[cfg(any(feature = "metrics", test))]
pub(crate) mod metrics;
#[cfg(test)]
pub(crate) mod testing;

#[cfg(any(feature = "metrics", test))]
use opentelemetry::{
    KeyValue,
    metrics::{Counter, MeterProvider},
};
use strata_tier::Error;

/// The cache operation an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum CacheOperation {
    /// Single-key read.
    Get,
    /// Single-key write.
    Set,
    /// Single-key removal.
    Delete,
    /// Removal of every entry.
    Clear,
    /// Batch read.
    GetMultiple,
    /// Batch write.
    SetMultiple,
    /// Batch removal.
    DeleteMultiple,
    /// Presence check.
    Has,
    /// Eviction of expired entries.
    Prune,
    /// Return to the initial state.
    Reset,
    /// Eviction of a group of related entries.
    Invalidate,
}

impl CacheOperation {
    /// Returns the name recorded for this operation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "cache.get",
            Self::Set => "cache.set",
            Self::Delete => "cache.delete",
            Self::Clear => "cache.clear",
            Self::GetMultiple => "cache.get_multiple",
            Self::SetMultiple => "cache.set_multiple",
            Self::DeleteMultiple => "cache.delete_multiple",
            Self::Has => "cache.has",
            Self::Prune => "cache.prune",
            Self::Reset => "cache.reset",
            Self::Invalidate => "cache.invalidate",
        }
    }
}

/// What an operation observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum CacheActivity {
    /// A value was found.
    Hit,
    /// No value was found.
    Miss,
    /// A value found in a slower tier was copied into a faster one.
    Backfill,
    /// A value was stored.
    Inserted,
    /// Entries were evicted.
    Invalidated,
    /// The cache was skipped on purpose.
    Bypass,
    /// The operation completed.
    Ok,
    /// The operation failed.
    Error,
}

impl CacheActivity {
    /// Returns the name recorded for this activity.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hit => "cache.hit",
            Self::Miss => "cache.miss",
            Self::Backfill => "cache.backfill",
            Self::Inserted => "cache.inserted",
            Self::Invalidated => "cache.invalidated",
            Self::Bypass => "cache.bypass",
            Self::Ok => "cache.ok",
            Self::Error => "cache.error",
        }
    }

    fn level(self) -> Level {
        match self {
            Self::Hit | Self::Miss | Self::Bypass | Self::Ok => Level::Debug,
            Self::Backfill | Self::Inserted | Self::Invalidated => Level::Info,
            Self::Error => Level::Error,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Debug,
    Info,
    Error,
}

/// Records cache events as logs and, optionally, metrics.
///
/// Logging is on by default. Pass a meter provider to
/// [`with_metrics`](Self::with_metrics) to also count events.
///
/// # Examples
///
/// ```
/// use strata::telemetry::{CacheActivity, CacheOperation, CacheTelemetry};
///
/// let telemetry = CacheTelemetry::new();
/// telemetry.record("sessions", CacheOperation::Get, CacheActivity::Hit);
/// ```
#[derive(Clone, Debug)]
pub struct CacheTelemetry {
    logging_enabled: bool,
    #[cfg(any(feature = "metrics", test))]
    event_counter: Option<Counter<u64>>,
}

impl Default for CacheTelemetry {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheTelemetry {
    /// Creates a collector that logs every event and records no metrics.
    #[must_use]
    pub fn new() -> Self {
        Self {
            logging_enabled: true,
            #[cfg(any(feature = "metrics", test))]
            event_counter: None,
        }
    }

    /// Creates a collector that records nothing.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new().without_logs()
    }

    /// Stops emitting events through `tracing`.
    #[must_use]
    pub fn without_logs(mut self) -> Self {
        self.logging_enabled = false;
        self
    }

    /// Counts every event on a meter obtained from `provider`.
    #[cfg(any(feature = "metrics", test))]
    #[cfg_attr(docsrs, doc(cfg(feature = "metrics")))]
    #[must_use]
    pub fn with_metrics(mut self, provider: &dyn MeterProvider) -> Self {
        let meter = metrics::create_meter(provider);
        self.event_counter = Some(metrics::create_event_counter(&meter));
        self
    }

    /// Records that `operation` on cache `cache_name` observed `activity`.
    pub fn record(&self, cache_name: &'static str, operation: CacheOperation, activity: CacheActivity) {
        self.count(cache_name, operation, activity);
        if self.logging_enabled {
            Self::emit(cache_name, operation, activity, None);
        }
    }

    /// Records that `operation` on cache `cache_name` failed with `error`.
    pub fn record_error(&self, cache_name: &'static str, operation: CacheOperation, error: &Error) {
        self.count(cache_name, operation, CacheActivity::Error);
        if self.logging_enabled {
            Self::emit(cache_name, operation, CacheActivity::Error, Some(error));
        }
    }

    #[cfg_attr(
        not(any(feature = "metrics", test)),
        expect(clippy::unused_self, reason = "counts only with the metrics feature")
    )]
    fn count(&self, cache_name: &'static str, operation: CacheOperation, activity: CacheActivity) {
        #[cfg(any(feature = "metrics", test))]
        if let Some(counter) = &self.event_counter {
            counter.add(
                1,
                &[
                    KeyValue::new(attributes::CACHE_NAME, cache_name),
                    KeyValue::new(attributes::CACHE_OPERATION_NAME, operation.as_str()),
                    KeyValue::new(attributes::CACHE_ACTIVITY_NAME, activity.as_str()),
                ],
            );
        }
        #[cfg(not(any(feature = "metrics", test)))]
        let _ = (cache_name, operation, activity);
    }

    fn emit(cache_name: &'static str, operation: CacheOperation, activity: CacheActivity, error: Option<&Error>) {
        let op = operation.as_str();
        let act = activity.as_str();
        let error = error.map(tracing::field::display);

        // Field names must match the constants in attributes.rs.
        macro_rules! emit_event {
            ($level:ident) => {
                tracing::$level!(
                    cache.name = cache_name,
                    cache.operation = op,
                    cache.activity = act,
                    error,
                    "cache.event"
                )
            };
        }

        // Tracing levels must be constant.
        match activity.level() {
            Level::Error => emit_event!(error),
            Level::Info => emit_event!(info),
            Level::Debug => emit_event!(debug),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::testing::{LogCapture, MetricTester};

    #[test]
    fn operation_names() {
        assert_eq!(CacheOperation::Get.as_str(), "cache.get");
        assert_eq!(CacheOperation::SetMultiple.as_str(), "cache.set_multiple");
        assert_eq!(CacheOperation::Invalidate.as_str(), "cache.invalidate");
    }

    #[test]
    fn activity_levels() {
        assert_eq!(CacheActivity::Hit.level(), Level::Debug);
        assert_eq!(CacheActivity::Bypass.level(), Level::Debug);
        assert_eq!(CacheActivity::Backfill.level(), Level::Info);
        assert_eq!(CacheActivity::Invalidated.level(), Level::Info);
        assert_eq!(CacheActivity::Error.level(), Level::Error);
    }

    #[test]
    fn metrics_carry_event_attributes() {
        let tester = MetricTester::new();
        let telemetry = CacheTelemetry::disabled().with_metrics(tester.meter_provider());

        telemetry.record("sessions", CacheOperation::Get, CacheActivity::Hit);
        telemetry.record("sessions", CacheOperation::Get, CacheActivity::Hit);

        tester.assert_attributes_contain(&[
            KeyValue::new(attributes::CACHE_NAME, "sessions"),
            KeyValue::new(attributes::CACHE_OPERATION_NAME, "cache.get"),
            KeyValue::new(attributes::CACHE_ACTIVITY_NAME, "cache.hit"),
        ]);
        let total: u64 = tester.counter_points().iter().map(|(_, value)| value).sum();
        assert_eq!(total, 2);
    }

    #[test]
    fn logs_contain_fields_and_values() {
        let capture = LogCapture::new();
        let _guard = tracing::subscriber::set_default(capture.subscriber());

        CacheTelemetry::new().record_error("sessions", CacheOperation::Set, &Error::storage("disk full"));

        capture.assert_contains(attributes::CACHE_EVENT_NAME);
        capture.assert_contains(attributes::CACHE_NAME);
        capture.assert_contains(attributes::CACHE_OPERATION_NAME);
        capture.assert_contains(attributes::CACHE_ACTIVITY_NAME);
        capture.assert_contains(attributes::CACHE_ERROR_NAME);
        capture.assert_contains("sessions");
        capture.assert_contains("cache.set");
        capture.assert_contains("cache.error");
        capture.assert_contains("disk full");
        capture.assert_contains("ERROR");
    }

    #[test]
    fn logs_use_activity_level() {
        let capture = LogCapture::new();
        let _guard = tracing::subscriber::set_default(capture.subscriber());
        CacheTelemetry::new().record("cache", CacheOperation::Get, CacheActivity::Backfill);
        capture.assert_contains("INFO");

        let capture = LogCapture::new();
        let _guard = tracing::subscriber::set_default(capture.subscriber());
        CacheTelemetry::new().record("cache", CacheOperation::Get, CacheActivity::Miss);
        capture.assert_contains("DEBUG");
    }

    #[test]
    fn disabled_telemetry_emits_nothing() {
        let capture = LogCapture::new();
        let _guard = tracing::subscriber::set_default(capture.subscriber());

        CacheTelemetry::disabled().record("cache", CacheOperation::Get, CacheActivity::Hit);

        assert!(capture.output().is_empty());
    }
}
