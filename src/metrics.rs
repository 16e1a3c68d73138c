//! # Metrics — Prometheus Exposition for the Prober Itself
//!
//! Exposes the six stable counters from `spec.md` §6 in the Prometheus text
//! exposition format, for scraping by the same (or an adjacent) Prometheus
//! instance the prober is testing. Mirrors the teacher's `prom_metrics.rs`:
//! a `Registry` plus one struct field per metric family, all safe to update
//! concurrently (though this crate's single-threaded run loop never needs
//! that).
//!
//! Every counter carries the stable `test="write-read-series"` label, added
//! once via [`Registry::sub_registry_with_label`] rather than threaded
//! through every `Family` label set.

use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::registry::Registry;
use std::borrow::Cow;

/// Label set for write-failure counters: the HTTP status code (or
/// `"transport"` for a connection-level failure).
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct StatusLabel {
    pub status_code: String,
}

/// Thread-safe metrics registry for `seriesprobe`.
pub struct Metrics {
    pub registry: Registry,
    pub writes_total: Counter,
    pub writes_failed_total: Family<StatusLabel, Counter>,
    pub queries_total: Counter,
    pub queries_failed_total: Counter,
    pub query_result_checks_total: Counter,
    pub query_result_checks_failed_total: Counter,
}

impl Metrics {
    pub fn new() -> Self {
        let mut registry = Registry::default();
        let mut labeled = registry.sub_registry_with_label((Cow::Borrowed("test"), Cow::Borrowed("write-read-series")));

        let writes_total = Counter::default();
        labeled.register(
            "mimir_continuous_test_writes",
            "Total number of writes attempted by the continuous test",
            writes_total.clone(),
        );

        let writes_failed_total = Family::<StatusLabel, Counter>::default();
        labeled.register(
            "mimir_continuous_test_writes_failed",
            "Total number of writes that failed, by status code",
            writes_failed_total.clone(),
        );

        let queries_total = Counter::default();
        labeled.register(
            "mimir_continuous_test_queries",
            "Total number of queries attempted by the continuous test",
            queries_total.clone(),
        );

        let queries_failed_total = Counter::default();
        labeled.register(
            "mimir_continuous_test_queries_failed",
            "Total number of queries that failed",
            queries_failed_total.clone(),
        );

        let query_result_checks_total = Counter::default();
        labeled.register(
            "mimir_continuous_test_query_result_checks",
            "Total number of query result samples compared against the expected value",
            query_result_checks_total.clone(),
        );

        let query_result_checks_failed_total = Counter::default();
        labeled.register(
            "mimir_continuous_test_query_result_checks_failed",
            "Total number of query result samples that didn't match the expected value",
            query_result_checks_failed_total.clone(),
        );

        Self {
            registry,
            writes_total,
            writes_failed_total,
            queries_total,
            queries_failed_total,
            query_result_checks_total,
            query_result_checks_failed_total,
        }
    }

    /// Render all metrics in Prometheus text exposition format.
    pub fn encode(&self) -> String {
        let mut buf = String::new();
        encode(&mut buf, &self.registry).expect("encoding metrics should not fail");
        buf
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
