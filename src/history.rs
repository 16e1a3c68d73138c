//! Metric History — Per-Metric Recovered/Advanced State
//!
//! One `MetricHistory` per tracked metric family. Populated by the recovery
//! engine ([`crate::init`]), mutated by the run loop ([`crate::runner`]),
//! and otherwise inert — the struct itself enforces none of the invariants
//! in `spec.md` §3; callers are expected to only ever reach the states the
//! recovery engine and run loop produce. [`MetricHistory::check_invariants`]
//! exists purely so tests can assert on that.

use crate::types::Timestamp;

/// `(lastWrittenTimestamp, queryMinTime, queryMaxTime)` for one metric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricHistory {
    /// Latest timestamp successfully written, across all restarts. Zero
    /// means "no confirmed history". Monotonically non-decreasing within a
    /// process lifetime.
    pub last_written_timestamp: Timestamp,
    /// Inclusive lower bound of timestamps believed fully present on the
    /// remote at the current cardinality.
    pub query_min_time: Timestamp,
    /// Inclusive upper bound of the same.
    pub query_max_time: Timestamp,
}

impl MetricHistory {
    pub fn is_empty(&self) -> bool {
        self.query_min_time == 0 && self.query_max_time == 0
    }

    pub fn reset(&mut self) {
        *self = MetricHistory::default();
    }

    /// I1–I3 from `spec.md` §3, for use in tests and debug assertions.
    pub fn check_invariants(&self, now: Timestamp, write_interval: Timestamp, max_query_age: Timestamp) -> Result<(), String> {
        if self.is_empty() {
            if self.last_written_timestamp != 0 {
                return Err("history empty but lastWrittenTimestamp nonzero".into());
            }
            return Ok(());
        }
        if !(self.query_min_time <= self.query_max_time && self.query_max_time <= self.last_written_timestamp) {
            return Err(format!(
                "I1 violated: queryMinTime={} queryMaxTime={} lastWrittenTimestamp={}",
                self.query_min_time, self.query_max_time, self.last_written_timestamp
            ));
        }
        for (name, t) in [
            ("lastWrittenTimestamp", self.last_written_timestamp),
            ("queryMinTime", self.query_min_time),
            ("queryMaxTime", self.query_max_time),
        ] {
            if t % write_interval != 0 {
                return Err(format!("I2 violated: {name}={t} not aligned to {write_interval}"));
            }
        }
        if now - self.query_min_time > max_query_age {
            return Err(format!(
                "I3 violated: now-queryMinTime={} > maxQueryAge={}",
                now - self.query_min_time,
                max_query_age
            ));
        }
        Ok(())
    }
}
