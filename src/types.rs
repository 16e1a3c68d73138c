//! Shared Types — Timestamps, Series Payloads, Label Sets
//!
//! Kept tiny and dependency-free so both the generators and the remote
//! client can build on them without a cyclic module dependency.

/// Unix timestamp in seconds. The prober never deals in sub-second precision.
pub type Timestamp = i64;

/// A single written data point: a label set plus either a float sample or a
/// histogram observation, at a specific timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub metric_name: String,
    /// Label set, including the reserved `series_id` label distinguishing
    /// the N parallel series of a metric family.
    pub labels: Vec<(String, String)>,
    pub timestamp: Timestamp,
    pub value: Value,
}

impl Series {
    pub fn series_id(&self) -> Option<&str> {
        self.labels
            .iter()
            .find(|(k, _)| k == "series_id")
            .map(|(_, v)| v.as_str())
    }
}

/// The payload of a single written point.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A plain float sample.
    Sample(f64),
    /// A classic (bucketed) histogram: explicit bucket boundaries, the
    /// decoded sum, and the total observation count.
    ClassicHistogram {
        buckets: Vec<(f64, u64)>,
        sum: f64,
        count: u64,
    },
    /// A native (sparse, exponential-bucket) histogram, represented here by
    /// its decoded sum and count — the detail a black-box correctness check
    /// actually needs.
    NativeHistogram { sum: f64, count: u64 },
}

impl Value {
    /// The scalar a `querySum` query is expected to return for this point.
    pub fn scalar(&self) -> f64 {
        match self {
            Value::Sample(v) => *v,
            Value::ClassicHistogram { sum, .. } => *sum,
            Value::NativeHistogram { sum, .. } => *sum,
        }
    }
}

/// Align a timestamp down to the nearest multiple of `interval`.
pub fn align_down(t: Timestamp, interval: Timestamp) -> Timestamp {
    debug_assert!(interval > 0);
    (t.div_euclid(interval)) * interval
}
