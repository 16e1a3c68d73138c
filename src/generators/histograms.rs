//! Histogram Generators — Classic (Bucketed) and Native Representations
//!
//! Both representations share one trait-level contract: `generate_value(t)`
//! is the exact decoded sum the write side embeds in the histogram payload,
//! and is therefore also the value `query_sum()`'s PromQL expression must
//! reproduce. Bucket layout is otherwise cosmetic — a fixed, deterministic
//! function of `t` — because a black-box correctness check only needs the
//! scalar the query derives, not the internal bucket counts.

use std::f64::consts::PI;

use crate::types::{Series, Timestamp, Value};

use super::{Generator, HISTOGRAM_TOLERANCE};

/// Fixed number of synthetic observations folded into every histogram point.
const OBSERVATIONS: u64 = 20;

/// Classic Prometheus bucket boundaries (le values), `+Inf` implicit last.
const BUCKET_BOUNDARIES: [f64; 6] = [1.0, 2.0, 4.0, 8.0, 16.0, 32.0];

fn wave(t: Timestamp, period_secs: i64, scale: f64) -> f64 {
    scale * (0.5 + 0.5 * (2.0 * PI * t as f64 / period_secs as f64).sin())
}

fn cumulative_buckets(sum: f64) -> Vec<(f64, u64)> {
    // Deterministic, monotonically non-decreasing cumulative counts that
    // happen to land heavier in buckets matching the point's own magnitude.
    let total = OBSERVATIONS;
    BUCKET_BOUNDARIES
        .iter()
        .enumerate()
        .map(|(i, &boundary)| {
            let frac = ((i + 1) as f64 / BUCKET_BOUNDARIES.len() as f64).min(1.0);
            let weight = if sum.abs() < boundary { frac } else { frac * 0.5 };
            (boundary, (total as f64 * weight) as u64)
        })
        .collect()
}

/// Bucketed histogram, in an integer- or float-valued flavor.
pub struct ClassicHistogramGenerator {
    metric_name: String,
    period_secs: i64,
    scale: f64,
    integer_valued: bool,
}

impl ClassicHistogramGenerator {
    pub fn integer() -> Self {
        Self {
            metric_name: "seriesprobe_histogram_classic_int".to_string(),
            period_secs: 1800,
            scale: 40.0,
            integer_valued: true,
        }
    }

    pub fn float() -> Self {
        Self {
            metric_name: "seriesprobe_histogram_classic_float".to_string(),
            period_secs: 1800,
            scale: 40.0,
            integer_valued: false,
        }
    }
}

impl Generator for ClassicHistogramGenerator {
    fn metric_name(&self) -> &str {
        &self.metric_name
    }

    fn generate_series(&self, timestamp: Timestamp, num_series: u32) -> Vec<Series> {
        let sum = self.generate_value(timestamp);
        let buckets = cumulative_buckets(sum);
        (0..num_series)
            .map(|i| Series {
                metric_name: self.metric_name.clone(),
                labels: vec![("series_id".to_string(), i.to_string())],
                timestamp,
                value: Value::ClassicHistogram {
                    buckets: buckets.clone(),
                    sum,
                    count: OBSERVATIONS,
                },
            })
            .collect()
    }

    fn generate_value(&self, timestamp: Timestamp) -> f64 {
        let v = wave(timestamp, self.period_secs, self.scale);
        if self.integer_valued {
            v.round()
        } else {
            v
        }
    }

    fn query_sum(&self) -> String {
        format!("sum({}_sum)", self.metric_name)
    }

    fn tolerance(&self) -> f64 {
        HISTOGRAM_TOLERANCE
    }
}

/// Native (sparse, exponential-bucket) histogram, in an integer- or
/// float-valued flavor. Only sum/count are modeled — a black-box correctness
/// check has no way to observe native bucket internals through PromQL.
pub struct NativeHistogramGenerator {
    metric_name: String,
    period_secs: i64,
    scale: f64,
    integer_valued: bool,
}

impl NativeHistogramGenerator {
    pub fn integer() -> Self {
        Self {
            metric_name: "seriesprobe_histogram_native_int".to_string(),
            period_secs: 2400,
            scale: 55.0,
            integer_valued: true,
        }
    }

    pub fn float() -> Self {
        Self {
            metric_name: "seriesprobe_histogram_native_float".to_string(),
            period_secs: 2400,
            scale: 55.0,
            integer_valued: false,
        }
    }
}

impl Generator for NativeHistogramGenerator {
    fn metric_name(&self) -> &str {
        &self.metric_name
    }

    fn generate_series(&self, timestamp: Timestamp, num_series: u32) -> Vec<Series> {
        let sum = self.generate_value(timestamp);
        (0..num_series)
            .map(|i| Series {
                metric_name: self.metric_name.clone(),
                labels: vec![("series_id".to_string(), i.to_string())],
                timestamp,
                value: Value::NativeHistogram {
                    sum,
                    count: OBSERVATIONS,
                },
            })
            .collect()
    }

    fn generate_value(&self, timestamp: Timestamp) -> f64 {
        let v = wave(timestamp, self.period_secs, self.scale);
        if self.integer_valued {
            v.round()
        } else {
            v
        }
    }

    fn query_sum(&self) -> String {
        format!("histogram_sum({})", self.metric_name)
    }

    fn tolerance(&self) -> f64 {
        HISTOGRAM_TOLERANCE
    }
}
