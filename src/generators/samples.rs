//! Sine-Wave Sample Generator — `sin(2π·t/period)`

use std::f64::consts::PI;

use crate::types::{Series, Timestamp, Value};

use super::{Generator, SAMPLE_TOLERANCE};

/// Default period, in seconds, of the sine wave (one hour).
pub const DEFAULT_PERIOD_SECS: i64 = 3600;

/// Writes one float sample per series, equal to `sin(2π·t/period)` for every
/// series — so summing `N` series at time `t` yields `N * sin(2π·t/period)`.
pub struct SineWaveGenerator {
    metric_name: String,
    period_secs: i64,
}

impl SineWaveGenerator {
    pub fn new(metric_name: impl Into<String>, period_secs: i64) -> Self {
        assert!(period_secs > 0, "period must be positive");
        Self {
            metric_name: metric_name.into(),
            period_secs,
        }
    }
}

impl Default for SineWaveGenerator {
    fn default() -> Self {
        Self::new("seriesprobe_sine_wave", DEFAULT_PERIOD_SECS)
    }
}

impl Generator for SineWaveGenerator {
    fn metric_name(&self) -> &str {
        &self.metric_name
    }

    fn generate_series(&self, timestamp: Timestamp, num_series: u32) -> Vec<Series> {
        let value = self.generate_value(timestamp);
        (0..num_series)
            .map(|i| Series {
                metric_name: self.metric_name.clone(),
                labels: vec![("series_id".to_string(), i.to_string())],
                timestamp,
                value: Value::Sample(value),
            })
            .collect()
    }

    fn generate_value(&self, timestamp: Timestamp) -> f64 {
        (2.0 * PI * timestamp as f64 / self.period_secs as f64).sin()
    }

    fn query_sum(&self) -> String {
        format!("sum({})", self.metric_name)
    }

    fn tolerance(&self) -> f64 {
        SAMPLE_TOLERANCE
    }
}
