//! # Prober — Top-Level Orchestration
//!
//! Owns the generator list, one [`MetricHistory`] per generator, the
//! [`RemoteClient`], the metrics registry, and a per-instance RNG. This is
//! the object a scheduler constructs once and drives by calling
//! [`Prober::init`] exactly once, then [`Prober::run`] on every subsequent
//! tick — `spec.md` §2's control-flow contract, made concrete.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::client::RemoteClient;
use crate::config::Config;
use crate::generators::{ClassicHistogramGenerator, Generator, NativeHistogramGenerator, SineWaveGenerator};
use crate::history::MetricHistory;
use crate::init::init_metric;
use crate::metrics::Metrics;
use crate::runner::run_metric;
use crate::types::Timestamp;

/// One tracked metric family: its generator and its recovered/advancing
/// history. Named `Tracked` rather than reusing `Generator` as the map key
/// because trait objects aren't `Hash`.
struct Tracked {
    generator: Box<dyn Generator>,
    history: MetricHistory,
}

pub struct Prober {
    client: Arc<dyn RemoteClient>,
    metrics: Arc<Metrics>,
    tracked: Vec<Tracked>,
    num_series: u32,
    write_interval: Timestamp,
    max_query_age: Timestamp,
    rng: StdRng,
}

impl Prober {
    pub fn new(config: &Config, client: Arc<dyn RemoteClient>, metrics: Arc<Metrics>) -> Self {
        Self::with_rng(config, client, metrics, StdRng::from_entropy())
    }

    /// Construct with an injected RNG — the hook `spec.md` §9 requires so
    /// tests can make the planner's random window/instant deterministic.
    pub fn with_rng(config: &Config, client: Arc<dyn RemoteClient>, metrics: Arc<Metrics>, rng: StdRng) -> Self {
        let mut tracked = Vec::new();
        if config.with_samples {
            tracked.push(Tracked {
                generator: Box::new(SineWaveGenerator::default()),
                history: MetricHistory::default(),
            });
        }
        if config.with_histograms {
            for generator in [
                Box::new(ClassicHistogramGenerator::integer()) as Box<dyn Generator>,
                Box::new(ClassicHistogramGenerator::float()),
                Box::new(NativeHistogramGenerator::integer()),
                Box::new(NativeHistogramGenerator::float()),
            ] {
                tracked.push(Tracked {
                    generator,
                    history: MetricHistory::default(),
                });
            }
        }

        Self {
            client,
            metrics,
            tracked,
            num_series: config.num_series,
            write_interval: config.write_interval_secs,
            max_query_age: config.max_query_age_secs,
            rng,
        }
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Recover history for every tracked metric. Must be called exactly once
    /// before the first [`Prober::run`].
    pub async fn init(&mut self, ctx: &CancellationToken, now: Timestamp) -> anyhow::Result<()> {
        for t in &mut self.tracked {
            init_metric(
                self.client.as_ref(),
                ctx,
                t.generator.as_ref(),
                &mut t.history,
                now,
                self.max_query_age,
                self.write_interval,
                self.num_series,
            )
            .await?;
            info!(
                metric = t.generator.metric_name(),
                last_written_timestamp = t.history.last_written_timestamp,
                query_min_time = t.history.query_min_time,
                query_max_time = t.history.query_max_time,
                "init: recovered history"
            );
        }
        Ok(())
    }

    /// Run one tick across every tracked metric. Continues past a per-metric
    /// failure so one bad metric can't mask another's results; returns the
    /// last error encountered, if any.
    pub async fn run(&mut self, ctx: &CancellationToken, now: Timestamp) -> anyhow::Result<()> {
        let mut last_error = None;

        for t in &mut self.tracked {
            let result = run_metric(
                self.client.as_ref(),
                ctx,
                t.generator.as_ref(),
                &mut t.history,
                &self.metrics,
                now,
                self.write_interval,
                self.max_query_age,
                self.num_series,
                &mut self.rng,
            )
            .await;

            if let Err(e) = result {
                warn!(metric = t.generator.metric_name(), error = %e, "run: tick reported a failure");
                last_error = Some(e);
            }
        }

        match last_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
