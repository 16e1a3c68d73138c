//! # Run Loop
//!
//! `run_metric` orchestrates one tick for one metric family: write backfill
//! (phase W) then query & compare (phase Q), per `spec.md` §4.4. Houses the
//! failure-classification policy from §7: [`ProbeError::halts_write_phase`]
//! decides whether a write outcome (5xx/transport) aborts phase W and skips
//! phase Q entirely, or (4xx) is merely counted while the cursor advances;
//! query/comparison failures are counted and reported but don't stop other
//! queries in the same tick.

use rand::Rng;
use tokio_util::sync::CancellationToken;

use crate::client::RemoteClient;
use crate::error::ProbeError;
use crate::generators::Generator;
use crate::history::MetricHistory;
use crate::metrics::{Metrics, StatusLabel};
use crate::planner::{self};
use crate::types::{align_down, Timestamp};

/// Run one tick for one metric family. Mutates `history` in place.
///
/// Returns `Err` if any write was rejected/failed, any query failed, or any
/// comparison mismatched — matching `spec.md` §6's exit-code contract. A
/// non-`Err` result means every write succeeded-or-was-rejected cleanly,
/// every query succeeded, and every comparison matched.
pub async fn run_metric(
    client: &dyn RemoteClient,
    ctx: &CancellationToken,
    gen: &dyn Generator,
    history: &mut MetricHistory,
    metrics: &Metrics,
    now: Timestamp,
    write_interval: Timestamp,
    max_query_age: Timestamp,
    num_series: u32,
    rng: &mut impl Rng,
) -> anyhow::Result<()> {
    let mut tick_error: Option<anyhow::Error> = None;
    let halted = run_write_phase(client, ctx, gen, history, metrics, now, write_interval, num_series, &mut tick_error).await;

    if !halted {
        run_query_phase(client, ctx, gen, history, metrics, now, write_interval, max_query_age, num_series, rng, &mut tick_error).await;
    }

    match tick_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Phase W. Returns `true` if a halting failure (5xx/transport) aborted the
/// phase early — in which case phase Q must be skipped entirely.
#[allow(clippy::too_many_arguments)]
async fn run_write_phase(
    client: &dyn RemoteClient,
    ctx: &CancellationToken,
    gen: &dyn Generator,
    history: &mut MetricHistory,
    metrics: &Metrics,
    now: Timestamp,
    write_interval: Timestamp,
    num_series: u32,
    tick_error: &mut Option<anyhow::Error>,
) -> bool {
    let target = align_down(now, write_interval);

    let timestamps: Vec<Timestamp> = if history.last_written_timestamp == 0 {
        vec![target]
    } else if history.last_written_timestamp >= target {
        Vec::new()
    } else {
        let mut t = history.last_written_timestamp + write_interval;
        let mut out = Vec::new();
        while t <= target {
            out.push(t);
            t += write_interval;
        }
        out
    };

    for t in timestamps {
        if ctx.is_cancelled() {
            *tick_error = Some(anyhow::anyhow!("write phase cancelled"));
            return true;
        }

        let series = gen.generate_series(t, num_series);
        metrics.writes_total.inc();

        match client.write_series(ctx, &series).await {
            Ok(status) if (200..300).contains(&status) => {
                let first_success = history.is_empty();
                history.last_written_timestamp = t;
                if first_success {
                    history.query_min_time = t;
                }
                history.query_max_time = t;
            }
            Ok(status) => {
                let err = if (400..500).contains(&status) {
                    ProbeError::Write4xx { status }
                } else {
                    ProbeError::Write5xx { status }
                };
                metrics
                    .writes_failed_total
                    .get_or_create(&StatusLabel { status_code: status.to_string() })
                    .inc();
                let halts = err.halts_write_phase();
                *tick_error = Some(err.into());
                if halts {
                    return true;
                }
                // 4xx: the payload is permanently rejected, but the cursor still advances.
                history.last_written_timestamp = t;
            }
            Err(e) => {
                metrics
                    .writes_failed_total
                    .get_or_create(&StatusLabel { status_code: "transport".to_string() })
                    .inc();
                let halts = e.halts_write_phase();
                *tick_error = Some(e.into());
                if halts {
                    return true;
                }
            }
        }
    }

    false
}

/// Phase Q. Never returns a hard "abort" signal — every range and instant in
/// the plan is attempted regardless of earlier failures in the same tick.
#[allow(clippy::too_many_arguments)]
async fn run_query_phase(
    client: &dyn RemoteClient,
    ctx: &CancellationToken,
    gen: &dyn Generator,
    history: &MetricHistory,
    metrics: &Metrics,
    now: Timestamp,
    write_interval: Timestamp,
    max_query_age: Timestamp,
    num_series: u32,
    rng: &mut impl Rng,
    tick_error: &mut Option<anyhow::Error>,
) {
    let plan = match planner::plan(now, history, max_query_age, rng) {
        Ok(p) => p,
        Err(_) => return, // NoHistory / HistoryStale: skip phase Q, no error surfaced.
    };

    let query = gen.query_sum();

    for r in &plan.ranges {
        if ctx.is_cancelled() {
            *tick_error = Some(anyhow::anyhow!("query phase cancelled"));
            return;
        }
        metrics.queries_total.inc();
        match client.query_range(ctx, &query, r.start, r.end, write_interval).await {
            Ok(samples) => check_samples(gen, metrics, num_series, &samples, tick_error),
            Err(e) => {
                metrics.queries_failed_total.inc();
                *tick_error = Some(e.into());
            }
        }
    }

    for &t in &plan.instants {
        if ctx.is_cancelled() {
            *tick_error = Some(anyhow::anyhow!("query phase cancelled"));
            return;
        }
        metrics.queries_total.inc();
        match client.query(ctx, &query, t).await {
            Ok(samples) => check_samples(gen, metrics, num_series, &samples, tick_error),
            Err(e) => {
                metrics.queries_failed_total.inc();
                *tick_error = Some(e.into());
            }
        }
    }
}

fn check_samples(
    gen: &dyn Generator,
    metrics: &Metrics,
    num_series: u32,
    samples: &[(Timestamp, f64)],
    tick_error: &mut Option<anyhow::Error>,
) {
    for &(t, observed) in samples {
        metrics.query_result_checks_total.inc();
        let expected = num_series as f64 * gen.generate_value(t);
        if !within_tolerance(observed, expected, gen.tolerance()) {
            metrics.query_result_checks_failed_total.inc();
            *tick_error = Some(
                ProbeError::ResultMismatch {
                    expected,
                    observed,
                    timestamp: t,
                }
                .into(),
            );
        }
    }
}

fn within_tolerance(observed: f64, expected: f64, relative_tolerance: f64) -> bool {
    (observed - expected).abs() <= relative_tolerance * expected.abs().max(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn within_tolerance_accepts_exact_match() {
        assert!(within_tolerance(1.0, 1.0, 1e-6));
    }

    #[test]
    fn within_tolerance_rejects_gross_mismatch() {
        assert!(!within_tolerance(12345.0, 0.5, 1e-6));
    }

    #[test]
    fn within_tolerance_scales_with_magnitude() {
        // 1e-6 relative tolerance on expected=1_000_000 allows an absolute
        // delta of 1.0.
        assert!(within_tolerance(1_000_000.5, 1_000_000.0, 1e-6));
        assert!(!within_tolerance(1_000_002.0, 1_000_000.0, 1e-6));
    }
}
