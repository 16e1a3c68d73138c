//! # Initialization / Recovery Engine
//!
//! Reconstructs `(lastWrittenTimestamp, queryMinTime, queryMaxTime)` purely
//! by querying the remote system, per `spec.md` §4.3. Walks backward from
//! `now` in 24h chunks — a concession to the remote query backend's
//! per-query range limit — validating each chunk's samples against the
//! currently configured cardinality `N` so a restart with a changed `N`
//! shortens the recovered window instead of producing false mismatches.

use tokio_util::sync::CancellationToken;

use crate::client::RemoteClient;
use crate::error::ProbeError;
use crate::generators::Generator;
use crate::history::MetricHistory;
use crate::planner::ONE_DAY_SECS;
use crate::types::Timestamp;

const ONE_HOUR_SECS: Timestamp = 3600;

/// Is `value` consistent with `num_series` independent copies of
/// `expected_unit` having been summed?
///
/// When `expected_unit` is within float epsilon of zero (the sine-wave
/// generator crosses zero twice a period), `value / expected_unit` is
/// undefined for discriminating cardinality — any `N` produces a sum of
/// ~0. Treat the sample as valid iff the observed value is itself ~0; this
/// can't prove the cardinality was right, but it also can't prove it wrong,
/// and refusing to extend the contiguous run here would make `Init` reject
/// perfectly good history purely because it landed on a zero-crossing.
fn is_valid(value: f64, expected_unit: f64, num_series: u32) -> bool {
    if expected_unit.abs() < 1e-9 {
        return value.abs() < 1e-6;
    }
    let n_observed = (value / expected_unit).round();
    n_observed >= 0.0 && n_observed as u64 == num_series as u64
}

/// The contiguous valid run within one chunk: `(oldest, latest)` timestamps.
fn analyze_chunk(
    samples: &[(Timestamp, f64)],
    gen: &dyn Generator,
    num_series: u32,
    write_interval: Timestamp,
) -> Option<(Timestamp, Timestamp)> {
    let mut latest_idx = None;
    for (i, (t, v)) in samples.iter().enumerate() {
        if is_valid(*v, gen.generate_value(*t), num_series) {
            latest_idx = Some(i);
        }
    }
    let latest_idx = latest_idx?;
    let chunk_latest = samples[latest_idx].0;

    let mut oldest_idx = latest_idx;
    while oldest_idx > 0 {
        let (prev_t, prev_v) = samples[oldest_idx - 1];
        let (cur_t, _) = samples[oldest_idx];
        let adjoining = cur_t - prev_t == write_interval;
        if adjoining && is_valid(prev_v, gen.generate_value(prev_t), num_series) {
            oldest_idx -= 1;
        } else {
            break;
        }
    }
    Some((samples[oldest_idx].0, chunk_latest))
}

/// Recover one metric's history by walking backward from `now`.
///
/// Never returns `Err` for a failed chunk query — per `spec.md` §4.3/§7,
/// `InitQueryFailure` only stops the recovery loop at the failing chunk and
/// keeps whatever was accumulated so far (possibly nothing, in which case
/// the metric starts fresh). It can still return `Err` for truly unexpected
/// conditions (none are defined by the spec; this is here for future-proofing
/// a caller that wants to treat infrastructure errors as fatal).
pub async fn init_metric(
    client: &dyn RemoteClient,
    ctx: &CancellationToken,
    gen: &dyn Generator,
    history: &mut MetricHistory,
    now: Timestamp,
    max_query_age: Timestamp,
    write_interval: Timestamp,
    num_series: u32,
) -> anyhow::Result<()> {
    history.reset();
    let oldest_allowed = now - max_query_age;
    let query = gen.query_sum();

    if max_query_age < ONE_DAY_SECS {
        // A single clipped query covers the whole allowed window.
        let samples = match client.query_range(ctx, &query, oldest_allowed, now, write_interval).await {
            Ok(s) => s,
            Err(e) => {
                let err = ProbeError::InitQueryFailure(e.into());
                tracing::warn!(metric = gen.metric_name(), error = %err, "init: clipped chunk query failed, starting fresh");
                return Ok(());
            }
        };
        apply_first_chunk(history, analyze_chunk(&samples, gen, num_series, write_interval), now);
        return Ok(());
    }

    let mut end = now;
    let mut start = now - ONE_DAY_SECS + write_interval;
    let mut first_chunk = true;

    while start > oldest_allowed {
        if ctx.is_cancelled() {
            tracing::warn!(metric = gen.metric_name(), "init: cancelled, keeping accumulated history");
            break;
        }

        let samples = match client.query_range(ctx, &query, start, end, write_interval).await {
            Ok(s) => s,
            Err(e) => {
                let err = ProbeError::InitQueryFailure(e.into());
                tracing::warn!(metric = gen.metric_name(), error = %err, "init: chunk query failed, stopping recovery");
                break;
            }
        };
        let analysis = analyze_chunk(&samples, gen, num_series, write_interval);

        if first_chunk {
            first_chunk = false;
            if apply_first_chunk(history, analysis, now) {
                // reset to zero and stop: either no data or too stale.
                return Ok(());
            }
        } else {
            match analysis {
                Some((chunk_oldest, chunk_latest)) if chunk_latest == history.query_min_time - write_interval => {
                    history.query_min_time = chunk_oldest;
                }
                _ => break,
            }
        }

        end -= ONE_DAY_SECS;
        start = end - ONE_DAY_SECS + write_interval;
    }

    Ok(())
}

/// Apply the first chunk's analysis to `history`. Returns `true` if the
/// outcome was "reset and stop" (no data, or data too stale to trust).
fn apply_first_chunk(history: &mut MetricHistory, analysis: Option<(Timestamp, Timestamp)>, now: Timestamp) -> bool {
    match analysis {
        None => {
            history.reset();
            true
        }
        Some((chunk_oldest, chunk_latest)) => {
            if now - chunk_latest > ONE_HOUR_SECS {
                history.reset();
                true
            } else {
                history.last_written_timestamp = chunk_latest;
                history.query_max_time = chunk_latest;
                history.query_min_time = chunk_oldest;
                false
            }
        }
    }
}
