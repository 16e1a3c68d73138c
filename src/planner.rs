//! # Time-Range Planner
//!
//! `plan(now, history, max_query_age, rng)` computes the range- and
//! instant-query plan for one tick, per `spec.md` §4.2. Pure apart from the
//! injected RNG, which must be per-`Prober`-instance (never global) so tests
//! can inject a deterministic seed — `spec.md` §9 calls this out explicitly.

use rand::Rng;

use crate::error::PlannerError;
use crate::history::MetricHistory;
use crate::types::Timestamp;

pub const ONE_HOUR_SECS: Timestamp = 3600;
pub const ONE_DAY_SECS: Timestamp = 86_400;

/// An inclusive `[start, end]` range-query window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeQuery {
    pub start: Timestamp,
    pub end: Timestamp,
}

/// The full query plan for one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPlan {
    pub ranges: Vec<RangeQuery>,
    pub instants: Vec<Timestamp>,
}

/// Compute the range- and instant-query plan for one tick.
pub fn plan(
    now: Timestamp,
    history: &MetricHistory,
    max_query_age: Timestamp,
    rng: &mut impl Rng,
) -> Result<QueryPlan, PlannerError> {
    if history.is_empty() {
        return Err(PlannerError::NoHistory);
    }
    if now - history.query_max_time > max_query_age {
        return Err(PlannerError::HistoryStale);
    }

    let qmin = history.query_min_time;
    let qmax = history.query_max_time;

    let mut ranges = Vec::new();
    let mut instants = Vec::new();

    // 1. "Last 1h" window — always present.
    ranges.push(RangeQuery {
        start: (now - ONE_HOUR_SECS).max(qmin),
        end: now.min(qmax),
    });

    let crosses_one_hour = qmin < now - ONE_HOUR_SECS;

    // 2. "Last 24h" window — only if history reaches back past 1h.
    if crosses_one_hour {
        ranges.push(RangeQuery {
            start: (now - ONE_DAY_SECS).max(qmin),
            end: now.min(qmax),
        });
    }

    // 3. "Boundary 23h->24h" window — only if history crosses the 24h mark.
    if qmin <= now - ONE_DAY_SECS {
        ranges.push(RangeQuery {
            start: now - ONE_DAY_SECS,
            end: now - ONE_DAY_SECS + ONE_HOUR_SECS,
        });
    }

    // 4. Random sub-range of [qmin, qmax] — always present.
    let (rs, re) = random_pair(qmin, qmax, rng);
    ranges.push(RangeQuery { start: rs, end: re });

    // Instant 1: "last 1h" — min(qmax, now) when within 1h of now.
    let last1h_instant = qmax.min(now);
    if now - last1h_instant <= ONE_HOUR_SECS {
        instants.push(last1h_instant);
    }

    // Instant 2: "last 24h" — same inclusion condition as range #2.
    if crosses_one_hour {
        instants.push((now - ONE_DAY_SECS).max(qmin));
    }

    // Instant 3: random instant in [qmin, qmax] — always present.
    instants.push(random_point(qmin, qmax, rng));

    Ok(QueryPlan { ranges, instants })
}

fn random_point(lo: Timestamp, hi: Timestamp, rng: &mut impl Rng) -> Timestamp {
    if lo >= hi {
        lo
    } else {
        rng.gen_range(lo..=hi)
    }
}

fn random_pair(lo: Timestamp, hi: Timestamp, rng: &mut impl Rng) -> (Timestamp, Timestamp) {
    let a = random_point(lo, hi, rng);
    let b = random_point(lo, hi, rng);
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}
