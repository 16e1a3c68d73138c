//! Error Types — Discriminated Failure Kinds for Writes, Queries, and Recovery
//!
//! The run loop and recovery engine need to tell apart failures that are
//! fatal-for-this-tick (a 5xx or transport error mid-write) from failures
//! that are merely counted (a 4xx rejection, a single bad comparison).
//! `ProbeError` carries that discrimination; callers that don't need to match
//! on it can fold it into `anyhow::Error` as usual.

use thiserror::Error;

/// Failure kinds surfaced by the write/query/compare pipeline.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Write request never reached the remote, or the remote never replied.
    #[error("write transport error: {0}")]
    WriteTransport(#[source] anyhow::Error),

    /// Remote rejected the write with a 5xx. Fatal for this tick's write phase.
    #[error("write failed with server error, status {status}")]
    Write5xx { status: u16 },

    /// Remote rejected the write with a 4xx. The payload is considered
    /// permanently rejected; the write cursor still advances past it.
    #[error("write rejected with client error, status {status}")]
    Write4xx { status: u16 },

    /// A query request never reached the remote, or the remote never replied.
    #[error("query transport error: {0}")]
    QueryTransport(#[source] anyhow::Error),

    /// A returned sample didn't match the value the generator predicts.
    #[error("result mismatch at t={timestamp}: expected {expected}, observed {observed}")]
    ResultMismatch {
        expected: f64,
        observed: f64,
        timestamp: i64,
    },

    /// A chunk query during `Init` failed. Never fatal to `Init` itself —
    /// the recovery loop stops and keeps whatever it accumulated.
    #[error("init recovery query failed: {0}")]
    InitQueryFailure(#[source] anyhow::Error),
}

impl ProbeError {
    /// `true` for write failures that must not advance `lastWrittenTimestamp`
    /// and must abort the rest of phase W.
    pub fn halts_write_phase(&self) -> bool {
        matches!(self, ProbeError::WriteTransport(_) | ProbeError::Write5xx { .. })
    }
}

/// Sentinel failures from the time-range planner. Neither is ever surfaced
/// as an error from `Run` — they just mean "skip phase Q this tick".
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PlannerError {
    #[error("no history to query against")]
    NoHistory,
    #[error("history is older than the max query age")]
    HistoryStale,
}
