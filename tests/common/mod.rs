//! Shared test fixtures for integration tests.
//!
//! `FakeRemoteClient` is the in-memory `RemoteClient` every scenario test
//! scripts against — no real network, every outcome deterministic. It mirrors
//! the queue-and-record shape of the teacher's `MockCoordinator` in
//! `tests/mock_coordinator.rs`: push expected responses, drive the code under
//! test, then assert on what was recorded.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use seriesprobe::client::RemoteClient;
use seriesprobe::error::ProbeError;
use seriesprobe::types::{Series, Timestamp};

#[derive(Default)]
pub struct FakeRemoteClient {
    /// Status codes returned by successive `write_series` calls. Once
    /// drained, every further call returns 200.
    pub write_statuses: Mutex<VecDeque<u16>>,
    pub written: Mutex<Vec<Series>>,
    /// Responses returned by successive `query_range` calls, in call order —
    /// for tests that need to script exactly what each chunk sees (e.g. the
    /// `Init` recovery walk). Once drained, falls back to `fixed_response`.
    pub range_queue: Mutex<VecDeque<Vec<(Timestamp, f64)>>>,
    /// Returned by any `query`/`query_range` call once `range_queue` is
    /// empty. `None` means "no samples".
    pub fixed_response: Mutex<Option<Vec<(Timestamp, f64)>>>,
    /// When set, every query call fails with a transport error instead of
    /// returning data.
    pub query_fails: Mutex<bool>,
    pub range_calls: Mutex<Vec<(Timestamp, Timestamp)>>,
    pub instant_calls: Mutex<Vec<Timestamp>>,
}

impl FakeRemoteClient {
    pub fn with_write_statuses(statuses: impl IntoIterator<Item = u16>) -> Self {
        Self {
            write_statuses: Mutex::new(statuses.into_iter().collect()),
            ..Default::default()
        }
    }

    pub fn with_fixed_response(samples: Vec<(Timestamp, f64)>) -> Self {
        Self {
            fixed_response: Mutex::new(Some(samples)),
            ..Default::default()
        }
    }

    pub fn with_chunks(chunks: impl IntoIterator<Item = Vec<(Timestamp, f64)>>) -> Self {
        Self {
            range_queue: Mutex::new(chunks.into_iter().collect()),
            ..Default::default()
        }
    }

    pub fn written_timestamps(&self) -> Vec<Timestamp> {
        self.written.lock().unwrap().iter().map(|s| s.timestamp).collect()
    }
}

#[async_trait]
impl RemoteClient for FakeRemoteClient {
    async fn write_series(&self, _ctx: &CancellationToken, series: &[Series]) -> Result<u16, ProbeError> {
        self.written.lock().unwrap().extend_from_slice(series);
        let status = self.write_statuses.lock().unwrap().pop_front().unwrap_or(200);
        Ok(status)
    }

    async fn query(&self, _ctx: &CancellationToken, _query: &str, at: Timestamp) -> Result<Vec<(Timestamp, f64)>, ProbeError> {
        self.instant_calls.lock().unwrap().push(at);
        if *self.query_fails.lock().unwrap() {
            return Err(ProbeError::QueryTransport(anyhow::anyhow!("fake query failure")));
        }
        Ok(self.fixed_response.lock().unwrap().clone().unwrap_or_default())
    }

    async fn query_range(
        &self,
        _ctx: &CancellationToken,
        _query: &str,
        start: Timestamp,
        end: Timestamp,
        _step: Timestamp,
    ) -> Result<Vec<(Timestamp, f64)>, ProbeError> {
        self.range_calls.lock().unwrap().push((start, end));
        if *self.query_fails.lock().unwrap() {
            return Err(ProbeError::QueryTransport(anyhow::anyhow!("fake query failure")));
        }
        if let Some(chunk) = self.range_queue.lock().unwrap().pop_front() {
            return Ok(chunk);
        }
        Ok(self.fixed_response.lock().unwrap().clone().unwrap_or_default())
    }
}
