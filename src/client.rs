//! # Remote Client Capability
//!
//! A pluggable capability exposing write / instant-query / range-query, per
//! `spec.md` §6. The core planner, recovery engine, and run loop depend only
//! on the [`RemoteClient`] trait; [`HttpRemoteClient`] is this crate's one
//! concrete implementation, a `reqwest`-based client talking to a
//! Prometheus-compatible write endpoint and the standard `/api/v1/query` and
//! `/api/v1/query_range` PromQL HTTP API — built the way the teacher builds
//! its HTTP coordination clients (`worker_client.rs`), adapted to `reqwest`
//! and `async` because this crate's core is I/O-bound throughout rather than
//! CPU-bound.
//!
//! Both query methods already receive an aggregate (`query_sum()`) query, so
//! unlike the raw Prometheus HTTP API — which can return an arbitrary
//! label-partitioned vector/matrix — the result here collapses to a single
//! flat time series. Implementations are free to sum across whatever the
//! remote returns if it doesn't collapse on its own.

use async_trait::async_trait;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::error::ProbeError;
use crate::types::{Series, Timestamp, Value};

/// Write / instant-query / range-query against a Prometheus-compatible remote.
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// Write a batch of series. Returns the HTTP-style status code the
    /// caller uses to classify the outcome (2xx / 4xx / 5xx).
    async fn write_series(&self, ctx: &CancellationToken, series: &[Series]) -> Result<u16, ProbeError>;

    /// Instant query at a single point in time.
    async fn query(&self, ctx: &CancellationToken, query: &str, at: Timestamp) -> Result<Vec<(Timestamp, f64)>, ProbeError>;

    /// Range query over `[start, end]` at `step` resolution.
    async fn query_range(
        &self,
        ctx: &CancellationToken,
        query: &str,
        start: Timestamp,
        end: Timestamp,
        step: Timestamp,
    ) -> Result<Vec<(Timestamp, f64)>, ProbeError>;
}

/// `reqwest`-based [`RemoteClient`].
pub struct HttpRemoteClient {
    http: reqwest::Client,
    write_endpoint: String,
    query_endpoint: String,
}

impl HttpRemoteClient {
    pub fn new(http: reqwest::Client, write_endpoint: impl Into<String>, query_endpoint: impl Into<String>) -> Self {
        Self {
            http,
            write_endpoint: write_endpoint.into(),
            query_endpoint: query_endpoint.into(),
        }
    }
}

#[derive(serde::Serialize)]
struct WritePoint<'a> {
    metric_name: &'a str,
    labels: &'a [(String, String)],
    timestamp: Timestamp,
    #[serde(flatten)]
    value: WireValue,
}

#[derive(serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum WireValue {
    Sample { value: f64 },
    ClassicHistogram { buckets: Vec<(f64, u64)>, sum: f64, count: u64 },
    NativeHistogram { sum: f64, count: u64 },
}

impl From<&Value> for WireValue {
    fn from(v: &Value) -> Self {
        match v {
            Value::Sample(x) => WireValue::Sample { value: *x },
            Value::ClassicHistogram { buckets, sum, count } => WireValue::ClassicHistogram {
                buckets: buckets.clone(),
                sum: *sum,
                count: *count,
            },
            Value::NativeHistogram { sum, count } => WireValue::NativeHistogram { sum: *sum, count: *count },
        }
    }
}

#[derive(Deserialize)]
struct PromResponse {
    status: String,
    data: Option<PromData>,
    error: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromData {
    result_type: String,
    result: Vec<PromSeries>,
}

#[derive(Deserialize)]
struct PromSeries {
    /// Instant query: `[ts, "value"]`. Range query: absent.
    value: Option<(f64, String)>,
    /// Range query: `[[ts, "value"], ...]`. Instant query: absent.
    values: Option<Vec<(f64, String)>>,
}

fn parse_sample(pair: &(f64, String)) -> Result<(Timestamp, f64), ProbeError> {
    let value: f64 = pair.1.parse().map_err(|e| {
        ProbeError::QueryTransport(anyhow::anyhow!("non-numeric sample value {:?}: {e}", pair.1))
    })?;
    Ok((pair.0.round() as Timestamp, value))
}

#[async_trait]
impl RemoteClient for HttpRemoteClient {
    async fn write_series(&self, ctx: &CancellationToken, series: &[Series]) -> Result<u16, ProbeError> {
        let points: Vec<WritePoint> = series
            .iter()
            .map(|s| WritePoint {
                metric_name: &s.metric_name,
                labels: &s.labels,
                timestamp: s.timestamp,
                value: WireValue::from(&s.value),
            })
            .collect();

        let url = format!("{}/api/v1/push", self.write_endpoint.trim_end_matches('/'));
        let send = self.http.post(&url).json(&points).send();

        let resp = tokio::select! {
            r = send => r.map_err(|e| ProbeError::WriteTransport(e.into()))?,
            _ = ctx.cancelled() => return Err(ProbeError::WriteTransport(anyhow::anyhow!("write cancelled"))),
        };

        Ok(resp.status().as_u16())
    }

    async fn query(&self, ctx: &CancellationToken, query: &str, at: Timestamp) -> Result<Vec<(Timestamp, f64)>, ProbeError> {
        let url = format!("{}/api/v1/query", self.query_endpoint.trim_end_matches('/'));
        let send = self
            .http
            .get(&url)
            .query(&[("query", query), ("time", &at.to_string())])
            .send();

        let resp = tokio::select! {
            r = send => r.map_err(|e| ProbeError::QueryTransport(e.into()))?,
            _ = ctx.cancelled() => return Err(ProbeError::QueryTransport(anyhow::anyhow!("query cancelled"))),
        };

        decode_prom_response(resp).await
    }

    async fn query_range(
        &self,
        ctx: &CancellationToken,
        query: &str,
        start: Timestamp,
        end: Timestamp,
        step: Timestamp,
    ) -> Result<Vec<(Timestamp, f64)>, ProbeError> {
        let url = format!("{}/api/v1/query_range", self.query_endpoint.trim_end_matches('/'));
        let send = self
            .http
            .get(&url)
            .query(&[
                ("query", query.to_string()),
                ("start", start.to_string()),
                ("end", end.to_string()),
                ("step", step.to_string()),
            ])
            .send();

        let resp = tokio::select! {
            r = send => r.map_err(|e| ProbeError::QueryTransport(e.into()))?,
            _ = ctx.cancelled() => return Err(ProbeError::QueryTransport(anyhow::anyhow!("query_range cancelled"))),
        };

        decode_prom_response(resp).await
    }
}

async fn decode_prom_response(resp: reqwest::Response) -> Result<Vec<(Timestamp, f64)>, ProbeError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ProbeError::QueryTransport(anyhow::anyhow!(
            "query endpoint returned {status}: {body}"
        )));
    }

    let body: PromResponse = resp
        .json()
        .await
        .map_err(|e| ProbeError::QueryTransport(e.into()))?;

    if body.status != "success" {
        return Err(ProbeError::QueryTransport(anyhow::anyhow!(
            "query failed: {}",
            body.error.unwrap_or_else(|| "unknown error".to_string())
        )));
    }

    let data = body
        .data
        .ok_or_else(|| ProbeError::QueryTransport(anyhow::anyhow!("success response missing data")))?;

    let mut points = Vec::new();
    for series in data.result {
        match data.result_type.as_str() {
            "vector" => {
                if let Some(pair) = &series.value {
                    points.push(parse_sample(pair)?);
                }
            }
            "matrix" => {
                for pair in series.values.unwrap_or_default() {
                    points.push(parse_sample(&pair)?);
                }
            }
            other => {
                return Err(ProbeError::QueryTransport(anyhow::anyhow!(
                    "unexpected resultType {other}"
                )))
            }
        }
    }
    points.sort_by_key(|(t, _)| *t);
    Ok(points)
}
