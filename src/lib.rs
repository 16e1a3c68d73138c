//! # seriesprobe — Continuous Correctness Prober
//!
//! Periodically writes synthetic time series with known, mathematically
//! generated values to a Prometheus-compatible remote, then queries them
//! back and compares. The prober is never authoritative about truth — it
//! *generates* truth and checks that the system under test preserves it.
//!
//! ## Module Organization
//!
//! - [`generators`] — deterministic value/series generators (sine-wave
//!   samples, classic and native histogram variants).
//! - [`history`] — [`history::MetricHistory`], the per-metric recovered state.
//! - [`planner`] — time-range planning for the query phase.
//! - [`init`] — the 24h-chunked recovery engine that rebuilds history by
//!   querying the remote on startup.
//! - [`runner`] — the per-tick write-then-query-and-compare loop.
//! - [`client`] — the [`client::RemoteClient`] trait and its `reqwest`-based
//!   implementation.
//! - [`prober`] — [`prober::Prober`], the object a scheduler drives.
//! - [`metrics`] — Prometheus exposition of the prober's own counters.
//! - [`config`] — CLI/env configuration surface.
//! - [`error`] — discriminated failure kinds ([`error::ProbeError`],
//!   [`error::PlannerError`]).
//!
//! ## Control Flow
//!
//! A scheduler (external to this crate) invokes [`prober::Prober::run`]
//! periodically. Before the first `run`, it must call
//! [`prober::Prober::init`] exactly once.

pub mod client;
pub mod config;
pub mod error;
pub mod generators;
pub mod history;
pub mod init;
pub mod metrics;
pub mod planner;
pub mod prober;
pub mod runner;
pub mod types;
