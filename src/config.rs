//! # Configuration — CLI Flags and Environment Variables
//!
//! Every tunable in `spec.md` §6's "Configuration surface" lives here as a
//! `clap`-derived field, settable by flag or by environment variable
//! (`--num-series` / `NUM_SERIES`), the same split the teacher's `main.rs`
//! uses for `--database-url` / `DATABASE_URL`.

use std::time::Duration;

use clap::Parser;

/// One hour, in seconds. `MaxQueryAge` must be at least this.
pub const MIN_MAX_QUERY_AGE_SECS: i64 = 3600;

/// The canonical write interval the spec calls out by name.
pub const DEFAULT_WRITE_INTERVAL_SECS: i64 = 20;

#[derive(Parser, Debug, Clone)]
#[command(name = "seriesprobe", about = "Continuous correctness prober for a Prometheus-compatible TSDB")]
pub struct Config {
    /// Number of parallel series written per metric family.
    #[arg(long, env = "NUM_SERIES", default_value_t = 2)]
    pub num_series: u32,

    /// Enable the sine-wave float-sample metric family.
    #[arg(long, env = "WITH_SAMPLES", default_value_t = true)]
    pub with_samples: bool,

    /// Enable the four histogram-variant metric families.
    #[arg(long, env = "WITH_HISTOGRAMS", default_value_t = true)]
    pub with_histograms: bool,

    /// How far back `Init` is allowed to walk when recovering history, in seconds.
    #[arg(long, env = "MAX_QUERY_AGE_SECS", default_value_t = 72 * 3600)]
    pub max_query_age_secs: i64,

    /// Write interval, in seconds. All written/queried timestamps align to this.
    #[arg(long, env = "WRITE_INTERVAL_SECS", default_value_t = DEFAULT_WRITE_INTERVAL_SECS)]
    pub write_interval_secs: i64,

    /// Base URL the write endpoint is reachable at (e.g. `http://localhost:9009`).
    #[arg(long, env = "WRITE_ENDPOINT")]
    pub write_endpoint: String,

    /// Base URL the PromQL query API is reachable at.
    #[arg(long, env = "QUERY_ENDPOINT")]
    pub query_endpoint: String,

    /// Port the `/metrics` exposition server listens on.
    #[arg(long, env = "METRICS_PORT", default_value_t = 9900)]
    pub metrics_port: u16,

    /// Request timeout for every write/query call.
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,
}

impl Config {
    /// Validate cross-field constraints `clap` can't express on its own.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_query_age_secs < MIN_MAX_QUERY_AGE_SECS {
            anyhow::bail!(
                "max-query-age-secs must be at least {MIN_MAX_QUERY_AGE_SECS} (1h), got {}",
                self.max_query_age_secs
            );
        }
        if self.write_interval_secs <= 0 {
            anyhow::bail!("write-interval-secs must be positive, got {}", self.write_interval_secs);
        }
        if self.num_series == 0 {
            anyhow::bail!("num-series must be >= 1");
        }
        if !self.with_samples && !self.with_histograms {
            anyhow::bail!("at least one of --with-samples / --with-histograms must be enabled");
        }
        url::Url::parse(&self.write_endpoint).map_err(|e| anyhow::anyhow!("write-endpoint is not a valid URL: {e}"))?;
        url::Url::parse(&self.query_endpoint).map_err(|e| anyhow::anyhow!("query-endpoint is not a valid URL: {e}"))?;
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
