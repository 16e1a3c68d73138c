//! # seriesprobe — Binary Entry Point
//!
//! Parses [`Config`], wires up structured logging, constructs a
//! [`Prober`] against a `reqwest`-based [`HttpRemoteClient`], recovers
//! history with one [`Prober::init`] call, then drives [`Prober::run`]
//! on a fixed `tokio::time::interval` while serving `/metrics` over a small
//! `axum` router.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::routing::get;
use axum::{extract::State, Router};
use clap::Parser;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use seriesprobe::client::HttpRemoteClient;
use seriesprobe::config::Config;
use seriesprobe::metrics::Metrics;
use seriesprobe::prober::Prober;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    if log_format == "json" {
        tracing_subscriber::fmt().json().with_target(false).init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }

    let config = Config::parse();
    config.validate()?;

    let http = reqwest::Client::builder().timeout(config.request_timeout()).build()?;
    let remote_client = Arc::new(HttpRemoteClient::new(http, &config.write_endpoint, &config.query_endpoint));
    let metrics = Arc::new(Metrics::new());

    let mut prober = Prober::new(&config, remote_client, metrics.clone());
    let ctx = CancellationToken::new();

    let now = now_unix();
    info!(now, num_series = config.num_series, "seriesprobe starting, recovering history");
    prober.init(&ctx, now).await?;

    let metrics_server = tokio::spawn(serve_metrics(metrics, config.metrics_port));

    let mut ticker = tokio::time::interval(Duration::from_secs(config.write_interval_secs as u64));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let now = now_unix();
                if let Err(e) = prober.run(&ctx, now).await {
                    error!(error = %e, "run: tick completed with failures");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received");
                ctx.cancel();
                break;
            }
        }
    }

    metrics_server.abort();
    Ok(())
}

fn now_unix() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system clock is before the epoch")
        .as_secs() as i64
}

async fn serve_metrics(metrics: Arc<Metrics>, port: u16) {
    let app = Router::new()
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(metrics);
    let addr = format!("0.0.0.0:{port}");
    match TcpListener::bind(&addr).await {
        Ok(listener) => {
            info!(addr, "metrics server listening");
            if let Err(e) = axum::serve(listener, app).await {
                error!(error = %e, "metrics server exited");
            }
        }
        Err(e) => error!(error = %e, addr, "failed to bind metrics server"),
    }
}

async fn metrics_handler(State(metrics): State<Arc<Metrics>>) -> String {
    metrics.encode()
}
