//! OVO energy Prometheus exporter
//!
//! Continuously logs in to the OVO energy web API, fetches the latest gas
//! and electricity readings for the account's supply points and republishes
//! them as gauges for Prometheus to scrape on `:8080/metrics`.
//!
//! One background task drives the scan loop; the axum listener only reads
//! gauge values. Startup/config errors are fatal, everything the upstream
//! API throws at us at runtime is logged and retried.

mod config;
mod error;
mod metrics;
mod ovo;
mod scanner;

use anyhow::Context;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use clap::Parser;
use prometheus::Registry;
use std::future::IntoFuture;
use std::sync::Arc;
use tokio::signal::ctrl_c;
use tokio::signal::unix::{signal, SignalKind};

const LISTEN_ADDR: &str = "0.0.0.0:8080";

#[tokio::main]
async fn main() {
    let cli = config::Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(cli.log_level())
        .init();

    if let Err(err) = run(cli).await {
        tracing::error!("failed: {}", err);
        std::process::exit(1);
    }
}

async fn run(cli: config::Cli) -> error::Result<()> {
    // Flag validation happens before any network activity.
    let interval = cli.interval()?;

    tracing::info!(config = %cli.config.display(), "loading config");
    let account = config::load_account_config(&cli.config)?;

    let client = ovo::OvoClient::new(account, ovo::Endpoints::default())?;
    let scanner = scanner::Scanner::new(client);
    let registry = scanner.registry();

    let scan_task = tokio::spawn(scanner::run(scanner, interval));

    let app = Router::new()
        .route("/metrics", get(serve_metrics))
        .with_state(registry);
    let listener = tokio::net::TcpListener::bind(LISTEN_ADDR)
        .await
        .context("failed to bind metrics listener")?;
    tracing::info!(address = LISTEN_ADDR, interval = ?interval, "starting server");

    let mut sig_term =
        signal(SignalKind::terminate()).context("failed to register SIGTERM handler")?;
    tokio::select! {
        _ = sig_term.recv() => {
            tracing::info!("Received SIGTERM. Exiting...");
        }
        _ = ctrl_c() => {
            tracing::info!("Received SIGINT. Exiting...");
        }
        result = axum::serve(listener, app).into_future() => {
            result.context("metrics server exited")?;
        }
        // The scan loop never returns; reaching this arm means it panicked.
        result = scan_task => {
            if let Err(e) = result {
                tracing::error!("scan task failed: {:?}", e);
            }
        }
    }
    Ok(())
}

async fn serve_metrics(State(registry): State<Arc<Registry>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics::render(&registry),
    )
}
