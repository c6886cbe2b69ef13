#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod args;

use args::Args;
use clap::Parser;
use rmcp::ServiceExt as _;
use sieve_config::Config;
use sieve_mcp::{RmcpConnector, Sieve};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = Config::load(&args.config)?;

    let _telemetry_guard = sieve_telemetry::init(config.telemetry.as_ref(), &args.log_level)?;

    tracing::info!(
        config_path = %args.config.display(),
        servers = config.mcp.servers.len(),
        oracle = %config.embeddings.oracle_id(),
        "starting sieve"
    );

    let embedder = sieve_embeddings::build_embedder(&config.embeddings);
    let sieve = Sieve::start(&config, &RmcpConnector, embedder).await?;

    let shutdown = CancellationToken::new();
    let shutdown_clone = shutdown.clone();

    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown_clone.cancel();
    });

    let served = match sieve.session().serve_with_ct(rmcp::transport::stdio(), shutdown).await {
        Ok(service) => service.waiting().await.map_err(anyhow::Error::from),
        Err(e) => Err(anyhow::anyhow!("client handshake failed: {e}")),
    };

    // upstreams are released whether or not the session ended cleanly
    sieve.shutdown().await;

    let reason = served?;
    tracing::info!(?reason, "sieve stopped");
    Ok(())
}

/// Wait for a shutdown signal (`SIGINT` or `SIGTERM`)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    tracing::info!("shutdown signal received");
}
