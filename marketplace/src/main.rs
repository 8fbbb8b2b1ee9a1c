//! Seatswap marketplace HTTP server.

use marketplace::config::Config;
use marketplace::metrics::register_market_metrics;
use marketplace::server::{AppState, build_router};
use metrics_exporter_prometheus::PrometheusBuilder;
use seatswap_chain::JsonRpcLedgerGateway;
use seatswap_core::clock::SystemClock;
use seatswap_postgres::PostgresRecordStore;
use seatswap_redpanda::RedpandaBidBus;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "marketplace=info,seatswap_postgres=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Seatswap marketplace server");

    let config = Config::from_env();
    info!(
        database_url = %config.database.url,
        redpanda_brokers = %config.redpanda.brokers,
        chain_rpc = %config.chain.rpc_url,
        "Configuration loaded"
    );

    // Metrics exporter
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], config.server.metrics_port))
        .install()?;
    register_market_metrics();

    // Record store
    info!("Connecting to record store...");
    let store = PostgresRecordStore::connect(&config.database.url, config.database.max_connections)
        .await?;
    store.ensure_schema().await?;
    info!("Record store connected");

    // Durable bid bus
    info!("Connecting to Redpanda...");
    let bus = RedpandaBidBus::builder()
        .brokers(&config.redpanda.brokers)
        .topic(&config.redpanda.topic)
        .producer_acks(&config.redpanda.acks)
        .build()?;
    info!("Durable bid bus connected");

    // Ledger gateway
    let ledger = JsonRpcLedgerGateway::builder()
        .endpoint(&config.chain.rpc_url)
        .poll_interval(Duration::from_millis(config.chain.poll_interval_ms))
        .confirmation_timeout(Duration::from_secs(config.chain.confirmation_timeout_secs))
        .build()?;
    info!(endpoint = %config.chain.rpc_url, "Ledger gateway configured");

    // Wire coordinators and router
    let state = AppState::new(
        Arc::new(store),
        Arc::new(ledger),
        Arc::new(bus),
        Arc::new(SystemClock),
    );
    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Graceful shutdown on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
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
        () = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        },
    }
}
