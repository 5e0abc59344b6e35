//! Beacon - Entry Point
//!
//! Starts the HTTP server and the pub/sub → WebSocket pump with graceful
//! shutdown support.

use clap::Parser;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use beacon::api::handlers::health::VERSION;
use beacon::api::{ApiServer, AppState};
use beacon::config::{Config, LogConfig};
use beacon::realtime::{Broadcaster, ConnectionRegistry, UpstreamSubscriber};
use beacon::{Metrics, StoreHandle};

/// Demo HTTP service with Redis pub/sub to WebSocket fan-out.
#[derive(Parser, Debug)]
#[command(name = "beacon", about = "Beacon demo server", disable_version_flag = true)]
struct Cli {
    /// Show version and exit.
    #[arg(long)]
    version: bool,

    /// Port to use (overrides PORT).
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if cli.version {
        println!("Version: {}", VERSION);
        return Ok(());
    }

    // Load configuration
    let mut config = Config::from_env()?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    init_tracing(&config.log);
    info!("Starting Beacon {}", VERSION);

    let metrics = Metrics::new()?;

    // Connect to Redis once up front; failure leaves the store in degraded mode.
    let store = StoreHandle::redis(config.redis_url()?);
    if store.get().await.is_none() {
        info!("Running without Redis: lookups return the default value, no push notifications");
    }

    let registry = ConnectionRegistry::new().with_gauge(metrics.ws_connections.clone());
    let broadcaster = Broadcaster::new(registry.clone(), config.push.write_timeout)
        .with_metrics(metrics.clone());

    // Create shutdown channel
    let (shutdown_tx, _) = watch::channel(false);

    // Start upstream subscriber
    let subscriber = UpstreamSubscriber::new(
        store.clone(),
        config.redis.channel.clone(),
        broadcaster,
    );
    let subscriber_shutdown = shutdown_tx.subscribe();
    let subscriber_task = tokio::spawn(async move {
        let relayed = subscriber.run(subscriber_shutdown).await;
        info!("Upstream subscriber stopped after relaying {} messages", relayed);
    });

    // Start HTTP server; a bind failure is fatal
    let server = ApiServer::new(AppState::new(config.clone(), store, registry, metrics));
    let listener = server.bind()?;
    let server_shutdown = shutdown_tx.subscribe();
    let server_task = tokio::spawn(async move {
        if let Err(e) = server.serve(listener, server_shutdown).await {
            error!("HTTP server error: {}", e);
        }
    });

    info!("Server started on {}", config.server_addr());

    // Wait for shutdown signal
    shutdown_signal().await;
    info!("Shutdown signal received");

    let _ = shutdown_tx.send(true);
    let _ = tokio::join!(server_task, subscriber_task);

    info!("Beacon stopped");
    Ok(())
}

/// Install the global tracing subscriber; `RUST_LOG` overrides `LOG_LEVEL`
fn init_tracing(log: &LogConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("beacon={},tower_http=info", log.level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if log.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
