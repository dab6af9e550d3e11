use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use courier_config::{Config, LogFormat, LoggingConfig};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub mod context;
pub mod kafka;
pub mod metrics;
pub mod routes;
pub mod service;
pub mod shutdown;
pub mod store;

use context::AppContext;
use kafka::{MessageConsumer, MessageProducer};
use service::{MessageService, ServiceOptions};
use store::PostgresMessageStore;

/// Install the global tracing subscriber
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_new(&config.rust_log).unwrap_or_else(|e| {
        eprintln!("Invalid RUST_LOG '{}': {}, falling back to 'info'", config.rust_log, e);
        EnvFilter::new("info")
    });
    let registry = tracing_subscriber::registry().with(filter);

    match config.format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).try_init(),
    }
    .context("Failed to initialize tracing")
}

/// Build the HTTP application for a running service
pub fn app(service: Arc<MessageService>, config: Arc<Config>) -> Router {
    routes::create_router(Arc::new(AppContext::new(service, config)))
}

/// Serve `app` until `shutdown` is cancelled, then drain in-flight requests
/// for at most `drain_timeout`.
pub async fn serve(
    listener: TcpListener,
    app: Router,
    shutdown: CancellationToken,
    drain_timeout: Duration,
) -> Result<()> {
    let graceful = shutdown.clone().cancelled_owned();
    let mut server =
        tokio::spawn(async move { axum::serve(listener, app).with_graceful_shutdown(graceful).await });

    tokio::select! {
        _ = shutdown.cancelled() => {
            match tokio::time::timeout(drain_timeout, &mut server).await {
                Ok(joined) => joined.context("HTTP server task panicked")?.context("HTTP server failed")?,
                Err(_) => {
                    warn!(timeout_secs = drain_timeout.as_secs(), "In-flight requests did not finish in time, aborting");
                    server.abort();
                }
            }
        }
        joined = &mut server => {
            shutdown.cancel();
            joined.context("HTTP server task panicked")?.context("HTTP server failed")?;
        }
    }

    info!("HTTP server stopped");
    Ok(())
}

pub async fn run() -> Result<()> {
    let config = Arc::new(Config::from_env().context("Failed to load configuration")?);
    init_tracing(&config.logging)?;

    info!(
        service = %config.app_name,
        version = %config.app_version,
        "=== Courier Starting ==="
    );

    // Database
    info!("Connecting to database...");
    let db_pool = courier_db::create_pool(&config.db).await?;
    courier_db::run_migrations(&db_pool).await?;
    let store = Arc::new(PostgresMessageStore::new(db_pool.clone()));

    // Kafka
    let producer = Arc::new(
        MessageProducer::new(&config.kafka).context("Failed to create Kafka producer")?,
    );
    let consumer =
        MessageConsumer::new(&config.kafka).context("Failed to create Kafka consumer")?;
    info!(
        topic = %config.kafka.topic,
        payload_format = ?config.kafka.payload_format,
        "Kafka clients ready"
    );

    let (service, subscriber) = MessageService::start(
        store,
        producer,
        consumer,
        ServiceOptions {
            payload_format: config.kafka.payload_format,
            ..ServiceOptions::default()
        },
    );

    // Signals
    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            shutdown::shutdown_signal().await;
            shutdown.cancel();
        });
    }

    let listener = TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_address))?;
    info!("Courier listening on {}", config.bind_address);

    let drain_timeout = Duration::from_secs(config.shutdown_timeout_secs);
    let served = serve(
        listener,
        app(service.clone(), config.clone()),
        shutdown,
        drain_timeout,
    )
    .await;
    if let Err(e) = &served {
        error!(error = ?e, "HTTP server error");
    }

    info!("Stopping subscriber...");
    if let Err(e) = subscriber.shutdown().await {
        error!(error = %e, "Subscriber did not stop cleanly");
    }

    if let Err(e) = service.flush(drain_timeout).await {
        error!(error = %e, "Failed to flush Kafka producer on shutdown");
    }

    db_pool.close().await;
    info!("=== Courier Stopped ===");

    served
}
