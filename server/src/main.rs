//! SeatGrid HTTP server binary.
//!
//! Wires configuration, the Postgres seat store, the Redis lock store and
//! admission cache, the configured commit strategy, the reconciler background
//! task and the metrics exporter, then serves until SIGTERM/Ctrl-C.

use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use seatgrid_core::admission::{AdmissionCache, DisabledAdmissionCache};
use seatgrid_core::clock::{Clock, SystemClock};
use seatgrid_core::coordinator::BookingCoordinator;
use seatgrid_core::initializer::EventInitializer;
use seatgrid_core::lock_store::LockStore;
use seatgrid_core::reconciler::Reconciler;
use seatgrid_core::seat_store::SeatStore;
use seatgrid_core::strategy::StrategyKind;
use seatgrid_postgres::{build_strategy, PostgresSeatStore};
use seatgrid_redis::{RedisAdmissionCache, RedisLockStore};
use seatgrid_server::instrument::{InstrumentedAdmissionCache, InstrumentedLockStore};
use seatgrid_server::server::routes::build_router;
use seatgrid_server::server::state::AppState;
use seatgrid_server::sweeper::spawn_reconciler;
use seatgrid_server::Config;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "seatgrid=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting SeatGrid server");

    // Load configuration
    let config = Config::from_env();
    info!(
        seatstore_url = %config.seat_store.url,
        lockstore_url = %config.lock_store.url,
        strategy = %config.booking.strategy,
        admission_cache = config.admission_cache.enabled,
        "Configuration loaded"
    );

    // Install the Prometheus recorder and expose it on the metrics port
    let prometheus_handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Suffix("duration_seconds".to_string()),
            &[
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ],
        )?
        .install_recorder()?;
    seatgrid_server::metrics::register_metrics();

    let metrics_addr = format!("{}:{}", config.server.metrics_host, config.server.metrics_port);
    let metrics_listener = tokio::net::TcpListener::bind(&metrics_addr).await?;
    let metrics_app = axum::Router::new().route(
        "/metrics",
        axum::routing::get(move || {
            let handle = prometheus_handle.clone();
            async move { handle.render() }
        }),
    );
    tokio::spawn(async move {
        if let Err(err) = axum::serve(metrics_listener, metrics_app).await {
            error!(error = %err, "Metrics server failed");
        }
    });
    info!(address = %metrics_addr, "Metrics server started");

    // Seat store (PostgreSQL)
    info!("Connecting to seat store...");
    let pool = PgPoolOptions::new()
        .max_connections(config.seat_store.max_connections)
        .min_connections(config.seat_store.min_connections)
        .acquire_timeout(Duration::from_secs(config.seat_store.connect_timeout))
        .idle_timeout(Some(Duration::from_secs(config.seat_store.idle_timeout)))
        .connect(&config.seat_store.url)
        .await?;
    let postgres_store = PostgresSeatStore::from_pool(pool.clone());
    postgres_store.run_migrations().await?;
    let seat_store: Arc<dyn SeatStore> = Arc::new(postgres_store);
    info!("Seat store connected");

    // Lock store and admission cache (Redis), behind their metric decorators
    info!("Connecting to lock store...");
    let redis_conn = seatgrid_redis::connect(&config.lock_store.url).await?;
    let lock_store: Arc<dyn LockStore> = Arc::new(InstrumentedLockStore::new(Arc::new(
        RedisLockStore::new(redis_conn.clone(), config.lock_ttl()),
    )));
    let admission: Arc<dyn AdmissionCache> = if config.admission_cache.enabled {
        Arc::new(InstrumentedAdmissionCache::new(Arc::new(
            RedisAdmissionCache::new(redis_conn, config.lock_ttl()),
        )))
    } else {
        info!("Admission cache disabled, fast path off");
        Arc::new(DisabledAdmissionCache)
    };
    info!("Lock store connected");

    // Commit strategy
    let kind = StrategyKind::parse_or_default(&config.booking.strategy);
    let strategy = build_strategy(kind, pool);
    info!(strategy = %kind, "Commit strategy configured");

    // Booking pipeline
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let coordinator = Arc::new(BookingCoordinator::new(
        Arc::clone(&lock_store),
        Arc::clone(&admission),
        strategy,
        Arc::clone(&clock),
    ));
    let initializer = Arc::new(EventInitializer::new(
        Arc::clone(&seat_store),
        Arc::clone(&admission),
    ));

    // Reconciler background task
    let reconciler = Arc::new(Reconciler::new(
        Arc::clone(&seat_store),
        Arc::clone(&lock_store),
        clock,
        config.stale_threshold(),
    ));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper = spawn_reconciler(reconciler, config.sweep_interval(), shutdown_rx);

    // HTTP server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(seat_store, lock_store, coordinator, initializer);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Stop the reconciler before exiting
    let _ = shutdown_tx.send(true);
    let _ = sweeper.await;

    info!("Server stopped");
    Ok(())
}

/// Graceful shutdown signal handler: Ctrl+C (SIGINT) or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}
