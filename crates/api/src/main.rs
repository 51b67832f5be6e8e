use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use cadence_automation::{AutomationStore, EngineConfig, EventWorker, PgStore, TriggerCoordinator};
use cadence_events::EventQueue;
use cadence_messaging::{DryRunGateway, MessagingGateway, WhatsAppConfig, WhatsAppGateway};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cadence_api::background::sweep_scheduler;
use cadence_api::config::ServerConfig;
use cadence_api::router::build_app_router;
use cadence_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "cadence_api=debug,cadence_automation=debug,tower_http=debug".into()
    });
    let registry = tracing_subscriber::registry().with(filter);
    if std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")) {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    // --- Configuration ---
    let config = ServerConfig::from_env();
    let engine_config = EngineConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        sweep_concurrency = engine_config.sweep_concurrency,
        scheduler_enabled = config.scheduler.enabled,
        "Loaded server configuration",
    );

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = cadence_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    cadence_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    cadence_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Messaging gateway ---
    let gateway: Arc<dyn MessagingGateway> = match WhatsAppConfig::from_env() {
        Some(whatsapp) => Arc::new(
            WhatsAppGateway::new(whatsapp).expect("Failed to build WhatsApp gateway"),
        ),
        None => {
            tracing::warn!("WhatsApp credentials not set, messages will only be logged");
            Arc::new(DryRunGateway)
        }
    };

    // --- Automation engine ---
    let store: Arc<dyn AutomationStore> = Arc::new(PgStore::new(pool.clone()));
    let engine = Arc::new(TriggerCoordinator::new(
        Arc::clone(&store),
        gateway,
        engine_config,
    ));

    let (queue, receiver) = EventQueue::new(config.queue_capacity);
    let worker_cancel = CancellationToken::new();
    let worker_handle = tokio::spawn(
        EventWorker::new(Arc::clone(&engine)).run(receiver, worker_cancel.clone()),
    );

    let scheduler_cancel = CancellationToken::new();
    let scheduler_handle = config.scheduler.enabled.then(|| {
        tokio::spawn(sweep_scheduler::run(
            Arc::clone(&engine),
            Duration::from_secs(config.scheduler.interval_secs),
            scheduler_cancel.clone(),
        ))
    });

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        store,
        engine,
        queue,
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");
    let grace = Duration::from_secs(config.shutdown_timeout_secs);

    scheduler_cancel.cancel();
    if let Some(handle) = scheduler_handle {
        if tokio::time::timeout(grace, handle).await.is_err() {
            tracing::warn!("Sweep scheduler did not stop in time");
        }
    }

    // The worker stops taking new events and drains what is buffered.
    worker_cancel.cancel();
    if tokio::time::timeout(grace, worker_handle).await.is_err() {
        tracing::warn!("Automation worker did not drain in time");
    }

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
