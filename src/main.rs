//! Hearth notification server
//!
//! Wires the notification store, channel dispatcher, notification service
//! and email delivery worker together and runs until Ctrl+C / SIGTERM.

use std::sync::Arc;

use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use hearth_core::config::AppConfig;
use hearth_core::error::AppError;
use hearth_database::{
    DatabasePool, MemoryNotificationStore, MemoryRecipientDirectory, NotificationRepository,
    NotificationStore, RecipientDirectory, RecipientRepository,
};
use hearth_dispatch::ChannelDispatcher;
use hearth_entity::DeliveryChannel;
use hearth_service::{NotificationService, delivery_intake};
use hearth_worker::EmailDeliveryWorker;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from `config/` and `HEARTH__*` variables
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("HEARTH_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing; `RUST_LOG` overrides the configured level
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Open the configured stores
async fn open_stores(
    config: &AppConfig,
) -> Result<(Arc<dyn NotificationStore>, Arc<dyn RecipientDirectory>, Option<DatabasePool>), AppError>
{
    if config.database.is_memory() {
        tracing::warn!("Using the in-memory store, notifications are lost on exit");
        return Ok((
            Arc::new(MemoryNotificationStore::new()),
            Arc::new(MemoryRecipientDirectory::new()),
            None,
        ));
    }

    let db = DatabasePool::connect(&config.database).await?;
    if config.database.run_migrations {
        hearth_database::migration::run_migrations(db.pool()).await?;
    }

    Ok((
        Arc::new(NotificationRepository::new(db.pool().clone())),
        Arc::new(RecipientRepository::new(db.pool().clone())),
        Some(db),
    ))
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Hearth notifications v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Stores ───────────────────────────────────────────
    let (store, recipients, db) = open_stores(&config).await?;

    // ── Step 2: Channel senders ──────────────────────────────────
    let dispatcher = Arc::new(ChannelDispatcher::from_config(&config.channels)?);

    // ── Step 3: Intake queue and service ─────────────────────────
    let (intake, intake_rx) = delivery_intake();
    let service = Arc::new(NotificationService::new(
        store,
        Arc::clone(&recipients),
        Arc::clone(&dispatcher),
        intake,
    ));

    // ── Step 4: Email delivery worker ────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let email_sender = dispatcher.sender_for(DeliveryChannel::Email);

    let worker_handle = match (config.worker.enabled, email_sender) {
        (true, Some(email)) => {
            let worker = EmailDeliveryWorker::new(
                Arc::clone(&service),
                recipients,
                email,
                intake_rx,
                config.worker.clone(),
            );
            tracing::info!("Email delivery worker started");
            Some(tokio::spawn(worker.run(shutdown_rx)))
        }
        (true, None) => {
            tracing::warn!("Email channel is not configured, email delivery worker disabled");
            None
        }
        (false, _) => {
            tracing::info!("Email delivery worker disabled");
            None
        }
    };

    // ── Step 5: Graceful shutdown ────────────────────────────────
    shutdown_signal().await;
    tracing::info!("Shutdown signal received, starting graceful shutdown...");
    let _ = shutdown_tx.send(true);

    if let Some(handle) = worker_handle {
        match tokio::time::timeout(config.worker.shutdown_grace(), handle).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!("Email delivery worker panicked: {}", e),
            Err(_) => tracing::warn!(
                "Email delivery worker did not stop within {}s",
                config.worker.shutdown_grace_seconds
            ),
        }
    }

    drop(service);
    if let Some(db) = db {
        db.close().await;
    }

    tracing::info!("Hearth shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
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
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
