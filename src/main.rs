//! FileStore Server: multi-tenant file storage with an audit trail.
//!
//! Main entry point that wires all crates together and starts the server.

use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use filestore_api::AppState;
use filestore_auth::{Authenticator, TokenService};
use filestore_core::config::AppConfig;
use filestore_core::error::AppError;
use filestore_core::offload::PersistencePool;
use filestore_core::traits::storage::ObjectStore;
use filestore_database::DatabasePool;
use filestore_database::repositories::event::EventRepository;
use filestore_database::repositories::file::FileRepository;
use filestore_database::repositories::user::UserRepository;
use filestore_service::{AdminUserService, EventLedger, FileRegistry, StorageTimeouts, UserService};
use filestore_storage::LocalObjectStore;

#[tokio::main]
async fn main() {
    let env = std::env::var("FILESTORE_ENV").unwrap_or_else(|_| "development".to_string());
    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);
    tracing::info!(env = %env, "Configuration loaded");

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, source = ?e.source, "Server error");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
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

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting FileStore v{}", env!("CARGO_PKG_VERSION"));

    if config.auth.uses_development_secret() {
        tracing::warn!("Using the built-in development JWT secret; set auth.jwt_secret in production");
    }

    // ── Step 1: Persistence runtime ──────────────────────────────
    let pool = PersistencePool::dedicated(
        config.persistence.worker_threads,
        config.persistence.max_in_flight,
    )?;

    // ── Step 2: Database connection + migrations ─────────────────
    let db_config = config.database.clone();
    let db = pool
        .run(async move {
            let db = DatabasePool::connect(&db_config).await?;
            if db_config.run_migrations {
                filestore_database::migration::run_migrations(db.pool()).await?;
            }
            Ok(db)
        })
        .await?;

    // ── Step 3: Repositories ─────────────────────────────────────
    let user_store = Arc::new(UserRepository::new(db.pool().clone()));
    let file_store = Arc::new(FileRepository::new(db.pool().clone()));
    let event_store = Arc::new(EventRepository::new(db.pool().clone()));

    // ── Step 4: Object store ─────────────────────────────────────
    tracing::info!(provider = %config.storage.provider, "Initializing object store");
    let (objects, local_objects): (Arc<dyn ObjectStore>, Option<Arc<LocalObjectStore>>) =
        if config.storage.provider == "local" {
            let local = Arc::new(LocalObjectStore::new(&config.storage.local).await?);
            (local.clone() as Arc<dyn ObjectStore>, Some(local))
        } else {
            (filestore_storage::from_config(&config.storage).await?, None)
        };

    // ── Step 5: Auth + services ──────────────────────────────────
    let tokens = Arc::new(TokenService::from_config(&config.auth)?);
    let authenticator = Arc::new(Authenticator::new(
        Arc::clone(&tokens),
        user_store.clone(),
        pool.clone(),
    ));
    let users = Arc::new(UserService::new(
        user_store.clone(),
        Arc::clone(&tokens),
        pool.clone(),
        config.auth.password_min_length,
    ));
    let admin = Arc::new(AdminUserService::new(
        user_store.clone(),
        pool.clone(),
        config.auth.password_min_length,
    ));
    let files = Arc::new(FileRegistry::new(
        file_store,
        objects,
        pool.clone(),
        StorageTimeouts::from_config(&config.storage),
    ));
    let events = Arc::new(EventLedger::new(event_store, pool.clone()));

    // ── Step 6: Bootstrap administrator ──────────────────────────
    if let Some(bootstrap) = &config.auth.bootstrap_admin {
        if admin
            .ensure_bootstrap_admin(&bootstrap.username, &bootstrap.password)
            .await?
            .is_none()
        {
            tracing::info!(username = %bootstrap.username, "Bootstrap administrator already exists");
        }
    }

    // ── Step 7: Build and start HTTP server ──────────────────────
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);

    let state = AppState {
        config: Arc::new(config),
        authenticator,
        users,
        admin,
        files,
        events,
        user_store,
        pool: pool.clone(),
        local_objects,
    };
    let app = filestore_api::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;
    tracing::info!("FileStore server listening on {}", addr);

    // ── Step 8: Graceful shutdown ────────────────────────────────
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received, starting graceful shutdown...");
            let _ = shutdown_tx.send(true);
        })
        .into_future();

    tokio::select! {
        result = server => {
            result.map_err(|e| AppError::internal(format!("Server error: {e}")))?;
        }
        _ = async {
            let _ = shutdown_rx.wait_for(|stopping| *stopping).await;
            tokio::time::sleep(grace).await;
        } => {
            tracing::warn!(grace_seconds = grace.as_secs(), "Open connections outlived the shutdown grace period");
        }
    }

    // ── Step 9: Release persistence resources ────────────────────
    pool.run(async move {
        db.close().await;
        Ok(())
    })
    .await?;

    tracing::info!("FileStore server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
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
