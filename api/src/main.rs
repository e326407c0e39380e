use std::sync::Arc;

use actix_web::{web, HttpServer};
use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cn_api::app::{create_app, AppState};
use cn_core::repositories::{PostRepository, RefreshLedger, UserDirectory};
use cn_core::services::{EventHub, LedgerReaper, LedgerReaperConfig};
use cn_infra::{
    DatabasePool, InMemoryPostRepository, InMemoryRefreshLedger, InMemoryUserDirectory,
    MySqlPostRepository, MySqlRefreshLedger, MySqlUserDirectory,
};
use cn_shared::{AppConfig, LogFormat, LoggingConfig, StorageBackend};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(&config.logging);

    info!(
        environment = %config.environment,
        backend = ?config.database.backend,
        "Starting Connect API server"
    );

    match config.database.backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; all data is lost on restart");
            run(
                config,
                Arc::new(InMemoryRefreshLedger::new()),
                Arc::new(InMemoryUserDirectory::new()),
                Arc::new(InMemoryPostRepository::new()),
            )
            .await
        }
        StorageBackend::MySql => {
            let database = DatabasePool::new(config.database.clone())
                .await
                .context("Failed to connect to database")?;
            database.migrate().await.context("Failed to run migrations")?;
            let stats = database.statistics();
            info!(
                connections = stats.size,
                max_connections = stats.max_connections,
                "Database pool ready"
            );

            let pool = database.get_pool().clone();
            let result = run(
                config,
                Arc::new(MySqlRefreshLedger::new(pool.clone())),
                Arc::new(MySqlUserDirectory::new(pool.clone())),
                Arc::new(MySqlPostRepository::new(pool)),
            )
            .await;

            database.close().await;
            result
        }
    }
}

/// Serve until interrupted, then shut the hub down so open event streams end
async fn run<L, U, P>(config: AppConfig, ledger: Arc<L>, users: Arc<U>, posts: Arc<P>) -> anyhow::Result<()>
where
    L: RefreshLedger + 'static,
    U: UserDirectory + 'static,
    P: PostRepository + 'static,
{
    let bind_address = config.server.bind_address();
    let workers = config.server.workers;
    let keep_alive = config.server.keep_alive;

    let reaper = Arc::new(LedgerReaper::new(
        ledger.clone(),
        LedgerReaperConfig::from(&config.auth),
    ));
    let reaper_handle = reaper.start_background_task();

    let hub = EventHub::from_config(&config.broadcast);
    let state = web::Data::new(AppState::new(config, ledger, users, posts, hub.clone()));

    let mut server = HttpServer::new(move || create_app(state.clone()))
        .keep_alive(std::time::Duration::from_secs(keep_alive))
        .disable_signals();
    if workers > 0 {
        server = server.workers(workers);
    }
    let server = server
        .bind(&bind_address)
        .with_context(|| format!("Failed to bind {}", bind_address))?
        .run();

    info!("Listening on {}", bind_address);

    let handle = server.handle();
    let shutdown_hub = hub.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received");
            shutdown_hub.shutdown();
            handle.stop(true).await;
        }
    });

    server.await.context("Server error")?;

    hub.shutdown();
    if let Some(handle) = reaper_handle {
        handle.abort();
    }
    info!("Server stopped");
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Compact => builder.compact().init(),
    }
}
