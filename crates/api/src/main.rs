use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use company_accounts_api::{
    app::{create_app, AppState},
    config::Config,
    jobs::{ExpireInvitationsJob, JobScheduler},
    middleware,
};
use persistence::repositories::PgInvitationStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = Config::load()?;

    middleware::logging::init_logging(&config.logging)?;
    middleware::init_metrics()?;

    info!("Starting Company Accounts API v{}", env!("CARGO_PKG_VERSION"));

    let db_config: persistence::db::DatabaseConfig = (&config.database).into();
    let pool = persistence::db::create_pool(&db_config).await?;

    info!("Running database migrations...");
    persistence::db::run_migrations(&pool).await?;
    info!("Migrations completed");

    let store = Arc::new(PgInvitationStore::new(
        pool,
        Duration::from_millis(config.database.query_timeout_ms),
    ));

    let addr = config.socket_addr().context("Invalid server address")?;
    let sweep_interval = config.invitations.sweep_interval_secs;
    let sweep_batch_size = config.invitations.sweep_batch_size;

    let state = AppState::new(config, store).context("Invalid JWT configuration")?;

    let mut scheduler = JobScheduler::new();
    if sweep_interval > 0 {
        scheduler.register(ExpireInvitationsJob::new(
            state.lifecycle.clone(),
            Duration::from_secs(sweep_interval),
            sweep_batch_size,
        ));
    } else {
        info!("Invitation expiry sweep disabled");
    }
    scheduler.start();

    let app = create_app(state);

    info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.shutdown(Duration::from_secs(10)).await;
    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}
