// Main entry point for the listings API server

use std::sync::Arc;

use anyhow::{Context, Result};
use listings_core::domains::sync::SyncService;
use listings_core::kernel::{scheduled_tasks::start_scheduler, ServerDeps};
use listings_core::server::{build_app, AppState};
use listings_core::Config;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,listings_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting listings API");

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    let pool = match &config.database_url {
        Some(database_url) => {
            tracing::info!("Connecting to database...");
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(database_url)
                .await
                .context("Failed to connect to database")?;

            tracing::info!("Running database migrations...");
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("Failed to run migrations")?;
            tracing::info!("Migrations complete");
            Some(pool)
        }
        None => None,
    };

    let deps = Arc::new(ServerDeps::from_config(&config, pool)?);
    let sync = Arc::new(SyncService::new(deps));

    let _scheduler = match &config.sync_cron {
        Some(cron) => Some(start_scheduler(sync.clone(), cron).await?),
        None => None,
    };

    let state = AppState::new(sync.clone(), config.sync_api_secret.clone());
    let app = build_app(state, &config.allowed_origins);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
            tracing::info!("Shutting down");
            sync.shutdown();
        })
        .await
        .context("Server error")?;

    Ok(())
}
