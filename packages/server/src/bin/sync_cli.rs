//! Run one MLS sync from the command line, or show the last run.
//!
//! Prints a JSON summary so it can be scripted.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use listings_core::domains::sync::{SyncError, SyncService};
use listings_core::kernel::ServerDeps;
use listings_core::Config;
use serde_json::json;
use sqlx::postgres::PgPoolOptions;

#[derive(Parser)]
#[command(name = "sync_cli")]
#[command(about = "Sync MLS listings into the local store")]
struct Cli {
    /// Print the most recent sync run instead of starting one
    #[arg(long)]
    status: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,listings_core=debug,sqlx=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;

    let pool = match &config.database_url {
        Some(database_url) => {
            let pool = PgPoolOptions::new()
                .max_connections(2)
                .connect(database_url)
                .await
                .context("Failed to connect to database")?;
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("Failed to run migrations")?;
            Some(pool)
        }
        None => None,
    };

    let deps = Arc::new(ServerDeps::from_config(&config, pool)?);
    let sync = SyncService::new(deps);

    if cli.status {
        let last_sync = sync.latest_run().await?;
        println!("{}", serde_json::to_string_pretty(&json!({ "lastSync": last_sync }))?);
        return Ok(ExitCode::SUCCESS);
    }

    let (summary, code) = match sync.run().await {
        Ok(outcome) => (
            json!({
                "success": true,
                "runId": outcome.run_id,
                "listingsSynced": outcome.listings_synced,
                "photosSynced": outcome.photos_synced,
                "agentListings": outcome.agent_listings,
                "brokerageListings": outcome.brokerage_listings,
                "brokerageScanComplete": outcome.brokerage_scan_complete,
            }),
            ExitCode::SUCCESS,
        ),
        Err(SyncError::Failed {
            run_id,
            message,
            listings_synced,
            photos_synced,
        }) => (
            json!({
                "success": false,
                "runId": run_id,
                "error": message,
                "listingsSynced": listings_synced,
                "photosSynced": photos_synced,
            }),
            ExitCode::FAILURE,
        ),
        Err(e @ SyncError::AlreadyRunning) => (
            json!({ "success": false, "error": e.to_string() }),
            ExitCode::FAILURE,
        ),
    };

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(code)
}
