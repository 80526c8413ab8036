//! Scheduled background tasks using tokio-cron-scheduler.
//!
//! ```text
//! Scheduler (SYNC_CRON)
//!     │
//!     └─► SyncService::run()
//!             └─► AlreadyRunning if a triggered sync is in flight
//! ```

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::domains::sync::{SyncError, SyncService};

/// Start the scheduled sync. `cron` uses the six-field format
/// (`sec min hour day month weekday`).
pub async fn start_scheduler(sync: Arc<SyncService>, cron: &str) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let sync_job = Job::new_async(cron, move |_uuid, _lock| {
        let sync = sync.clone();
        Box::pin(async move {
            run_scheduled_sync(&sync).await;
        })
    })
    .with_context(|| format!("Invalid SYNC_CRON expression: {}", cron))?;

    scheduler.add(sync_job).await?;
    scheduler.start().await?;

    tracing::info!(cron, "Scheduled MLS sync started");
    Ok(scheduler)
}

async fn run_scheduled_sync(sync: &SyncService) {
    tracing::info!("Running scheduled MLS sync");

    match sync.run().await {
        Ok(outcome) => tracing::info!(
            listings_synced = outcome.listings_synced,
            photos_synced = outcome.photos_synced,
            "Scheduled sync complete"
        ),
        Err(SyncError::AlreadyRunning) => {
            tracing::info!("Skipping scheduled sync, another run is in progress")
        }
        Err(e) => tracing::error!(error = %e, "Scheduled sync failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::{MemoryStore, MockMlsSource, MockTranslator, ServerDeps};

    #[tokio::test]
    async fn rejects_invalid_cron() {
        let deps = ServerDeps::in_memory(
            Arc::new(MockMlsSource::new()),
            Arc::new(MockTranslator::new()),
            Arc::new(MemoryStore::new()),
        );
        let sync = Arc::new(SyncService::new(Arc::new(deps)));

        assert!(start_scheduler(sync, "not a cron").await.is_err());
    }
}
