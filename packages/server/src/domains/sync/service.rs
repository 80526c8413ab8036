//! Sync orchestrator.
//!
//! ```text
//! run()
//!   ├─► agent listings (ListAgentKey)
//!   ├─► brokerage listings (office scan, deadline + cancel)
//!   ├─► merge, agent first
//!   ├─► batches of N: photos concurrently → transform
//!   ├─► dedup by listing_key
//!   └─► upsert → SyncRun completed | failed
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use futures::future::join_all;
use reso_client::{PhotoFetch, ResoProperty};
use thiserror::Error;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::merge::{dedup_by_key, merge_agent_first};
use super::models::sync_run::SyncRun;
use crate::domains::listings::transform::{transform, TransformContext};
use crate::domains::listings::Listing;
use crate::kernel::ServerDeps;

/// Pacing and retry knobs. Defaults match the MLS's tolerance.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Listings whose photos are fetched concurrently
    pub batch_size: usize,
    pub batch_delay: Duration,
    pub photo_attempts: u32,
    /// Wait after a rate-limited photo fetch, doubled per attempt
    pub rate_limit_base: Duration,
    /// Wait after a failed photo fetch
    pub error_delay: Duration,
    pub max_photos: usize,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            batch_size: 5,
            batch_delay: Duration::from_millis(500),
            photo_attempts: 3,
            rate_limit_base: Duration::from_secs(1),
            error_delay: Duration::from_secs(1),
            max_photos: 6,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyncOutcome {
    pub run_id: Uuid,
    pub listings_synced: i32,
    pub photos_synced: i32,
    pub agent_listings: usize,
    pub brokerage_listings: usize,
    /// False when the office scan stopped early
    pub brokerage_scan_complete: bool,
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("A sync is already in progress")]
    AlreadyRunning,

    #[error("{message}")]
    Failed {
        /// None when the run could not even be recorded
        run_id: Option<Uuid>,
        message: String,
        listings_synced: i32,
        photos_synced: i32,
    },
}

#[derive(Debug, Default)]
struct Progress {
    listings_synced: i32,
    photos_synced: i32,
    agent_listings: usize,
    brokerage_listings: usize,
    brokerage_scan_complete: bool,
}

pub struct SyncService {
    deps: Arc<ServerDeps>,
    options: SyncOptions,
    run_lock: Mutex<()>,
    cancel: CancellationToken,
}

impl SyncService {
    pub fn new(deps: Arc<ServerDeps>) -> Self {
        Self::with_options(deps, SyncOptions::default())
    }

    pub fn with_options(deps: Arc<ServerDeps>, options: SyncOptions) -> Self {
        Self {
            deps,
            options,
            run_lock: Mutex::new(()),
            cancel: CancellationToken::new(),
        }
    }

    pub fn deps(&self) -> &Arc<ServerDeps> {
        &self.deps
    }

    pub fn is_running(&self) -> bool {
        self.run_lock.try_lock().is_err()
    }

    /// Cancel an in-flight run. Later runs fail immediately.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    pub async fn latest_run(&self) -> Result<Option<SyncRun>> {
        self.deps.sync_log.latest_run().await
    }

    /// Run one full sync. Only one run executes at a time.
    #[tracing::instrument(skip(self))]
    pub async fn run(&self) -> Result<SyncOutcome, SyncError> {
        let _guard = self
            .run_lock
            .try_lock()
            .map_err(|_| SyncError::AlreadyRunning)?;

        info!("Starting MLS sync");

        let run = self
            .deps
            .sync_log
            .start_run()
            .await
            .map_err(|e| SyncError::Failed {
                run_id: None,
                message: format!("Failed to record sync run: {e:#}"),
                listings_synced: 0,
                photos_synced: 0,
            })?;

        let mut progress = Progress::default();

        match self.execute(&mut progress).await {
            Ok(()) => {
                if let Err(e) = self
                    .deps
                    .sync_log
                    .complete_run(run.id, progress.listings_synced, progress.photos_synced)
                    .await
                {
                    error!(run_id = %run.id, error = %e, "Failed to mark sync run completed");
                }

                info!(
                    run_id = %run.id,
                    listings_synced = progress.listings_synced,
                    photos_synced = progress.photos_synced,
                    "MLS sync completed"
                );

                Ok(SyncOutcome {
                    run_id: run.id,
                    listings_synced: progress.listings_synced,
                    photos_synced: progress.photos_synced,
                    agent_listings: progress.agent_listings,
                    brokerage_listings: progress.brokerage_listings,
                    brokerage_scan_complete: progress.brokerage_scan_complete,
                })
            }
            Err(e) => {
                let message = format!("{e:#}");
                error!(run_id = %run.id, error = %message, "MLS sync failed");

                if let Err(log_err) = self
                    .deps
                    .sync_log
                    .fail_run(
                        run.id,
                        &message,
                        progress.listings_synced,
                        progress.photos_synced,
                    )
                    .await
                {
                    error!(run_id = %run.id, error = %log_err, "Failed to mark sync run failed");
                }

                Err(SyncError::Failed {
                    run_id: Some(run.id),
                    message,
                    listings_synced: progress.listings_synced,
                    photos_synced: progress.photos_synced,
                })
            }
        }
    }

    async fn execute(&self, progress: &mut Progress) -> Result<()> {
        let deps = &self.deps;

        let agent = match deps.agent_key.as_deref() {
            Some(agent_key) => deps
                .mls
                .agent_listings(agent_key)
                .await
                .context("Failed to fetch agent listings")?,
            None => Vec::new(),
        };
        progress.agent_listings = agent.len();
        info!(count = agent.len(), "Fetched agent listings");

        let scan = deps
            .mls
            .office_listings(&deps.brokerage_name, deps.scan_deadline, &self.cancel)
            .await
            .context("Failed to fetch brokerage listings")?;
        progress.brokerage_listings = scan.listings.len();
        progress.brokerage_scan_complete = scan.complete;
        if !scan.complete {
            warn!(
                found = scan.listings.len(),
                scanned = scan.scanned,
                "Brokerage scan incomplete, syncing partial results"
            );
        }
        info!(count = scan.listings.len(), office = %deps.brokerage_name, "Fetched brokerage listings");

        let (combined, agent_keys) = merge_agent_first(agent, scan.listings);
        info!(count = combined.len(), "Processing unique listings");

        let ctx = TransformContext::now();
        let total = combined.len();
        let mut transformed: Vec<Listing> = Vec::with_capacity(total);

        for batch in combined.chunks(self.options.batch_size.max(1)) {
            if self.cancel.is_cancelled() {
                anyhow::bail!("Sync cancelled");
            }

            let photos = join_all(batch.iter().map(|l| self.photos_with_retry(l))).await;

            for (property, urls) in batch.iter().zip(photos) {
                let is_agent = agent_keys.contains(&property.listing_key);
                progress.photos_synced += urls.len() as i32;
                transformed.push(transform(property, urls, ctx.with_flags(is_agent, !is_agent)));
            }

            let processed = transformed.len();
            info!(processed, total, "Processed listings");

            if processed < total {
                tokio::time::sleep(self.options.batch_delay).await;
            }
        }

        let unique = dedup_by_key(transformed);
        info!(count = unique.len(), "Upserting listings");

        deps.listing_store
            .upsert_listings(&unique)
            .await
            .context("Upsert failed")?;

        progress.listings_synced = unique.len() as i32;
        Ok(())
    }

    /// Photo URLs for one listing; empty once every attempt is used up.
    async fn photos_with_retry(&self, property: &ResoProperty) -> Vec<String> {
        let key = &property.listing_key;
        let attempts = self.options.photo_attempts;

        for attempt in 0..attempts {
            let last = attempt + 1 >= attempts;

            match self.deps.mls.photos(key).await {
                Ok(PhotoFetch::Photos(items)) => {
                    return PhotoFetch::Photos(items).urls(self.options.max_photos);
                }
                Ok(PhotoFetch::RateLimited) => {
                    warn!(listing_key = %key, attempt, "Photo fetch rate limited");
                    if !last {
                        tokio::time::sleep(self.options.rate_limit_base * 2u32.pow(attempt)).await;
                    }
                }
                Err(e) => {
                    warn!(listing_key = %key, attempt, error = %e, "Photo fetch failed");
                    if !last {
                        tokio::time::sleep(self.options.error_delay).await;
                    }
                }
            }
        }

        Vec::new()
    }
}
