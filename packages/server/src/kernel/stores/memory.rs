//! In-memory storage used when no database is configured, and in tests.
//!
//! Data is lost on restart.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::domains::listings::models::listing::{priority_order, Listing, ListingFilter};
use crate::domains::listings::ListingStatus;
use crate::domains::sync::models::sync_run::{SyncRun, SyncStatus};
use crate::domains::translation::Lang;
use crate::kernel::{BaseListingStore, BaseSyncLogStore, BaseTranslationStore};

type TranslationKey = (String, Lang, Lang);

/// Listings, sync runs and translations in one process-local store.
pub struct MemoryStore {
    listings: RwLock<HashMap<String, Listing>>,
    sync_runs: RwLock<Vec<SyncRun>>,
    translations: RwLock<HashMap<TranslationKey, String>>,
    translation_reads: AtomicUsize,
    translation_writes: AtomicUsize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            listings: RwLock::new(HashMap::new()),
            sync_runs: RwLock::new(Vec::new()),
            translations: RwLock::new(HashMap::new()),
            translation_reads: AtomicUsize::new(0),
            translation_writes: AtomicUsize::new(0),
        }
    }

    pub fn listing_count(&self) -> usize {
        read(&self.listings).len()
    }

    pub fn listing(&self, listing_key: &str) -> Option<Listing> {
        read(&self.listings).get(listing_key).cloned()
    }

    pub fn sync_runs(&self) -> Vec<SyncRun> {
        read(&self.sync_runs).clone()
    }

    pub fn translation_count(&self) -> usize {
        read(&self.translations).len()
    }

    /// Number of translation lookups served
    pub fn translation_reads(&self) -> usize {
        self.translation_reads.load(Ordering::SeqCst)
    }

    /// Number of translation writes accepted
    pub fn translation_writes(&self) -> usize {
        self.translation_writes.load(Ordering::SeqCst)
    }

    fn finish_run(
        &self,
        id: Uuid,
        status: SyncStatus,
        error_message: Option<&str>,
        listings_synced: i32,
        photos_synced: i32,
    ) -> Result<()> {
        let mut runs = write(&self.sync_runs);
        let run = runs
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| anyhow!("Sync run not found: {}", id))?;

        // Terminal states are final
        if !run.is_running() {
            return Ok(());
        }

        run.status = status.to_string();
        run.completed_at = Some(Utc::now());
        run.error_message = error_message.map(str::to_string);
        run.listings_synced = listings_synced;
        run.photos_synced = photos_synced;
        Ok(())
    }
}

// =============================================================================
// Listings
// =============================================================================

#[async_trait]
impl BaseListingStore for MemoryStore {
    async fn upsert_listings(&self, listings: &[Listing]) -> Result<u64> {
        let now = Utc::now();
        let mut stored = write(&self.listings);

        for listing in listings {
            let mut row = listing.clone();
            match stored.get(&listing.listing_key) {
                Some(existing) => {
                    row.created_at = existing.created_at;
                    row.updated_at = now;
                }
                None => {
                    row.created_at = now;
                    row.updated_at = now;
                }
            }
            stored.insert(row.listing_key.clone(), row);
        }

        Ok(listings.len() as u64)
    }

    async fn find_for_sale(&self, filter: &ListingFilter) -> Result<Vec<Listing>> {
        let mut matches: Vec<Listing> = read(&self.listings)
            .values()
            .filter(|l| filter.matches(l))
            .cloned()
            .collect();
        matches.sort_by(priority_order);

        Ok(matches
            .into_iter()
            .skip(filter.offset.max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .collect())
    }

    async fn find_by_slug_or_mls_number(&self, identifier: &str) -> Result<Option<Listing>> {
        Ok(read(&self.listings)
            .values()
            .filter(|l| l.slug == identifier || l.mls_number == identifier)
            .max_by(|a, b| {
                a.is_agent_listing
                    .cmp(&b.is_agent_listing)
                    .then(a.updated_at.cmp(&b.updated_at))
            })
            .cloned())
    }

    async fn search(&self, text: &str, limit: i64) -> Result<Vec<Listing>> {
        let needle = text.to_lowercase();
        let for_sale = ListingStatus::ForSale.to_string();

        let mut matches: Vec<Listing> = read(&self.listings)
            .values()
            .filter(|l| l.status == for_sale)
            .filter(|l| {
                l.city.to_lowercase().contains(&needle)
                    || l.address.to_lowercase().contains(&needle)
                    || l.title.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.price_number.total_cmp(&a.price_number));
        matches.truncate(limit.max(0) as usize);
        Ok(matches)
    }

    async fn agent_listings(&self) -> Result<Vec<Listing>> {
        let mut listings: Vec<Listing> = read(&self.listings)
            .values()
            .filter(|l| l.is_agent_listing)
            .cloned()
            .collect();
        listings.sort_by(|a, b| b.listed_date.cmp(&a.listed_date));
        Ok(listings)
    }

    async fn featured(&self) -> Result<Option<Listing>> {
        let for_sale = ListingStatus::ForSale.to_string();
        Ok(read(&self.listings)
            .values()
            .filter(|l| l.is_agent_listing && l.status == for_sale)
            .max_by(|a, b| a.price_number.total_cmp(&b.price_number))
            .cloned())
    }
}

// =============================================================================
// Sync log
// =============================================================================

#[async_trait]
impl BaseSyncLogStore for MemoryStore {
    async fn start_run(&self) -> Result<SyncRun> {
        let run = SyncRun::started();
        write(&self.sync_runs).push(run.clone());
        Ok(run)
    }

    async fn complete_run(&self, id: Uuid, listings_synced: i32, photos_synced: i32) -> Result<()> {
        self.finish_run(id, SyncStatus::Completed, None, listings_synced, photos_synced)
    }

    async fn fail_run(
        &self,
        id: Uuid,
        error_message: &str,
        listings_synced: i32,
        photos_synced: i32,
    ) -> Result<()> {
        self.finish_run(
            id,
            SyncStatus::Failed,
            Some(error_message),
            listings_synced,
            photos_synced,
        )
    }

    async fn latest_run(&self) -> Result<Option<SyncRun>> {
        Ok(read(&self.sync_runs)
            .iter()
            .max_by_key(|r| (r.started_at, r.id))
            .cloned())
    }
}

// =============================================================================
// Translations
// =============================================================================

#[async_trait]
impl BaseTranslationStore for MemoryStore {
    async fn lookup(
        &self,
        texts: &[String],
        source: Lang,
        target: Lang,
    ) -> Result<HashMap<String, String>> {
        self.translation_reads.fetch_add(1, Ordering::SeqCst);
        let cache = read(&self.translations);

        Ok(texts
            .iter()
            .filter_map(|text| {
                cache
                    .get(&(text.clone(), source, target))
                    .map(|t| (text.clone(), t.clone()))
            })
            .collect())
    }

    async fn store(&self, entries: &[(String, String)], source: Lang, target: Lang) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }
        self.translation_writes.fetch_add(1, Ordering::SeqCst);

        let mut cache = write(&self.translations);
        for (source_text, translated) in entries {
            cache.insert((source_text.clone(), source, target), translated.clone());
        }
        Ok(())
    }
}
