// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Sync and translation logic live in the domains and use these traits.
//
// Naming convention: Base* for trait names (e.g., BaseMlsSource, BaseTranslator)

use std::collections::HashMap;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reso_client::{OfficeScan, PhotoFetch, ResoProperty};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::domains::listings::models::listing::{Listing, ListingFilter};
use crate::domains::sync::models::sync_run::SyncRun;
use crate::domains::translation::data::Lang;

// =============================================================================
// MLS Source Trait (Infrastructure - remote listing data)
// =============================================================================

#[async_trait]
pub trait BaseMlsSource: Send + Sync {
    /// Whether credentials were provided. Unconfigured sources return nothing.
    fn is_configured(&self) -> bool;

    /// Active listings for one agent
    async fn agent_listings(&self, agent_key: &str) -> Result<Vec<ResoProperty>>;

    /// Active listings whose office name contains `office_name`
    async fn office_listings(
        &self,
        office_name: &str,
        deadline: Option<Duration>,
        cancel: &CancellationToken,
    ) -> Result<OfficeScan>;

    /// Photos for one listing, uncached
    async fn photos(&self, listing_key: &str) -> Result<PhotoFetch>;

    /// Single listing by MLS number
    async fn listing_by_id(&self, listing_id: &str) -> Option<ResoProperty>;

    /// Cached photo URLs for many listings (keys with no photos are absent)
    async fn photos_for_listings(&self, listing_keys: &[String]) -> HashMap<String, Vec<String>>;
}

// =============================================================================
// Translator Trait (Infrastructure - machine translation)
// =============================================================================

#[async_trait]
pub trait BaseTranslator: Send + Sync {
    /// One entry per input; `None` where no translation came back
    async fn translate_batch(&self, texts: &[String], target: Lang) -> Result<Vec<Option<String>>>;
}

// =============================================================================
// Store Traits (Infrastructure - persistence)
// =============================================================================

#[async_trait]
pub trait BaseListingStore: Send + Sync {
    /// Insert or replace by `listing_key`
    async fn upsert_listings(&self, listings: &[Listing]) -> Result<u64>;

    async fn find_for_sale(&self, filter: &ListingFilter) -> Result<Vec<Listing>>;

    async fn find_by_slug_or_mls_number(&self, identifier: &str) -> Result<Option<Listing>>;

    /// For Sale listings whose city, address or title contains `text`
    async fn search(&self, text: &str, limit: i64) -> Result<Vec<Listing>>;

    async fn agent_listings(&self) -> Result<Vec<Listing>>;

    async fn featured(&self) -> Result<Option<Listing>>;
}

#[async_trait]
pub trait BaseSyncLogStore: Send + Sync {
    /// Record a new run in the `running` state
    async fn start_run(&self) -> Result<SyncRun>;

    async fn complete_run(&self, id: Uuid, listings_synced: i32, photos_synced: i32)
        -> Result<()>;

    async fn fail_run(
        &self,
        id: Uuid,
        error_message: &str,
        listings_synced: i32,
        photos_synced: i32,
    ) -> Result<()>;

    /// Most recently started run
    async fn latest_run(&self) -> Result<Option<SyncRun>>;
}

#[async_trait]
pub trait BaseTranslationStore: Send + Sync {
    /// Cached source text -> translation for any of `texts`
    async fn lookup(
        &self,
        texts: &[String],
        source: Lang,
        target: Lang,
    ) -> Result<HashMap<String, String>>;

    /// Insert or overwrite `(source_text, translated_text)` pairs
    async fn store(&self, entries: &[(String, String)], source: Lang, target: Lang) -> Result<()>;
}
