//! PostgreSQL storage, delegating to the model queries.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domains::listings::models::listing::{Listing, ListingFilter};
use crate::domains::sync::models::sync_run::SyncRun;
use crate::domains::translation::{Lang, Translation};
use crate::kernel::{BaseListingStore, BaseSyncLogStore, BaseTranslationStore};

#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl BaseListingStore for PostgresStore {
    async fn upsert_listings(&self, listings: &[Listing]) -> Result<u64> {
        Listing::upsert_many(listings, &self.pool).await
    }

    async fn find_for_sale(&self, filter: &ListingFilter) -> Result<Vec<Listing>> {
        Listing::find_for_sale(filter, &self.pool).await
    }

    async fn find_by_slug_or_mls_number(&self, identifier: &str) -> Result<Option<Listing>> {
        Listing::find_by_slug_or_mls_number(identifier, &self.pool).await
    }

    async fn search(&self, text: &str, limit: i64) -> Result<Vec<Listing>> {
        Listing::search(text, limit, &self.pool).await
    }

    async fn agent_listings(&self) -> Result<Vec<Listing>> {
        Listing::find_agent_listings(&self.pool).await
    }

    async fn featured(&self) -> Result<Option<Listing>> {
        Listing::find_featured(&self.pool).await
    }
}

#[async_trait]
impl BaseSyncLogStore for PostgresStore {
    async fn start_run(&self) -> Result<SyncRun> {
        SyncRun::create(&self.pool).await
    }

    async fn complete_run(&self, id: Uuid, listings_synced: i32, photos_synced: i32) -> Result<()> {
        SyncRun::complete(id, listings_synced, photos_synced, &self.pool).await
    }

    async fn fail_run(
        &self,
        id: Uuid,
        error_message: &str,
        listings_synced: i32,
        photos_synced: i32,
    ) -> Result<()> {
        SyncRun::fail(id, error_message, listings_synced, photos_synced, &self.pool).await
    }

    async fn latest_run(&self) -> Result<Option<SyncRun>> {
        SyncRun::find_latest(&self.pool).await
    }
}

#[async_trait]
impl BaseTranslationStore for PostgresStore {
    async fn lookup(
        &self,
        texts: &[String],
        source: Lang,
        target: Lang,
    ) -> Result<HashMap<String, String>> {
        let rows = Translation::find_many(texts, source.code(), target.code(), &self.pool).await?;
        Ok(rows
            .into_iter()
            .map(|row| (row.source_text, row.translated_text))
            .collect())
    }

    async fn store(&self, entries: &[(String, String)], source: Lang, target: Lang) -> Result<()> {
        Translation::upsert_many(entries, source.code(), target.code(), &self.pool).await
    }
}
