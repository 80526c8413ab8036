//! Server dependencies (using traits for testability)
//!
//! Optional collaborators are resolved once here: no MLS token means a Noop
//! source, no translation key means passthrough, no database means the
//! in-memory store.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use deepl_client::DeepLClient;
use reso_client::{ResoClient, ResoClientOptions};
use secrecy::ExposeSecret;
use sqlx::PgPool;

use crate::config::{Config, DEFAULT_BROKERAGE_NAME, DEFAULT_SCAN_DEADLINE_SECS};
use crate::kernel::{
    BaseListingStore, BaseMlsSource, BaseSyncLogStore, BaseTranslationStore, BaseTranslator,
    DeepLTranslator, MemoryStore, NoopMlsSource, NoopTranslator, PostgresStore, ResoMlsSource,
};

/// Server dependencies accessible to services and routes
#[derive(Clone)]
pub struct ServerDeps {
    pub mls: Arc<dyn BaseMlsSource>,
    pub translator: Arc<dyn BaseTranslator>,
    pub listing_store: Arc<dyn BaseListingStore>,
    pub sync_log: Arc<dyn BaseSyncLogStore>,
    pub translation_store: Arc<dyn BaseTranslationStore>,
    /// Present when backed by PostgreSQL (used by the health check)
    pub db_pool: Option<PgPool>,
    /// `ListAgentKey` of the site's agent; no agent listings when unset
    pub agent_key: Option<String>,
    pub brokerage_name: String,
    /// Office scan budget; unbounded when None
    pub scan_deadline: Option<Duration>,
}

impl ServerDeps {
    /// Build from configuration. `db_pool` must already be migrated.
    pub fn from_config(config: &Config, db_pool: Option<PgPool>) -> Result<Self> {
        let mls: Arc<dyn BaseMlsSource> = match &config.spark_access_token {
            Some(token) => {
                let options = ResoClientOptions::new(
                    config.spark_api_url.clone(),
                    Some(token.expose_secret().to_string()),
                );
                let client = ResoClient::new(options).context("Failed to build MLS client")?;
                Arc::new(ResoMlsSource::new(client))
            }
            None => {
                tracing::warn!("SPARK_ACCESS_TOKEN not set, MLS queries will return nothing");
                Arc::new(NoopMlsSource)
            }
        };

        let translator: Arc<dyn BaseTranslator> = match &config.deepl_api_key {
            Some(key) => Arc::new(DeepLTranslator::new(
                DeepLClient::new(key.expose_secret()).with_api_url(config.deepl_api_url.clone()),
            )),
            None => {
                tracing::warn!("DEEPL_API_KEY not set, translations pass through untranslated");
                Arc::new(NoopTranslator)
            }
        };

        let deps = match db_pool {
            Some(pool) => Self::postgres(mls, translator, pool),
            None => {
                tracing::warn!("DATABASE_URL not set, using in-memory storage");
                Self::in_memory(mls, translator, Arc::new(MemoryStore::new()))
            }
        };

        Ok(deps
            .with_agent_key(config.agent_key.clone())
            .with_brokerage_name(config.brokerage_name.clone())
            .with_scan_deadline(
                Some(config.scan_deadline).filter(|deadline| !deadline.is_zero()),
            ))
    }

    /// All storage in PostgreSQL. `pool` must already be migrated.
    pub fn postgres(
        mls: Arc<dyn BaseMlsSource>,
        translator: Arc<dyn BaseTranslator>,
        pool: PgPool,
    ) -> Self {
        let store = Arc::new(PostgresStore::from_pool(pool.clone()));
        Self {
            mls,
            translator,
            listing_store: store.clone(),
            sync_log: store.clone(),
            translation_store: store,
            db_pool: Some(pool),
            agent_key: None,
            brokerage_name: DEFAULT_BROKERAGE_NAME.to_string(),
            scan_deadline: Some(Duration::from_secs(DEFAULT_SCAN_DEADLINE_SECS)),
        }
    }

    /// All storage in one process-local store
    pub fn in_memory(
        mls: Arc<dyn BaseMlsSource>,
        translator: Arc<dyn BaseTranslator>,
        store: Arc<MemoryStore>,
    ) -> Self {
        Self {
            mls,
            translator,
            listing_store: store.clone(),
            sync_log: store.clone(),
            translation_store: store,
            db_pool: None,
            agent_key: None,
            brokerage_name: DEFAULT_BROKERAGE_NAME.to_string(),
            scan_deadline: Some(Duration::from_secs(DEFAULT_SCAN_DEADLINE_SECS)),
        }
    }

    pub fn with_agent_key(mut self, agent_key: Option<String>) -> Self {
        self.agent_key = agent_key;
        self
    }

    pub fn with_brokerage_name(mut self, brokerage_name: impl Into<String>) -> Self {
        self.brokerage_name = brokerage_name.into();
        self
    }

    pub fn with_scan_deadline(mut self, scan_deadline: Option<Duration>) -> Self {
        self.scan_deadline = scan_deadline;
        self
    }

    /// `postgres` or `memory`
    pub fn storage_backend(&self) -> &'static str {
        if self.db_pool.is_some() {
            "postgres"
        } else {
            "memory"
        }
    }
}
