//! MLS source adapters.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reso_client::{OfficeScan, PhotoFetch, ResoClient, ResoProperty, ScanOptions};
use tokio_util::sync::CancellationToken;

use super::BaseMlsSource;

// =============================================================================
// ResoClient Adapter (implements BaseMlsSource trait)
// =============================================================================

/// Wrapper around ResoClient that implements BaseMlsSource trait
pub struct ResoMlsSource {
    client: ResoClient,
    scan: ScanOptions,
}

impl ResoMlsSource {
    pub fn new(client: ResoClient) -> Self {
        Self {
            client,
            scan: ScanOptions::default(),
        }
    }

    pub fn with_scan_options(mut self, scan: ScanOptions) -> Self {
        self.scan = scan;
        self
    }

    pub fn client(&self) -> &ResoClient {
        &self.client
    }
}

#[async_trait]
impl BaseMlsSource for ResoMlsSource {
    fn is_configured(&self) -> bool {
        self.client.is_configured()
    }

    async fn agent_listings(&self, agent_key: &str) -> Result<Vec<ResoProperty>> {
        let page = self.client.get_agent_listings(agent_key).await?;
        if page.rate_limited {
            tracing::warn!(agent_key, "Agent listing fetch rate limited, continuing without them");
        }
        Ok(page.listings)
    }

    async fn office_listings(
        &self,
        office_name: &str,
        deadline: Option<Duration>,
        cancel: &CancellationToken,
    ) -> Result<OfficeScan> {
        let options = ScanOptions {
            deadline,
            ..self.scan.clone()
        };
        Ok(self
            .client
            .get_office_listings(office_name, &options, cancel)
            .await?)
    }

    async fn photos(&self, listing_key: &str) -> Result<PhotoFetch> {
        Ok(self.client.get_photos(listing_key).await)
    }

    async fn listing_by_id(&self, listing_id: &str) -> Option<ResoProperty> {
        self.client.get_listing_by_id(listing_id).await
    }

    async fn photos_for_listings(&self, listing_keys: &[String]) -> HashMap<String, Vec<String>> {
        self.client.get_photos_for_listings(listing_keys).await
    }
}

// =============================================================================
// Noop MLS source (no access token configured)
// =============================================================================

/// Stands in when no MLS credentials are configured. Every query is empty.
pub struct NoopMlsSource;

#[async_trait]
impl BaseMlsSource for NoopMlsSource {
    fn is_configured(&self) -> bool {
        false
    }

    async fn agent_listings(&self, _agent_key: &str) -> Result<Vec<ResoProperty>> {
        Ok(Vec::new())
    }

    async fn office_listings(
        &self,
        _office_name: &str,
        _deadline: Option<Duration>,
        _cancel: &CancellationToken,
    ) -> Result<OfficeScan> {
        Ok(OfficeScan {
            complete: true,
            ..Default::default()
        })
    }

    async fn photos(&self, _listing_key: &str) -> Result<PhotoFetch> {
        Ok(PhotoFetch::Photos(Vec::new()))
    }

    async fn listing_by_id(&self, _listing_id: &str) -> Option<ResoProperty> {
        None
    }

    async fn photos_for_listings(&self, _listing_keys: &[String]) -> HashMap<String, Vec<String>> {
        HashMap::new()
    }
}
