// Test dependencies - mock implementations for testing
//
// Provides mock MLS and translation services that can be injected into
// ServerDeps for tests. In-memory stores double as test stores.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reso_client::{MediaItem, OfficeScan, PhotoFetch, ResoProperty, PHOTOS_PER_LISTING};
use tokio_util::sync::CancellationToken;

use super::{BaseMlsSource, BaseTranslator};
use crate::domains::translation::Lang;

// =============================================================================
// Mock MLS Source
// =============================================================================

/// One scripted photo response
#[derive(Debug, Clone)]
pub enum MockPhotos {
    Urls(Vec<String>),
    RateLimited,
    Error(String),
}

pub struct MockMlsSource {
    configured: bool,
    agent: Vec<ResoProperty>,
    office: Vec<ResoProperty>,
    office_scan_complete: bool,
    office_delay: Option<Duration>,
    agent_error: Option<String>,
    office_error: Option<String>,
    by_id: HashMap<String, ResoProperty>,
    /// Default photos per listing key
    photos: HashMap<String, Vec<String>>,
    /// Scripted responses consumed before falling back to `photos`
    photo_script: Arc<Mutex<HashMap<String, Vec<MockPhotos>>>>,
    agent_calls: Arc<Mutex<Vec<String>>>,
    office_calls: Arc<Mutex<Vec<String>>>,
    photo_calls: Arc<Mutex<Vec<String>>>,
    by_id_calls: Arc<Mutex<Vec<String>>>,
}

impl Default for MockMlsSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMlsSource {
    pub fn new() -> Self {
        Self {
            configured: true,
            agent: Vec::new(),
            office: Vec::new(),
            office_scan_complete: true,
            office_delay: None,
            agent_error: None,
            office_error: None,
            by_id: HashMap::new(),
            photos: HashMap::new(),
            photo_script: Arc::new(Mutex::new(HashMap::new())),
            agent_calls: Arc::new(Mutex::new(Vec::new())),
            office_calls: Arc::new(Mutex::new(Vec::new())),
            photo_calls: Arc::new(Mutex::new(Vec::new())),
            by_id_calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn unconfigured(mut self) -> Self {
        self.configured = false;
        self
    }

    pub fn with_agent_listings(mut self, listings: Vec<ResoProperty>) -> Self {
        self.agent = listings;
        self
    }

    pub fn with_office_listings(mut self, listings: Vec<ResoProperty>) -> Self {
        self.office = listings;
        self
    }

    /// Report the office scan as stopped early
    pub fn with_incomplete_scan(mut self) -> Self {
        self.office_scan_complete = false;
        self
    }

    /// Make the office scan take `delay` (cancellable)
    pub fn with_office_delay(mut self, delay: Duration) -> Self {
        self.office_delay = Some(delay);
        self
    }

    pub fn with_agent_error(mut self, message: &str) -> Self {
        self.agent_error = Some(message.to_string());
        self
    }

    pub fn with_office_error(mut self, message: &str) -> Self {
        self.office_error = Some(message.to_string());
        self
    }

    /// Listing returned by `listing_by_id` for its `ListingId`
    pub fn with_listing_by_id(mut self, listing: ResoProperty) -> Self {
        let id = listing
            .listing_id
            .clone()
            .unwrap_or_else(|| listing.listing_key.clone());
        self.by_id.insert(id, listing);
        self
    }

    pub fn with_photos(mut self, listing_key: &str, urls: &[&str]) -> Self {
        self.photos.insert(
            listing_key.to_string(),
            urls.iter().map(|u| u.to_string()).collect(),
        );
        self
    }

    /// Queue responses for a listing's next photo fetches
    pub fn with_photo_script(self, listing_key: &str, script: Vec<MockPhotos>) -> Self {
        self.photo_script
            .lock()
            .unwrap()
            .insert(listing_key.to_string(), script);
        self
    }

    pub fn agent_calls(&self) -> Vec<String> {
        self.agent_calls.lock().unwrap().clone()
    }

    pub fn office_calls(&self) -> Vec<String> {
        self.office_calls.lock().unwrap().clone()
    }

    /// Listing keys whose photos were fetched, in call order
    pub fn photo_calls(&self) -> Vec<String> {
        self.photo_calls.lock().unwrap().clone()
    }

    pub fn photo_call_count(&self, listing_key: &str) -> usize {
        self.photo_calls
            .lock()
            .unwrap()
            .iter()
            .filter(|k| *k == listing_key)
            .count()
    }

    pub fn by_id_calls(&self) -> Vec<String> {
        self.by_id_calls.lock().unwrap().clone()
    }

    fn default_photos(&self, listing_key: &str) -> Vec<String> {
        self.photos.get(listing_key).cloned().unwrap_or_default()
    }
}

fn media(urls: Vec<String>) -> PhotoFetch {
    PhotoFetch::Photos(
        urls.into_iter()
            .enumerate()
            .map(|(i, url)| MediaItem {
                media_url: Some(url),
                mime_type: Some("image/jpeg".to_string()),
                media_category: Some("Photo".to_string()),
                order: Some(i as i64),
            })
            .collect(),
    )
}

#[async_trait]
impl BaseMlsSource for MockMlsSource {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn agent_listings(&self, agent_key: &str) -> Result<Vec<ResoProperty>> {
        self.agent_calls.lock().unwrap().push(agent_key.to_string());

        if let Some(message) = &self.agent_error {
            anyhow::bail!("{}", message);
        }
        Ok(self.agent.clone())
    }

    async fn office_listings(
        &self,
        office_name: &str,
        _deadline: Option<Duration>,
        cancel: &CancellationToken,
    ) -> Result<OfficeScan> {
        self.office_calls.lock().unwrap().push(office_name.to_string());

        if let Some(delay) = self.office_delay {
            tokio::select! {
                _ = cancel.cancelled() => anyhow::bail!("Office scan cancelled"),
                _ = tokio::time::sleep(delay) => {}
            }
        }

        if let Some(message) = &self.office_error {
            anyhow::bail!("{}", message);
        }

        Ok(OfficeScan {
            listings: self.office.clone(),
            scanned: self.office.len(),
            complete: self.office_scan_complete,
        })
    }

    async fn photos(&self, listing_key: &str) -> Result<PhotoFetch> {
        self.photo_calls.lock().unwrap().push(listing_key.to_string());

        let scripted = {
            let mut script = self.photo_script.lock().unwrap();
            script
                .get_mut(listing_key)
                .filter(|queue| !queue.is_empty())
                .map(|queue| queue.remove(0))
        };

        match scripted {
            Some(MockPhotos::Urls(urls)) => Ok(media(urls)),
            Some(MockPhotos::RateLimited) => Ok(PhotoFetch::RateLimited),
            Some(MockPhotos::Error(message)) => Err(anyhow::anyhow!("{}", message)),
            None => Ok(media(self.default_photos(listing_key))),
        }
    }

    async fn listing_by_id(&self, listing_id: &str) -> Option<ResoProperty> {
        self.by_id_calls.lock().unwrap().push(listing_id.to_string());
        self.by_id.get(listing_id).cloned()
    }

    async fn photos_for_listings(&self, listing_keys: &[String]) -> HashMap<String, Vec<String>> {
        listing_keys
            .iter()
            .filter_map(|key| {
                let urls: Vec<String> = self
                    .default_photos(key)
                    .into_iter()
                    .take(PHOTOS_PER_LISTING)
                    .collect();
                (!urls.is_empty()).then(|| (key.clone(), urls))
            })
            .collect()
    }
}

// =============================================================================
// Mock Translator
// =============================================================================

pub struct MockTranslator {
    translations: HashMap<String, String>,
    /// Translate everything as `[lang] text`
    translate_all: bool,
    failing: bool,
    calls: Arc<Mutex<Vec<Vec<String>>>>,
}

impl Default for MockTranslator {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTranslator {
    pub fn new() -> Self {
        Self {
            translations: HashMap::new(),
            translate_all: false,
            failing: false,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_translation(mut self, source: &str, translated: &str) -> Self {
        self.translations
            .insert(source.to_string(), translated.to_string());
        self
    }

    pub fn translating_all(mut self) -> Self {
        self.translate_all = true;
        self
    }

    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    /// Batches sent to the translator
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl BaseTranslator for MockTranslator {
    async fn translate_batch(&self, texts: &[String], target: Lang) -> Result<Vec<Option<String>>> {
        self.calls.lock().unwrap().push(texts.to_vec());

        if self.failing {
            anyhow::bail!("Mock translator failure");
        }

        Ok(texts
            .iter()
            .map(|text| match self.translations.get(text) {
                Some(translated) => Some(translated.clone()),
                None if self.translate_all => Some(format!("[{}] {}", target, text)),
                None => None,
            })
            .collect())
    }
}
