//! Rate-limited RESO OData client.
//!
//! Talks to an MLS replication endpoint (`{base}/Reso/OData/Property`) under a
//! shared throttle. Rate limiting (HTTP 429) is treated as routine: listing
//! queries return an empty page flagged `rate_limited`, photo fetches retry
//! with exponential backoff and then report [`PhotoFetch::RateLimited`].
//! Transport and non-429 HTTP failures are returned as errors.
//!
//! # Example
//!
//! ```rust,ignore
//! use reso_client::{ResoClient, ResoClientOptions, ScanOptions};
//! use tokio_util::sync::CancellationToken;
//!
//! let client = ResoClient::new(ResoClientOptions::new("https://replication.sparkapi.com", Some(token)))?;
//!
//! let scan = client
//!     .get_office_listings("Partnership", &ScanOptions::default(), &CancellationToken::new())
//!     .await?;
//! println!("{} brokerage listings ({} scanned)", scan.listings.len(), scan.scanned);
//! ```

pub mod error;
pub mod filter;
pub mod photo_cache;
pub mod scan;
pub mod throttle;
pub mod types;

pub use error::{ResoError, Result};
pub use photo_cache::{Clock, ManualClock, PhotoCache, SystemClock, DEFAULT_PHOTO_CACHE_TTL};
pub use scan::{ScanOptions, ScanPage};
pub use throttle::{RetryPolicy, Throttle, DEFAULT_MIN_REQUEST_INTERVAL};
pub use types::{
    ListingPage, ListingSearchParams, MediaItem, ODataResponse, OfficeScan, PhotoFetch,
    ResoProperty,
};

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretBox};
use serde::de::DeserializeOwned;

pub const DEFAULT_BASE_URL: &str = "https://replication.sparkapi.com";

/// Photos requested per listing from the `Media` resource.
pub const MEDIA_FETCH_LIMIT: u32 = 6;

/// Photos kept per listing by [`ResoClient::get_photos_for_listings`].
pub const PHOTOS_PER_LISTING: usize = 4;

/// Listings requested for a single agent.
const AGENT_LISTING_LIMIT: u32 = 50;

/// Listings returned by the free-text search.
const SEARCH_LIMIT: u32 = 20;

/// Client settings.
pub struct ResoClientOptions {
    /// Replication host, without the `/Reso/OData` suffix
    pub base_url: String,
    pub access_token: Option<SecretBox<str>>,
    pub min_request_interval: Duration,
    /// Backoff for rate-limited photo requests
    pub photo_retry: RetryPolicy,
    /// Concurrent photo fetches per batch in [`ResoClient::get_photos_for_listings`]
    pub photo_batch_size: usize,
    pub photo_batch_delay: Duration,
    pub photo_cache_ttl: Duration,
    pub request_timeout: Duration,
}

impl ResoClientOptions {
    pub fn new(base_url: impl Into<String>, access_token: Option<String>) -> Self {
        Self {
            base_url: base_url.into(),
            access_token: access_token.map(|t| SecretBox::new(Box::from(t.as_str()))),
            ..Self::default()
        }
    }
}

impl Default for ResoClientOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            access_token: None,
            min_request_interval: DEFAULT_MIN_REQUEST_INTERVAL,
            photo_retry: RetryPolicy::default(),
            photo_batch_size: 2,
            photo_batch_delay: Duration::from_millis(600),
            photo_cache_ttl: DEFAULT_PHOTO_CACHE_TTL,
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Response of a single throttled GET.
enum Fetched<T> {
    Data(T),
    RateLimited,
}

pub struct ResoClient {
    http: reqwest::Client,
    odata_url: String,
    access_token: Option<SecretBox<str>>,
    throttle: Throttle,
    photo_retry: RetryPolicy,
    photo_batch_size: usize,
    photo_batch_delay: Duration,
    photo_cache: PhotoCache,
}

impl ResoClient {
    pub fn new(options: ResoClientOptions) -> Result<Self> {
        Self::with_clock(options, Arc::new(SystemClock))
    }

    /// Build a client whose photo cache reads time from `clock`.
    pub fn with_clock(options: ResoClientOptions, clock: Arc<dyn Clock>) -> Result<Self> {
        if options.photo_batch_size == 0 {
            return Err(ResoError::Config(
                "photo_batch_size must be at least 1".to_string(),
            ));
        }

        let http = reqwest::Client::builder()
            .timeout(options.request_timeout)
            .build()?;

        Ok(Self {
            http,
            odata_url: format!("{}/Reso/OData", options.base_url.trim_end_matches('/')),
            access_token: options.access_token,
            throttle: Throttle::new(options.min_request_interval),
            photo_retry: options.photo_retry,
            photo_batch_size: options.photo_batch_size,
            photo_batch_delay: options.photo_batch_delay,
            photo_cache: PhotoCache::new(options.photo_cache_ttl, clock),
        })
    }

    /// Whether an access token was configured.
    pub fn is_configured(&self) -> bool {
        self.access_token.is_some()
    }

    pub fn photo_cache(&self) -> &PhotoCache {
        &self.photo_cache
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
        throttled: bool,
    ) -> Result<Fetched<T>> {
        if throttled {
            self.throttle.wait().await;
        }

        let mut request = self
            .http
            .get(url)
            .header(ACCEPT, "application/json")
            .query(query);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token.expose_secret());
        }

        let resp = request.send().await?;
        let status = resp.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Ok(Fetched::RateLimited);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ResoError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(Fetched::Data(resp.json().await?))
    }

    /// Search `Property` with structured filters.
    ///
    /// A 429 yields an empty page with `rate_limited` set rather than an error.
    pub async fn get_listings(&self, params: &ListingSearchParams) -> Result<ListingPage> {
        let url = format!("{}/Property", self.odata_url);
        let query = filter::build_query(params);

        match self.get_json::<ODataResponse<ResoProperty>>(&url, &query, true).await {
            Ok(Fetched::Data(resp)) => Ok(resp.into()),
            Ok(Fetched::RateLimited) => {
                tracing::warn!("MLS rate limited listing search, returning empty page");
                Ok(ListingPage::rate_limited())
            }
            Err(e) => {
                tracing::error!(error = %e, "MLS listing search failed");
                Err(e)
            }
        }
    }

    /// Look up one listing by MLS number. Failures of any kind yield `None`.
    pub async fn get_listing_by_id(&self, listing_id: &str) -> Option<ResoProperty> {
        let url = format!("{}/Property", self.odata_url);
        let query = [
            ("$filter", format!("ListingId eq {}", filter::quote(listing_id))),
            ("$top", "1".to_string()),
        ];

        match self.get_json::<ODataResponse<ResoProperty>>(&url, &query, true).await {
            Ok(Fetched::Data(resp)) => resp.value.into_iter().next(),
            Ok(Fetched::RateLimited) => {
                tracing::warn!(listing_id, "MLS rate limited single listing lookup");
                None
            }
            Err(e) => {
                tracing::error!(listing_id, error = %e, "MLS single listing lookup failed");
                None
            }
        }
    }

    /// Listings for one agent, by `ListAgentKey`.
    pub async fn get_agent_listings(&self, agent_key: &str) -> Result<ListingPage> {
        tracing::info!(agent_key, "Fetching agent listings");
        let page = self
            .get_listings(&ListingSearchParams {
                agent_key: Some(agent_key.to_string()),
                limit: Some(AGENT_LISTING_LIMIT),
                ..Default::default()
            })
            .await?;
        tracing::info!(count = page.listings.len(), "Fetched agent listings");
        Ok(page)
    }

    /// Free-text search over active listings' city and address.
    pub async fn search_listings(&self, text: &str) -> Result<ListingPage> {
        let url = format!("{}/Property", self.odata_url);
        let query = [
            ("$filter", filter::search_filter(text)),
            ("$top", SEARCH_LIMIT.to_string()),
            ("$orderby", "ListPrice desc".to_string()),
        ];

        match self.get_json::<ODataResponse<ResoProperty>>(&url, &query, true).await? {
            Fetched::Data(resp) => Ok(resp.into()),
            Fetched::RateLimited => {
                tracing::warn!("MLS rate limited search");
                Ok(ListingPage::rate_limited())
            }
        }
    }

    /// Photo media for one listing, throttled like every other call.
    pub async fn get_photos(&self, listing_key: &str) -> PhotoFetch {
        self.fetch_photos(listing_key, true).await
    }

    /// Fetch `Media` photos, retrying 429s on the photo backoff schedule.
    ///
    /// Retries skip the throttle; the backoff already spaces them out.
    async fn fetch_photos(&self, listing_key: &str, throttled: bool) -> PhotoFetch {
        let url = format!(
            "{}/Property({})/Media",
            self.odata_url,
            filter::quote(listing_key)
        );
        let query = [
            ("$filter", "MediaCategory eq 'Photo'".to_string()),
            ("$orderby", "Order".to_string()),
            ("$top", MEDIA_FETCH_LIMIT.to_string()),
        ];

        let mut retry = 0;
        let mut use_throttle = throttled;
        loop {
            match self
                .get_json::<ODataResponse<MediaItem>>(&url, &query, use_throttle)
                .await
            {
                Ok(Fetched::Data(resp)) => {
                    let mut photos: Vec<MediaItem> =
                        resp.value.into_iter().filter(MediaItem::is_photo).collect();
                    photos.sort_by_key(|m| m.order.unwrap_or(i64::MAX));
                    return PhotoFetch::Photos(photos);
                }
                Ok(Fetched::RateLimited) if retry < self.photo_retry.max_retries => {
                    let wait = self.photo_retry.delay_for(retry);
                    tracing::debug!(listing_key, retry, ?wait, "Media request rate limited, backing off");
                    tokio::time::sleep(wait).await;
                    retry += 1;
                    use_throttle = false;
                }
                Ok(Fetched::RateLimited) => {
                    tracing::warn!(
                        listing_key,
                        attempts = retry + 1,
                        "Rate limited on media after all retries"
                    );
                    return PhotoFetch::RateLimited;
                }
                Err(e) => {
                    tracing::warn!(listing_key, error = %e, "Media request failed");
                    return PhotoFetch::Photos(Vec::new());
                }
            }
        }
    }

    /// Photo URLs for many listings, served from the photo cache where possible.
    ///
    /// Misses are fetched `photo_batch_size` at a time with `photo_batch_delay`
    /// between batches. Only non-rate-limited results are cached, so a
    /// throttled listing is fetched again on the next call. The returned map
    /// only contains listings with at least one photo.
    pub async fn get_photos_for_listings(
        &self,
        listing_keys: &[String],
    ) -> HashMap<String, Vec<String>> {
        let mut photo_map = HashMap::new();
        let mut uncached = Vec::new();

        for key in listing_keys {
            match self.photo_cache.get(key) {
                Some(urls) => {
                    if !urls.is_empty() {
                        photo_map.insert(key.clone(), urls);
                    }
                }
                None => uncached.push(key.clone()),
            }
        }

        let hits = listing_keys.len() - uncached.len();
        if hits > 0 {
            tracing::debug!(hits, misses = uncached.len(), "Photo cache lookup");
        }

        let batches: Vec<&[String]> = uncached.chunks(self.photo_batch_size).collect();
        let batch_count = batches.len();

        for (i, batch) in batches.into_iter().enumerate() {
            let results = join_all(batch.iter().map(|key| async move {
                (key, self.fetch_photos(key, false).await)
            }))
            .await;

            for (key, fetch) in results {
                let urls = fetch.urls(PHOTOS_PER_LISTING);
                if !fetch.is_rate_limited() {
                    self.photo_cache.insert(key, urls.clone());
                }
                if !urls.is_empty() {
                    photo_map.insert(key.clone(), urls);
                }
            }

            if i + 1 < batch_count {
                tokio::time::sleep(self.photo_batch_delay).await;
            }
        }

        photo_map
    }
}
