//! Client behaviour against a local stand-in for the MLS replication API.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use reso_client::{
    ListingSearchParams, ManualClock, PhotoFetch, ResoClient, ResoClientOptions, ResoError,
    RetryPolicy, ScanOptions, DEFAULT_PHOTO_CACHE_TTL,
};

#[derive(Debug, Clone)]
struct Seen {
    path: String,
    query: HashMap<String, String>,
    auth: Option<String>,
}

/// Scripted MLS: serves `properties` with `$top`/`$skip` paging and per-key media.
#[derive(Default)]
struct MockMls {
    properties: Vec<Value>,
    property_status: Option<StatusCode>,
    media: HashMap<String, Vec<Value>>,
    throttled_media: HashSet<String>,
    seen: Mutex<Vec<Seen>>,
}

impl MockMls {
    fn requests(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }

    fn media_requests(&self, key: &str) -> usize {
        let path = format!("Property('{key}')/Media");
        self.requests().iter().filter(|s| s.path == path).count()
    }
}

async fn odata(
    State(mock): State<Arc<MockMls>>,
    Path(path): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let path = path.trim_start_matches('/').to_string();
    let auth = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    mock.seen.lock().unwrap().push(Seen {
        path: path.clone(),
        query: query.clone(),
        auth,
    });

    if let Some(key) = path
        .strip_prefix("Property('")
        .and_then(|p| p.strip_suffix("')/Media"))
    {
        if mock.throttled_media.contains(key) {
            return StatusCode::TOO_MANY_REQUESTS.into_response();
        }
        let value = mock.media.get(key).cloned().unwrap_or_default();
        return Json(json!({ "value": value })).into_response();
    }

    if let Some(status) = mock.property_status {
        return (status, "upstream failure").into_response();
    }

    let skip = query
        .get("$skip")
        .and_then(|s| s.parse().ok())
        .unwrap_or(0usize);
    let top = query
        .get("$top")
        .and_then(|s| s.parse().ok())
        .unwrap_or(20usize);
    let value: Vec<Value> = mock.properties.iter().skip(skip).take(top).cloned().collect();
    Json(json!({ "@odata.context": "$metadata#Property", "value": value })).into_response()
}

async fn spawn(mock: MockMls) -> (String, Arc<MockMls>) {
    let mock = Arc::new(mock);
    let app = Router::new()
        .route("/Reso/OData/*path", get(odata))
        .with_state(mock.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), mock)
}

fn fast_options(base_url: &str) -> ResoClientOptions {
    ResoClientOptions {
        min_request_interval: Duration::ZERO,
        photo_retry: RetryPolicy::new(2, Duration::from_millis(5)),
        photo_batch_delay: Duration::from_millis(1),
        ..ResoClientOptions::new(base_url, Some("test-token".to_string()))
    }
}

fn property(key: &str, office: &str) -> Value {
    json!({
        "ListingKey": key,
        "ListingId": format!("RX-{key}"),
        "StandardStatus": "Active",
        "ListOfficeName": office,
        "ListPrice": 950000,
    })
}

fn photo(url: &str, order: i64) -> Value {
    json!({ "MediaURL": url, "MimeType": "image/jpeg", "MediaCategory": "Photo", "Order": order })
}

#[tokio::test]
async fn test_rate_limited_search_returns_flagged_empty_page() {
    let (url, _mock) = spawn(MockMls {
        property_status: Some(StatusCode::TOO_MANY_REQUESTS),
        ..Default::default()
    })
    .await;
    let client = ResoClient::new(fast_options(&url)).unwrap();

    let page = client
        .get_listings(&ListingSearchParams::default())
        .await
        .unwrap();

    assert!(page.rate_limited);
    assert!(page.is_empty());
}

#[tokio::test]
async fn test_server_error_is_returned_as_api_error() {
    let (url, _mock) = spawn(MockMls {
        property_status: Some(StatusCode::INTERNAL_SERVER_ERROR),
        ..Default::default()
    })
    .await;
    let client = ResoClient::new(fast_options(&url)).unwrap();

    let err = client
        .get_listings(&ListingSearchParams::default())
        .await
        .unwrap_err();

    assert!(matches!(err, ResoError::Api { status: 500, .. }));
}

#[tokio::test]
async fn test_agent_listings_query_and_auth() {
    let (url, mock) = spawn(MockMls {
        properties: vec![property("A1", "Partnership Realty")],
        ..Default::default()
    })
    .await;
    let client = ResoClient::new(fast_options(&url)).unwrap();

    let page = client.get_agent_listings("AGENT-7").await.unwrap();
    assert_eq!(page.listings.len(), 1);
    assert_eq!(page.listings[0].listing_key, "A1");

    let seen = mock.requests();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].path, "Property");
    assert_eq!(seen[0].auth.as_deref(), Some("Bearer test-token"));
    assert_eq!(
        seen[0].query.get("$filter").map(String::as_str),
        Some("StandardStatus eq 'Active' and ListAgentKey eq 'AGENT-7'")
    );
    assert_eq!(seen[0].query.get("$top").map(String::as_str), Some("50"));
}

#[tokio::test]
async fn test_listing_by_id_swallows_failures() {
    let (url, _mock) = spawn(MockMls {
        property_status: Some(StatusCode::INTERNAL_SERVER_ERROR),
        ..Default::default()
    })
    .await;
    let client = ResoClient::new(fast_options(&url)).unwrap();

    assert!(client.get_listing_by_id("RX-1").await.is_none());
}

#[tokio::test]
async fn test_listing_by_id_found() {
    let (url, mock) = spawn(MockMls {
        properties: vec![property("K9", "Elsewhere")],
        ..Default::default()
    })
    .await;
    let client = ResoClient::new(fast_options(&url)).unwrap();

    let found = client.get_listing_by_id("RX-K9").await.unwrap();
    assert_eq!(found.listing_key, "K9");
    assert_eq!(
        mock.requests()[0].query.get("$filter").map(String::as_str),
        Some("ListingId eq 'RX-K9'")
    );
}

#[tokio::test]
async fn test_search_orders_by_price() {
    let (url, mock) = spawn(MockMls::default()).await;
    let client = ResoClient::new(fast_options(&url)).unwrap();

    let page = client.search_listings("Jupiter").await.unwrap();
    assert!(page.is_empty());
    assert!(!page.rate_limited);

    let seen = &mock.requests()[0];
    assert_eq!(seen.query.get("$top").map(String::as_str), Some("20"));
    assert_eq!(
        seen.query.get("$orderby").map(String::as_str),
        Some("ListPrice desc")
    );
}

#[tokio::test]
async fn test_photos_drop_documents_and_sort_by_order() {
    let mut media = HashMap::new();
    media.insert(
        "P1".to_string(),
        vec![
            photo("https://cdn.example.org/2.jpg", 2),
            photo("https://cdn.example.org/floorplan.pdf", 0),
            photo("https://cdn.example.org/1.jpg", 1),
        ],
    );
    let (url, _mock) = spawn(MockMls {
        media,
        ..Default::default()
    })
    .await;
    let client = ResoClient::new(fast_options(&url)).unwrap();

    let fetch = client.get_photos("P1").await;
    assert_eq!(
        fetch.urls(10),
        vec![
            "https://cdn.example.org/1.jpg".to_string(),
            "https://cdn.example.org/2.jpg".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_photos_retry_then_report_rate_limited() {
    let (url, mock) = spawn(MockMls {
        throttled_media: HashSet::from(["SLOW".to_string()]),
        ..Default::default()
    })
    .await;
    let client = ResoClient::new(fast_options(&url)).unwrap();

    let fetch = client.get_photos("SLOW").await;

    assert_eq!(fetch, PhotoFetch::RateLimited);
    // One attempt plus two retries
    assert_eq!(mock.media_requests("SLOW"), 3);
}

#[tokio::test]
async fn test_batch_photos_cache_successes_only() {
    let mut media = HashMap::new();
    media.insert(
        "OK".to_string(),
        (0..6)
            .map(|i| photo(&format!("https://cdn.example.org/ok-{i}.jpg"), i))
            .collect(),
    );
    let (url, mock) = spawn(MockMls {
        media,
        throttled_media: HashSet::from(["SLOW".to_string()]),
        ..Default::default()
    })
    .await;
    let client = ResoClient::new(ResoClientOptions {
        photo_retry: RetryPolicy::none(),
        ..fast_options(&url)
    })
    .unwrap();
    let keys = vec!["OK".to_string(), "SLOW".to_string(), "BARE".to_string()];

    let first = client.get_photos_for_listings(&keys).await;
    assert_eq!(first.get("OK").map(Vec::len), Some(4));
    assert!(!first.contains_key("SLOW"));
    assert!(!first.contains_key("BARE"));

    let second = client.get_photos_for_listings(&keys).await;
    assert_eq!(second.get("OK"), first.get("OK"));

    assert_eq!(mock.media_requests("OK"), 1);
    // No photos is a cacheable answer
    assert_eq!(mock.media_requests("BARE"), 1);
    // Rate limited is not
    assert_eq!(mock.media_requests("SLOW"), 2);
    assert_eq!(client.photo_cache().get("SLOW"), None);
}

#[tokio::test]
async fn test_photo_cache_expires() {
    let mut media = HashMap::new();
    media.insert(
        "OK".to_string(),
        vec![photo("https://cdn.example.org/ok.jpg", 1)],
    );
    let (url, mock) = spawn(MockMls {
        media,
        ..Default::default()
    })
    .await;
    let clock = ManualClock::new();
    let client = ResoClient::with_clock(fast_options(&url), Arc::new(clock.clone())).unwrap();
    let keys = vec!["OK".to_string()];

    client.get_photos_for_listings(&keys).await;
    clock.advance(DEFAULT_PHOTO_CACHE_TTL - Duration::from_secs(1));
    client.get_photos_for_listings(&keys).await;
    assert_eq!(mock.media_requests("OK"), 1);

    clock.advance(Duration::from_secs(2));
    client.get_photos_for_listings(&keys).await;
    assert_eq!(mock.media_requests("OK"), 2);
}

fn scan_options(page_size: u32) -> ScanOptions {
    ScanOptions {
        page_size,
        page_delay: Duration::from_millis(1),
        rate_limit_retry: RetryPolicy::new(1, Duration::from_millis(5)),
        ..Default::default()
    }
}

fn mixed_offices() -> Vec<Value> {
    vec![
        property("1", "Partnership Realty"),
        property("2", "Compass"),
        property("3", "PARTNERSHIP REALTY INC"),
        property("4", "Keller Williams"),
        property("5", "Compass"),
        property("6", "The Partnership Group"),
        property("7", "Douglas Elliman"),
    ]
}

#[tokio::test]
async fn test_office_scan_pages_until_short_page() {
    let (url, mock) = spawn(MockMls {
        properties: mixed_offices(),
        ..Default::default()
    })
    .await;
    let client = ResoClient::new(fast_options(&url)).unwrap();

    let scan = client
        .get_office_listings("partnership", &scan_options(3), &CancellationToken::new())
        .await
        .unwrap();

    assert!(scan.complete);
    assert_eq!(scan.scanned, 7);
    let keys: Vec<&str> = scan.listings.iter().map(|l| l.listing_key.as_str()).collect();
    assert_eq!(keys, vec!["1", "3", "6"]);

    let skips: Vec<Option<String>> = mock
        .requests()
        .iter()
        .map(|s| s.query.get("$skip").cloned())
        .collect();
    assert_eq!(skips, vec![None, Some("3".into()), Some("6".into())]);
}

#[tokio::test]
async fn test_office_scan_respects_record_cap() {
    let (url, mock) = spawn(MockMls {
        properties: mixed_offices(),
        ..Default::default()
    })
    .await;
    let client = ResoClient::new(fast_options(&url)).unwrap();
    let options = ScanOptions {
        max_records: 4,
        ..scan_options(2)
    };

    let scan = client
        .get_office_listings("partnership", &options, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(scan.scanned, 4);
    assert_eq!(mock.requests().len(), 2);
}

#[tokio::test]
async fn test_office_scan_cancelled() {
    let (url, _mock) = spawn(MockMls {
        properties: mixed_offices(),
        ..Default::default()
    })
    .await;
    let client = ResoClient::new(fast_options(&url)).unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = client
        .get_office_listings("partnership", &scan_options(3), &cancel)
        .await;

    assert!(matches!(result, Err(ResoError::Cancelled)));
}

#[tokio::test]
async fn test_office_scan_deadline_returns_partial() {
    let (url, _mock) = spawn(MockMls {
        properties: mixed_offices(),
        ..Default::default()
    })
    .await;
    let client = ResoClient::new(fast_options(&url)).unwrap();
    let options = ScanOptions {
        deadline: Some(Duration::ZERO),
        ..scan_options(3)
    };

    let scan = client
        .get_office_listings("partnership", &options, &CancellationToken::new())
        .await
        .unwrap();

    assert!(!scan.complete);
    assert_eq!(scan.scanned, 3);
    assert_eq!(scan.listings.len(), 2);
}

#[tokio::test]
async fn test_office_scan_gives_up_when_rate_limited() {
    let (url, mock) = spawn(MockMls {
        property_status: Some(StatusCode::TOO_MANY_REQUESTS),
        ..Default::default()
    })
    .await;
    let client = ResoClient::new(fast_options(&url)).unwrap();

    let scan = client
        .get_office_listings("partnership", &scan_options(3), &CancellationToken::new())
        .await
        .unwrap();

    assert!(!scan.complete);
    assert!(scan.listings.is_empty());
    // One attempt plus one retry
    assert_eq!(mock.requests().len(), 2);
}
