//! Brokerage-wide office scan.
//!
//! The MLS `ListOfficeName` filter is unreliable, so brokerage listings are
//! found by paging through every active listing and matching the office name
//! client-side. On a large MLS this takes minutes, so the scan is exposed as a
//! stream of pages the caller can stop at any time, plus a collecting wrapper
//! that honours a cancellation token and a deadline.

use std::pin::Pin;
use std::time::{Duration, Instant};

use async_stream::try_stream;
use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::error::{ResoError, Result};
use crate::throttle::RetryPolicy;
use crate::types::{ListingSearchParams, OfficeScan, ResoProperty};
use crate::ResoClient;

/// Office scan bounds.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub page_size: u32,
    /// Hard cap on rows inspected
    pub max_records: u32,
    /// Pause between pages
    pub page_delay: Duration,
    /// Stop collecting after this long and return what was found
    pub deadline: Option<Duration>,
    /// Backoff for a rate-limited page before the scan gives up
    pub rate_limit_retry: RetryPolicy,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            page_size: 500,
            max_records: 50_000,
            page_delay: Duration::from_millis(200),
            deadline: None,
            rate_limit_retry: RetryPolicy::default(),
        }
    }
}

/// One scanned page.
#[derive(Debug, Clone, Default)]
pub struct ScanPage {
    pub offset: u32,
    /// Rows the MLS returned for this page
    pub scanned: usize,
    /// Rows whose office name matched
    pub matches: Vec<ResoProperty>,
    /// The page stayed rate limited after all retries; the stream ends here
    pub rate_limited: bool,
}

pub type ScanStream<'a> = Pin<Box<dyn Stream<Item = Result<ScanPage>> + Send + 'a>>;

impl ResoClient {
    /// Stream every active listing page, keeping rows whose office name
    /// contains `office_name` (case-insensitive).
    ///
    /// The stream ends at the first short page, at `max_records`, or after a
    /// page that is still rate limited once its retries are spent.
    pub fn office_listing_pages<'a>(
        &'a self,
        office_name: &str,
        options: &ScanOptions,
    ) -> ScanStream<'a> {
        let needle = office_name.to_lowercase();
        let options = options.clone();

        Box::pin(try_stream! {
            let mut offset = 0u32;

            while offset < options.max_records {
                let params = ListingSearchParams {
                    limit: Some(options.page_size),
                    offset: Some(offset),
                    ..Default::default()
                };

                let mut retry = 0;
                let page = loop {
                    let page = self.get_listings(&params).await?;
                    if !page.rate_limited || retry >= options.rate_limit_retry.max_retries {
                        break page;
                    }
                    tokio::time::sleep(options.rate_limit_retry.delay_for(retry)).await;
                    retry += 1;
                };

                if page.rate_limited {
                    tracing::warn!(offset, "Office scan page still rate limited, stopping scan");
                    yield ScanPage {
                        offset,
                        rate_limited: true,
                        ..Default::default()
                    };
                    break;
                }

                if page.listings.is_empty() {
                    break;
                }

                let scanned = page.listings.len();
                let matches: Vec<ResoProperty> = page
                    .listings
                    .into_iter()
                    .filter(|l| l.office_matches(&needle))
                    .collect();

                yield ScanPage {
                    offset,
                    scanned,
                    matches,
                    rate_limited: false,
                };

                if scanned < options.page_size as usize {
                    break;
                }

                offset += options.page_size;
                tokio::time::sleep(options.page_delay).await;
            }
        })
    }

    /// Collect all listings for an office.
    ///
    /// Cancelling `cancel` aborts with [`ResoError::Cancelled`]. Hitting the
    /// deadline, or persistent rate limiting, returns the matches found so far
    /// with `complete = false`.
    pub async fn get_office_listings(
        &self,
        office_name: &str,
        options: &ScanOptions,
        cancel: &CancellationToken,
    ) -> Result<OfficeScan> {
        tracing::info!(office_name, "Scanning MLS listings for office");

        let started = Instant::now();
        let mut pages = self.office_listing_pages(office_name, options);
        let mut scan = OfficeScan {
            complete: true,
            ..Default::default()
        };

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::warn!(scanned = scan.scanned, "Office scan cancelled");
                    return Err(ResoError::Cancelled);
                }
                next = pages.next() => next,
            };

            let Some(page) = next else { break };
            let page = page?;

            if page.rate_limited {
                scan.complete = false;
                break;
            }

            scan.scanned += page.scanned;
            scan.listings.extend(page.matches);

            if page.offset > 0 && page.offset % 5000 == 0 {
                tracing::info!(
                    scanned = scan.scanned,
                    found = scan.listings.len(),
                    office_name,
                    "Office scan progress"
                );
            }

            if let Some(deadline) = options.deadline {
                if started.elapsed() >= deadline {
                    tracing::warn!(
                        scanned = scan.scanned,
                        found = scan.listings.len(),
                        ?deadline,
                        "Office scan deadline reached, returning partial results"
                    );
                    scan.complete = false;
                    break;
                }
            }
        }

        tracing::info!(
            office_name,
            found = scan.listings.len(),
            scanned = scan.scanned,
            complete = scan.complete,
            "Office scan finished"
        );
        Ok(scan)
    }
}
