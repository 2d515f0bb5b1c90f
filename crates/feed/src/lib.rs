//! CIMA `psuministro` feed client.
//!
//! Fetches the full shortage list from the registry's paginated REST
//! endpoint. The first page reveals the total row count; the remaining
//! pages are fetched in fixed-size concurrent batches, waiting for each
//! batch to complete before issuing the next.
//!
//! Failure model: the first page failing is fatal (there is nothing to
//! report on), but any later page failure — HTTP error status or transport
//! error — degrades to an empty page with a warning. The assembled feed is
//! therefore best-effort and its record count is a lower bound; callers
//! must treat it that way.

use chrono::Utc;
use futures_util::future::join_all;
use serde::Deserialize;
use tracing::{debug, info, warn};

use cimawatch_core::ShortageRecord;

/// Default public endpoint for the AEMPS shortage feed.
pub const DEFAULT_BASE_URL: &str = "https://cima.aemps.es/cima/rest/psuministro";

/// Rows per page; the API caps pages at 200 items.
pub const PAGE_SIZE: u64 = 200;

/// Pages fetched concurrently per batch.
pub const CONCURRENCY_LIMIT: usize = 5;

/// Errors from the feed client.
///
/// Only first-page problems surface here; later pages degrade silently.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("feed request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// One page of the upstream feed.
#[derive(Debug, Deserialize)]
struct FeedPage {
    #[serde(rename = "totalFilas", default)]
    total_rows: u64,
    #[serde(rename = "resultados", default)]
    results: Vec<ShortageRecord>,
}

/// The assembled shortage feed.
#[derive(Debug, Default)]
pub struct FeedBatch {
    /// All records fetched, flattened across pages, in page order.
    pub records: Vec<ShortageRecord>,
    /// Row count the API reported on page one. May exceed `records.len()`
    /// when pages failed mid-fetch.
    pub reported_total: u64,
}

/// Async client for the shortage feed.
#[derive(Clone)]
pub struct FeedClient {
    http: reqwest::Client,
    base_url: String,
}

impl FeedClient {
    /// Creates a client against the default AEMPS endpoint.
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Creates a client against a custom endpoint (tests, mirrors).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Fetches every page of the feed.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError`] only when the first page cannot be fetched or
    /// parsed; later pages degrade to empty results.
    pub async fn fetch_all(&self) -> Result<FeedBatch, FeedError> {
        // Cache-buster matching the upstream UI; the API sits behind a CDN
        // that otherwise serves stale pages.
        let cache_buster = Utc::now().timestamp_millis();

        let first: FeedPage = self
            .http
            .get(self.page_url(1, cache_buster))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let reported_total = first.total_rows;
        let mut records = first.results;

        if reported_total == 0 {
            return Ok(FeedBatch {
                records: Vec::new(),
                reported_total,
            });
        }

        let total_pages = total_pages(reported_total, PAGE_SIZE);
        info!(reported_total, total_pages, "fetching shortage feed");

        let remaining: Vec<u64> = (2..=total_pages).collect();
        for batch in remaining.chunks(CONCURRENCY_LIMIT) {
            let fetches = batch.iter().map(|&page| self.fetch_page(page, cache_buster));
            for page_records in join_all(fetches).await {
                records.extend(page_records);
            }
            debug!(
                fetched = records.len(),
                reported_total, "feed batch complete"
            );
        }

        if (records.len() as u64) < reported_total {
            warn!(
                fetched = records.len(),
                reported_total, "feed under-counted; some pages failed"
            );
        }

        Ok(FeedBatch {
            records,
            reported_total,
        })
    }

    /// Fetches one page, degrading any failure to an empty page.
    async fn fetch_page(&self, page: u64, cache_buster: i64) -> Vec<ShortageRecord> {
        let url = self.page_url(page, cache_buster);
        let response = match self.http.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(page, error = %e, "failed to fetch feed page");
                return Vec::new();
            }
        };
        if !response.status().is_success() {
            warn!(page, status = %response.status(), "feed page returned error status");
            return Vec::new();
        }
        match response.json::<FeedPage>().await {
            Ok(parsed) => parsed.results,
            Err(e) => {
                warn!(page, error = %e, "failed to parse feed page");
                Vec::new()
            }
        }
    }

    fn page_url(&self, page: u64, cache_buster: i64) -> String {
        format!(
            "{}?pagina={page}&tamanioPagina={PAGE_SIZE}&t={cache_buster}",
            self.base_url
        )
    }
}

impl Default for FeedClient {
    fn default() -> Self {
        Self::new()
    }
}

fn total_pages(total_rows: u64, page_size: u64) -> u64 {
    total_rows.div_ceil(page_size)
}
