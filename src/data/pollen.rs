//! Scraping client for the LUMC pollen dashboard
//!
//! This module fetches the dashboard page, parses the pollen table and the
//! history graph links out of it, and answers queries by pollen name. Results
//! are cached in memory for a short TTL to avoid hammering the upstream site.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use scraper::{Html, Selector};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::PollenRow;
use crate::cache::PageCache;

/// Default base URL of the upstream dashboard
pub const DEFAULT_BASE_URL: &str = "https://sec.lumc.nl/pollenwebextern/";

/// User agent sent with every upstream request
const USER_AGENT: &str = "Mozilla/5.0 (compatible; LUMCPollenBot/1.0; +https://example.local)";

/// Substring identifying a history graph page link
const GRAPH_PAGE_MARKER: &str = "PollenGrafiek";

/// Substring identifying the image variant of a graph page
const GRAPH_IMAGE_MARKER: &str = "PollenGrafiekImg";

/// File extension of graph pages
const GRAPH_PAGE_EXT: &str = ".html";

/// File extension of graph images
const GRAPH_IMAGE_EXT: &str = ".png";

/// Errors that can occur when querying the dashboard
#[derive(Debug, Error)]
pub enum PollenError {
    /// The requested pollen name has no matching table row or graph link
    #[error("pollen '{0}' not found")]
    NotFound(String),

    /// HTTP request failed (transport error or non-2xx upstream status)
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
}

/// Client for the LUMC pollen dashboard
///
/// Holds one [`PageCache`] behind an async mutex; request handlers share a
/// single client instance, and the lock is held across the upstream fetch so
/// concurrent callers cannot trigger duplicate fetches within one TTL window.
#[derive(Debug)]
pub struct PollenClient {
    /// HTTP client for upstream requests
    http: Client,
    /// Base URL of the dashboard; always ends with a slash
    base_url: String,
    /// Cached page and derived data
    cache: Mutex<PageCache>,
}

impl PollenClient {
    /// Creates a new client for the dashboard at `base_url`
    ///
    /// # Arguments
    /// * `base_url` - Upstream base URL; graph links are joined to it by
    ///   concatenation, so it should end with a slash
    /// * `ttl` - How long a fetched page stays cached
    /// * `timeout` - Timeout applied to every upstream request
    ///
    /// # Returns
    /// * `Ok(PollenClient)` if the underlying HTTP client could be built
    /// * `Err(PollenError)` otherwise
    pub fn new(
        base_url: impl Into<String>,
        ttl: Duration,
        timeout: Duration,
    ) -> Result<Self, PollenError> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            cache: Mutex::new(PageCache::new(ttl)),
        })
    }

    /// Returns the name of every pollen row, in table order
    pub async fn list_names(&self) -> Result<Vec<String>, PollenError> {
        let mut cache = self.cache.lock().await;
        self.ensure_rows(&mut cache).await?;
        Ok(cache.names().unwrap_or_default().to_vec())
    }

    /// Returns all parsed table rows, in table order
    pub async fn get_table(&self) -> Result<Vec<PollenRow>, PollenError> {
        let mut cache = self.cache.lock().await;
        self.ensure_rows(&mut cache).await?;
        Ok(cache.rows().unwrap_or_default().to_vec())
    }

    /// Returns the total for the given pollen name
    ///
    /// The name is matched case-insensitively against the table rows.
    ///
    /// # Returns
    /// * `Ok(u32)` - The row's total
    /// * `Err(PollenError::NotFound)` - If no row matches the name
    pub async fn get_total(&self, name: &str) -> Result<u32, PollenError> {
        let mut cache = self.cache.lock().await;
        let index = self.find_name_index(&mut cache, name).await?;
        cache
            .rows()
            .and_then(|rows| rows.get(index))
            .map(|row| row.total)
            .ok_or_else(|| PollenError::NotFound(name.to_string()))
    }

    /// Returns the absolute URL of the history graph image for a pollen name
    ///
    /// The row index of the matched name selects the graph link at the same
    /// position; the upstream page offers no name-based join between the
    /// table and the links, so the positional correspondence is assumed.
    ///
    /// # Returns
    /// * `Ok(String)` - Absolute image URL
    /// * `Err(PollenError::NotFound)` - If the name is unknown or the matched
    ///   index has no corresponding graph link
    pub async fn get_history_graph_url(&self, name: &str) -> Result<String, PollenError> {
        let mut cache = self.cache.lock().await;
        let index = self.find_name_index(&mut cache, name).await?;
        self.ensure_graph_links(&mut cache).await?;

        let link = cache
            .graph_links()
            .and_then(|links| links.get(index))
            .cloned()
            .ok_or_else(|| PollenError::NotFound(name.to_string()))?;

        Ok(image_url(&self.base_url, &link))
    }

    /// Fetches the history graph image for a pollen name
    ///
    /// # Returns
    /// * `Ok(Vec<u8>)` - Raw image bytes as served by the upstream site
    /// * `Err(PollenError)` - If the name cannot be resolved or the fetch fails
    pub async fn get_history_graph_png(&self, name: &str) -> Result<Vec<u8>, PollenError> {
        let url = self.get_history_graph_url(name).await?;
        debug!(%url, "fetching history graph image");

        let response = self.http.get(&url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }

    /// Returns the cached document, fetching a fresh copy if it expired
    ///
    /// Storing the fresh copy drops every derived cache entry, so rows, names
    /// and graph links are rebuilt from the new page on their next access.
    async fn fresh_document(&self, cache: &mut PageCache) -> Result<Arc<str>, PollenError> {
        if let Some(html) = cache.fresh_document() {
            debug!("serving dashboard page from cache");
            return Ok(html);
        }

        info!(url = %self.base_url, "fetching dashboard page");
        let response = self
            .http
            .get(&self.base_url)
            .send()
            .await?
            .error_for_status()?;
        let body = response.text().await?;

        let html: Arc<str> = Arc::from(body);
        cache.store_document(Arc::clone(&html));
        Ok(html)
    }

    /// Makes sure the row list (and the derived name list) is cached
    async fn ensure_rows(&self, cache: &mut PageCache) -> Result<(), PollenError> {
        let html = self.fresh_document(cache).await?;
        if cache.rows().is_none() {
            cache.store_rows(parse_rows(&html));
        }
        Ok(())
    }

    /// Makes sure the graph link list is cached
    async fn ensure_graph_links(&self, cache: &mut PageCache) -> Result<(), PollenError> {
        let html = self.fresh_document(cache).await?;
        if cache.graph_links().is_none() {
            cache.store_graph_links(parse_graph_links(&html));
        }
        Ok(())
    }

    /// Resolves a pollen name to its row index, case-insensitively
    async fn find_name_index(
        &self,
        cache: &mut PageCache,
        name: &str,
    ) -> Result<usize, PollenError> {
        self.ensure_rows(cache).await?;

        let needle = name.to_lowercase();
        cache
            .names()
            .and_then(|names| names.iter().position(|n| n.to_lowercase() == needle))
            .ok_or_else(|| PollenError::NotFound(name.to_string()))
    }
}

/// Parses the pollen table out of the dashboard page
///
/// A missing `PollenTabel` table yields an empty list, not an error. Rows
/// without `<td>` cells are skipped, which also skips the header row.
fn parse_rows(html: &str) -> Vec<PollenRow> {
    let document = Html::parse_document(html);
    let table_selector = Selector::parse("table#PollenTabel").expect("Invalid table selector");
    let row_selector = Selector::parse("tr").expect("Invalid row selector");
    let cell_selector = Selector::parse("td").expect("Invalid cell selector");

    let Some(table) = document.select(&table_selector).next() else {
        return Vec::new();
    };

    let mut rows = Vec::new();
    for tr in table.select(&row_selector) {
        let cells: Vec<String> = tr
            .select(&cell_selector)
            .map(|td| td.text().collect::<String>().trim().to_string())
            .collect();
        if cells.is_empty() {
            continue;
        }

        // First cell holds a pictogram; the name lives in the second cell.
        let Some(name) = cells.get(1).cloned() else {
            continue;
        };
        let total = cells.last().map(|cell| parse_total(cell)).unwrap_or(0);

        rows.push(PollenRow {
            name,
            columns: cells,
            total,
        });
    }
    rows
}

/// Extracts the history graph page links from the dashboard page
///
/// Keeps every anchor href containing the graph page marker and ending in the
/// page extension, in document order.
fn parse_graph_links(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let anchor_selector = Selector::parse("a[href]").expect("Invalid anchor selector");

    document
        .select(&anchor_selector)
        .filter_map(|anchor| anchor.value().attr("href"))
        .filter(|href| href.contains(GRAPH_PAGE_MARKER) && href.ends_with(GRAPH_PAGE_EXT))
        .map(str::to_string)
        .collect()
}

/// Parses a total cell into a count
///
/// Tries a direct integer parse first; on failure strips every non-digit
/// character and parses the remainder, defaulting to 0 if nothing is left.
fn parse_total(raw: &str) -> u32 {
    if let Ok(total) = raw.parse::<u32>() {
        return total;
    }
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    digits.parse().unwrap_or(0)
}

/// Builds the absolute image URL for a graph page link
///
/// The link is joined to the base URL by concatenation, then rewritten from
/// the graph page to its image variant.
fn image_url(base_url: &str, link: &str) -> String {
    format!("{base_url}{link}")
        .replace(GRAPH_PAGE_EXT, GRAPH_IMAGE_EXT)
        .replace(GRAPH_PAGE_MARKER, GRAPH_IMAGE_MARKER)
}
