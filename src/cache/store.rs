//! In-memory page cache with a single TTL clock
//!
//! Holds the raw HTML of the upstream dashboard plus three derived entries
//! (rows, names, graph links). Only the document carries a timestamp; the
//! derived entries are valid exactly as long as the document they were parsed
//! from and are dropped whenever a new document is stored.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::data::PollenRow;

/// The raw upstream document together with its fetch time
#[derive(Debug)]
struct CachedDocument {
    /// Raw HTML of the dashboard page
    html: Arc<str>,
    /// When the page was fetched; the TTL clock for every cache entry
    fetched_at: Instant,
}

/// In-memory cache for one scraped dashboard page
///
/// The cache is not synchronized itself; the owning client guards it with a
/// mutex since request handlers share a single instance.
#[derive(Debug)]
pub struct PageCache {
    /// How long a fetched document stays fresh
    ttl: Duration,
    /// Raw document, if one has been fetched
    document: Option<CachedDocument>,
    /// Rows parsed from the document
    rows: Option<Vec<PollenRow>>,
    /// Pollen names in row order, derived alongside the rows
    names: Option<Vec<String>>,
    /// Graph page links extracted from the document's anchors
    graph_links: Option<Vec<String>>,
}

impl PageCache {
    /// Creates an empty cache whose entries expire `ttl` after each fetch
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            document: None,
            rows: None,
            names: None,
            graph_links: None,
        }
    }

    /// Returns the cached document if it is still within its TTL
    pub fn fresh_document(&self) -> Option<Arc<str>> {
        self.document
            .as_ref()
            .filter(|doc| doc.fetched_at.elapsed() < self.ttl)
            .map(|doc| Arc::clone(&doc.html))
    }

    /// Stores a freshly fetched document and restarts the TTL clock
    ///
    /// Every derived entry is dropped unconditionally: it was parsed from the
    /// previous document and must be rebuilt from this one.
    pub fn store_document(&mut self, html: Arc<str>) {
        self.document = Some(CachedDocument {
            html,
            fetched_at: Instant::now(),
        });
        self.rows = None;
        self.names = None;
        self.graph_links = None;
    }

    /// Returns the cached row list, if present
    pub fn rows(&self) -> Option<&[PollenRow]> {
        self.rows.as_deref()
    }

    /// Stores parsed rows and derives the name list from them
    pub fn store_rows(&mut self, rows: Vec<PollenRow>) {
        self.names = Some(rows.iter().map(|row| row.name.clone()).collect());
        self.rows = Some(rows);
    }

    /// Returns the cached name list, if present
    pub fn names(&self) -> Option<&[String]> {
        self.names.as_deref()
    }

    /// Returns the cached graph links, if present
    pub fn graph_links(&self) -> Option<&[String]> {
        self.graph_links.as_deref()
    }

    /// Stores extracted graph links
    pub fn store_graph_links(&mut self, links: Vec<String>) {
        self.graph_links = Some(links);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, total: u32) -> PollenRow {
        PollenRow {
            name: name.to_string(),
            columns: vec![String::new(), name.to_string(), total.to_string()],
            total,
        }
    }

    #[test]
    fn test_empty_cache_has_no_document() {
        let cache = PageCache::new(Duration::from_secs(900));
        assert!(cache.fresh_document().is_none());
        assert!(cache.rows().is_none());
        assert!(cache.names().is_none());
        assert!(cache.graph_links().is_none());
    }

    #[test]
    fn test_stored_document_is_fresh_within_ttl() {
        let mut cache = PageCache::new(Duration::from_secs(900));
        cache.store_document(Arc::from("<html></html>"));

        let doc = cache.fresh_document().expect("document should be fresh");
        assert_eq!(&*doc, "<html></html>");
    }

    #[test]
    fn test_zero_ttl_expires_immediately() {
        let mut cache = PageCache::new(Duration::ZERO);
        cache.store_document(Arc::from("<html></html>"));

        assert!(cache.fresh_document().is_none());
    }

    #[test]
    fn test_store_document_drops_all_derived_entries() {
        let mut cache = PageCache::new(Duration::from_secs(900));
        cache.store_document(Arc::from("first"));
        cache.store_rows(vec![row("Grassen", 42)]);
        cache.store_graph_links(vec!["PollenGrafiek1.html".to_string()]);

        cache.store_document(Arc::from("second"));

        assert!(cache.rows().is_none());
        assert!(cache.names().is_none());
        assert!(cache.graph_links().is_none());
    }

    #[test]
    fn test_store_rows_derives_name_list_in_row_order() {
        let mut cache = PageCache::new(Duration::from_secs(900));
        cache.store_rows(vec![row("Grassen", 42), row("Berk", 7)]);

        let names = cache.names().expect("names should be derived");
        assert_eq!(names, ["Grassen", "Berk"]);
    }

    #[test]
    fn test_expired_document_leaves_derived_entries_untouched() {
        // Derived entries carry no clock of their own; freshness is gated
        // entirely by the document check the client performs first.
        let mut cache = PageCache::new(Duration::ZERO);
        cache.store_document(Arc::from("<html></html>"));
        cache.store_rows(vec![row("Els", 0)]);

        assert!(cache.fresh_document().is_none());
        assert!(cache.rows().is_some());
    }
}
