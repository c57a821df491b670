//! Query-to-page pipeline: cache lookup, then fetch and extract on a miss.
//!
//! Page position lives entirely in `(query, offset)`. `open` starts at zero,
//! `next` and `previous` step by one page, and `previous` from the first page
//! stays on the first page.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use thiserror::Error;
use tracing::debug;

use crate::clients::{FetchError, Fetcher};
use crate::constants::PAGE_LIMIT;
use crate::domain::{Cursor, CursorError, InvalidQuery, Offset, Query};
use crate::models::{ImageResult, Page};
use crate::parser;
use crate::services::cache::ResultCache;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageError {
    #[error("Invalid query: {0}")]
    InvalidQuery(#[from] InvalidQuery),

    #[error("Invalid cursor: {0}")]
    InvalidCursor(#[from] CursorError),

    #[error("Retrieval failed: {0}")]
    RetrievalFailed(#[from] FetchError),
}

type FlightKey = (Query, Offset);

pub struct Paginator {
    fetcher: Arc<dyn Fetcher>,

    cache: Arc<ResultCache>,

    /// One gate per key with a request in progress; a second request for the
    /// same key waits on it and then reads the cache.
    in_flight: Mutex<HashMap<FlightKey, Weak<tokio::sync::Mutex<()>>>>,
}

impl Paginator {
    #[must_use]
    pub fn new(fetcher: Arc<dyn Fetcher>, cache: Arc<ResultCache>) -> Self {
        Self {
            fetcher,
            cache,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub const fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    #[must_use]
    pub fn provider(&self) -> &'static str {
        self.fetcher.name()
    }

    /// First page for `query`.
    pub async fn open(&self, query: &str) -> Result<Page, PageError> {
        let query = Query::parse(query)?;
        self.load(query, Offset::ZERO).await
    }

    /// Page after the one at `offset`. Offsets between page boundaries are
    /// rounded down first.
    pub async fn next(&self, query: &str, offset: u32) -> Result<Page, PageError> {
        let query = Query::parse(query)?;
        self.load(query, Offset::aligned(offset).next()).await
    }

    /// Page before the one at `offset`, never going below zero.
    pub async fn previous(&self, query: &str, offset: u32) -> Result<Page, PageError> {
        let query = Query::parse(query)?;
        self.load(query, Offset::aligned(offset).previous()).await
    }

    /// Load the page a cursor names.
    pub async fn resolve(&self, cursor: &str) -> Result<Page, PageError> {
        let (query, offset) = Cursor::decode(cursor)?.into_parts();
        self.load(query, offset).await
    }

    /// Load the page at `(query, offset)`, from cache when possible.
    ///
    /// A failed fetch is returned as [`PageError::RetrievalFailed`] and
    /// leaves the cache untouched; no retry happens here.
    pub async fn load(&self, query: Query, offset: Offset) -> Result<Page, PageError> {
        let gate = self.gate_for(&query, offset);
        let _in_flight = gate.lock().await;

        if let Some(results) = self.cache.get(&query, offset) {
            debug!(query = %query, offset = %offset, "Serving page from cache");
            return Ok(Page::assemble(query, offset, results, true));
        }

        debug!(
            query = %query,
            offset = %offset,
            provider = self.fetcher.name(),
            "Cache miss, fetching"
        );
        let raw = self.fetcher.fetch(&query, offset).await?;

        let results: Arc<[ImageResult]> = parser::extract(&raw, PAGE_LIMIT).into();
        self.cache.put(&query, offset, Arc::clone(&results));

        Ok(Page::assemble(query, offset, results, false))
    }

    fn gate_for(&self, query: &Query, offset: Offset) -> Arc<tokio::sync::Mutex<()>> {
        let mut in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        in_flight.retain(|_, gate| gate.strong_count() > 0);

        let key = (query.clone(), offset);
        if let Some(gate) = in_flight.get(&key).and_then(Weak::upgrade) {
            return gate;
        }

        let gate = Arc::new(tokio::sync::Mutex::new(()));
        in_flight.insert(key, Arc::downgrade(&gate));
        gate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{RawResponse, ResponseFormat};
    use std::time::Duration;

    struct StaticFetcher;

    #[async_trait::async_trait]
    impl Fetcher for StaticFetcher {
        fn name(&self) -> &'static str {
            "static"
        }

        async fn fetch(&self, query: &Query, offset: Offset) -> Result<RawResponse, FetchError> {
            let body = format!(
                r#"[{{"images": {{"original": {{"url": "https://media.example/{}/{}.gif"}}}}}}]"#,
                query.as_str().replace(' ', "-"),
                offset
            );
            Ok(RawResponse::new(ResponseFormat::GifApi, body))
        }
    }

    fn paginator() -> Paginator {
        Paginator::new(
            Arc::new(StaticFetcher),
            Arc::new(ResultCache::new(10, Duration::from_secs(300))),
        )
    }

    #[tokio::test]
    async fn test_previous_from_zero_stays_at_zero() {
        let paginator = paginator();
        let page = paginator.previous("cats", 0).await.unwrap();
        assert_eq!(page.offset(), Offset::ZERO);
        assert!(!page.has_previous());
    }

    #[tokio::test]
    async fn test_unaligned_offsets_round_down() {
        let paginator = paginator();
        assert_eq!(paginator.next("cats", 17).await.unwrap().offset().value(), 20);
        assert_eq!(paginator.previous("cats", 17).await.unwrap().offset().value(), 0);
    }

    #[tokio::test]
    async fn test_second_load_is_served_from_cache() {
        let paginator = paginator();
        let first = paginator.open("dancing robot").await.unwrap();
        let second = paginator.open("  dancing   robot ").await.unwrap();

        assert!(!first.from_cache());
        assert!(second.from_cache());
        assert_eq!(first.results(), second.results());
        assert_eq!(
            first.results()[0].url(),
            "https://media.example/dancing-robot/0.gif"
        );
    }

    #[tokio::test]
    async fn test_gates_are_released() {
        let paginator = paginator();
        paginator.open("cats").await.unwrap();
        paginator.next("cats", 0).await.unwrap();

        let in_flight = paginator.in_flight.lock().unwrap();
        assert!(in_flight.values().all(|gate| gate.strong_count() == 0));
    }
}
