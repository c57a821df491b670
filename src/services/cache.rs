//! In-memory result cache keyed by `(query, offset)`.
//!
//! Bounded by entry count (least recently used goes first) and by age (an
//! entry older than the TTL is never returned). Values are immutable slices
//! swapped in whole, so a reader sees either the old list or the new one.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use crate::config::CacheConfig;
use crate::domain::{Offset, Query};
use crate::models::ImageResult;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    query: Query,
    offset: Offset,
}

#[derive(Debug)]
struct CacheEntry {
    results: Arc<[ImageResult]>,
    created_at: Instant,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub expired: u64,
    pub evictions: u64,
}

#[derive(Debug)]
struct Inner {
    entries: LruCache<CacheKey, CacheEntry>,
    stats: CacheStats,
}

#[derive(Debug)]
pub struct ResultCache {
    inner: Mutex<Inner>,
    ttl: Duration,
}

impl ResultCache {
    /// Creates a cache holding at most `capacity` pages (minimum 1).
    #[must_use]
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(Inner {
                entries: LruCache::new(capacity),
                stats: CacheStats {
                    capacity: capacity.get(),
                    ..CacheStats::default()
                },
            }),
            ttl,
        }
    }

    #[must_use]
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.capacity, Duration::from_secs(config.ttl_seconds))
    }

    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    // Values are swapped whole, so a poisoned lock still guards a consistent map.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up a page, refreshing its recency. Expired entries are removed
    /// and reported as a miss.
    #[must_use]
    pub fn get(&self, query: &Query, offset: Offset) -> Option<Arc<[ImageResult]>> {
        let key = CacheKey {
            query: query.clone(),
            offset,
        };
        let mut guard = self.lock();
        let inner = &mut *guard;

        let lookup = inner
            .entries
            .get(&key)
            .map(|entry| (entry.created_at.elapsed() <= self.ttl, Arc::clone(&entry.results)));

        let fresh = match lookup {
            Some((true, results)) => Some(results),
            Some((false, _)) => {
                inner.entries.pop(&key);
                inner.stats.expired += 1;
                debug!(query = %query, offset = %offset, "Cache entry expired");
                None
            }
            None => None,
        };

        if fresh.is_some() {
            inner.stats.hits += 1;
            metrics::counter!("gifbot_cache_hits_total").increment(1);
        } else {
            inner.stats.misses += 1;
            metrics::counter!("gifbot_cache_misses_total").increment(1);
        }

        fresh
    }

    /// Store a page, overwriting any existing entry for the same key. When
    /// full and the key is new, the least recently used entry is evicted.
    pub fn put(&self, query: &Query, offset: Offset, results: impl Into<Arc<[ImageResult]>>) {
        let key = CacheKey {
            query: query.clone(),
            offset,
        };
        let entry = CacheEntry {
            results: results.into(),
            created_at: Instant::now(),
        };

        let mut inner = self.lock();
        if let Some((old_key, _)) = inner.entries.push(key.clone(), entry)
            && old_key != key
        {
            inner.stats.evictions += 1;
            metrics::counter!("gifbot_cache_evictions_total").increment(1);
            debug!(
                query = %old_key.query,
                offset = %old_key.offset,
                "Evicted least recently used cache entry"
            );
        }
        inner.stats.entries = inner.entries.len();
    }

    /// Whether a live entry exists, without touching recency or stats.
    #[must_use]
    pub fn contains(&self, query: &Query, offset: Offset) -> bool {
        let key = CacheKey {
            query: query.clone(),
            offset,
        };
        self.lock()
            .entries
            .peek(&key)
            .is_some_and(|entry| entry.created_at.elapsed() <= self.ttl)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.stats.entries = 0;
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        CacheStats {
            entries: inner.entries.len(),
            ..inner.stats
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(text: &str) -> Query {
        Query::parse(text).unwrap()
    }

    fn results(tag: &str, n: usize) -> Vec<ImageResult> {
        (0..n)
            .filter_map(|i| ImageResult::new(&format!("https://example.com/{tag}/{i}.gif"), None))
            .collect()
    }

    #[test]
    fn test_get_returns_what_was_put() {
        let cache = ResultCache::new(10, Duration::from_secs(300));
        assert!(cache.get(&q("cats"), Offset::ZERO).is_none());

        cache.put(&q("cats"), Offset::ZERO, results("a", 3));
        let hit = cache.get(&q("cats"), Offset::ZERO).unwrap();
        assert_eq!(hit.len(), 3);

        assert!(cache.get(&q("cats"), Offset::ZERO.next()).is_none());
        assert!(cache.get(&q("dogs"), Offset::ZERO).is_none());
    }

    #[test]
    fn test_put_overwrites_whole_value() {
        let cache = ResultCache::new(10, Duration::from_secs(300));
        cache.put(&q("cats"), Offset::ZERO, results("old", 5));
        cache.put(&q("cats"), Offset::ZERO, results("new", 2));

        let hit = cache.get(&q("cats"), Offset::ZERO).unwrap();
        assert_eq!(hit.len(), 2);
        assert!(hit.iter().all(|r| r.url().contains("/new/")));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn test_evicts_least_recently_accessed() {
        let cache = ResultCache::new(2, Duration::from_secs(300));
        cache.put(&q("a"), Offset::ZERO, results("a", 1));
        cache.put(&q("b"), Offset::ZERO, results("b", 1));

        // Touch "a" so "b" becomes the oldest.
        assert!(cache.get(&q("a"), Offset::ZERO).is_some());

        cache.put(&q("c"), Offset::ZERO, results("c", 1));

        assert!(cache.contains(&q("a"), Offset::ZERO));
        assert!(!cache.contains(&q("b"), Offset::ZERO));
        assert!(cache.contains(&q("c"), Offset::ZERO));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let cache = ResultCache::new(0, Duration::from_secs(300));
        cache.put(&q("a"), Offset::ZERO, results("a", 1));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().capacity, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire_after_ttl() {
        let cache = ResultCache::new(10, Duration::from_secs(300));
        cache.put(&q("cats"), Offset::ZERO, results("a", 1));

        tokio::time::advance(Duration::from_secs(299)).await;
        assert!(cache.get(&q("cats"), Offset::ZERO).is_some());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(cache.get(&q("cats"), Offset::ZERO).is_none());
        assert!(cache.is_empty());

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.expired, 1);
    }
}
