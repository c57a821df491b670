use std::sync::Arc;

use crate::domain::{Cursor, Offset, Query};
use crate::models::image::ImageResult;

/// One bounded batch of results for a `(query, offset)` pair.
///
/// Pages are assembled by the paginator and never mutated afterwards. The
/// result list is shared with the cache entry it came from.
#[derive(Debug, Clone)]
pub struct Page {
    query: Query,

    offset: Offset,

    results: Arc<[ImageResult]>,

    next: Cursor,

    previous: Option<Cursor>,

    from_cache: bool,
}

impl Page {
    pub(crate) fn assemble(
        query: Query,
        offset: Offset,
        results: Arc<[ImageResult]>,
        from_cache: bool,
    ) -> Self {
        let next = Cursor::new(query.clone(), offset.next());
        let previous = (!offset.is_first()).then(|| Cursor::new(query.clone(), offset.previous()));

        Self {
            query,
            offset,
            results,
            next,
            previous,
            from_cache,
        }
    }

    #[must_use]
    pub const fn query(&self) -> &Query {
        &self.query
    }

    #[must_use]
    pub const fn offset(&self) -> Offset {
        self.offset
    }

    #[must_use]
    pub fn results(&self) -> &[ImageResult] {
        &self.results
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.previous.is_some()
    }

    /// Always true: a provider never says in advance that it ran out, an
    /// empty page further on is how exhaustion shows up.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        true
    }

    #[must_use]
    pub const fn next_cursor(&self) -> &Cursor {
        &self.next
    }

    #[must_use]
    pub const fn previous_cursor(&self) -> Option<&Cursor> {
        self.previous.as_ref()
    }

    #[must_use]
    pub const fn page_number(&self) -> u32 {
        self.offset.page_number()
    }

    /// Whether the results were served without a provider call.
    #[must_use]
    pub const fn from_cache(&self) -> bool {
        self.from_cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn results(n: usize) -> Arc<[ImageResult]> {
        (0..n)
            .filter_map(|i| ImageResult::new(&format!("https://example.com/{i}.gif"), None))
            .collect()
    }

    #[test]
    fn test_first_page_has_no_previous_cursor() {
        let query = Query::parse("funny cats").unwrap();
        let page = Page::assemble(query.clone(), Offset::ZERO, results(3), false);

        assert!(!page.has_previous());
        assert!(page.previous_cursor().is_none());
        assert!(page.has_next());
        assert_eq!(page.next_cursor().offset().value(), 10);
        assert_eq!(page.next_cursor().query(), &query);
        assert_eq!(page.page_number(), 1);
    }

    #[test]
    fn test_later_page_links_both_ways() {
        let query = Query::parse("funny cats").unwrap();
        let offset = Offset::new(20).unwrap();
        let page = Page::assemble(query, offset, results(0), true);

        assert!(page.is_empty());
        assert!(page.from_cache());
        assert_eq!(page.previous_cursor().map(|c| c.offset().value()), Some(10));
        assert_eq!(page.next_cursor().offset().value(), 30);
        assert_eq!(page.page_number(), 3);
    }
}
