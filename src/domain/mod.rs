//! Domain primitives for the retrieval pipeline.
//!
//! Queries and offsets are newtypes so a raw `String` or `u32` coming from a
//! chat message cannot reach the cache or a provider without validation.

pub mod cursor;

pub use cursor::{Cursor, CursorError};

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::constants::{MAX_QUERY_CHARS, PAGE_SIZE};

/// Why a piece of user text was refused as a search query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidQuery {
    #[error("query is empty")]
    Empty,

    #[error("query is {len} characters long (max {max})")]
    TooLong { len: usize, max: usize },
}

/// Normalized search text.
///
/// Leading and trailing whitespace is removed and inner whitespace runs are
/// collapsed to a single space, so `"  funny   cats "` and `"funny cats"`
/// share a cache entry.
///
/// # Examples
///
/// ```rust
/// use gifbot::domain::Query;
///
/// let query = Query::parse("  funny   cats ").unwrap();
/// assert_eq!(query.as_str(), "funny cats");
/// assert!(Query::parse("   ").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Query(String);

impl Query {
    /// Validates and normalizes raw user text.
    ///
    /// # Errors
    ///
    /// - [`InvalidQuery::Empty`] if nothing but whitespace remains
    /// - [`InvalidQuery::TooLong`] if the trimmed text exceeds
    ///   [`MAX_QUERY_CHARS`] characters, counted before inner whitespace is
    ///   collapsed
    pub fn parse(raw: &str) -> Result<Self, InvalidQuery> {
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            return Err(InvalidQuery::Empty);
        }

        let len = trimmed.chars().count();
        if len > MAX_QUERY_CHARS {
            return Err(InvalidQuery::TooLong {
                len,
                max: MAX_QUERY_CHARS,
            });
        }

        Ok(Self(trimmed.split_whitespace().collect::<Vec<_>>().join(" ")))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Query {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for Query {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Zero-based position into a provider's result ordering, always a multiple
/// of [`PAGE_SIZE`].
///
/// # Examples
///
/// ```rust
/// use gifbot::domain::Offset;
///
/// let first = Offset::ZERO;
/// assert_eq!(first.next().value(), 10);
/// assert_eq!(first.previous(), Offset::ZERO);
/// assert_eq!(Offset::aligned(27).value(), 20);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(try_from = "u32", into = "u32")]
pub struct Offset(u32);

impl Offset {
    pub const ZERO: Self = Self(0);

    /// Returns `None` unless `value` falls on a page boundary.
    #[must_use]
    pub const fn new(value: u32) -> Option<Self> {
        if value % PAGE_SIZE == 0 {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Rounds `value` down to the page boundary containing it.
    #[must_use]
    pub const fn aligned(value: u32) -> Self {
        Self(value - value % PAGE_SIZE)
    }

    /// Offset of the 1-based `page`; page 0 is treated as page 1.
    #[must_use]
    pub const fn for_page(page: u32) -> Self {
        Self::aligned(page.saturating_sub(1).saturating_mul(PAGE_SIZE))
    }

    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn next(self) -> Self {
        Self::aligned(self.0.saturating_add(PAGE_SIZE))
    }

    /// Steps back one page, stopping at zero.
    #[must_use]
    pub const fn previous(self) -> Self {
        Self(self.0.saturating_sub(PAGE_SIZE))
    }

    #[must_use]
    pub const fn is_first(self) -> bool {
        self.0 == 0
    }

    /// 1-based page number, as shown to users.
    #[must_use]
    pub const fn page_number(self) -> u32 {
        self.0 / PAGE_SIZE + 1
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Offset> for u32 {
    fn from(offset: Offset) -> Self {
        offset.0
    }
}

impl TryFrom<u32> for Offset {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("offset {value} is not a multiple of {PAGE_SIZE}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_normalization() {
        let query = Query::parse("\t dancing \n  robot  ").unwrap();
        assert_eq!(query.as_str(), "dancing robot");
    }

    #[test]
    fn test_query_rejects_empty() {
        assert_eq!(Query::parse(""), Err(InvalidQuery::Empty));
        assert_eq!(Query::parse(" \n\t "), Err(InvalidQuery::Empty));
    }

    #[test]
    fn test_query_length_is_counted_in_characters() {
        let exact = "ж".repeat(MAX_QUERY_CHARS);
        assert!(Query::parse(&exact).is_ok());

        let long = "a".repeat(MAX_QUERY_CHARS + 1);
        assert_eq!(
            Query::parse(&long),
            Err(InvalidQuery::TooLong {
                len: MAX_QUERY_CHARS + 1,
                max: MAX_QUERY_CHARS
            })
        );
    }

    #[test]
    fn test_query_length_includes_inner_whitespace() {
        let padded = format!("cats{}x", " ".repeat(97));
        assert_eq!(
            Query::parse(&padded),
            Err(InvalidQuery::TooLong { len: 102, max: 100 })
        );

        let surrounded = format!("   {}   ", "a".repeat(MAX_QUERY_CHARS));
        assert!(Query::parse(&surrounded).is_ok());
    }

    #[test]
    fn test_query_deserialize_validates() {
        let query: Query = serde_json::from_str("\"  happy birthday \"").unwrap();
        assert_eq!(query.as_str(), "happy birthday");
        assert!(serde_json::from_str::<Query>("\"  \"").is_err());
    }

    #[test]
    fn test_offset_transitions() {
        let offset = Offset::ZERO.next().next();
        assert_eq!(offset.value(), 20);
        assert_eq!(offset.previous().value(), 10);
        assert_eq!(offset.page_number(), 3);
    }

    #[test]
    fn test_offset_previous_floors_at_zero() {
        let mut offset = Offset::ZERO;
        for _ in 0..5 {
            offset = offset.previous();
            assert_eq!(offset, Offset::ZERO);
        }
    }

    #[test]
    fn test_offset_alignment() {
        assert_eq!(Offset::new(30), Some(Offset::aligned(30)));
        assert_eq!(Offset::new(31), None);
        assert_eq!(Offset::aligned(39).value(), 30);
        assert_eq!(Offset::for_page(0), Offset::ZERO);
        assert_eq!(Offset::for_page(3).value(), 20);
    }

    #[test]
    fn test_offset_next_saturates_on_boundary() {
        let last = Offset::aligned(u32::MAX);
        assert_eq!(last.next(), last);
    }
}
