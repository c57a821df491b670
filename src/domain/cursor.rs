//! Opaque pagination cursors.
//!
//! A cursor names one page, `(query, offset)`, and travels through chat
//! callback data. The text form is base64url without padding over
//! `"<offset>:<query>"`, so it only contains `[A-Za-z0-9_-]`.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use std::fmt;
use thiserror::Error;

use super::{InvalidQuery, Offset, Query};
use crate::constants::cursor::MAX_ENCODED_LEN;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CursorError {
    #[error("cursor is longer than {MAX_ENCODED_LEN} characters")]
    TooLong,

    #[error("cursor is not valid base64")]
    Encoding,

    #[error("cursor is not valid UTF-8")]
    Utf8,

    #[error("malformed cursor")]
    Malformed,

    #[error("cursor offset {0} is not a page boundary")]
    Offset(String),

    #[error("cursor query is invalid: {0}")]
    Query(#[from] InvalidQuery),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cursor {
    query: Query,
    offset: Offset,
}

impl Cursor {
    #[must_use]
    pub const fn new(query: Query, offset: Offset) -> Self {
        Self { query, offset }
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
    pub fn into_parts(self) -> (Query, Offset) {
        (self.query, self.offset)
    }

    /// Base64url (no padding) of `"<offset>:<query>"`.
    ///
    /// The output length is bounded by the query limit: at most 548
    /// characters (ten offset digits and 100 four-byte characters), always
    /// within [`MAX_ENCODED_LEN`]. A 100-character ASCII query encodes to
    /// about 150 characters, so transports with a tighter payload limit,
    /// such as Telegram's 64-byte callback data, must map cursors to shorter
    /// tokens themselves.
    #[must_use]
    pub fn encode(&self) -> String {
        let raw = format!("{}:{}", self.offset, self.query);
        URL_SAFE_NO_PAD.encode(raw)
    }

    pub fn decode(text: &str) -> Result<Self, CursorError> {
        let text = text.trim();
        if text.len() > MAX_ENCODED_LEN {
            return Err(CursorError::TooLong);
        }

        let bytes = URL_SAFE_NO_PAD
            .decode(text)
            .map_err(|_| CursorError::Encoding)?;
        let raw = String::from_utf8(bytes).map_err(|_| CursorError::Utf8)?;

        let (offset, query) = raw.split_once(':').ok_or(CursorError::Malformed)?;
        let offset = offset
            .parse::<u32>()
            .ok()
            .and_then(Offset::new)
            .ok_or_else(|| CursorError::Offset(offset.to_string()))?;
        let query = Query::parse(query)?;

        Ok(Self { query, offset })
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl std::str::FromStr for Cursor {
    type Err = CursorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}
