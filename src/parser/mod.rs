//! Turns raw provider bodies into ordered, de-duplicated image results.
//!
//! Extraction never fails: markup or JSON that cannot be understood yields
//! fewer (possibly zero) results, and one bad node only drops itself.

pub mod gif_api;
pub mod html;

use std::collections::HashSet;
use tracing::debug;

use crate::clients::{RawResponse, ResponseFormat};
use crate::models::ImageResult;

/// A URL pulled out of a provider body, not yet validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub url: String,

    pub caption: Option<String>,

    /// The provider's own statement about the media type, when it makes one.
    pub animated: Option<bool>,
}

impl Candidate {
    #[must_use]
    pub fn new(url: impl Into<String>, caption: Option<String>) -> Self {
        Self {
            url: url.into(),
            caption,
            animated: None,
        }
    }

    #[must_use]
    pub const fn with_animated(mut self, animated: Option<bool>) -> Self {
        self.animated = animated;
        self
    }
}

/// Extract at most `limit` results from `raw`, in first-seen order.
#[must_use]
pub fn extract(raw: &RawResponse, limit: usize) -> Vec<ImageResult> {
    match raw.format {
        ResponseFormat::SearchPage { gif_extension_only } => {
            let candidates = html::candidates(&raw.body);
            select(candidates, limit, |result| {
                !gif_extension_only || result.has_gif_extension()
            })
        }
        ResponseFormat::GifApi => select(gif_api::candidates(&raw.body), limit, |_| true),
    }
}

/// Validate, filter, de-duplicate and truncate candidates.
///
/// Filters run in order: structural URL validity, then the media-type
/// signal. A candidate's own `animated` flag wins; `fallback` decides only
/// when the provider said nothing about that candidate.
fn select<F>(candidates: Vec<Candidate>, limit: usize, fallback: F) -> Vec<ImageResult>
where
    F: Fn(&ImageResult) -> bool,
{
    let total = candidates.len();
    let mut seen = HashSet::new();
    let mut results = Vec::with_capacity(limit.min(total));

    for candidate in candidates {
        if results.len() >= limit {
            break;
        }

        let Some(result) = ImageResult::new(&candidate.url, candidate.caption.as_deref()) else {
            continue;
        };

        let animated = candidate.animated.unwrap_or_else(|| fallback(&result));
        if !animated {
            continue;
        }

        if seen.insert(result.url().to_string()) {
            results.push(result);
        }
    }

    debug!(candidates = total, kept = results.len(), "Extracted results");
    results
}
