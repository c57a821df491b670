//! Giphy-style JSON search responses.

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::Candidate;

#[derive(Debug, Deserialize)]
struct GifObject {
    #[serde(rename = "type", default)]
    kind: Option<String>,

    #[serde(default)]
    title: Option<String>,

    #[serde(default)]
    images: Option<GifImages>,
}

#[derive(Debug, Deserialize)]
struct GifImages {
    #[serde(default)]
    original: Option<Rendition>,

    #[serde(default)]
    downsized: Option<Rendition>,

    #[serde(default)]
    fixed_height: Option<Rendition>,
}

#[derive(Debug, Deserialize)]
struct Rendition {
    #[serde(default)]
    url: Option<String>,
}

impl GifObject {
    fn image_url(&self) -> Option<&str> {
        let images = self.images.as_ref()?;
        [&images.original, &images.downsized, &images.fixed_height]
            .into_iter()
            .filter_map(|r| r.as_ref()?.url.as_deref())
            .find(|url| !url.trim().is_empty())
    }

    fn into_candidate(self) -> Option<Candidate> {
        let url = self.image_url()?.to_string();
        let animated = self.kind.as_deref().map(|k| k.eq_ignore_ascii_case("gif"));
        Some(Candidate::new(url, self.title).with_animated(animated))
    }
}

/// Collect one candidate per usable result object.
#[must_use]
pub fn candidates(body: &str) -> Vec<Candidate> {
    let document: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(e) => {
            warn!("Unparseable API response: {}", e);
            return Vec::new();
        }
    };

    let items = match document {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => items,
            _ => {
                debug!("API response has no result array");
                return Vec::new();
            }
        },
        _ => return Vec::new(),
    };

    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<GifObject>(item) {
            Ok(object) => object.into_candidate(),
            Err(e) => {
                debug!("Skipping malformed result object: {}", e);
                None
            }
        })
        .collect()
}
