use serde::Serialize;
use url::Url;

/// One retrieved animation.
///
/// Only constructible from an absolute `http`/`https` URL with a host. The
/// provider's string is kept as given (minus surrounding whitespace) and is
/// the key used for de-duplication.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ImageResult {
    url: String,

    caption: Option<String>,
}

impl ImageResult {
    #[must_use]
    pub fn new(candidate: &str, caption: Option<&str>) -> Option<Self> {
        let candidate = candidate.trim();
        let url = Url::parse(candidate).ok()?;

        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return None;
        }

        let caption = caption
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(ToString::to_string);

        Some(Self {
            url: candidate.to_string(),
            caption,
        })
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub fn caption(&self) -> Option<&str> {
        self.caption.as_deref()
    }

    /// Whether the URL path names a `.gif` file.
    #[must_use]
    pub fn has_gif_extension(&self) -> bool {
        Url::parse(&self.url)
            .is_ok_and(|url| url.path().to_ascii_lowercase().ends_with(".gif"))
    }
}
