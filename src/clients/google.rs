use reqwest::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, USER_AGENT};
use std::time::Duration;
use url::Url;

use super::{FetchError, Fetcher, RawResponse, ResponseFormat, fetch_text};
use crate::config::ScrapeConfig;
use crate::domain::{Offset, Query};

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Scrapes an image search results page filtered to animated images.
#[derive(Clone)]
pub struct ScrapeFetcher {
    client: Client,
    base_url: Url,
    headers: HeaderMap,
    gif_extension_only: bool,
    timeout: Duration,
}

impl ScrapeFetcher {
    pub fn new(client: Client, config: &ScrapeConfig, timeout: Duration) -> anyhow::Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| anyhow::anyhow!("Invalid scrape base URL '{}': {e}", config.base_url))?;

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_str(&config.user_agent)?);
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_str(&config.accept_language)?,
        );

        Ok(Self {
            client,
            base_url,
            headers,
            gif_extension_only: config.gif_extension_only,
            timeout,
        })
    }

    #[must_use]
    pub fn build_url(&self, query: &Query, offset: Offset) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("q", query.as_str())
            .append_pair("tbm", "isch")
            .append_pair("tbs", "itp:animated");
        if !offset.is_first() {
            url.query_pairs_mut()
                .append_pair("start", &offset.value().to_string());
        }
        url
    }
}

#[async_trait::async_trait]
impl Fetcher for ScrapeFetcher {
    fn name(&self) -> &'static str {
        "scrape"
    }

    async fn fetch(&self, query: &Query, offset: Offset) -> Result<RawResponse, FetchError> {
        let url = self.build_url(query, offset);
        let request = self.client.get(url).headers(self.headers.clone());

        let body = fetch_text(self.name(), request, self.timeout).await?;

        Ok(RawResponse::new(
            ResponseFormat::SearchPage {
                gif_extension_only: self.gif_extension_only,
            },
            body,
        ))
    }
}
