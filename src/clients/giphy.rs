use reqwest::Client;
use std::time::Duration;
use url::Url;

use super::{FetchError, Fetcher, RawResponse, ResponseFormat, fetch_text};
use crate::config::GiphyConfig;
use crate::constants::PAGE_SIZE;
use crate::domain::{Offset, Query};

/// Calls the Giphy search API.
#[derive(Clone)]
pub struct ApiFetcher {
    client: Client,
    base_url: Url,
    api_key: String,
    lang: String,
    rating: Option<String>,
    timeout: Duration,
}

impl ApiFetcher {
    pub fn new(client: Client, config: &GiphyConfig, timeout: Duration) -> anyhow::Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| anyhow::anyhow!("Invalid Giphy base URL '{}': {e}", config.base_url))?;

        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("Giphy API key is not configured"))?;

        Ok(Self {
            client,
            base_url,
            api_key,
            lang: config.lang.clone(),
            rating: config.rating.clone(),
            timeout,
        })
    }

    #[must_use]
    pub fn build_url(&self, query: &Query, offset: Offset) -> Url {
        let mut url = self.base_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("api_key", &self.api_key)
                .append_pair("q", query.as_str())
                .append_pair("limit", &PAGE_SIZE.to_string())
                .append_pair("offset", &offset.value().to_string())
                .append_pair("lang", &self.lang);
            if let Some(ref rating) = self.rating {
                pairs.append_pair("rating", rating);
            }
        }
        url
    }
}

#[async_trait::async_trait]
impl Fetcher for ApiFetcher {
    fn name(&self) -> &'static str {
        "giphy"
    }

    async fn fetch(&self, query: &Query, offset: Offset) -> Result<RawResponse, FetchError> {
        let request = self.client.get(self.build_url(query, offset));
        let body = fetch_text(self.name(), request, self.timeout).await?;
        Ok(RawResponse::new(ResponseFormat::GifApi, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GiphyConfig {
        GiphyConfig {
            api_key: Some("test-key".to_string()),
            ..GiphyConfig::default()
        }
    }

    #[test]
    fn test_search_url_parameters() {
        let fetcher = ApiFetcher::new(Client::new(), &config(), Duration::from_secs(15)).unwrap();
        let url = fetcher.build_url(
            &Query::parse("happy birthday").unwrap(),
            Offset::new(30).unwrap(),
        );
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();

        assert_eq!(url.path(), "/v1/gifs/search");
        assert!(pairs.contains(&("api_key".to_string(), "test-key".to_string())));
        assert!(pairs.contains(&("q".to_string(), "happy birthday".to_string())));
        assert!(pairs.contains(&("limit".to_string(), "10".to_string())));
        assert!(pairs.contains(&("offset".to_string(), "30".to_string())));
        assert!(!pairs.iter().any(|(k, _)| k == "rating"));
    }

    #[test]
    fn test_rating_is_forwarded_when_set() {
        let config = GiphyConfig {
            rating: Some("pg".to_string()),
            ..config()
        };
        let fetcher = ApiFetcher::new(Client::new(), &config, Duration::from_secs(15)).unwrap();
        let url = fetcher.build_url(&Query::parse("cats").unwrap(), Offset::ZERO);
        assert!(url.query_pairs().any(|(k, v)| k == "rating" && v == "pg"));
    }

    #[test]
    fn test_missing_api_key_is_rejected() {
        let config = GiphyConfig {
            api_key: Some("  ".to_string()),
            ..GiphyConfig::default()
        };
        assert!(ApiFetcher::new(Client::new(), &config, Duration::from_secs(15)).is_err());
    }
}
