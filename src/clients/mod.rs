//! Provider clients.
//!
//! Each client performs exactly one outbound request per [`Fetcher::fetch`]
//! call and hands back the undecoded body. Parsing lives in
//! [`crate::parser`], caching and retries are the caller's business.

pub mod giphy;
pub mod google;

pub use giphy::ApiFetcher;
pub use google::ScrapeFetcher;

use reqwest::{Client, RequestBuilder};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::{Offset, Query};

/// Why a provider call produced no body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("provider did not answer in time")]
    Timeout,

    #[error("provider unreachable: {0}")]
    Unreachable(String),

    #[error("provider rejected the request with status {0}")]
    ProviderRejected(u16),
}

impl FetchError {
    const fn outcome(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Unreachable(_) => "unreachable",
            Self::ProviderRejected(_) => "rejected",
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if let Some(status) = err.status() {
            Self::ProviderRejected(status.as_u16())
        } else {
            Self::Unreachable(err.to_string())
        }
    }
}

/// Shape of a raw body, telling the extractor which rules apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    /// HTML image search results page.
    SearchPage {
        /// Keep only URLs whose path ends in `.gif`.
        gif_extension_only: bool,
    },

    /// Giphy-style JSON: an array of result objects, bare or under `data`.
    GifApi,
}

#[derive(Debug, Clone)]
pub struct RawResponse {
    pub format: ResponseFormat,

    pub body: String,
}

impl RawResponse {
    #[must_use]
    pub fn new(format: ResponseFormat, body: impl Into<String>) -> Self {
        Self {
            format,
            body: body.into(),
        }
    }
}

#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    /// Short provider name for logs and metrics.
    fn name(&self) -> &'static str;

    async fn fetch(&self, query: &Query, offset: Offset) -> Result<RawResponse, FetchError>;
}

/// Build the HTTP client shared by provider fetchers.
pub fn build_http_client(timeout: Duration, user_agent: &str) -> anyhow::Result<Client> {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .user_agent(user_agent)
        .pool_max_idle_per_host(4)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {e}"))
}

/// Send `request` and read its body, bounded by `timeout` end to end.
pub(crate) async fn fetch_text(
    provider: &'static str,
    request: RequestBuilder,
    timeout: Duration,
) -> Result<String, FetchError> {
    let started = Instant::now();

    let result = tokio::time::timeout(timeout, async {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::ProviderRejected(status.as_u16()));
        }
        Ok(response.text().await?)
    })
    .await
    .unwrap_or(Err(FetchError::Timeout));

    let elapsed = started.elapsed();
    metrics::histogram!("gifbot_fetch_duration_seconds", "provider" => provider)
        .record(elapsed.as_secs_f64());

    match &result {
        Ok(body) => {
            metrics::counter!("gifbot_fetch_total", "provider" => provider, "outcome" => "ok")
                .increment(1);
            debug!(
                provider,
                bytes = body.len(),
                elapsed_ms = elapsed.as_millis(),
                "Provider responded"
            );
        }
        Err(e) => {
            metrics::counter!("gifbot_fetch_total", "provider" => provider, "outcome" => e.outcome())
                .increment(1);
            warn!(provider, elapsed_ms = elapsed.as_millis(), "Provider call failed: {}", e);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one connection with a canned response after reading the request.
    async fn serve_once(response: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        });
        format!("http://{addr}/search")
    }

    fn client() -> Client {
        Client::builder()
            .no_proxy()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_success_returns_body() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\ncontent-length: 2\r\nconnection: close\r\n\r\n[]",
        )
        .await;

        let body = fetch_text("test", client().get(url), Duration::from_secs(5)).await;
        assert_eq!(body.unwrap(), "[]");
    }

    #[tokio::test]
    async fn test_non_success_status_is_rejected() {
        let url = serve_once(
            "HTTP/1.1 429 Too Many Requests\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
        )
        .await;

        let err = fetch_text("test", client().get(url), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert_eq!(err, FetchError::ProviderRejected(429));
    }

    #[tokio::test]
    async fn test_silent_provider_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _held = tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        let err = fetch_text(
            "test",
            client().get(format!("http://{addr}/search")),
            Duration::from_millis(200),
        )
        .await
        .unwrap_err();
        assert_eq!(err, FetchError::Timeout);
    }

    #[tokio::test]
    async fn test_closed_port_is_unreachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = fetch_text(
            "test",
            client().get(format!("http://{addr}/search")),
            Duration::from_secs(5),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, FetchError::Unreachable(_)));
    }
}
