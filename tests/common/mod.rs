//! Shared test doubles.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use gifbot::clients::{FetchError, Fetcher, RawResponse, ResponseFormat};
use gifbot::domain::{Offset, Query};

/// A provider holding `total` results, answering up to 15 per call and
/// counting how often it is asked.
pub struct CountingFetcher {
    calls: AtomicUsize,
    total: u32,
    delay: Duration,
    failure: Option<FetchError>,
}

impl CountingFetcher {
    pub fn with_total(total: u32) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            total,
            delay: Duration::ZERO,
            failure: None,
        }
    }

    pub fn failing(error: FetchError) -> Self {
        Self {
            failure: Some(error),
            ..Self::with_total(0)
        }
    }

    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for CountingFetcher {
    fn name(&self) -> &'static str {
        "counting"
    }

    async fn fetch(&self, query: &Query, offset: Offset) -> Result<RawResponse, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if let Some(error) = &self.failure {
            return Err(error.clone());
        }

        let slug = query.as_str().replace(' ', "-");
        let start = offset.value().min(self.total);
        let end = (start + 15).min(self.total);
        let items: Vec<String> = (start..end)
            .map(|i| {
                format!(
                    r#"{{"type": "gif", "title": "{slug} {i}", "images": {{"original": {{"url": "https://media.example/{slug}/{i}.gif"}}}}}}"#
                )
            })
            .collect();

        Ok(RawResponse::new(
            ResponseFormat::GifApi,
            format!(r#"{{"data": [{}]}}"#, items.join(",")),
        ))
    }
}
