use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::clients::{ApiFetcher, Fetcher, ScrapeFetcher, build_http_client};
use crate::config::{Config, ProviderKind};
use crate::constants;
use crate::services::{AccessGate, AllowList, Cooldown, Dispatcher, Paginator, ResultCache};

/// Everything a front end needs, wired from one [`Config`].
#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub cache: Arc<ResultCache>,

    pub paginator: Arc<Paginator>,

    pub access: Arc<AllowList>,

    pub dispatcher: Arc<Dispatcher>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let fetcher = build_fetcher(&config)?;
        Self::with_fetcher(config, fetcher).await
    }

    /// Wire the state around an already-built fetcher.
    pub async fn with_fetcher(config: Config, fetcher: Arc<dyn Fetcher>) -> anyhow::Result<Self> {
        let cache = Arc::new(ResultCache::from_config(&config.cache));
        let paginator = Arc::new(Paginator::new(fetcher, Arc::clone(&cache)));

        let access = Arc::new(
            AllowList::load(&config.access.allowlist_path, config.access.admin_id.clone()).await?,
        );

        let dispatcher = Arc::new(Dispatcher::new(
            Arc::clone(&access) as Arc<dyn AccessGate>,
            Arc::clone(&paginator),
            Cooldown::new(Duration::from_secs(config.bot.cooldown_seconds)),
        ));

        info!(
            provider = paginator.provider(),
            cache_capacity = config.cache.capacity,
            cache_ttl_seconds = config.cache.ttl_seconds,
            "Search pipeline ready"
        );

        Ok(Self {
            config: Arc::new(config),
            cache,
            paginator,
            access,
            dispatcher,
        })
    }
}

/// Build the fetcher for the configured provider.
pub fn build_fetcher(config: &Config) -> anyhow::Result<Arc<dyn Fetcher>> {
    let timeout = config.provider.request_timeout();

    let fetcher: Arc<dyn Fetcher> = match config.provider.kind {
        ProviderKind::Scrape => {
            let client = build_http_client(timeout, &config.scrape.user_agent)?;
            Arc::new(ScrapeFetcher::new(client, &config.scrape, timeout)?)
        }
        ProviderKind::Giphy => {
            let client = build_http_client(timeout, constants::http::API_USER_AGENT)?;
            Arc::new(ApiFetcher::new(client, &config.giphy, timeout)?)
        }
    };

    Ok(fetcher)
}
