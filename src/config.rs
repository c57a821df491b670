use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::constants;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub provider: ProviderConfig,

    pub scrape: ScrapeConfig,

    pub giphy: GiphyConfig,

    pub cache: CacheConfig,

    pub access: AccessConfig,

    pub bot: BotConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub log_level: String,

    /// Silence reqwest/hyper connection noise in the log.
    #[serde(default)]
    pub suppress_connection_errors: bool,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            suppress_connection_errors: false,
            worker_threads: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Image search result pages.
    #[default]
    Scrape,

    /// The Giphy search API.
    Giphy,
}

impl std::str::FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "scrape" | "google" => Ok(Self::Scrape),
            "giphy" => Ok(Self::Giphy),
            other => anyhow::bail!("Unknown provider '{other}' (expected 'scrape' or 'giphy')"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub kind: ProviderKind,

    /// Upper bound on one provider call, connect to last byte.
    pub request_timeout_seconds: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::default(),
            request_timeout_seconds: constants::http::DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

impl ProviderConfig {
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    pub base_url: String,

    pub user_agent: String,

    pub accept_language: String,

    /// Keep only URLs whose path ends in `.gif`.
    pub gif_extension_only: bool,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.google.com/search".to_string(),
            user_agent: constants::http::BROWSER_USER_AGENT.to_string(),
            accept_language: "en-US,en;q=0.9".to_string(),
            gif_extension_only: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GiphyConfig {
    pub base_url: String,

    /// Usually supplied through `GIPHY_API_KEY` rather than the file.
    pub api_key: Option<String>,

    pub lang: String,

    /// Content rating filter (`g`, `pg`, `pg-13`, `r`); unset means no filter.
    pub rating: Option<String>,
}

impl Default for GiphyConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.giphy.com/v1/gifs/search".to_string(),
            api_key: None,
            lang: "en".to_string(),
            rating: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of cached pages.
    pub capacity: usize,

    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: constants::cache::DEFAULT_CAPACITY,
            ttl_seconds: constants::cache::DEFAULT_TTL_SECONDS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    pub allowlist_path: String,

    /// Always allowed; the only identity that may edit the allow-list.
    pub admin_id: Option<String>,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            allowlist_path: "whitelist.txt".to_string(),
            admin_id: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Minimum gap between two searches from the same user. 0 disables.
    pub cooldown_seconds: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            cooldown_seconds: constants::bot::DEFAULT_COOLDOWN_SECONDS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    pub metrics_port: Option<u16>,

    pub loki_enabled: bool,

    pub loki_url: String,

    pub loki_labels: std::collections::HashMap<String, String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        let mut labels = std::collections::HashMap::new();
        labels.insert("app".to_string(), "gifbot".to_string());

        Self {
            metrics_enabled: false,
            metrics_port: Some(9464),
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
            loki_labels: labels,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        let mut config = match paths.iter().find(|p| p.exists()) {
            Some(path) => {
                info!("Loading config from: {}", path.display());
                Self::load_from_path(path)?
            }
            None => {
                info!("No config file found, using defaults");
                Self::default()
            }
        };

        config.apply_env_overrides()?;
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Secrets and deployment-specific values from the environment win over
    /// the file.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        let var = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = var("GIPHY_API_KEY") {
            self.giphy.api_key = Some(key);
        }
        if let Some(admin) = var("ADMIN_ID") {
            self.access.admin_id = Some(admin.trim().to_string());
        }
        if let Some(kind) = var("GIFBOT_PROVIDER") {
            self.provider.kind = kind
                .parse()
                .context("Invalid GIFBOT_PROVIDER environment variable")?;
        }
        Ok(())
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("gifbot").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".gifbot").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            Self::default().save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.cache.capacity == 0 {
            anyhow::bail!("Cache capacity must be > 0");
        }

        if self.cache.ttl_seconds == 0 {
            anyhow::bail!("Cache TTL must be > 0");
        }

        if self.provider.request_timeout_seconds == 0 {
            anyhow::bail!("Provider request timeout must be > 0");
        }

        if self.provider.kind == ProviderKind::Giphy
            && self.giphy.api_key.as_deref().is_none_or(|k| k.trim().is_empty())
        {
            anyhow::bail!("Giphy provider selected but no API key is set (GIPHY_API_KEY)");
        }

        if self.access.allowlist_path.trim().is_empty() {
            anyhow::bail!("Allow-list path cannot be empty");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.provider.kind, ProviderKind::Scrape);
        assert_eq!(config.provider.request_timeout_seconds, 15);
        assert_eq!(config.cache.capacity, 100);
        assert_eq!(config.cache.ttl_seconds, 300);
        assert_eq!(config.access.allowlist_path, "whitelist.txt");
        assert!(config.scrape.gif_extension_only);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[provider]"));
        assert!(toml_str.contains("[cache]"));
        assert!(toml_str.contains("kind = \"scrape\""));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [provider]
            kind = "giphy"

            [giphy]
            api_key = "abc"
            rating = "pg"

            [cache]
            ttl_seconds = 60
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.provider.kind, ProviderKind::Giphy);
        assert_eq!(config.giphy.rating.as_deref(), Some("pg"));
        assert_eq!(config.cache.ttl_seconds, 60);
        assert_eq!(config.cache.capacity, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.cache.capacity = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.cache.ttl_seconds = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.provider.request_timeout_seconds = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.provider.kind = ProviderKind::Giphy;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.access.allowlist_path = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("GIPHY_API_KEY", "secret"),
            ("ADMIN_ID", " 42 "),
            ("GIFBOT_PROVIDER", "Giphy"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_overrides(|key| env.get(key).map(|v| (*v).to_string()))
            .unwrap();

        assert_eq!(config.giphy.api_key.as_deref(), Some("secret"));
        assert_eq!(config.access.admin_id.as_deref(), Some("42"));
        assert_eq!(config.provider.kind, ProviderKind::Giphy);
    }

    #[test]
    fn test_unknown_provider_override_is_an_error() {
        let mut config = Config::default();
        assert!(
            config
                .apply_overrides(|key| (key == "GIFBOT_PROVIDER").then(|| "bing".to_string()))
                .is_err()
        );
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.bot.cooldown_seconds = 5;
        config.save_to_path(&path).unwrap();

        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(loaded.bot.cooldown_seconds, 5);
    }
}
