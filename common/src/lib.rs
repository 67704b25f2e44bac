/*!
common/src/lib.rs

Shared configuration types for Festnews.

This file provides:
- Config data structures (deserialized from TOML)
- An async loader that layers an override file over a default file
- Accessors that resolve every optional setting to its documented default
*/

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_STATIC_DIR: &str = "static";
pub const DEFAULT_TTL_SECONDS: u64 = 1800;
pub const DEFAULT_PAGE_SIZE: usize = 12;
pub const DEFAULT_FETCH_TIMEOUT_SECONDS: u64 = 10;
pub const DEFAULT_FETCH_RETRIES: u32 = 3;
pub const DEFAULT_USER_AGENT: &str = "Festnews/0.1.0";
pub const DEFAULT_ENRICH_LIMIT: usize = 10;
pub const DEFAULT_SUMMARY_PREFIX_CHARS: usize = 100;
pub const DEFAULT_TRANSLATION_ADAPTER: &str = "google";
pub const DEFAULT_TARGET_LOCALE: &str = "zh-CN";
pub const DEFAULT_TRANSLATION_TIMEOUT_SECONDS: u64 = 5;

/// HTTP server section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind (e.g. "0.0.0.0")
    pub bind: Option<String>,
    pub port: Option<u16>,
    /// Directory holding `index.html` and other static assets
    pub static_dir: Option<String>,
}

/// Article cache and paging
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheConfig {
    pub ttl_seconds: Option<u64>,
    pub page_size: Option<usize>,
}

/// Feed fetching / normalization
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FetchConfig {
    pub timeout_seconds: Option<u64>,
    pub max_retries: Option<u32>,
    pub user_agent: Option<String>,
    /// Only the first N entries of a feed are translated
    pub enrich_limit: Option<usize>,
    pub summary_prefix_chars: Option<usize>,
}

/// Translation backend
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranslationConfig {
    pub adapter: Option<String>, // "google", "remote", "none"
    pub target_locale: Option<String>,
    pub timeout_seconds: Option<u64>,
    // Used by the "remote" adapter only
    pub api_url: Option<String>,
    pub api_key_env: Option<String>,
    pub model: Option<String>,
}

/// Topic → feed URL overrides, merged over the built-in catalog
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedsConfig {
    pub default_url: Option<String>,
    #[serde(default)]
    pub topics: BTreeMap<String, String>,
}

/// Top-level application configuration (deserialized from config.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub server: Option<ServerConfig>,
    pub cache: Option<CacheConfig>,
    pub fetch: Option<FetchConfig>,
    pub translation: Option<TranslationConfig>,
    pub feeds: Option<FeedsConfig>,
}

impl Config {
    /// Load configuration with an optional default file and an optional override file.
    /// If both are present, they are merged (override takes precedence).
    /// Missing files are skipped, so an empty configuration is valid.
    pub async fn load_with_defaults(default_path: Option<&Path>, override_path: Option<&Path>) -> Result<Self> {
        let mut config_value = toml::Value::Table(toml::map::Map::new());

        for path in [default_path, override_path].into_iter().flatten() {
            if !path.exists() {
                continue;
            }
            let data = tokio::fs::read_to_string(path).await
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            let val: toml::Value = toml::from_str(&data)
                .with_context(|| format!("Failed to parse configuration: {}", path.display()))?;
            merge_toml(&mut config_value, val);
        }

        let cfg: Config = config_value.try_into().context("Failed to parse merged configuration")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject values that would only fail later, at request time.
    pub fn validate(&self) -> Result<()> {
        if self.page_size() == 0 {
            anyhow::bail!("cache.page_size must be at least 1");
        }
        if let Some(feeds) = &self.feeds {
            if let Some(default_url) = &feeds.default_url {
                url::Url::parse(default_url)
                    .with_context(|| format!("Invalid feeds.default_url: {}", default_url))?;
            }
            for (topic, feed_url) in &feeds.topics {
                url::Url::parse(feed_url)
                    .with_context(|| format!("Invalid feed URL for topic '{}': {}", topic, feed_url))?;
            }
        }
        if self.translation_adapter() == "remote" {
            let t = self.translation.as_ref();
            if t.and_then(|t| t.api_url.as_ref()).is_none() {
                anyhow::bail!("translation.adapter = \"remote\" requires translation.api_url");
            }
        }
        Ok(())
    }

    pub fn bind(&self) -> String {
        self.server.as_ref()
            .and_then(|s| s.bind.clone())
            .unwrap_or_else(|| DEFAULT_BIND.to_string())
    }

    pub fn port(&self) -> u16 {
        self.server.as_ref().and_then(|s| s.port).unwrap_or(DEFAULT_PORT)
    }

    pub fn static_dir(&self) -> String {
        self.server.as_ref()
            .and_then(|s| s.static_dir.clone())
            .unwrap_or_else(|| DEFAULT_STATIC_DIR.to_string())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(
            self.cache.as_ref().and_then(|c| c.ttl_seconds).unwrap_or(DEFAULT_TTL_SECONDS),
        )
    }

    pub fn page_size(&self) -> usize {
        self.cache.as_ref().and_then(|c| c.page_size).unwrap_or(DEFAULT_PAGE_SIZE)
    }

    pub fn fetch_timeout_seconds(&self) -> u64 {
        self.fetch.as_ref()
            .and_then(|f| f.timeout_seconds)
            .unwrap_or(DEFAULT_FETCH_TIMEOUT_SECONDS)
    }

    pub fn fetch_max_retries(&self) -> u32 {
        self.fetch.as_ref().and_then(|f| f.max_retries).unwrap_or(DEFAULT_FETCH_RETRIES)
    }

    pub fn user_agent(&self) -> String {
        self.fetch.as_ref()
            .and_then(|f| f.user_agent.clone())
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string())
    }

    pub fn enrich_limit(&self) -> usize {
        self.fetch.as_ref().and_then(|f| f.enrich_limit).unwrap_or(DEFAULT_ENRICH_LIMIT)
    }

    pub fn summary_prefix_chars(&self) -> usize {
        self.fetch.as_ref()
            .and_then(|f| f.summary_prefix_chars)
            .unwrap_or(DEFAULT_SUMMARY_PREFIX_CHARS)
    }

    pub fn translation_adapter(&self) -> String {
        self.translation.as_ref()
            .and_then(|t| t.adapter.clone())
            .unwrap_or_else(|| DEFAULT_TRANSLATION_ADAPTER.to_string())
    }

    pub fn target_locale(&self) -> String {
        self.translation.as_ref()
            .and_then(|t| t.target_locale.clone())
            .unwrap_or_else(|| DEFAULT_TARGET_LOCALE.to_string())
    }

    pub fn translation_timeout_seconds(&self) -> u64 {
        self.translation.as_ref()
            .and_then(|t| t.timeout_seconds)
            .unwrap_or(DEFAULT_TRANSLATION_TIMEOUT_SECONDS)
    }
}

fn merge_toml(a: &mut toml::Value, b: toml::Value) {
    match (a, b) {
        (toml::Value::Table(a_map), toml::Value::Table(b_map)) => {
            for (k, v) in b_map {
                if let Some(a_val) = a_map.get_mut(&k) {
                    merge_toml(a_val, v);
                } else {
                    a_map.insert(k, v);
                }
            }
        }
        (a_val, b_val) => *a_val = b_val,
    }
}
