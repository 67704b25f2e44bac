use chrono::{NaiveDate, Utc};
use scraper::Html;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

use common::Config;

use crate::error::FetchError;
use crate::ingestion::{FeedSource, HttpFeedSource, RawEntry};
use crate::model::Article;
use crate::translate::{self, Enricher};

pub const DEFAULT_TOPIC: &str = "all";

const POPULARITY_MIN: u32 = 1000;
const POPULARITY_MAX: u32 = 50000;
const CONTINUATION_MARKER: &str = "...";

const BUILTIN_TOPICS: &[(&str, &str)] = &[
    ("cannes", "Cannes Film Festival"),
    ("venice", "Venice Film Festival"),
    ("berlinale", "Berlinale"),
    ("sundance", "Sundance Film Festival"),
    ("tiff", "Toronto International Film Festival"),
    ("sxsw", "SXSW Film Festival"),
    ("oscars", "Academy Awards Oscars"),
];

fn google_news_search(query: &str) -> String {
    format!(
        "https://news.google.com/rss/search?q={}&hl=en-US&gl=US&ceid=US:en",
        query.replace(' ', "+")
    )
}

/// Maps topic ids to feed URLs. Unknown topics resolve to the default feed.
#[derive(Debug, Clone)]
pub struct FeedCatalog {
    topics: BTreeMap<String, String>,
    default_url: String,
}

impl FeedCatalog {
    pub fn new(topics: BTreeMap<String, String>, default_url: impl Into<String>) -> Self {
        Self {
            topics: topics.into_iter().map(|(k, v)| (k.to_ascii_lowercase(), v)).collect(),
            default_url: default_url.into(),
        }
    }

    /// The seven festival topics plus the aggregate default.
    pub fn builtin() -> Self {
        let topics = BUILTIN_TOPICS
            .iter()
            .map(|(id, query)| (id.to_string(), google_news_search(query)))
            .collect();
        Self::new(topics, google_news_search("film festival"))
    }

    /// Built-in catalog with `[feeds]` overrides applied.
    pub fn from_config(config: &Config) -> Self {
        let mut catalog = Self::builtin();
        if let Some(feeds) = &config.feeds {
            for (topic, url) in &feeds.topics {
                catalog.topics.insert(topic.to_ascii_lowercase(), url.clone());
            }
            if let Some(default_url) = &feeds.default_url {
                catalog.default_url = default_url.clone();
            }
        }
        catalog
    }

    /// Canonical topic id: known topics lowercased, anything else `all`.
    pub fn canonical_topic(&self, topic: &str) -> String {
        let topic = topic.trim().to_ascii_lowercase();
        if self.topics.contains_key(&topic) {
            topic
        } else {
            DEFAULT_TOPIC.to_string()
        }
    }

    pub fn url_for(&self, topic: &str) -> &str {
        self.topics
            .get(&topic.trim().to_ascii_lowercase())
            .map(String::as_str)
            .unwrap_or(&self.default_url)
    }

    /// Known topic ids, sorted, including the default.
    pub fn topics(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.topics.keys().cloned().collect();
        if !self.topics.contains_key(DEFAULT_TOPIC) {
            ids.push(DEFAULT_TOPIC.to_string());
        }
        ids.sort();
        ids
    }
}

/// Produces the article set for a topic. The store refreshes through this.
#[async_trait::async_trait]
pub trait ArticleSource: Send + Sync {
    async fn fetch(&self, topic: &str) -> Result<Vec<Article>, FetchError>;

    /// Key under which a topic's articles are cached. Topics that resolve to
    /// the same feed should share a key.
    fn cache_key(&self, topic: &str) -> String {
        topic.to_string()
    }
}

/// Fetches a topic's feed, normalizes its entries and translates the first few.
pub struct FeedFetcher {
    source: Arc<dyn FeedSource>,
    catalog: FeedCatalog,
    enricher: Enricher,
    enrich_limit: usize,
    summary_prefix_chars: usize,
}

impl FeedFetcher {
    pub fn new(source: Arc<dyn FeedSource>, catalog: FeedCatalog, enricher: Enricher) -> Self {
        Self {
            source,
            catalog,
            enricher,
            enrich_limit: common::DEFAULT_ENRICH_LIMIT,
            summary_prefix_chars: common::DEFAULT_SUMMARY_PREFIX_CHARS,
        }
    }

    /// Full HTTP + translation stack as described by `config`.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let source = HttpFeedSource::new(
            config.fetch_timeout_seconds(),
            &config.user_agent(),
            config.fetch_max_retries(),
        )?;
        let translator = translate::from_config(config)?;
        let enricher = Enricher::new(translator, config.target_locale());

        Ok(Self::new(Arc::new(source), FeedCatalog::from_config(config), enricher)
            .with_limits(config.enrich_limit(), config.summary_prefix_chars()))
    }

    pub fn with_limits(mut self, enrich_limit: usize, summary_prefix_chars: usize) -> Self {
        self.enrich_limit = enrich_limit;
        self.summary_prefix_chars = summary_prefix_chars;
        self
    }

    pub fn catalog(&self) -> &FeedCatalog {
        &self.catalog
    }

    /// Normalize one entry. The flag reports whether its title was translated.
    async fn build_article(&self, raw: &RawEntry, today: NaiveDate, enrich: bool) -> (Article, bool) {
        let title = clean_text(&raw.title);
        let summary = raw.summary.as_deref().map(clean_text).unwrap_or_default();

        let (title_translated, summary_translated, translated) = if enrich {
            let prefix: String = summary.chars().take(self.summary_prefix_chars).collect();
            let (t, s) = tokio::join!(self.enricher.enrich(&title), self.enricher.enrich(&prefix));
            let summary_translated = if s.ok {
                format!("{}{}", s.value, CONTINUATION_MARKER)
            } else {
                summary.clone()
            };
            (t.value, summary_translated, t.ok)
        } else {
            (title.clone(), summary.clone(), false)
        };

        let article = Article {
            id: raw.id.clone(),
            popularity: popularity(&title),
            title_original: title,
            title_translated,
            summary_original: summary,
            summary_translated,
            published_at: raw.published.map(|d| d.date_naive()).unwrap_or(today),
            source_link: raw.link.clone(),
        };
        (article, translated)
    }
}

#[async_trait::async_trait]
impl ArticleSource for FeedFetcher {
    async fn fetch(&self, topic: &str) -> Result<Vec<Article>, FetchError> {
        let url = self.catalog.url_for(topic);
        info!("fetching topic '{}' from {}", topic, url);

        let entries = self.source.entries(url).await.map_err(|e| {
            warn!("feed fetch for topic '{}' failed: {:#}", topic, e);
            FetchError::Network(format!("{:#}", e))
        })?;
        if entries.is_empty() {
            warn!("feed for topic '{}' returned no entries", topic);
            return Err(FetchError::Empty);
        }

        let today = Utc::now().date_naive();
        let enrich_count = if self.enricher.is_enabled() { self.enrich_limit } else { 0 };

        let mut articles = Vec::with_capacity(entries.len());
        let mut translated = 0;
        for (i, raw) in entries.iter().enumerate() {
            let (article, ok) = self.build_article(raw, today, i < enrich_count).await;
            translated += usize::from(ok);
            articles.push(article);
        }

        info!(
            "topic '{}': {} articles, {} translated ({} attempted)",
            topic,
            articles.len(),
            translated,
            articles.len().min(enrich_count)
        );
        Ok(articles)
    }

    fn cache_key(&self, topic: &str) -> String {
        self.catalog.canonical_topic(topic)
    }
}

/// Strip HTML markup, collapse whitespace and drop a trailing " - Source" suffix.
pub fn clean_text(raw: &str) -> String {
    let fragment = Html::parse_fragment(raw);
    let text: String = fragment.root_element().text().collect();
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");

    match text.rfind(" - ") {
        Some(idx) if !text[..idx].trim().is_empty() => text[..idx].trim_end().to_string(),
        _ => text,
    }
}

/// Stable pseudo-popularity in `[1000, 50000]`, derived from the title so that
/// sort order survives cache refreshes.
pub fn popularity(title: &str) -> u32 {
    let digest = Sha256::digest(title.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    let n = u64::from_be_bytes(bytes);
    POPULARITY_MIN + (n % u64::from(POPULARITY_MAX - POPULARITY_MIN + 1)) as u32
}
