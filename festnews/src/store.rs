use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tracing::{debug, info, warn};

use crate::fetcher::ArticleSource;
use crate::model::Article;

/// Last known article set for one topic.
#[derive(Debug, Clone)]
pub struct TopicCacheEntry {
    pub articles: Arc<Vec<Article>>,
    /// Time of the last refresh attempt, successful or not
    pub fetched_at: DateTime<Utc>,
}

/// One topic: the published entry plus the lock a refresh holds.
///
/// Readers only touch `current`, so they never wait for a fetch in flight.
#[derive(Default)]
struct Slot {
    refresh: tokio::sync::Mutex<()>,
    current: RwLock<Option<TopicCacheEntry>>,
}

impl Slot {
    fn current(&self) -> Option<TopicCacheEntry> {
        self.current.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn publish(&self, entry: TopicCacheEntry) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(entry);
    }
}

/// Process-wide topic cache.
///
/// Each topic gets its own slot on first use; slots are updated in place and
/// never evicted. The map lock is synchronous and never held across an await.
#[derive(Default)]
pub struct Cache {
    slots: Mutex<HashMap<String, Arc<Slot>>>,
}

impl Cache {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, key: &str) -> Arc<Slot> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.entry(key.to_string()).or_default().clone()
    }

    /// Snapshot of a topic's entry, if it has been resolved at least once.
    pub fn get(&self, key: &str) -> Option<TopicCacheEntry> {
        let slot = self.slots.lock().unwrap_or_else(PoisonError::into_inner).get(key).cloned()?;
        slot.current()
    }

    /// Cached topic keys with their entries, sorted by key.
    pub fn entries(&self) -> Vec<(String, TopicCacheEntry)> {
        let slots: Vec<(String, Arc<Slot>)> = {
            let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            slots.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
        };

        let mut out: Vec<_> = slots
            .into_iter()
            .filter_map(|(key, slot)| slot.current().map(|entry| (key, entry)))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }
}

/// Serves cached article sets, refreshing them through an [`ArticleSource`]
/// once they are older than the TTL.
pub struct ArticleStore {
    cache: Arc<Cache>,
    source: Arc<dyn ArticleSource>,
    ttl: Duration,
}

impl ArticleStore {
    pub fn new(cache: Arc<Cache>, source: Arc<dyn ArticleSource>, ttl: std::time::Duration) -> Self {
        Self {
            cache,
            source,
            // Out-of-range TTLs saturate to "never expires".
            ttl: Duration::from_std(ttl).unwrap_or(Duration::MAX),
        }
    }

    pub fn cache(&self) -> &Arc<Cache> {
        &self.cache
    }

    fn fresh(&self, entry: &TopicCacheEntry, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(entry.fetched_at) <= self.ttl
    }

    /// Articles for `topic` as of `now`.
    ///
    /// A failed or empty refresh never replaces a previous set, but it still
    /// counts as an attempt so a failing upstream is retried at most once per TTL.
    pub async fn resolve(&self, topic: &str, now: DateTime<Utc>) -> Arc<Vec<Article>> {
        let key = self.source.cache_key(topic);
        let slot = self.cache.slot(&key);

        if let Some(current) = slot.current().filter(|e| self.fresh(e, now)) {
            debug!("cache hit for topic '{}' ({} articles)", key, current.articles.len());
            return current.articles;
        }

        let _refresh = slot.refresh.lock().await;

        // Another request may have refreshed while we waited.
        let previous = slot.current();
        if let Some(current) = previous.as_ref().filter(|e| self.fresh(e, now)) {
            debug!("topic '{}' refreshed by a concurrent request", key);
            return current.articles.clone();
        }

        info!("refreshing topic '{}'", key);
        let articles = match self.source.fetch(&key).await {
            Ok(articles) if !articles.is_empty() => {
                info!("topic '{}' refreshed with {} articles", key, articles.len());
                Arc::new(articles)
            }
            outcome => {
                if let Err(e) = outcome {
                    warn!("refresh of topic '{}' failed: {}", key, e);
                }
                match previous {
                    Some(previous) => {
                        info!("keeping {} stale articles for topic '{}'", previous.articles.len(), key);
                        previous.articles
                    }
                    None => Arc::new(Vec::new()),
                }
            }
        };

        slot.publish(TopicCacheEntry {
            articles: articles.clone(),
            fetched_at: now,
        });
        articles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use chrono::NaiveDate;

    struct Fixed(Vec<Article>);

    #[async_trait::async_trait]
    impl ArticleSource for Fixed {
        async fn fetch(&self, _topic: &str) -> Result<Vec<Article>, FetchError> {
            Ok(self.0.clone())
        }

        fn cache_key(&self, topic: &str) -> String {
            topic.to_ascii_lowercase()
        }
    }

    fn article(id: &str) -> Article {
        Article {
            id: id.to_string(),
            title_original: id.to_string(),
            title_translated: id.to_string(),
            summary_original: String::new(),
            summary_translated: String::new(),
            published_at: NaiveDate::from_ymd_opt(2024, 9, 1).unwrap(),
            popularity: 1000,
            source_link: format!("https://example.com/{}", id),
        }
    }

    #[tokio::test]
    async fn topics_share_a_slot_by_cache_key() {
        let cache = Arc::new(Cache::new());
        let store = ArticleStore::new(
            cache.clone(),
            Arc::new(Fixed(vec![article("a")])),
            std::time::Duration::from_secs(1800),
        );

        let now = Utc::now();
        store.resolve("Cannes", now).await;
        store.resolve("cannes", now).await;

        let entries = cache.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, "cannes");
        assert_eq!(entries[0].1.fetched_at, now);
        assert!(cache.get("cannes").is_some());
        assert!(cache.get("venice").is_none());
    }

    #[tokio::test]
    async fn oversized_ttl_never_expires() {
        let cache = Arc::new(Cache::new());
        let store = ArticleStore::new(
            cache.clone(),
            Arc::new(Fixed(vec![article("a")])),
            std::time::Duration::from_secs(10_000_000_000_000_000),
        );

        let now = Utc::now();
        store.resolve("venice", now).await;
        let later = now + Duration::days(365 * 100);
        store.resolve("venice", later).await;
        assert_eq!(cache.get("venice").map(|e| e.fetched_at), Some(now));
    }
}
