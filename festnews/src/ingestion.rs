use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use feed_rs::model::{Entry, Feed};
use feed_rs::parser;
use reqwest::Client;
use std::time::Duration;

/// One item as it comes out of a feed, before any cleanup.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEntry {
    pub id: String,
    pub title: String,
    pub summary: Option<String>,
    pub published: Option<DateTime<Utc>>,
    pub link: String,
}

/// Turns a feed URL into its raw entries.
#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    async fn entries(&self, url: &str) -> Result<Vec<RawEntry>>;
}

/// Fetches feeds over HTTP and parses them with feed-rs.
pub struct HttpFeedSource {
    client: Client,
    max_retries: u32,
}

impl HttpFeedSource {
    pub fn new(timeout_secs: u64, user_agent: &str, max_retries: u32) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(user_agent)
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            client,
            max_retries: max_retries.max(1),
        })
    }

    /// Fetches a feed and parses it.
    /// Server errors, rate limiting and network errors are retried with a
    /// 1s, 2s, 4s... backoff; other client errors fail immediately.
    pub async fn fetch_and_parse_feed(&self, url: &str) -> Result<Feed> {
        let mut last_error = None;

        for attempt in 1..=self.max_retries {
            if attempt > 1 {
                let backoff = Duration::from_secs(2u64.pow(attempt - 2));
                tracing::info!("Retrying feed fetch for {} (attempt {}/{}) after {:?}...", url, attempt, self.max_retries, backoff);
                tokio::time::sleep(backoff).await;
            }

            match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let bytes = response.bytes().await.context("failed to read response body")?;
                        let feed = parser::parse(bytes.as_ref()).context("failed to parse feed")?;
                        return Ok(feed);
                    } else if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        last_error = Some(anyhow::anyhow!("feed server returned {}", status));
                        continue;
                    } else {
                        return Err(anyhow::anyhow!("feed fetch failed with status: {}", status));
                    }
                }
                Err(e) => {
                    last_error = Some(anyhow::Error::new(e).context("network error during fetch"));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow::anyhow!("unknown error after retries")))
    }
}

#[async_trait::async_trait]
impl FeedSource for HttpFeedSource {
    async fn entries(&self, url: &str) -> Result<Vec<RawEntry>> {
        let feed = self.fetch_and_parse_feed(url).await?;
        tracing::debug!("parsed {} entries from {}", feed.entries.len(), url);
        Ok(feed.entries.iter().map(raw_entry).collect())
    }
}

fn raw_entry(entry: &Entry) -> RawEntry {
    let title = entry.title.as_ref().map(|t| t.content.clone()).unwrap_or_default();
    let link = entry.links.first().map(|l| l.href.clone()).unwrap_or_default();
    let summary = entry.summary.as_ref()
        .map(|s| s.content.clone())
        .or_else(|| entry.content.as_ref().and_then(|c| c.body.clone()));

    // Prefer the feed's own identifier; the link is stable enough otherwise.
    let id = if entry.id.trim().is_empty() { link.clone() } else { entry.id.clone() };

    RawEntry {
        id,
        title,
        summary,
        published: entry.published.or(entry.updated),
        link,
    }
}
