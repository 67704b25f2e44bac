use anyhow::{Context, Result};
use std::time::Duration;

use super::Translator;

pub const DEFAULT_BASE_URL: &str = "https://translate.googleapis.com";

/// Translator backed by the public Google Translate `gtx` endpoint.
///
/// The endpoint answers with a nested JSON array. The first element lists the
/// translated segments (one per source sentence), each segment being
/// `[translated, original, ...]`.
pub struct GoogleTranslator {
    base_url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl GoogleTranslator {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(5),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout = Duration::from_secs(timeout_secs);
        self
    }

    async fn request(&self, url: &str, text: &str, target_locale: &str) -> Result<serde_json::Value> {
        let response = self.client
            .get(url)
            .query(&[
                ("client", "gtx"),
                ("sl", "auto"),
                ("tl", target_locale),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await
            .context("Translation HTTP request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Translation API error {}: {}", status, body);
        }

        response
            .json()
            .await
            .context("Failed to parse translation response")
    }
}

#[async_trait::async_trait]
impl Translator for GoogleTranslator {
    async fn translate(&self, text: &str, target_locale: &str) -> Result<String> {
        let url = format!("{}/translate_a/single", self.base_url.trim_end_matches('/'));

        let body = tokio::time::timeout(self.timeout, self.request(&url, text, target_locale))
            .await
            .context("Translation request timed out")??;

        parse_segments(&body)
    }
}

fn parse_segments(body: &serde_json::Value) -> Result<String> {
    let segments = body
        .get(0)
        .and_then(|v| v.as_array())
        .context("Translation response has no segment list")?;

    let translated: String = segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(|s| s.as_str()))
        .collect();

    if translated.trim().is_empty() {
        anyhow::bail!("Translation response contained no text");
    }
    Ok(translated)
}
