use anyhow::{Context, Result};
use std::sync::Arc;

use common::Config;

pub mod enricher;
pub mod google;
pub mod remote;

pub use enricher::{Enriched, Enricher};

/// Core trait for translation backends.
#[async_trait::async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` into `target_locale` (e.g. "zh-CN").
    /// Any failure is an error; callers decide how to fall back.
    async fn translate(&self, text: &str, target_locale: &str) -> Result<String>;
}

/// Build the translator selected by `translation.adapter`.
/// Returns `None` for the "none" adapter.
pub fn from_config(config: &Config) -> Result<Option<Arc<dyn Translator>>> {
    let adapter = config.translation_adapter();
    let timeout_secs = config.translation_timeout_seconds();

    match adapter.as_str() {
        "google" => {
            let translator = google::GoogleTranslator::new(google::DEFAULT_BASE_URL)
                .with_timeout(timeout_secs);
            Ok(Some(Arc::new(translator)))
        }
        "remote" => {
            let remote_config = config.translation.as_ref()
                .ok_or_else(|| anyhow::anyhow!("Remote translation selected but [translation] is missing"))?;
            let api_url = remote_config.api_url.clone()
                .ok_or_else(|| anyhow::anyhow!("Missing api_url in translation config"))?;

            // A missing key is allowed: local OpenAI-compatible servers often need none.
            let api_key = match remote_config.api_key_env.as_deref() {
                Some(env) => std::env::var(env)
                    .with_context(|| format!("Translation API key env var '{}' not set", env))?,
                None => String::new(),
            };
            let model = remote_config.model.clone().unwrap_or_else(|| "gpt-4o-mini".to_string());

            let translator = remote::RemoteTranslator::new(api_url, api_key, model)
                .with_defaults(timeout_secs, 0.2);
            Ok(Some(Arc::new(translator)))
        }
        "none" => Ok(None),
        _ => anyhow::bail!("Unknown translation adapter type: {}", adapter),
    }
}
