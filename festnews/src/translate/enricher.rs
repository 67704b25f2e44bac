// Best-effort translation of article text
use std::sync::Arc;
use tracing::{debug, warn};

use super::Translator;

/// Outcome of one enrichment attempt. When `ok` is false, `value` is the
/// input text, unmodified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enriched {
    pub value: String,
    pub ok: bool,
}

impl Enriched {
    fn fallback(text: &str) -> Self {
        Self {
            value: text.to_string(),
            ok: false,
        }
    }
}

/// Wraps a translator so that failures become a fallback value, never an error.
#[derive(Clone)]
pub struct Enricher {
    translator: Option<Arc<dyn Translator>>,
    target_locale: String,
}

impl Enricher {
    pub fn new(translator: Option<Arc<dyn Translator>>, target_locale: impl Into<String>) -> Self {
        Self {
            translator,
            target_locale: target_locale.into(),
        }
    }

    /// An enricher that never translates.
    pub fn disabled() -> Self {
        Self::new(None, "")
    }

    pub fn is_enabled(&self) -> bool {
        self.translator.is_some()
    }

    /// Translate `text` with a single attempt.
    pub async fn enrich(&self, text: &str) -> Enriched {
        let Some(translator) = &self.translator else {
            return Enriched::fallback(text);
        };
        if text.trim().is_empty() {
            return Enriched::fallback(text);
        }

        match translator.translate(text, &self.target_locale).await {
            Ok(value) => {
                debug!("translated {} chars into {}", text.chars().count(), self.target_locale);
                Enriched { value, ok: true }
            }
            Err(e) => {
                warn!("translation failed, keeping original text: {:#}", e);
                Enriched::fallback(text)
            }
        }
    }
}
