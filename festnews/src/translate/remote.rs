use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::Translator;

/// Translator using an OpenAI-compatible chat completions API
pub struct RemoteTranslator {
    base_url: String,
    api_key: String,
    model: String,
    default_timeout: Duration,
    default_temperature: f32,
    client: reqwest::Client,
}

impl RemoteTranslator {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            default_timeout: Duration::from_secs(30),
            default_temperature: 0.2,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_defaults(mut self, timeout_secs: u64, temperature: f32) -> Self {
        self.default_timeout = Duration::from_secs(timeout_secs);
        self.default_temperature = temperature;
        self
    }

    /// POST one chat request and decode the reply, body included.
    async fn send(&self, req_body: &OpenAiRequest) -> Result<OpenAiResponse> {
        let mut request = self.client
            .post(&self.base_url)
            .header("Content-Type", "application/json")
            .json(req_body);
        if !self.api_key.is_empty() {
            request = request.header("Authorization", format!("Bearer {}", self.api_key));
        }

        let response = request.send().await.context("Translation HTTP request failed")?;

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
impl Translator for RemoteTranslator {
    async fn translate(&self, text: &str, target_locale: &str) -> Result<String> {
        let prompt = format!(
            r#"Translate the following news text into the language with locale code "{}".
Reply with the translation only: no quotes, no notes, no explanations.

TEXT:
{}
"#,
            target_locale, text
        );

        let req_body = OpenAiRequest {
            model: self.model.clone(),
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt,
            }],
            temperature: Some(self.default_temperature),
        };

        let resp_body = tokio::time::timeout(self.default_timeout, self.send(&req_body))
            .await
            .context("Translation request timed out")??;

        let choice = resp_body
            .choices
            .first()
            .context("Translation response has no choices")?;

        let translated = choice.message.content.trim();
        if translated.is_empty() {
            anyhow::bail!("Translation response was empty");
        }
        Ok(translated.to_string())
    }
}

// OpenAI API request/response structures
#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}
