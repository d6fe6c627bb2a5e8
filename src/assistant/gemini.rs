//! Google Generative Language (`generateContent`) adapter.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::assistant::types::{AiResponse, AiService, QueryError};
use crate::config::AssistantConfig;
use crate::error::{NexusError, Result};

/// API base, without the model path.
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// `generateContent` client.
pub struct GeminiClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    api_key_env: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("has_api_key", &self.api_key.is_some())
            .finish()
    }
}

impl GeminiClient {
    /// Build a client whose requests time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NexusError::Config(format!("cannot build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            model: DEFAULT_MODEL.to_owned(),
            api_key,
            api_key_env: "GEMINI_API_KEY".to_owned(),
        })
    }

    /// Build from config, reading the key from the configured environment variable.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn from_config(config: &AssistantConfig) -> Result<Self> {
        Ok(Self::new(config.resolve_api_key(), config.request_timeout())?
            .with_endpoint(config.endpoint.clone())
            .with_model(config.model.clone())
            .with_api_key_env(config.api_key_env.clone()))
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_owned();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Name of the variable mentioned when the key is missing.
    pub fn with_api_key_env(mut self, name: impl Into<String>) -> Self {
        self.api_key_env = name.into();
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }

    fn map_http_error(status: reqwest::StatusCode, body: &str) -> QueryError {
        match status.as_u16() {
            429 => QueryError::RateLimited,
            code => QueryError::Other(format!("HTTP {code}: {}", extract_error_message(body))),
        }
    }
}

/// Pull `error.message` out of an error body, falling back to the raw body.
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| body.trim().to_string())
}

fn request_body(text: &str) -> serde_json::Value {
    serde_json::json!({
        "contents": [{ "parts": [{ "text": text }] }]
    })
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

impl From<GenerateContentResponse> for AiResponse {
    fn from(response: GenerateContentResponse) -> Self {
        let candidates = response
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .filter_map(|content| content.parts.into_iter().find_map(|p| p.text))
            .collect();
        Self { candidates }
    }
}

#[async_trait]
impl AiService for GeminiClient {
    async fn query(&self, text: &str) -> std::result::Result<AiResponse, QueryError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(QueryError::Other(format!(
                "missing API key: set {}",
                self.api_key_env
            )));
        };

        debug!(model = %self.model, chars = text.chars().count(), "sending generateContent");
        let response = self
            .client
            .post(self.url())
            .query(&[("key", api_key)])
            .json(&request_body(text))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    QueryError::Timeout
                } else {
                    QueryError::Other(format!("request failed: {e}"))
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                QueryError::Timeout
            } else {
                QueryError::Other(format!("cannot read response body: {e}"))
            }
        })?;
        if !status.is_success() {
            return Err(Self::map_http_error(status, &body));
        }

        let parsed: GenerateContentResponse =
            serde_json::from_str(&body).map_err(|e| QueryError::Malformed(e.to_string()))?;
        Ok(parsed.into())
    }
}
