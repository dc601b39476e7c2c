//! Analysis provider client
//!
//! Single-attempt outbound call to an OpenAI-compatible chat-completions
//! endpoint. Retry policy belongs to the caller, not here.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::model::ProviderConfig;

/// Environment variable for the provider credential
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";

/// Upper bound on the status-body excerpt carried in errors
const STATUS_MESSAGE_LIMIT: usize = 300;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ProviderError {
    /// Network/connection failure reaching the provider
    #[error("provider transport failure: {0}")]
    Transport(String),

    /// Non-success status from the provider
    #[error("provider returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// Provider responded but the envelope lacked textual content
    #[error("provider response malformed: {0}")]
    MalformedPayload(String),

    /// Provider credential absent
    #[error("provider credential not configured (missing {ENV_OPENAI_API_KEY})")]
    NotConfigured,
}

/// Seam between the pipeline and the external analysis provider
#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    /// Send one chat-completion request and return the raw response text
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, ProviderError>;
}

/// Production provider backed by the OpenAI chat-completions API
pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiProvider {
    /// Build the provider from the environment; `None` when the
    /// credential is absent (per-request 500s, not a startup abort)
    pub fn from_env(config: &ProviderConfig) -> Option<Self> {
        let api_key = std::env::var(ENV_OPENAI_API_KEY).ok()?;
        if api_key.trim().is_empty() {
            return None;
        }

        Some(Self {
            client: Client::builder()
                .user_agent("se-triage/1.0")
                .build()
                .unwrap_or_else(|_| Client::new()),
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl AnalysisProvider for OpenAiProvider {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, ProviderError> {
        let start_time = std::time::Instant::now();

        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": prompt },
            ],
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message: String = response
                .text()
                .await
                .unwrap_or_default()
                .chars()
                .take(STATUS_MESSAGE_LIMIT)
                .collect();
            tracing::error!(
                model = %self.model,
                status = status.as_u16(),
                "Completion request rejected by provider"
            );
            return Err(ProviderError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedPayload(e.to_string()))?;

        let text = envelope
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                ProviderError::MalformedPayload("no textual content in completion".to_string())
            })?;

        tracing::info!(
            model = %self.model,
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            prompt_length = prompt.len(),
            response_length = text.len(),
            "Completion request succeeded"
        );

        Ok(text.to_string())
    }
}

/// Stand-in used when no credential is configured; every call fails
/// with `NotConfigured` so handlers can return the fallback body
pub struct UnconfiguredProvider;

#[async_trait]
impl AnalysisProvider for UnconfiguredProvider {
    async fn complete(&self, _system: &str, _prompt: &str) -> Result<String, ProviderError> {
        Err(ProviderError::NotConfigured)
    }
}
