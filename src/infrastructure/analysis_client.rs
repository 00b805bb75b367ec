//! Inference client for product critique.
//!
//! Talks to a chat-completions style endpoint, instructs strict JSON
//! output, and refuses to pass along critiques that say nothing. The
//! endpoint is an opaque dependency; only the shape of the data crossing
//! the boundary is fixed here.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::domain::errors::AnalysisError;
use crate::domain::product::{AnalysisResult, RawExtraction};
use crate::domain::services::AnalysisEngine;

const SYSTEM_PROMPT: &str = "You are a pragmatic shopping advisor. Given product data, \
respond with exactly one JSON object and nothing else, using the keys: \
\"pros\" (array of short strings), \"cons\" (array of short strings), \
\"recommendation\" (one or two sentences), and \"alternatives\" (array of \
objects with \"name\" and optional \"price\"). Ground every point in the \
provided data.";

/// Inference endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub endpoint: String,
    pub model: String,
    pub timeout_seconds: u64,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4o-mini".to_string(),
            timeout_seconds: 45,
            max_tokens: 700,
            temperature: 0.4,
        }
    }
}

/// [`AnalysisEngine`] backed by a chat-completions endpoint.
pub struct InferenceClient {
    client: reqwest::Client,
    config: AnalysisConfig,
    api_key: String,
}

impl InferenceClient {
    /// # Errors
    /// Fails when the underlying HTTP client cannot be constructed.
    pub fn new(config: AnalysisConfig, api_key: String) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("failed to create inference HTTP client")?;

        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    fn build_user_prompt(extraction: &RawExtraction) -> String {
        let mut prompt = String::from("Assess this product:\n");
        prompt.push_str(&format!("URL: {}\n", extraction.source_url));
        if let Some(title) = &extraction.title {
            prompt.push_str(&format!("Title: {title}\n"));
        }
        if let Some(price) = &extraction.price {
            prompt.push_str(&format!("Price: {} {}\n", price.amount, price.currency));
        }
        if let Some(rating) = &extraction.rating {
            match rating.count {
                Some(count) => prompt.push_str(&format!(
                    "Rating: {} across {count} reviews\n",
                    rating.value
                )),
                None => prompt.push_str(&format!("Rating: {}\n", rating.value)),
            }
        }
        if let Some(description) = &extraction.description {
            prompt.push_str(&format!("Description: {description}\n"));
        }
        prompt
    }

    fn classify(&self, err: reqwest::Error) -> AnalysisError {
        if err.is_timeout() {
            AnalysisError::Timeout {
                timeout_secs: self.config.timeout_seconds,
            }
        } else {
            AnalysisError::Unavailable {
                reason: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl AnalysisEngine for InferenceClient {
    async fn analyze(
        &self,
        extraction: &RawExtraction,
        cancel: &CancellationToken,
    ) -> Result<AnalysisResult, AnalysisError> {
        if cancel.is_cancelled() {
            return Err(AnalysisError::Cancelled);
        }

        let body = json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": Self::build_user_prompt(extraction) },
            ],
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
        });

        debug!(model = %self.config.model, url = %extraction.source_url, "requesting critique");

        let request = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send();

        let response = tokio::select! {
            result = request => result.map_err(|e| self.classify(e))?,
            () = cancel.cancelled() => {
                warn!("inference call cancelled mid-request");
                return Err(AnalysisError::Cancelled);
            }
        };

        let status = response.status();
        if !status.is_success() {
            return Err(AnalysisError::Unavailable {
                reason: format!("inference endpoint returned status {status}"),
            });
        }

        let payload: ChatCompletionResponse = tokio::select! {
            result = response.json() => result.map_err(|e| self.classify(e))?,
            () = cancel.cancelled() => {
                warn!("inference call cancelled while reading response");
                return Err(AnalysisError::Cancelled);
            }
        };

        let content = payload
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| AnalysisError::Unavailable {
                reason: "response held no choices".to_string(),
            })?;

        parse_critique(&content)
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

/// Parses the model's JSON critique, tolerating markdown code fences.
fn parse_critique(content: &str) -> Result<AnalysisResult, AnalysisError> {
    let stripped = strip_code_fence(content);
    let analysis: AnalysisResult =
        serde_json::from_str(stripped).map_err(|e| AnalysisError::Unavailable {
            reason: format!("critique was not valid JSON: {e}"),
        })?;

    if !analysis.has_substance() {
        return Err(AnalysisError::Unavailable {
            reason: "critique held no pros, no cons, or no recommendation".to_string(),
        });
    }
    Ok(analysis)
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").map_or(trimmed, str::trim)
}
