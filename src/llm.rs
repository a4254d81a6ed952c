//! LLM Backend Interface
//!
//! Reasoning backends are opaque to the core: a prompt goes in, text and
//! token usage come out. The router owns model selection and spend
//! tracking; backends only execute the call for a given model id.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Completion with usage stats
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
    pub model_id: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Opaque generate(prompt) -> text+usage collaborator
#[async_trait]
pub trait LlmBackend: Send + Sync {
    async fn generate(&self, model_id: &str, prompt: &str, max_tokens: usize)
        -> Result<LlmResponse>;
}

const DEFAULT_API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";

/// HTTP backend speaking the messages-style completion API
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    api_key: Option<String>,
    api_url: String,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct MessageRequest {
    model: String,
    max_tokens: usize,
    messages: Vec<Message>,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    content: Vec<ContentBlock>,
    usage: Usage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    r#type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u64,
    output_tokens: u64,
}

impl HttpBackend {
    pub fn new(api_key: Option<&str>, api_url: Option<&str>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.map(|s| s.to_string()),
            api_url: api_url.unwrap_or(DEFAULT_API_URL).to_string(),
        }
    }

    /// Create from config
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self::new(config.api_key.as_deref(), config.api_url.as_deref())
    }

    /// Check if an API key is configured
    pub fn is_available(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl LlmBackend for HttpBackend {
    async fn generate(
        &self,
        model_id: &str,
        prompt: &str,
        max_tokens: usize,
    ) -> Result<LlmResponse> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("SOLACE_API_KEY not set - HTTP backend unavailable"))?;

        let request = MessageRequest {
            model: model_id.to_string(),
            max_tokens,
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        debug!("Calling backend: model={}, prompt_len={}", model_id, prompt.len());

        let response = self
            .client
            .post(&self.api_url)
            .header("x-api-key", api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await?;
            anyhow::bail!("backend error {}: {}", status, text);
        }

        let result: MessageResponse = response.json().await?;

        let content = result
            .content
            .into_iter()
            .filter_map(|b| if b.r#type == "text" { b.text } else { None })
            .collect::<Vec<_>>()
            .join("\n");

        info!(
            "Backend response: model={}, in={}, out={}",
            model_id, result.usage.input_tokens, result.usage.output_tokens
        );

        Ok(LlmResponse {
            content,
            model_id: model_id.to_string(),
            input_tokens: result.usage.input_tokens,
            output_tokens: result.usage.output_tokens,
        })
    }
}
