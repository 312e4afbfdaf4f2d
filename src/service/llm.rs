//! Language model client
//!
//! Sends a single user message to an Anthropic-messages style endpoint and
//! returns the free-text reply. Services depend on [`LanguageModel`] so tests
//! can script replies and failures.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::model::ModelConfig;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ModelError {
    /// Transient: the transport gave up waiting for the reply
    #[error("Model invocation timed out: {0}")]
    Timeout(String),

    #[error("HTTP request failed: {0}")]
    Http(#[source] reqwest::Error),

    #[error("Model endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed model response: {0}")]
    InvalidResponse(String),
}

impl ModelError {
    /// Only read timeouts are worth another attempt
    pub fn is_transient(&self) -> bool {
        matches!(self, ModelError::Timeout(_))
    }
}

impl From<reqwest::Error> for ModelError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ModelError::Timeout(err.to_string())
        } else {
            ModelError::Http(err)
        }
    }
}

/// Anything that turns a prompt into a free-text reply
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn invoke(&self, prompt: &str) -> Result<String, ModelError>;
}

#[derive(Debug, Serialize)]
struct InvokeRequest<'a> {
    anthropic_version: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: Vec<ContentBlock<'a>>,
}

#[derive(Debug, Serialize)]
struct ContentBlock<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct InvokeResponse {
    #[serde(default)]
    content: Vec<ResponseBlock>,
}

#[derive(Debug, Deserialize)]
struct ResponseBlock {
    text: Option<String>,
}

/// HTTP client for the hosted model endpoint
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    config: ModelConfig,
}

impl LlmClient {
    pub fn new(config: ModelConfig) -> Result<Self, String> {
        let base_url = config.base_url();
        let endpoint = Url::parse(&base_url)
            .map_err(|e| format!("Invalid model endpoint '{}': {}", base_url, e))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(format!("Unsupported model endpoint scheme: {}", endpoint.scheme()));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| format!("Failed to create model HTTP client: {}", e))?;

        Ok(Self { client, config })
    }

    pub fn model_id(&self) -> &str {
        &self.config.model_id
    }

    fn invoke_url(&self) -> String {
        format!(
            "{}/model/{}/invoke",
            self.config.base_url(),
            self.config.model_id
        )
    }
}

#[async_trait]
impl LanguageModel for LlmClient {
    async fn invoke(&self, prompt: &str) -> Result<String, ModelError> {
        let body = InvokeRequest {
            anthropic_version: &self.config.api_version,
            max_tokens: self.config.max_tokens,
            messages: vec![Message {
                role: "user",
                content: vec![ContentBlock {
                    kind: "text",
                    text: prompt,
                }],
            }],
        };

        let start_time = std::time::Instant::now();
        tracing::debug!(
            model = %self.config.model_id,
            prompt_length = prompt.len(),
            "Invoking model"
        );

        let mut request = self.client.post(self.invoke_url()).json(&body);
        if let Some(ref key) = self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: InvokeResponse = response.json().await?;
        let text = extract_reply_text(parsed)?;

        tracing::info!(
            model = %self.config.model_id,
            elapsed_ms = start_time.elapsed().as_millis(),
            reply_length = text.len(),
            "Model invocation completed"
        );

        Ok(text)
    }
}

fn extract_reply_text(response: InvokeResponse) -> Result<String, ModelError> {
    response
        .content
        .into_iter()
        .next()
        .and_then(|block| block.text)
        .ok_or_else(|| ModelError::InvalidResponse("missing content[0].text".to_string()))
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    /// Replays a fixed script of replies and failures, recording prompts
    pub struct ScriptedModel {
        script: Mutex<VecDeque<Result<String, ModelError>>>,
        pub prompts: Mutex<Vec<String>>,
    }

    impl ScriptedModel {
        pub fn new(script: Vec<Result<String, ModelError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn replying(text: &str) -> Self {
            Self::new(vec![Ok(text.to_string())])
        }

        pub fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl LanguageModel for ScriptedModel {
        async fn invoke(&self, prompt: &str) -> Result<String, ModelError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ModelError::InvalidResponse("script exhausted".into())))
        }
    }
}
