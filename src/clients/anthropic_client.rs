//! 托管后端：Anthropic Messages API

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::clients::llm_client::{Completion, CompletionState, ModelBackend};
use crate::config::{Config, Provider};
use crate::error::{ConfigError, LlmError};

const BACKEND: &str = "anthropic";
const API_VERSION: &str = "2023-06-01";

pub struct AnthropicClient {
    http: Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

impl AnthropicClient {
    pub fn new(config: &Config, http: Client) -> Result<Self, ConfigError> {
        let api_key = config
            .anthropic_api_key
            .clone()
            .ok_or_else(|| ConfigError::MissingCredential {
                var_name: "ANTHROPIC_API_KEY".to_string(),
                provider: Provider::Anthropic.name().to_string(),
            })?;

        Ok(Self {
            http,
            api_key,
            base_url: config.anthropic_base_url.trim_end_matches('/').to_string(),
            model: config.ai_model.clone(),
            max_tokens: config.ai_max_tokens,
        })
    }
}

#[async_trait]
impl ModelBackend for AnthropicClient {
    fn name(&self) -> &str {
        BACKEND
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<Completion, LlmError> {
        let url = format!("{}/v1/messages", self.base_url);
        debug!("调用 {}，模型: {}，提示词 {} 字符", BACKEND, self.model, prompt.len());

        let body = json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let response = self
            .http
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::from_transport(BACKEND, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<无法读取响应体>".to_string());
            return Err(LlmError::Status {
                backend: BACKEND.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let message: MessagesResponse = response
            .json()
            .await
            .map_err(|e| LlmError::from_transport(BACKEND, e))?;

        into_completion(message)
    }
}

fn into_completion(message: MessagesResponse) -> Result<Completion, LlmError> {
    let text: String = message.content.into_iter().map(|block| block.text).collect();
    if text.trim().is_empty() {
        return Err(LlmError::EmptyContent {
            backend: BACKEND.to_string(),
        });
    }

    let state = match message.stop_reason.as_deref() {
        Some("max_tokens") => CompletionState::Truncated,
        _ => CompletionState::Complete,
    };

    Ok(Completion { text, state })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> Result<Completion, LlmError> {
        into_completion(serde_json::from_str(body).unwrap())
    }

    #[test]
    fn test_end_turn_is_complete() {
        let completion = parse(
            r#"{"content":[{"type":"text","text":"[]"}],"stop_reason":"end_turn","model":"m"}"#,
        )
        .unwrap();
        assert_eq!(completion.text, "[]");
        assert_eq!(completion.state, CompletionState::Complete);
    }

    #[test]
    fn test_max_tokens_is_truncated() {
        let completion =
            parse(r#"{"content":[{"type":"text","text":"[{\"a\":"}],"stop_reason":"max_tokens"}"#)
                .unwrap();
        assert_eq!(completion.state, CompletionState::Truncated);
    }

    #[test]
    fn test_empty_content_is_error() {
        assert!(matches!(
            parse(r#"{"content":[],"stop_reason":"end_turn"}"#),
            Err(LlmError::EmptyContent { .. })
        ));
    }
}
