//! 本地后端：Ollama `/api/generate`

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::clients::llm_client::{Completion, CompletionState, ModelBackend};
use crate::config::Config;
use crate::error::{ConfigError, LlmError};

const BACKEND: &str = "ollama";
const TEMPERATURE: f32 = 0.7;

pub struct OllamaClient {
    http: Client,
    base_url: String,
    model: String,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
struct ModelTag {
    name: String,
}

impl OllamaClient {
    pub fn new(config: &Config, http: Client) -> Self {
        Self {
            http,
            base_url: config.ollama_base_url.trim_end_matches('/').to_string(),
            model: config.ollama_model.clone(),
            max_tokens: config.ai_max_tokens,
        }
    }

    /// 列出本地已拉取的模型
    async fn list_models(&self) -> Result<Vec<String>, ConfigError> {
        let url = format!("{}/api/tags", self.base_url);
        let backend_unreachable = |message: String| ConfigError::BackendUnreachable {
            url: url.clone(),
            message,
        };

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| backend_unreachable(format!("{} (请确认已运行 `ollama serve`)", e)))?;

        if !response.status().is_success() {
            return Err(backend_unreachable(format!("HTTP {}", response.status())));
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| backend_unreachable(format!("模型列表解析失败: {}", e)))?;

        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }
}

#[async_trait]
impl ModelBackend for OllamaClient {
    fn name(&self) -> &str {
        BACKEND
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<Completion, LlmError> {
        let url = format!("{}/api/generate", self.base_url);
        debug!("调用 {}，模型: {}，提示词 {} 字符", BACKEND, self.model, prompt.len());

        let body = json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
            "options": {
                "temperature": TEMPERATURE,
                "num_predict": self.max_tokens,
            },
        });

        let response = self
            .http
            .post(&url)
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

        let generated: GenerateResponse = response
            .json()
            .await
            .map_err(|e| LlmError::from_transport(BACKEND, e))?;

        into_completion(generated)
    }

    async fn verify(&self) -> Result<(), ConfigError> {
        let available = self.list_models().await?;
        ensure_model_available(&self.model, available)
    }
}

fn into_completion(generated: GenerateResponse) -> Result<Completion, LlmError> {
    if generated.response.trim().is_empty() {
        return Err(LlmError::EmptyContent {
            backend: BACKEND.to_string(),
        });
    }

    let state = if generated.done {
        CompletionState::Complete
    } else {
        CompletionState::Truncated
    };

    Ok(Completion {
        text: generated.response,
        state,
    })
}

fn ensure_model_available(model: &str, available: Vec<String>) -> Result<(), ConfigError> {
    if available.iter().any(|name| name == model) {
        info!("✓ Ollama 可用 ({} 个模型)", available.len());
        Ok(())
    } else {
        Err(ConfigError::ModelNotFound {
            model: model.to_string(),
            available,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_done_flag_maps_to_state() {
        let done: GenerateResponse =
            serde_json::from_str(r#"{"model":"m","response":"[]","done":true}"#).unwrap();
        assert_eq!(into_completion(done).unwrap().state, CompletionState::Complete);

        let cut: GenerateResponse =
            serde_json::from_str(r#"{"response":"[{","done":false}"#).unwrap();
        assert_eq!(into_completion(cut).unwrap().state, CompletionState::Truncated);
    }

    #[test]
    fn test_empty_response_is_error() {
        let empty: GenerateResponse = serde_json::from_str(r#"{"response":"  ","done":true}"#).unwrap();
        assert!(matches!(
            into_completion(empty),
            Err(LlmError::EmptyContent { .. })
        ));
    }

    #[test]
    fn test_model_catalog_check() {
        let tags: TagsResponse = serde_json::from_str(
            r#"{"models":[{"name":"llama3:8b"},{"name":"qwen2.5-coder:7b"}]}"#,
        )
        .unwrap();
        let names: Vec<String> = tags.models.into_iter().map(|m| m.name).collect();

        assert!(ensure_model_available("qwen2.5-coder:7b", names.clone()).is_ok());
        assert!(matches!(
            ensure_model_available("mistral", names),
            Err(ConfigError::ModelNotFound { .. })
        ));
    }

    /// 需要本地运行 Ollama：cargo test -- --ignored
    #[tokio::test]
    #[ignore]
    async fn test_live_generate() {
        let _ = tracing_subscriber::fmt::try_init();
        let config = Config::test_config();
        let client = OllamaClient::new(&config, Client::new());

        client.verify().await.expect("Ollama 不可用");
        let completion = client
            .generate("Reply with the JSON array [1, 2, 3] and nothing else.")
            .await
            .expect("生成失败");
        assert!(!completion.text.is_empty());
    }
}
