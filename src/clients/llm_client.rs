//! 模型后端抽象
//!
//! 托管 API 与本地服务实现同一个 [`ModelBackend`]，启动时按配置选定一次，
//! 调用方只持有 trait 对象。

use async_trait::async_trait;
use reqwest::Client;
use std::fmt;
use std::sync::Arc;

use crate::clients::{AnthropicClient, OllamaClient};
use crate::config::{Config, Provider};
use crate::error::{ConfigError, LlmError};

/// 生成结束的方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionState {
    /// 模型自然停止
    Complete,
    /// 因输出长度上限被截断，下游解析可能失败
    Truncated,
}

impl fmt::Display for CompletionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletionState::Complete => write!(f, "complete"),
            CompletionState::Truncated => write!(f, "truncated"),
        }
    }
}

/// 一次模型调用的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    pub state: CompletionState,
}

/// 模型后端
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// 后端名称（用于日志）
    fn name(&self) -> &str;

    /// 模型名称
    fn model(&self) -> &str;

    /// 发送一条提示词，返回生成文本与结束状态
    async fn generate(&self, prompt: &str) -> Result<Completion, LlmError>;

    /// 启动时的可用性检查
    async fn verify(&self) -> Result<(), ConfigError> {
        Ok(())
    }
}

/// 按配置创建模型后端
pub fn build_backend(config: &Config, http: Client) -> Result<Arc<dyn ModelBackend>, ConfigError> {
    let backend: Arc<dyn ModelBackend> = match config.provider {
        Provider::Anthropic => Arc::new(AnthropicClient::new(config, http)?),
        Provider::Ollama => Arc::new(OllamaClient::new(config, http)),
    };
    Ok(backend)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_backend_by_provider() {
        let http = Client::new();

        let config = Config::test_config();
        let backend = build_backend(&config, http.clone()).unwrap();
        assert_eq!(backend.name(), "ollama");
        assert_eq!(backend.model(), config.ollama_model);

        let config = Config {
            provider: Provider::Anthropic,
            anthropic_api_key: Some("sk-test".to_string()),
            ..Config::test_config()
        };
        let backend = build_backend(&config, http).unwrap();
        assert_eq!(backend.name(), "anthropic");
        assert_eq!(backend.model(), config.ai_model);
    }

    #[test]
    fn test_build_hosted_backend_without_key_fails() {
        let config = Config {
            provider: Provider::Anthropic,
            anthropic_api_key: None,
            ..Config::test_config()
        };
        assert!(matches!(
            build_backend(&config, Client::new()),
            Err(ConfigError::MissingCredential { .. })
        ));
    }
}
