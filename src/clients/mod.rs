//! 客户端层
//!
//! 持有网络资源（共享的 `reqwest::Client`），只对外暴露能力。

pub mod anthropic_client;
pub mod http;
pub mod llm_client;
pub mod ollama_client;

pub use anthropic_client::AnthropicClient;
pub use http::build_http_client;
pub use llm_client::{build_backend, Completion, CompletionState, ModelBackend};
pub use ollama_client::OllamaClient;
