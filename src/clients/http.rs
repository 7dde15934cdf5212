use crate::config::Config;
use crate::error::ConfigError;
use reqwest::Client;
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// 构建全局共享的 HTTP 客户端
///
/// 来源抓取和模型调用共用同一个连接池。
pub fn build_http_client(config: &Config) -> Result<Client, ConfigError> {
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(config.http_timeout)
        .user_agent(concat!("quiz_pipeline/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ConfigError::InvalidValue {
            name: "HTTP 客户端".to_string(),
            reason: e.to_string(),
        })
}
