use crate::error::ConfigError;
use std::str::FromStr;
use std::time::Duration;

/// 模型后端类型
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Provider {
    /// 托管 API（Anthropic Messages API）
    Anthropic,
    /// 本地 Ollama 服务
    Ollama,
}

impl Provider {
    pub fn name(self) -> &'static str {
        match self {
            Provider::Anthropic => "anthropic",
            Provider::Ollama => "ollama",
        }
    }
}

impl FromStr for Provider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "anthropic" => Ok(Provider::Anthropic),
            "ollama" => Ok(Provider::Ollama),
            other => Err(ConfigError::UnknownProvider(other.to_string())),
        }
    }
}

/// 程序配置
///
/// 启动时构建一次，之后只读，以引用传给所有组件。
#[derive(Clone, Debug)]
pub struct Config {
    // --- 模型后端 ---
    pub provider: Provider,
    pub anthropic_api_key: Option<String>,
    pub anthropic_base_url: String,
    pub ai_model: String,
    pub ai_max_tokens: u32,
    pub ollama_base_url: String,
    pub ollama_model: String,
    pub http_timeout: Duration,

    // --- 批处理与重试 ---
    pub batch_size: usize,
    pub rate_limit_delay: Duration,
    pub max_retries: u32,
    pub retry_delay_base: Duration,

    // --- 文件路径 ---
    /// 来源列表（TOML）
    pub sources_file: String,
    /// 解析阶段输出目录
    pub parsed_dir: String,
    /// 题库产物输出目录
    pub output_dir: String,

    // --- 来源抓取 ---
    pub source_base_url: String,
    pub source_branch: String,
    pub source_filename: String,
    pub trusted_domain_suffix: String,
    pub max_document_bytes: u64,

    // --- 题目抽取阈值（字符数） ---
    pub min_answer_len: usize,
    pub max_question_len: usize,
    pub max_answer_len: usize,
    pub answer_preview_len: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: Provider::Anthropic,
            anthropic_api_key: None,
            anthropic_base_url: "https://api.anthropic.com".to_string(),
            ai_model: "claude-3-5-haiku-20241022".to_string(),
            ai_max_tokens: 4096,
            ollama_base_url: "http://localhost:11434".to_string(),
            ollama_model: "qwen2.5-coder:7b".to_string(),
            http_timeout: Duration::from_secs(120),
            batch_size: 3,
            rate_limit_delay: Duration::from_millis(1000),
            max_retries: 3,
            retry_delay_base: Duration::from_millis(1000),
            sources_file: "sources.toml".to_string(),
            parsed_dir: "parsed".to_string(),
            output_dir: "public/data".to_string(),
            source_base_url: "https://raw.githubusercontent.com/Devinterview-io".to_string(),
            source_branch: "main".to_string(),
            source_filename: "README.md".to_string(),
            trusted_domain_suffix: "githubusercontent.com".to_string(),
            max_document_bytes: 10 * 1024 * 1024,
            min_answer_len: 50,
            max_question_len: 2000,
            max_answer_len: 50_000,
            answer_preview_len: 500,
        }
    }
}

impl Config {
    /// 从环境变量读取配置，未设置的项使用默认值
    pub fn from_env() -> Result<Self, ConfigError> {
        let default = Self::default();
        Ok(Self {
            provider: match std::env::var("AI_PROVIDER") {
                Ok(value) => value.parse()?,
                Err(_) => default.provider,
            },
            anthropic_api_key: std::env::var("ANTHROPIC_API_KEY")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            anthropic_base_url: env_string("ANTHROPIC_BASE_URL", default.anthropic_base_url),
            ai_model: env_string("AI_MODEL", default.ai_model),
            ai_max_tokens: env_parse("AI_MAX_TOKENS", default.ai_max_tokens)?,
            ollama_base_url: env_string("OLLAMA_BASE_URL", default.ollama_base_url),
            ollama_model: env_string("OLLAMA_MODEL", default.ollama_model),
            http_timeout: Duration::from_secs(env_parse(
                "HTTP_TIMEOUT_SECS",
                default.http_timeout.as_secs(),
            )?),
            batch_size: env_parse("BATCH_SIZE", default.batch_size)?,
            rate_limit_delay: Duration::from_millis(env_parse(
                "RATE_LIMIT_DELAY_MS",
                default.rate_limit_delay.as_millis() as u64,
            )?),
            max_retries: env_parse("MAX_RETRIES", default.max_retries)?,
            retry_delay_base: Duration::from_millis(env_parse(
                "RETRY_DELAY_BASE_MS",
                default.retry_delay_base.as_millis() as u64,
            )?),
            sources_file: env_string("SOURCES_FILE", default.sources_file),
            parsed_dir: env_string("PARSED_DIR", default.parsed_dir),
            output_dir: env_string("OUTPUT_DIR", default.output_dir),
            source_base_url: env_string("SOURCE_BASE_URL", default.source_base_url),
            source_branch: env_string("SOURCE_BRANCH", default.source_branch),
            source_filename: env_string("SOURCE_FILENAME", default.source_filename),
            trusted_domain_suffix: env_string(
                "TRUSTED_DOMAIN_SUFFIX",
                default.trusted_domain_suffix,
            ),
            ..default
        })
    }

    /// 启动前校验
    ///
    /// 缺少托管后端凭据、批大小为 0 等问题会在处理任何来源之前终止运行。
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_limits()?;
        if self.provider == Provider::Anthropic && self.anthropic_api_key.is_none() {
            return Err(ConfigError::MissingCredential {
                var_name: "ANTHROPIC_API_KEY".to_string(),
                provider: self.provider.name().to_string(),
            });
        }
        Ok(())
    }

    /// 只校验与模型后端无关的数值项
    pub fn validate_limits(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                name: "BATCH_SIZE".to_string(),
                reason: "必须大于 0".to_string(),
            });
        }
        if self.max_document_bytes == 0 {
            return Err(ConfigError::InvalidValue {
                name: "max_document_bytes".to_string(),
                reason: "必须大于 0".to_string(),
            });
        }
        Ok(())
    }

    /// 当前后端使用的模型名
    pub fn model_name(&self) -> &str {
        match self.provider {
            Provider::Anthropic => &self.ai_model,
            Provider::Ollama => &self.ollama_model,
        }
    }

    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            provider: Provider::Ollama,
            rate_limit_delay: Duration::from_millis(10),
            retry_delay_base: Duration::from_millis(10),
            sources_file: "sources-test.toml".to_string(),
            parsed_dir: "parsed-test".to_string(),
            output_dir: "output-test".to_string(),
            ..Self::default()
        }
    }
}

fn env_string(var_name: &str, default: String) -> String {
    std::env::var(var_name).unwrap_or(default)
}

fn env_parse<T: FromStr>(var_name: &str, default: T) -> Result<T, ConfigError> {
    match std::env::var(var_name) {
        Ok(value) => value.trim().parse().map_err(|_| ConfigError::EnvVarParseFailed {
            var_name: var_name.to_string(),
            value,
            expected_type: std::any::type_name::<T>().to_string(),
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds() {
        let config = Config::default();
        assert_eq!(config.batch_size, 3);
        assert_eq!(config.max_document_bytes, 10 * 1024 * 1024);
        assert_eq!(config.min_answer_len, 50);
        assert_eq!(config.max_question_len, 2000);
        assert_eq!(config.max_answer_len, 50_000);
    }

    #[test]
    fn test_provider_from_str() {
        assert_eq!("anthropic".parse::<Provider>().unwrap(), Provider::Anthropic);
        assert_eq!(" Ollama ".parse::<Provider>().unwrap(), Provider::Ollama);
        assert!(matches!(
            "openai".parse::<Provider>(),
            Err(ConfigError::UnknownProvider(_))
        ));
    }

    #[test]
    fn test_missing_credential_fails_validation() {
        let config = Config {
            provider: Provider::Anthropic,
            anthropic_api_key: None,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingCredential { .. })
        ));

        let config = Config {
            anthropic_api_key: Some("sk-test".to_string()),
            ..config
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_local_backend_needs_no_credential() {
        assert!(Config::test_config().validate().is_ok());
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let config = Config {
            batch_size: 0,
            ..Config::test_config()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
