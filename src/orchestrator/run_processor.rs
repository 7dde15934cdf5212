//! 运行处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责按阶段遍历全部来源并汇总统计。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：校验配置、创建 HTTP 客户端、选定并检查模型后端
//! 2. **来源加载**：读取来源列表
//! 3. **串行处理**：逐个来源委托 `source_processor`
//! 4. **错误隔离**：单个来源失败只计数，不中断运行
//! 5. **全局统计**：输出 processed / skipped / failed

use anyhow::Result;
use reqwest::Client;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use tracing::error;

use crate::clients::{build_backend, build_http_client, ModelBackend};
use crate::config::Config;
use crate::error::{AppResult, ConfigError, FileError};
use crate::models::load_sources;
use crate::orchestrator::source_processor::{self, SourceOutcome};
use crate::services::{QuestionExtractor, SourceFetcher};
use crate::utils::logging;
use crate::workflow::BatchFlow;

/// 运行的阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// 只抓取并解析来源
    Parse,
    /// 只用模型生成题库
    Generate,
    /// 先解析再生成
    All,
}

impl Stage {
    /// 该阶段是否需要模型后端
    pub fn needs_model(self) -> bool {
        matches!(self, Stage::Generate | Stage::All)
    }

    pub fn name(self) -> &'static str {
        match self {
            Stage::Parse => "parse",
            Stage::Generate => "generate",
            Stage::All => "all",
        }
    }
}

impl FromStr for Stage {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "parse" => Ok(Stage::Parse),
            "generate" => Ok(Stage::Generate),
            "all" => Ok(Stage::All),
            other => Err(ConfigError::InvalidValue {
                name: "stage".to_string(),
                reason: format!("未知阶段 '{}' (可选: parse, generate, all)", other),
            }),
        }
    }
}

/// 单个阶段的处理统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub total: usize,
}

impl RunStats {
    fn record(&mut self, outcome: &Result<SourceOutcome>) {
        match outcome {
            Ok(SourceOutcome::Processed(_)) => self.processed += 1,
            Ok(SourceOutcome::Skipped) => self.skipped += 1,
            Err(_) => self.failed += 1,
        }
    }
}

/// 一次运行的结果
#[derive(Debug, Default, Clone, Copy)]
pub struct RunReport {
    pub parse: Option<RunStats>,
    pub generate: Option<RunStats>,
}

/// 应用主结构
pub struct App {
    config: Config,
    http: Client,
    backend: Option<Arc<dyn ModelBackend>>,
}

impl App {
    /// 初始化应用
    ///
    /// 需要模型的阶段会在这里创建后端并做可用性检查，
    /// 任何配置问题都在处理第一个来源之前报错。
    pub async fn initialize(config: Config, stage: Stage) -> AppResult<Self> {
        if stage.needs_model() {
            config.validate()?;
        } else {
            config.validate_limits()?;
        }
        let http = build_http_client(&config)?;

        let backend = if stage.needs_model() {
            let backend = build_backend(&config, http.clone())?;
            backend.verify().await?;
            Some(backend)
        } else {
            None
        };

        logging::log_startup(
            stage.name(),
            backend.as_ref().map(|b| b.name()),
            config.model_name(),
        );

        Ok(Self {
            config,
            http,
            backend,
        })
    }

    /// 使用给定后端创建应用（不做可用性检查）
    pub fn with_backend(config: Config, backend: Arc<dyn ModelBackend>) -> AppResult<Self> {
        config.validate_limits()?;
        let http = build_http_client(&config)?;
        Ok(Self {
            config,
            http,
            backend: Some(backend),
        })
    }

    /// 运行指定阶段
    pub async fn run(&self, stage: Stage) -> AppResult<RunReport> {
        let mut report = RunReport::default();

        if matches!(stage, Stage::Parse | Stage::All) {
            report.parse = Some(self.run_parse().await?);
        }
        if stage.needs_model() {
            report.generate = Some(self.run_generate().await?);
        }

        Ok(report)
    }

    /// 解析阶段
    async fn run_parse(&self) -> AppResult<RunStats> {
        let sources = load_sources(Path::new(&self.config.sources_file)).await?;
        let parsed_dir = Path::new(&self.config.parsed_dir);
        tokio::fs::create_dir_all(parsed_dir)
            .await
            .map_err(|e| FileError::write(&self.config.parsed_dir, e))?;

        let fetcher = SourceFetcher::new(&self.config, self.http.clone());
        let extractor = QuestionExtractor::new(&self.config);

        let mut stats = RunStats {
            total: sources.len(),
            ..Default::default()
        };
        logging::log_stage_start("parse", stats.total);

        for (index, source) in sources.iter().enumerate() {
            logging::log_source_start(index + 1, stats.total, &source.name);
            let outcome =
                source_processor::parse_source(&fetcher, &extractor, source, parsed_dir).await;
            if let Err(e) = &outcome {
                error!("❌ {} 解析失败: {:#}", source.name, e);
            }
            stats.record(&outcome);
        }

        logging::print_final_stats(
            "parse",
            stats.processed,
            stats.skipped,
            stats.failed,
            &self.config.parsed_dir,
        );
        Ok(stats)
    }

    /// 生成阶段
    async fn run_generate(&self) -> AppResult<RunStats> {
        let backend = self.backend.clone().ok_or_else(|| ConfigError::InvalidValue {
            name: "AI_PROVIDER".to_string(),
            reason: "生成阶段需要模型后端".to_string(),
        })?;

        let parsed_dir = Path::new(&self.config.parsed_dir);
        if !tokio::fs::try_exists(parsed_dir).await.unwrap_or(false) {
            return Err(FileError::DirectoryNotFound {
                path: self.config.parsed_dir.clone(),
            }
            .into());
        }

        let sources = load_sources(Path::new(&self.config.sources_file)).await?;
        let output_dir = Path::new(&self.config.output_dir);
        tokio::fs::create_dir_all(output_dir)
            .await
            .map_err(|e| FileError::write(&self.config.output_dir, e))?;

        let flow = BatchFlow::new(&self.config, backend);

        let mut stats = RunStats {
            total: sources.len(),
            ..Default::default()
        };
        logging::log_stage_start("generate", stats.total);

        for (index, source) in sources.iter().enumerate() {
            logging::log_source_start(index + 1, stats.total, &source.name);
            let outcome =
                source_processor::generate_source(&flow, source, parsed_dir, output_dir).await;
            if let Err(e) = &outcome {
                error!("❌ {} 生成失败: {:#}", source.name, e);
            }
            stats.record(&outcome);
        }

        logging::print_final_stats(
            "generate",
            stats.processed,
            stats.skipped,
            stats.failed,
            &self.config.output_dir,
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_from_str() {
        assert_eq!("parse".parse::<Stage>().unwrap(), Stage::Parse);
        assert_eq!("GENERATE".parse::<Stage>().unwrap(), Stage::Generate);
        assert_eq!("all".parse::<Stage>().unwrap(), Stage::All);
        assert!("deploy".parse::<Stage>().is_err());
    }

    #[test]
    fn test_stage_needs_model() {
        assert!(!Stage::Parse.needs_model());
        assert!(Stage::Generate.needs_model());
        assert!(Stage::All.needs_model());
    }

    #[tokio::test]
    async fn test_parse_stage_skips_model_setup() {
        // 托管后端缺少凭据，但解析阶段不需要模型
        let config = Config {
            provider: crate::config::Provider::Anthropic,
            anthropic_api_key: None,
            ..Config::test_config()
        };

        assert!(App::initialize(config.clone(), Stage::Parse).await.is_ok());
        assert!(matches!(
            App::initialize(config, Stage::Generate).await,
            Err(crate::error::AppError::Config(ConfigError::MissingCredential { .. }))
        ));
    }

    #[tokio::test]
    async fn test_generate_without_backend_fails() {
        let app = App::initialize(Config::test_config(), Stage::Parse)
            .await
            .unwrap();
        assert!(matches!(
            app.run_generate().await,
            Err(crate::error::AppError::Config(ConfigError::InvalidValue { .. }))
        ));
    }
}
