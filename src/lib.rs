//! # Quiz Pipeline
//!
//! 离线题库生成工具：从公开的面试题 Markdown 文档中抽取问答对，
//! 再交给大模型改写成四选一的选择题。
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 客户端层（Clients）
//! - `clients/` - 持有网络资源，只暴露能力
//! - `ModelBackend` - 托管 API 与本地 Ollama 的统一抽象
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，每个服务只做一件事
//! - `SourceFetcher` / `QuestionExtractor` - 抓取与抽取
//! - `PromptBuilder` / `ModelInvoker` - 提示词与带重试的模型调用
//! - `response_parser` / `option_shuffler` - 响应解析与选项洗牌
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个来源"的批处理流程
//! - `BatchCtx` - 上下文封装（来源 + 批次序号）
//! - `BatchFlow` - 流程编排（prompt → invoke → parse → assemble）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/run_processor` - 按阶段遍历全部来源
//! - `orchestrator/source_processor` - 处理单个来源，负责幂等与落盘
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{Completion, CompletionState, ModelBackend};
pub use config::{Config, Provider};
pub use error::{AppError, AppResult};
pub use models::{FormattedQuestion, ParsedDataset, QaPair, QuizArtifact, SourceDescriptor};
pub use orchestrator::{App, RunReport, RunStats, Stage};
pub use workflow::{BatchCtx, BatchFlow};
