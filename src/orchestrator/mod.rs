//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责按阶段遍历来源和汇总统计，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `run_processor` - 运行处理器
//! - 管理应用生命周期（初始化、运行）
//! - 选定模型后端并在启动时检查可用性
//! - 串行遍历来源列表
//! - 输出每个阶段的统计信息
//!
//! ### `source_processor` - 单个来源处理器
//! - 解析阶段：抓取、抽取、写入解析结果
//! - 生成阶段：幂等检查、委托 BatchFlow、写入题库产物
//!
//! ## 层次关系
//!
//! ```text
//! run_processor (处理 Vec<SourceDescriptor>)
//!     ↓
//! source_processor (处理单个来源)
//!     ↓
//! workflow::BatchFlow (处理一个来源的全部批次)
//!     ↓
//! services (能力层：fetch / extract / prompt / invoke / parse / shuffle)
//!     ↓
//! clients (模型后端、HTTP 客户端)
//! ```

pub mod run_processor;
pub mod source_processor;

// 重新导出主要类型
pub use run_processor::{App, RunReport, RunStats, Stage};
pub use source_processor::{generate_source, parse_source, SourceOutcome};
