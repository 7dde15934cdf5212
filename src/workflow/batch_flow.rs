//! 批次处理流程 - 流程层
//!
//! 核心职责：定义"一个来源的全部题目"如何分批交给模型并组装成选择题
//!
//! 流程顺序：
//! 1. 按批大小切分
//! 2. 每批：构建提示词 → 调用模型（带重试）→ 解析 → 洗牌组装
//! 3. 每批之后固定等待，控制请求速率
//!
//! 单批失败只记录日志并跳过，不影响其余批次。

use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::clients::{CompletionState, ModelBackend};
use crate::config::Config;
use crate::error::AppResult;
use crate::models::{FormattedQuestion, ModelRecord, ParsedDataset, QaPair};
use crate::services::{
    clean_answer, duplicates_correct, parse_records, shuffle_options, ModelInvoker, PromptBuilder,
    RetryPolicy,
};
use crate::utils::logging::truncate_text;
use crate::workflow::batch_ctx::BatchCtx;

/// 一个来源的处理结果
#[derive(Debug, Default)]
pub struct FlowOutcome {
    pub questions: Vec<FormattedQuestion>,
    pub failed_batches: usize,
}

/// 批次处理流程
///
/// - 不持有文件，只依赖业务能力（services）
/// - 批次严格串行
pub struct BatchFlow {
    invoker: ModelInvoker,
    prompts: PromptBuilder,
    batch_size: usize,
    pacing: Duration,
}

impl BatchFlow {
    pub fn new(config: &Config, backend: Arc<dyn ModelBackend>) -> Self {
        Self {
            invoker: ModelInvoker::new(backend, RetryPolicy::from_config(config)),
            prompts: PromptBuilder::new(config),
            batch_size: config.batch_size.max(1),
            pacing: config.rate_limit_delay,
        }
    }

    /// 处理一个数据集的全部题目
    pub async fn run(&self, dataset: &ParsedDataset) -> FlowOutcome {
        let mut outcome = FlowOutcome::default();
        let total_batches = dataset.questions.len().div_ceil(self.batch_size);

        for (i, batch) in dataset.questions.chunks(self.batch_size).enumerate() {
            let ctx = BatchCtx::new(
                &dataset.name,
                i + 1,
                total_batches,
                i * self.batch_size + 1,
                batch.len(),
            );

            match self.process_batch(dataset, batch, &ctx).await {
                Ok(questions) => {
                    info!("{} ✓ 完成 {} 道题", ctx, questions.len());
                    outcome.questions.extend(questions);
                }
                Err(e) => {
                    error!("{} ❌ 批次失败，已跳过: {}", ctx, e);
                    outcome.failed_batches += 1;
                }
            }

            sleep(self.pacing).await;
        }

        outcome
    }

    async fn process_batch(
        &self,
        dataset: &ParsedDataset,
        batch: &[QaPair],
        ctx: &BatchCtx,
    ) -> AppResult<Vec<FormattedQuestion>> {
        let prompt = self
            .prompts
            .build(&dataset.name, &dataset.category, batch);

        let completion = self.invoker.invoke(&prompt).await?;
        if completion.state == CompletionState::Truncated {
            debug!("{} 模型输出被截断", ctx);
        }

        let records = parse_records(&completion.text).map_err(|e| {
            warn!(
                "{} 响应长度: {} 字符, 结束状态: {}",
                ctx,
                completion.text.chars().count(),
                completion.state
            );
            debug!("{} 响应预览: {}", ctx, truncate_text(&completion.text, 200));
            if completion.state == CompletionState::Truncated {
                warn!("{} 输出被截断，可减小 BATCH_SIZE 或增大 AI_MAX_TOKENS", ctx);
            }
            e
        })?;

        if records.len() < batch.len() {
            warn!(
                "{} 模型只返回了 {}/{} 条记录，缺失的题目将被跳过",
                ctx,
                records.len(),
                batch.len()
            );
        }

        Ok(assemble(batch, &records, ctx))
    }
}

/// 按位置把模型记录与原题配对，组装成选择题
///
/// 多出的记录忽略；缺少记录的原题跳过。
fn assemble(batch: &[QaPair], records: &[ModelRecord], ctx: &BatchCtx) -> Vec<FormattedQuestion> {
    let mut rng = rand::thread_rng();

    batch
        .iter()
        .zip(records)
        .map(|(original, record)| {
            if duplicates_correct(&record.correct_answer, &record.wrong_answers) {
                warn!("{} ⚠️  第 {} 题的错误选项与正确答案重复", ctx, original.id);
            }

            let shuffled = shuffle_options(&record.correct_answer, &record.wrong_answers, &mut rng);
            let explanation = if record.explanation.trim().is_empty() {
                clean_answer(&original.answer)
            } else {
                record.explanation.clone()
            };

            FormattedQuestion {
                id: original.id,
                question: original.question.clone(),
                options: shuffled.options,
                correct_index: shuffled.correct_index,
                explanation,
            }
        })
        .collect()
}
