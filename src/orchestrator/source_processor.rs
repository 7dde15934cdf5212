//! 单个来源处理器 - 编排层
//!
//! ## 职责
//!
//! 处理单个来源在两个阶段中的工作，是来源级别的编排器。
//!
//! - **解析阶段**：抓取文档 → 抽取问答对 → 写入 `<parsed_dir>/<id>.json`
//! - **生成阶段**：读取解析结果 → 交给 `BatchFlow` → 写入 `<output_dir>/<id>.json`
//!
//! 两个阶段都以产物文件作为幂等标记，已完成的来源直接跳过。
//! 产物只在全部完成后一次性写入。

use anyhow::{bail, Context, Result};
use std::path::Path;
use tracing::{info, warn};

use crate::models::{read_json, write_json_atomic, ParsedDataset, QuizArtifact, SourceDescriptor};
use crate::services::{extract_topics, QuestionExtractor, SourceFetcher};
use crate::workflow::BatchFlow;

/// 单个来源的处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceOutcome {
    /// 已处理，附带写入的题目数
    Processed(usize),
    /// 产物已存在，跳过
    Skipped,
}

/// 解析单个来源
pub async fn parse_source(
    fetcher: &SourceFetcher,
    extractor: &QuestionExtractor,
    source: &SourceDescriptor,
    parsed_dir: &Path,
) -> Result<SourceOutcome> {
    let path = parsed_dir.join(format!("{}.json", source.id));

    if tokio::fs::try_exists(&path).await.unwrap_or(false) {
        info!("⏭️  [SKIP] {} (已解析)", source.name);
        return Ok(SourceOutcome::Skipped);
    }

    info!("🌐 [FETCH] {}...", source.name);
    let markdown = fetcher
        .fetch(&source.origin_slug)
        .await
        .with_context(|| format!("抓取 {} 失败", source.origin_slug))?;

    let questions = extractor.extract(&markdown);
    info!("✓ 找到 {} 道题", questions.len());
    if questions.is_empty() {
        warn!("⚠️  {} 中没有符合条件的题目", source.name);
    }

    let dataset = ParsedDataset::new(source, questions);
    write_json_atomic(&path, &dataset).await?;
    info!("💾 已保存至 {}", path.display());

    Ok(SourceOutcome::Processed(dataset.total_questions))
}

/// 为单个来源生成题库
pub async fn generate_source(
    flow: &BatchFlow,
    source: &SourceDescriptor,
    parsed_dir: &Path,
    output_dir: &Path,
) -> Result<SourceOutcome> {
    let output_path = output_dir.join(format!("{}.json", source.id));

    match read_json::<QuizArtifact>(&output_path).await {
        Ok(Some(existing)) if existing.is_complete() => {
            info!("⏭️  [SKIP] {} (已生成)", existing.name);
            return Ok(SourceOutcome::Skipped);
        }
        Ok(Some(existing)) => {
            info!("🔁 [REGEN] {} (产物中没有题目)", existing.name);
        }
        Ok(None) => {}
        Err(e) => {
            warn!("⚠️  已有产物无法读取，将重新生成: {}", e);
        }
    }

    let parsed_path = parsed_dir.join(format!("{}.json", source.id));
    let Some(dataset) = read_json::<ParsedDataset>(&parsed_path).await? else {
        bail!(
            "未找到解析结果 {}，请先运行 parse 阶段",
            parsed_path.display()
        );
    };

    info!("⚙️  [PROCESS] {}...", dataset.name);
    info!("   待格式化题目: {} 道", dataset.total_questions);

    let outcome = flow.run(&dataset).await;
    if outcome.failed_batches > 0 {
        warn!("⚠️  {} 个批次失败，对应题目已跳过", outcome.failed_batches);
    }
    if outcome.questions.is_empty() && !dataset.questions.is_empty() {
        warn!("⚠️  {} 的所有批次均失败，写入空产物，下次运行将重新生成", dataset.name);
    }

    let topics = extract_topics(&dataset.questions);
    let artifact = QuizArtifact::new(&dataset, topics, outcome.questions);
    write_json_atomic(&output_path, &artifact).await?;

    info!(
        "✓ 已生成 {} 道题，主题: [{}]",
        artifact.total_questions,
        artifact
            .topics
            .iter()
            .cloned()
            .collect::<Vec<_>>()
            .join(", ")
    );

    Ok(SourceOutcome::Processed(artifact.total_questions))
}
