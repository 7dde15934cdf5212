use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::models::dataset::ParsedDataset;

/// 模型为单道题返回的格式化记录
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelRecord {
    pub correct_answer: String,
    pub wrong_answers: Vec<String>,
    #[serde(default)]
    pub explanation: String,
}

/// 最终的选择题
///
/// 不变量：`options[correct_index]` 就是正确答案。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattedQuestion {
    pub id: usize,
    pub question: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    pub explanation: String,
}

/// 一个来源的题库产物
///
/// 文件存在且 `questions` 非空即视为已完成。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizArtifact {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub category: String,
    pub total_questions: usize,
    pub topics: BTreeSet<String>,
    pub questions: Vec<FormattedQuestion>,
    pub processed_at: DateTime<Utc>,
}

impl QuizArtifact {
    pub fn new(
        dataset: &ParsedDataset,
        topics: BTreeSet<String>,
        questions: Vec<FormattedQuestion>,
    ) -> Self {
        Self {
            id: dataset.id.clone(),
            name: dataset.name.clone(),
            slug: dataset.slug.clone(),
            category: dataset.category.clone(),
            total_questions: questions.len(),
            topics,
            questions,
            processed_at: Utc::now(),
        }
    }

    /// 是否可以作为幂等标记（题目非空）
    pub fn is_complete(&self) -> bool {
        !self.questions.is_empty()
    }
}
