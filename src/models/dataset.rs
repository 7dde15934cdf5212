use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::source::SourceDescriptor;

/// 抽取出的一道题
///
/// `id` 是原文中的小节序号，被丢弃的小节不会导致重新编号。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaPair {
    pub id: usize,
    pub question: String,
    pub answer: String,
}

/// 解析阶段的持久化产物，每个来源一个 JSON 文件
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedDataset {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub category: String,
    pub total_questions: usize,
    pub questions: Vec<QaPair>,
    pub parsed_at: DateTime<Utc>,
}

impl ParsedDataset {
    pub fn new(source: &SourceDescriptor, questions: Vec<QaPair>) -> Self {
        Self {
            id: source.id.clone(),
            name: source.name.clone(),
            slug: source.origin_slug.clone(),
            category: source.category.clone(),
            total_questions: questions.len(),
            questions,
            parsed_at: Utc::now(),
        }
    }
}
