//! 题目抽取服务
//!
//! 把 Markdown 文档按 `## N. ` 标题切分为问答对。

use regex::Regex;
use std::sync::OnceLock;
use tracing::warn;

use crate::config::Config;
use crate::models::QaPair;

fn heading_pattern() -> &'static Regex {
    static HEADING: OnceLock<Regex> = OnceLock::new();
    HEADING.get_or_init(|| Regex::new(r"(?m)^## \d+\.\s+").expect("题目标题正则"))
}

/// 题目长度阈值（按字符计）
#[derive(Debug, Clone, Copy)]
pub struct ExtractLimits {
    pub min_answer_len: usize,
    pub max_question_len: usize,
    pub max_answer_len: usize,
}

impl From<&Config> for ExtractLimits {
    fn from(config: &Config) -> Self {
        Self {
            min_answer_len: config.min_answer_len,
            max_question_len: config.max_question_len,
            max_answer_len: config.max_answer_len,
        }
    }
}

/// 题目抽取服务
pub struct QuestionExtractor {
    limits: ExtractLimits,
}

impl QuestionExtractor {
    pub fn new(config: &Config) -> Self {
        Self {
            limits: ExtractLimits::from(config),
        }
    }

    /// 抽取问答对
    ///
    /// 第一个标题之前的内容丢弃。编号取标题在文档中的序号（从 1 开始），
    /// 被过滤掉的题目不会让后续编号前移。
    pub fn extract(&self, markdown: &str) -> Vec<QaPair> {
        let mut pairs = Vec::new();

        for (ordinal, section) in heading_pattern().split(markdown).enumerate().skip(1) {
            let (first_line, rest) = section.split_once('\n').unwrap_or((section, ""));
            let question = first_line.trim();
            let answer = rest.trim();

            if question.is_empty() || answer.is_empty() {
                continue;
            }

            let question_len = question.chars().count();
            let answer_len = answer.chars().count();

            if question_len > self.limits.max_question_len {
                warn!("⚠️  跳过第 {} 题: 问题过长 ({} 字符)", ordinal, question_len);
                continue;
            }
            if answer_len > self.limits.max_answer_len {
                warn!("⚠️  跳过第 {} 题: 答案过长 ({} 字符)", ordinal, answer_len);
                continue;
            }
            if answer_len <= self.limits.min_answer_len {
                warn!("⚠️  跳过第 {} 题: 答案过短 ({} 字符)", ordinal, answer_len);
                continue;
            }

            pairs.push(QaPair {
                id: ordinal,
                question: question.to_string(),
                answer: answer.to_string(),
            });
        }

        pairs
    }
}

/// 把原始答案整理成可直接展示的解析文本
///
/// 去掉标题标记和代码块，压缩多余空行。模型未给出解析时用它兜底。
pub fn clean_answer(answer: &str) -> String {
    static PATTERNS: OnceLock<(Regex, Regex, Regex)> = OnceLock::new();
    let (headers, fences, blank_lines) = PATTERNS.get_or_init(|| {
        (
            Regex::new(r"(?m)^#{1,6}\s+").expect("标题正则"),
            Regex::new(r"(?s)```.*?```").expect("代码块正则"),
            Regex::new(r"\n{3,}").expect("空行正则"),
        )
    });

    let text = headers.replace_all(answer, "");
    let text = fences.replace_all(&text, "");
    let text = blank_lines.replace_all(&text, "\n\n");
    text.trim().to_string()
}
