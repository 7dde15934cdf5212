//! 提示词构建
//!
//! 纯函数，相同输入必得相同输出。

use crate::config::Config;
use crate::models::QaPair;

/// 解析中附带代码示例的分类
pub const CODE_EXAMPLE_CATEGORIES: &[&str] = &["Languages", "Frontend", "Backend", "Mobile"];

/// 该分类是否要求代码示例
pub fn includes_code_examples(category: &str) -> bool {
    CODE_EXAMPLE_CATEGORIES.contains(&category)
}

/// 提示词构建器
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    preview_len: usize,
}

impl PromptBuilder {
    pub fn new(config: &Config) -> Self {
        Self {
            preview_len: config.answer_preview_len,
        }
    }

    /// 为一个批次生成提示词
    pub fn build(&self, source_name: &str, category: &str, batch: &[QaPair]) -> String {
        let with_code = includes_code_examples(category);
        let questions = self.format_questions(batch);

        let code_instructions = if with_code {
            "4. For explanations, include a relevant code example in markdown format when applicable (use ```language for code blocks)\n\
             5. If the original question contains code that's essential to understanding it, preserve that code in the question"
        } else {
            "4. Keep explanations clear and concise without code examples"
        };
        let explanation_hint = if with_code {
            " and code example if relevant"
        } else {
            ""
        };

        format!(
            r#"You are formatting quiz answers for {source_name} interview questions.

<questions>
{questions}
</questions>

For each question:
1. Create a CLEAN, concise correct answer (1-2 sentences, NO markdown headers)
2. Generate 3 plausible but INCORRECT wrong answers that are:
   - Similar LENGTH to the correct answer (crucial to prevent guessing by length)
   - Well-written and detailed (not obviously wrong)
   - Technically plausible but factually incorrect
   - Each should be 1-2 sentences like the correct answer
3. Create a clean explanation paragraph (remove markdown headers, keep useful content)
{code_instructions}

IMPORTANT: All 4 options (1 correct + 3 wrong) must have similar length and detail level to make them equally convincing.

Return ONLY a JSON array:
[
  {{
    "correctAnswer": "clean, formatted correct answer",
    "wrongAnswers": ["wrong 1 with similar length", "wrong 2 with similar length", "wrong 3 with similar length"],
    "explanation": "clean explanation with key points{explanation_hint}"
  }}
]"#
        )
    }

    /// 批内题目按 1 起编号，答案只取前 `preview_len` 个字符
    fn format_questions(&self, batch: &[QaPair]) -> String {
        batch
            .iter()
            .enumerate()
            .map(|(idx, pair)| {
                let preview: String = pair.answer.chars().take(self.preview_len).collect();
                format!(
                    "\n{}. Question: {}\n   Raw Answer: {}...\n",
                    idx + 1,
                    pair.question,
                    preview
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
