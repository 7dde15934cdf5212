//! 模型响应解析
//!
//! 模型输出不可信：可能包了 Markdown 代码块、前后夹杂说明文字，
//! 或在字符串里直接写了换行符。这里把它还原成结构化记录，
//! 无法还原时整批失败。

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

use crate::error::ResponseError;
use crate::models::ModelRecord;

/// 每条记录要求的错误选项数
pub const WRONG_ANSWER_COUNT: usize = 3;

/// 解析模型响应为记录列表
pub fn parse_records(raw: &str) -> Result<Vec<ModelRecord>, ResponseError> {
    let values = parse_json_array(raw)?;

    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| into_record(index, value))
        .collect()
}

/// 解析出顶层 JSON 数组
///
/// 先按原文严格解析，失败后转义字符串内的控制字符再试一次。
pub fn parse_json_array(raw: &str) -> Result<Vec<Value>, ResponseError> {
    let candidate = extract_array(strip_code_fence(raw));

    let value = match serde_json::from_str::<Value>(candidate) {
        Ok(value) => value,
        Err(_) => serde_json::from_str::<Value>(&escape_control_chars(candidate))
            .map_err(|source| ResponseError::InvalidJson { source })?,
    };

    match value {
        Value::Array(items) => Ok(items),
        _ => Err(ResponseError::NotAnArray),
    }
}

/// 去掉首尾的 Markdown 代码块标记（可带语言标签）
///
/// 只处理首尾，内容里的代码块保持不变。
pub fn strip_code_fence(raw: &str) -> &str {
    static OPENING: OnceLock<Regex> = OnceLock::new();
    let opening = OPENING
        .get_or_init(|| Regex::new(r"^```[A-Za-z0-9_+-]*[ \t]*\r?\n?").expect("代码块开头正则"));

    let mut text = raw.trim();
    if let Some(m) = opening.find(text) {
        text = &text[m.end()..];
    }
    if let Some(stripped) = text.trim_end().strip_suffix("```") {
        text = stripped;
    }
    text.trim()
}

/// 取出第一个括号配平的 `[...]` 子串
///
/// 扫描时跳过字符串字面量中的括号。找不到 `[` 时原样返回；
/// 括号未闭合（多半是被截断）时返回从 `[` 到结尾的部分。
pub fn extract_array(text: &str) -> &str {
    let Some(start) = text.find('[') else {
        return text;
    };

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return &text[start..start + offset + 1];
                }
            }
            _ => {}
        }
    }

    &text[start..]
}

/// 把字符串字面量内部的原始控制字符改写为 JSON 转义序列
///
/// 字符串外的空白保持原样。
pub fn escape_control_chars(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for c in text.chars() {
        if !in_string {
            if c == '"' {
                in_string = true;
            }
            out.push(c);
            continue;
        }

        if escaped {
            escaped = false;
            out.push(c);
            continue;
        }

        match c {
            '\\' => {
                escaped = true;
                out.push(c);
            }
            '"' => {
                in_string = false;
                out.push(c);
            }
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{0C}' => out.push_str("\\f"),
            '\u{08}' => out.push_str("\\b"),
            c if c.is_control() && (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }

    out
}

fn into_record(index: usize, value: Value) -> Result<ModelRecord, ResponseError> {
    let record: ModelRecord =
        serde_json::from_value(value).map_err(|e| ResponseError::InvalidRecord {
            index,
            reason: e.to_string(),
        })?;

    if record.correct_answer.trim().is_empty() {
        return Err(ResponseError::InvalidRecord {
            index,
            reason: "correctAnswer 为空".to_string(),
        });
    }
    if record.wrong_answers.len() != WRONG_ANSWER_COUNT {
        return Err(ResponseError::InvalidRecord {
            index,
            reason: format!(
                "wrongAnswers 应有 {} 项，实际 {} 项",
                WRONG_ANSWER_COUNT,
                record.wrong_answers.len()
            ),
        });
    }

    Ok(record)
}
