//! 批次处理上下文
//!
//! 封装"我正在处理哪个来源的第几批"这一信息

use std::fmt::Display;

/// 批次处理上下文
#[derive(Debug, Clone)]
pub struct BatchCtx {
    /// 来源名称（仅用于日志显示）
    pub source_name: String,

    /// 批次序号（从1开始）
    pub batch_index: usize,

    /// 批次总数
    pub total_batches: usize,

    /// 本批第一题在数据集中的位置（从1开始）
    pub first_position: usize,

    /// 本批最后一题在数据集中的位置
    pub last_position: usize,
}

impl BatchCtx {
    pub fn new(
        source_name: &str,
        batch_index: usize,
        total_batches: usize,
        first_position: usize,
        batch_len: usize,
    ) -> Self {
        Self {
            source_name: source_name.to_string(),
            batch_index,
            total_batches,
            first_position,
            last_position: first_position + batch_len.saturating_sub(1),
        }
    }
}

impl Display for BatchCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{} 批次 {}/{} 题目 {}-{}]",
            self.source_name,
            self.batch_index,
            self.total_batches,
            self.first_position,
            self.last_position
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let ctx = BatchCtx::new("React", 2, 3, 4, 3);
        assert_eq!(ctx.to_string(), "[React 批次 2/3 题目 4-6]");
    }
}
