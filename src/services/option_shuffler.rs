//! 选项洗牌

use rand::seq::SliceRandom;
use rand::Rng;

/// 洗牌后的选项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShuffledOptions {
    pub options: Vec<String>,
    pub correct_index: usize,
}

/// 把正确答案与错误选项合并后均匀洗牌
///
/// `correct_index` 按值查找，若错误选项与正确答案重复，取第一个匹配位置。
pub fn shuffle_options<R: Rng + ?Sized>(
    correct: &str,
    wrong: &[String],
    rng: &mut R,
) -> ShuffledOptions {
    let mut options = Vec::with_capacity(wrong.len() + 1);
    options.push(correct.to_string());
    options.extend(wrong.iter().cloned());
    options.shuffle(rng);

    let correct_index = options
        .iter()
        .position(|option| option == correct)
        .unwrap_or_default();

    ShuffledOptions {
        options,
        correct_index,
    }
}

/// 错误选项中是否有与正确答案相同的（忽略首尾空白）
pub fn duplicates_correct(correct: &str, wrong: &[String]) -> bool {
    let correct = correct.trim();
    wrong.iter().any(|option| option.trim() == correct)
}
