//! 主题标签提取

use std::collections::BTreeSet;

use crate::models::QaPair;

/// 主题与触发关键词
pub const TOPIC_KEYWORDS: &[(&str, &[&str])] = &[
    ("basics", &["basic", "introduction", "what is", "define"]),
    ("advanced", &["advanced", "complex", "optimization"]),
    ("async", &["async", "await", "promise", "asynchronous"]),
    ("performance", &["performance", "optimization", "speed", "efficient"]),
    ("security", &["security", "authentication", "authorization"]),
    ("testing", &["test", "testing", "unit test"]),
];

/// 按关键词（小写子串匹配）从问答对中提取主题，结果有序去重
pub fn extract_topics(pairs: &[QaPair]) -> BTreeSet<String> {
    let mut topics = BTreeSet::new();

    for pair in pairs {
        let text = format!("{} {}", pair.question, pair.answer).to_lowercase();
        for (topic, keywords) in TOPIC_KEYWORDS {
            if keywords.iter().any(|keyword| text.contains(keyword)) {
                topics.insert(topic.to_string());
            }
        }
    }

    topics
}
