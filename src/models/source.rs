use serde::{Deserialize, Serialize};

/// 来源描述
///
/// 一份众包的"问题/原始答案" markdown 文档，由配置提供，只读。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    pub id: String,
    pub name: String,
    /// 来源仓库名，用于拼接抓取 URL
    #[serde(rename = "slug")]
    pub origin_slug: String,
    pub category: String,
}

/// 来源列表文件（TOML）的顶层结构
///
/// ```toml
/// [[sources]]
/// id = "react-interview-questions"
/// name = "React"
/// slug = "react-interview-questions"
/// category = "Frontend"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceList {
    #[serde(default)]
    pub sources: Vec<SourceDescriptor>,
}
