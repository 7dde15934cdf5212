use crate::error::FileError;
use crate::models::source::{SourceDescriptor, SourceList};
use std::path::Path;
use tokio::fs;

/// 从 TOML 文件加载来源列表，保持文件中的顺序
pub async fn load_sources(path: &Path) -> Result<Vec<SourceDescriptor>, FileError> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| FileError::read(path.display().to_string(), e))?;

    let list: SourceList = toml::from_str(&content)
        .map_err(|e| FileError::malformed(path.display().to_string(), e))?;

    tracing::info!(
        "从 {} 加载了 {} 个来源",
        path.file_name().unwrap_or_default().to_string_lossy(),
        list.sources.len()
    );

    Ok(list.sources)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_sources_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sources.toml");
        std::fs::write(
            &path,
            r#"
[[sources]]
id = "rust"
name = "Rust"
slug = "rust-interview-questions"
category = "Languages"

[[sources]]
id = "docker"
name = "Docker"
slug = "docker-interview-questions"
category = "DevOps"
"#,
        )
        .unwrap();

        let sources = load_sources(&path).await.unwrap();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].id, "rust");
        assert_eq!(sources[0].origin_slug, "rust-interview-questions");
        assert_eq!(sources[1].category, "DevOps");
    }

    #[tokio::test]
    async fn test_load_sources_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sources.toml");
        std::fs::write(&path, "[[sources]]\nid = 1\n").unwrap();

        let err = load_sources(&path).await.unwrap_err();
        assert!(matches!(err, FileError::Malformed { .. }));
    }

    #[tokio::test]
    async fn test_load_sources_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_sources(&dir.path().join("nope.toml")).await.unwrap_err();
        assert!(matches!(err, FileError::Read { .. }));
    }
}
