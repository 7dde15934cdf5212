//! 阶段产物的 JSON 读写
//!
//! 写入先落到同目录下的 `.tmp` 文件，再整体 rename，
//! 保证不会留下写了一半的产物。

use crate::error::FileError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;

/// 读取并反序列化 JSON 文件；文件不存在时返回 `Ok(None)`
pub async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, FileError> {
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(FileError::read(path.display().to_string(), e)),
    };

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| FileError::malformed(path.display().to_string(), e))
}

/// 以原子方式写入 JSON 文件（带缩进）
pub async fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), FileError> {
    let body = serde_json::to_string_pretty(value)
        .map_err(|e| FileError::malformed(path.display().to_string(), e))?;

    let tmp_path = tmp_sibling(path);
    fs::write(&tmp_path, body)
        .await
        .map_err(|e| FileError::write(tmp_path.display().to_string(), e))?;

    if let Err(e) = fs::rename(&tmp_path, path).await {
        let _ = fs::remove_file(&tmp_path).await;
        return Err(FileError::write(path.display().to_string(), e));
    }

    Ok(())
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
