//! 错误类型
//!
//! 按出错层次划分为五类：来源抓取、模型调用、响应解析、文件读写、配置。
//! 来源级、批次级错误在各自边界被捕获并转换为"跳过/继续"；
//! 只有配置错误会终止整个运行。

use reqwest::StatusCode;
use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 来源文档抓取错误
    #[error("抓取错误: {0}")]
    Fetch(#[from] FetchError),
    /// 模型调用错误
    #[error("模型错误: {0}")]
    Llm(#[from] LlmError),
    /// 模型响应解析错误
    #[error("响应解析错误: {0}")]
    Response(#[from] ResponseError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 来源抓取错误
///
/// 全部视为来源级致命错误，不重试。
#[derive(Debug, Error)]
pub enum FetchError {
    /// 主机不属于可信域名
    #[error("不可信的来源主机: {host} (要求以 {expected_suffix} 结尾)")]
    SecurityViolation {
        host: String,
        expected_suffix: String,
    },
    /// 文档超出大小上限
    #[error("文档过大: {size} 字节 (上限: {max} 字节)")]
    PayloadTooLarge { size: u64, max: u64 },
    /// 文档内容为空
    #[error("文档内容为空")]
    EmptyContent,
    /// 服务器返回非成功状态
    #[error("抓取 {url} 失败: HTTP {status}")]
    FetchFailed { url: String, status: StatusCode },
    /// URL 无法解析
    #[error("无效的 URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    /// 网络请求失败
    #[error("请求 {url} 失败: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// 模型调用错误
#[derive(Debug, Error)]
pub enum LlmError {
    /// 后端返回非成功状态
    #[error("{backend} 返回 HTTP {status}: {body}")]
    Status {
        backend: String,
        status: u16,
        body: String,
    },
    /// 请求超时
    #[error("{backend} 请求超时: {message}")]
    Timeout { backend: String, message: String },
    /// 连接被重置或中断
    #[error("{backend} 连接中断: {message}")]
    ConnectionReset { backend: String, message: String },
    /// 其他传输层错误（连接被拒、DNS 失败等）
    #[error("{backend} 传输错误: {message}")]
    Transport { backend: String, message: String },
    /// 返回内容为空
    #[error("{backend} 返回内容为空")]
    EmptyContent { backend: String },
    /// 响应体无法解码
    #[error("{backend} 响应体解码失败: {message}")]
    Decode { backend: String, message: String },
}

impl LlmError {
    /// 是否属于可重试的临时性故障
    ///
    /// 限流、上游不可用、网关/超时类 HTTP 状态，以及连接重置、超时。
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::Status { status, .. } => matches!(status, 429 | 500 | 502 | 503 | 504),
            LlmError::Timeout { .. } | LlmError::ConnectionReset { .. } => true,
            LlmError::Transport { .. } | LlmError::EmptyContent { .. } | LlmError::Decode { .. } => {
                false
            }
        }
    }

    /// 把 reqwest 的传输层错误归类
    ///
    /// 只有超时和连接被对端重置算作临时性故障，读取响应体时的重置也一样；
    /// 连接被拒、DNS 失败等归为 `Transport`。
    pub fn from_transport(backend: &str, err: reqwest::Error) -> Self {
        let backend = backend.to_string();
        let message = err.to_string();
        if err.is_timeout() {
            LlmError::Timeout { backend, message }
        } else if is_connection_reset(&err) {
            LlmError::ConnectionReset { backend, message }
        } else if err.is_decode() || err.is_body() {
            LlmError::Decode { backend, message }
        } else {
            LlmError::Transport { backend, message }
        }
    }
}

/// 错误链中是否有连接被重置/中断的 I/O 错误
fn is_connection_reset(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(io) = e.downcast_ref::<std::io::Error>() {
            if matches!(
                io.kind(),
                std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::BrokenPipe
            ) {
                return true;
            }
        }
        current = e.source();
    }
    false
}

/// 模型响应解析错误
///
/// 结构性错误不重试，整个批次被丢弃。
#[derive(Debug, Error)]
pub enum ResponseError {
    /// 修复后仍不是合法 JSON
    #[error("JSON 解析失败: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },
    /// 顶层不是数组
    #[error("响应顶层不是数组")]
    NotAnArray,
    /// 数组元素结构不合法
    #[error("第 {index} 条记录不合法: {reason}")]
    InvalidRecord { index: usize, reason: String },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 文件内容格式错误
    #[error("文件格式错误 ({path}): {message}")]
    Malformed { path: String, message: String },
    /// 目录不存在
    #[error("目录不存在: {path}")]
    DirectoryNotFound { path: String },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 缺少必需的凭据
    #[error("环境变量 {var_name} 未设置 (使用 {provider} 后端时必需)")]
    MissingCredential { var_name: String, provider: String },
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 未知的模型后端
    #[error("未知的 AI_PROVIDER: {0} (可选: anthropic, ollama)")]
    UnknownProvider(String),
    /// 配置值不合法
    #[error("配置项 {name} 不合法: {reason}")]
    InvalidValue { name: String, reason: String },
    /// 后端无法连接
    #[error("无法连接模型后端 {url}: {message}")]
    BackendUnreachable { url: String, message: String },
    /// 本地后端中没有目标模型
    #[error("模型 {model} 不在本地后端的模型列表中 (可用: {})", .available.join(", "))]
    ModelNotFound {
        model: String,
        available: Vec<String>,
    },
}

// ========== 便捷构造函数 ==========

impl FileError {
    pub fn read(path: impl Into<String>, source: std::io::Error) -> Self {
        FileError::Read {
            path: path.into(),
            source,
        }
    }

    pub fn write(path: impl Into<String>, source: std::io::Error) -> Self {
        FileError::Write {
            path: path.into(),
            source,
        }
    }

    pub fn malformed(path: impl Into<String>, err: impl std::fmt::Display) -> Self {
        FileError::Malformed {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
