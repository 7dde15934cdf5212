//! 来源抓取服务 - 业务能力层
//!
//! 只负责"取回一份原始文档"，不关心题目抽取。

use reqwest::header::CONTENT_LENGTH;
use reqwest::{Client, Url};
use tracing::debug;

use crate::config::Config;
use crate::error::FetchError;

/// 来源抓取服务
///
/// - 拼接 `<base>/<slug>/<branch>/<filename>`
/// - 请求前校验主机属于可信域名
/// - 声明长度与实际长度都不得超过上限
/// - 本层不重试
pub struct SourceFetcher {
    http: Client,
    base_url: String,
    branch: String,
    filename: String,
    trusted_suffix: String,
    max_bytes: u64,
}

impl SourceFetcher {
    pub fn new(config: &Config, http: Client) -> Self {
        Self {
            http,
            base_url: config.source_base_url.trim_end_matches('/').to_string(),
            branch: config.source_branch.clone(),
            filename: config.source_filename.clone(),
            trusted_suffix: config.trusted_domain_suffix.clone(),
            max_bytes: config.max_document_bytes,
        }
    }

    /// 来源文档的 URL
    pub fn document_url(&self, slug: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.base_url, slug, self.branch, self.filename
        )
    }

    /// 抓取来源文档
    pub async fn fetch(&self, slug: &str) -> Result<String, FetchError> {
        let url = self.document_url(slug);
        let parsed = validate_origin(&url, &self.trusted_suffix)?;

        debug!("GET {}", url);
        let mut response = self
            .http
            .get(parsed)
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::FetchFailed { url, status });
        }

        let declared = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        check_declared_length(declared, self.max_bytes)?;

        // 边读边计数，超限立即中止
        let mut bytes = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|source| FetchError::Request {
                url: url.clone(),
                source,
            })?
        {
            bytes.extend_from_slice(&chunk);
            if bytes.len() as u64 > self.max_bytes {
                return Err(FetchError::PayloadTooLarge {
                    size: bytes.len() as u64,
                    max: self.max_bytes,
                });
            }
        }

        validate_body(String::from_utf8_lossy(&bytes).into_owned(), self.max_bytes)
    }
}

/// 校验 URL 的主机属于可信域名
///
/// 主机必须等于后缀本身，或是它的子域名。
pub fn validate_origin(url: &str, trusted_suffix: &str) -> Result<Url, FetchError> {
    let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    let host = parsed.host_str().unwrap_or_default().to_ascii_lowercase();
    let suffix = trusted_suffix.trim_start_matches('.').to_ascii_lowercase();
    let trusted = !suffix.is_empty()
        && (host == suffix || host.ends_with(&format!(".{}", suffix)));

    if !trusted {
        return Err(FetchError::SecurityViolation {
            host,
            expected_suffix: trusted_suffix.to_string(),
        });
    }

    Ok(parsed)
}

fn check_declared_length(declared: Option<u64>, max_bytes: u64) -> Result<(), FetchError> {
    match declared {
        Some(size) if size > max_bytes => Err(FetchError::PayloadTooLarge {
            size,
            max: max_bytes,
        }),
        _ => Ok(()),
    }
}

fn validate_body(body: String, max_bytes: u64) -> Result<String, FetchError> {
    let size = body.len() as u64;
    if size > max_bytes {
        return Err(FetchError::PayloadTooLarge {
            size,
            max: max_bytes,
        });
    }
    if body.trim().is_empty() {
        return Err(FetchError::EmptyContent);
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_url() {
        let fetcher = SourceFetcher::new(&Config::test_config(), Client::new());
        assert_eq!(
            fetcher.document_url("rust-interview-questions"),
            "https://raw.githubusercontent.com/Devinterview-io/rust-interview-questions/main/README.md"
        );
    }

    #[test]
    fn test_validate_origin_accepts_trusted_hosts() {
        let suffix = "githubusercontent.com";
        assert!(validate_origin("https://raw.githubusercontent.com/a/main/README.md", suffix).is_ok());
        assert!(validate_origin("https://githubusercontent.com/x", suffix).is_ok());
    }

    #[test]
    fn test_validate_origin_rejects_untrusted_hosts() {
        let suffix = "githubusercontent.com";
        for url in [
            "https://example.com/a/main/README.md",
            "https://githubusercontent.com.evil.io/a",
            "https://evilgithubusercontent.com/a",
            "http://127.0.0.1:8080/a",
        ] {
            let err = validate_origin(url, suffix).unwrap_err();
            assert!(
                matches!(err, FetchError::SecurityViolation { .. }),
                "{} 应被拒绝",
                url
            );
        }
    }

    #[test]
    fn test_validate_origin_rejects_garbage() {
        assert!(matches!(
            validate_origin("not a url", "githubusercontent.com"),
            Err(FetchError::InvalidUrl { .. })
        ));
    }

    #[tokio::test]
    async fn test_fetch_untrusted_base_fails_before_request() {
        // 指向不可达端口：若真的发出请求会得到 Request 错误而不是 SecurityViolation
        let config = Config {
            source_base_url: "http://127.0.0.1:9".to_string(),
            ..Config::test_config()
        };
        let fetcher = SourceFetcher::new(&config, Client::new());

        let err = fetcher.fetch("anything").await.unwrap_err();
        assert!(matches!(err, FetchError::SecurityViolation { .. }));
    }

    /// 本地起一个只应答一次的 HTTP 服务，返回它的基础 URL
    async fn serve_once(response: Vec<u8>) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 2048];
            let _ = socket.read(&mut request).await;
            let _ = socket.write_all(&response).await;
            let _ = socket.shutdown().await;
        });
        format!("http://{}", addr)
    }

    fn local_fetcher(base_url: String) -> SourceFetcher {
        let config = Config {
            source_base_url: base_url,
            trusted_domain_suffix: "127.0.0.1".to_string(),
            max_document_bytes: 1024,
            ..Config::test_config()
        };
        SourceFetcher::new(&config, Client::new())
    }

    #[tokio::test]
    async fn test_fetch_returns_body() {
        let body = "## 1. What is Rust?\nA systems language.\n";
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        let fetcher = local_fetcher(serve_once(response.into_bytes()).await);

        assert_eq!(fetcher.fetch("rust").await.unwrap(), body);
    }

    #[tokio::test]
    async fn test_fetch_aborts_oversized_stream_without_length() {
        let mut response = b"HTTP/1.1 200 OK\r\nConnection: close\r\n\r\n".to_vec();
        response.extend(std::iter::repeat(b'x').take(8 * 1024));
        let fetcher = local_fetcher(serve_once(response).await);

        let err = fetcher.fetch("rust").await.unwrap_err();
        match err {
            FetchError::PayloadTooLarge { size, max } => {
                assert_eq!(max, 1024);
                assert!(size > 1024);
            }
            other => panic!("期望 PayloadTooLarge，实际 {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_rejects_declared_length() {
        let response = b"HTTP/1.1 200 OK\r\nContent-Length: 5000\r\nConnection: close\r\n\r\n".to_vec();
        let fetcher = local_fetcher(serve_once(response).await);

        assert!(matches!(
            fetcher.fetch("rust").await,
            Err(FetchError::PayloadTooLarge { size: 5000, max: 1024 })
        ));
    }

    #[tokio::test]
    async fn test_fetch_non_success_status() {
        let response =
            b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_vec();
        let fetcher = local_fetcher(serve_once(response).await);

        match fetcher.fetch("missing").await.unwrap_err() {
            FetchError::FetchFailed { url, status } => {
                assert_eq!(status, reqwest::StatusCode::NOT_FOUND);
                assert!(url.ends_with("/missing/main/README.md"));
            }
            other => panic!("期望 FetchFailed，实际 {:?}", other),
        }
    }

    #[test]
    fn test_size_checks() {
        assert!(check_declared_length(None, 10).is_ok());
        assert!(check_declared_length(Some(10), 10).is_ok());
        assert!(matches!(
            check_declared_length(Some(11), 10),
            Err(FetchError::PayloadTooLarge { size: 11, max: 10 })
        ));
        assert!(matches!(
            validate_body("x".repeat(11), 10),
            Err(FetchError::PayloadTooLarge { .. })
        ));
    }

    #[test]
    fn test_empty_body_rejected() {
        assert!(matches!(
            validate_body(" \n\t ".to_string(), 10),
            Err(FetchError::EmptyContent)
        ));
        assert_eq!(validate_body("# ok".to_string(), 10).unwrap(), "# ok");
    }
}
