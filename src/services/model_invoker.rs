//! 模型调用服务
//!
//! 在 [`ModelBackend`] 之上加指数退避重试。只对临时性故障重试，
//! 其余错误原样返回给调用方。

use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::clients::{Completion, ModelBackend};
use crate::config::Config;
use crate::error::LlmError;

/// 重试抖动上限
const MAX_JITTER: Duration = Duration::from_millis(1000);

/// 退避策略
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// 首次调用之外的最大重试次数
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_jitter: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: config.retry_delay_base,
            max_jitter: MAX_JITTER,
        }
    }

    /// 第 `attempt` 次重试（从 0 起）的基础延迟：`base * 2^attempt`
    pub fn base_delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }

    /// 基础延迟加上 `[0, max_jitter)` 的随机抖动
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let jitter_ms = self.max_jitter.as_millis() as u64;
        let jitter = if jitter_ms == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(rand::thread_rng().gen_range(0..jitter_ms))
        };
        self.base_delay_for(attempt) + jitter
    }
}

/// 单次调用的重试状态
#[derive(Debug, Default)]
pub struct RetryState {
    pub attempt_count: u32,
    pub last_error: Option<String>,
}

/// 模型调用服务
pub struct ModelInvoker {
    backend: Arc<dyn ModelBackend>,
    policy: RetryPolicy,
}

impl ModelInvoker {
    pub fn new(backend: Arc<dyn ModelBackend>, policy: RetryPolicy) -> Self {
        Self { backend, policy }
    }

    /// 调用模型，临时性故障按退避策略重试
    ///
    /// 最多发起 `max_retries + 1` 次请求。
    pub async fn invoke(&self, prompt: &str) -> Result<Completion, LlmError> {
        let mut state = RetryState::default();

        loop {
            match self.backend.generate(prompt).await {
                Ok(completion) => {
                    if state.attempt_count > 0 {
                        debug!("第 {} 次重试成功", state.attempt_count);
                    }
                    return Ok(completion);
                }
                Err(err) if err.is_retryable() && state.attempt_count < self.policy.max_retries => {
                    let delay = self.policy.delay_for(state.attempt_count);
                    warn!(
                        "⚠️  {} 调用失败，{}ms 后重试 ({}/{}): {}",
                        self.backend.name(),
                        delay.as_millis(),
                        state.attempt_count + 1,
                        self.policy.max_retries,
                        err
                    );
                    state.attempt_count += 1;
                    state.last_error = Some(err.to_string());
                    sleep(delay).await;
                }
                Err(err) => {
                    if let Some(previous) = state.last_error.as_deref() {
                        warn!(
                            "❌ 已重试 {} 次仍失败，上一次错误: {}",
                            state.attempt_count, previous
                        );
                    }
                    return Err(err);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::CompletionState;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::time::Instant;

    /// 按脚本依次返回结果的假后端
    struct ScriptedBackend {
        script: Mutex<VecDeque<Result<Completion, LlmError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedBackend {
        fn new(script: Vec<Result<Completion, LlmError>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ModelBackend for ScriptedBackend {
        fn name(&self) -> &str {
            "scripted"
        }

        fn model(&self) -> &str {
            "test-model"
        }

        async fn generate(&self, _prompt: &str) -> Result<Completion, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(status(503)))
        }
    }

    fn status(code: u16) -> LlmError {
        LlmError::Status {
            backend: "scripted".to_string(),
            status: code,
            body: String::new(),
        }
    }

    fn ok(text: &str) -> Result<Completion, LlmError> {
        Ok(Completion {
            text: text.to_string(),
            state: CompletionState::Complete,
        })
    }

    fn policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay: Duration::from_secs(1),
            max_jitter: Duration::ZERO,
        }
    }

    #[test]
    fn test_backoff_is_monotonic() {
        let policy = policy(5);
        let delays: Vec<Duration> = (0..6).map(|a| policy.base_delay_for(a)).collect();

        assert_eq!(delays[0], Duration::from_secs(1));
        assert_eq!(delays[3], Duration::from_secs(8));
        assert!(delays.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_backoff_saturates() {
        let policy = policy(100);
        assert_eq!(policy.base_delay_for(64), policy.base_delay_for(80));
    }

    #[test]
    fn test_jitter_bounded() {
        let policy = RetryPolicy {
            max_jitter: Duration::from_millis(1000),
            ..policy(3)
        };
        for _ in 0..100 {
            let delay = policy.delay_for(1);
            assert!(delay >= Duration::from_secs(2));
            assert!(delay < Duration::from_secs(3));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_then_success() {
        let backend = ScriptedBackend::new(vec![Err(status(429)), Err(status(502)), ok("[]")]);
        let invoker = ModelInvoker::new(backend.clone(), policy(3));

        let start = Instant::now();
        let completion = invoker.invoke("prompt").await.unwrap();

        assert_eq!(completion.text, "[]");
        assert_eq!(backend.calls(), 3);
        // 1s + 2s
        assert_eq!(start.elapsed().as_secs(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_error_returns_immediately() {
        let backend = ScriptedBackend::new(vec![Err(status(401)), ok("[]")]);
        let invoker = ModelInvoker::new(backend.clone(), policy(3));

        let start = Instant::now();
        let err = invoker.invoke("prompt").await.unwrap_err();

        assert!(matches!(err, LlmError::Status { status: 401, .. }));
        assert_eq!(backend.calls(), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_cap_honored() {
        let backend = ScriptedBackend::new(vec![]);
        let invoker = ModelInvoker::new(backend.clone(), policy(3));

        let err = invoker.invoke("prompt").await.unwrap_err();

        assert!(err.is_retryable());
        assert_eq!(backend.calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_retried() {
        let backend = ScriptedBackend::new(vec![
            Err(LlmError::Timeout {
                backend: "scripted".to_string(),
                message: "deadline".to_string(),
            }),
            ok("[1]"),
        ]);
        let invoker = ModelInvoker::new(backend.clone(), policy(1));

        assert_eq!(invoker.invoke("p").await.unwrap().text, "[1]");
        assert_eq!(backend.calls(), 2);
    }
}
