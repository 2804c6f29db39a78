//! # Retry Policy
//!
//! 操作全体を指数バックオフでリトライするポリシー
//!
//! リトライ対象のエラー分類は呼び出し側が明示的に渡す。

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use super::activity_log::ActivityLog;

pub const MAX_RETRIES: u32 = 3;
pub const INITIAL_RETRY_DELAY_MS: u64 = 1000;
pub const BACKOFF_FACTOR: f64 = 2.0;

/// リトライポリシー
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    initial_delay: Duration,
    backoff_factor: f64,
    log: ActivityLog,
}

impl RetryPolicy {
    /// 新しいリトライポリシーを作成
    ///
    /// # Arguments
    ///
    /// * `max_retries` - 最初の試行に追加して行うリトライ回数
    /// * `initial_delay` - 最初のリトライまでの待機時間
    /// * `backoff_factor` - 失敗するたびに待機時間に掛ける係数
    pub fn new(max_retries: u32, initial_delay: Duration, backoff_factor: f64) -> Self {
        Self {
            max_retries,
            initial_delay,
            backoff_factor,
            log: ActivityLog::default(),
        }
    }

    /// リトライを記録するログコンポーネントを差し替える
    pub fn with_log(mut self, log: ActivityLog) -> Self {
        self.log = log;
        self
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// `retry` 回目（1始まり）のリトライ前の待機時間
    pub fn delay_for(&self, retry: u32) -> Duration {
        let mut delay = self.initial_delay;
        for _ in 1..retry {
            delay = scale(delay, self.backoff_factor);
        }
        delay
    }

    /// 操作を実行し、`is_retryable` が真を返すエラーの場合はリトライする
    ///
    /// 最大 `max_retries + 1` 回試行し、使い切った場合は最後のエラーを返す。
    /// `is_retryable` が偽を返すエラーは即座に返す。
    pub async fn run<T, E, F, Fut, P>(&self, mut operation: F, is_retryable: P) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
        E: Display,
    {
        let total_attempts = self.max_retries + 1;
        let mut delay = self.initial_delay;
        let mut attempt = 0;

        loop {
            attempt += 1;

            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if !is_retryable(&e) => return Err(e),
                Err(e) if attempt >= total_attempts => {
                    self.log.error(format!(
                        "最大リトライ回数に達しました。処理を中止します: {}",
                        e
                    ));
                    return Err(e);
                }
                Err(e) => {
                    self.log.retry(attempt, total_attempts, delay, &e);
                    tokio::time::sleep(delay).await;
                    delay = scale(delay, self.backoff_factor);
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            MAX_RETRIES,
            Duration::from_millis(INITIAL_RETRY_DELAY_MS),
            BACKOFF_FACTOR,
        )
    }
}

fn scale(delay: Duration, factor: f64) -> Duration {
    Duration::try_from_secs_f64(delay.as_secs_f64() * factor).unwrap_or(Duration::MAX)
}
