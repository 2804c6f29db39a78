//! # Activity Log
//!
//! アップロード・認証の結果を記録するロギングコンポーネント
//!
//! プロセス全体で共有するシングルトンではなく、呼び出し側が構築して
//! アップローダーやクライアントに渡す。出力先は `log` ファサード経由で
//! `adapter::logging` が初期化したロガーになる。

use std::fmt::Display;
use std::path::Path;
use std::time::Duration;

/// デフォルトのログターゲット
pub const DEFAULT_TARGET: &str = "onedrive_uploader";

/// アクティビティログ
#[derive(Debug, Clone)]
pub struct ActivityLog {
    target: String,
}

impl ActivityLog {
    /// 指定したターゲット名でログコンポーネントを作成
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn debug(&self, message: impl Display) {
        log::debug!(target: self.target.as_str(), "{}", message);
    }

    pub fn info(&self, message: impl Display) {
        log::info!(target: self.target.as_str(), "{}", message);
    }

    pub fn warn(&self, message: impl Display) {
        log::warn!(target: self.target.as_str(), "{}", message);
    }

    pub fn error(&self, message: impl Display) {
        log::error!(target: self.target.as_str(), "{}", message);
    }

    /// アップロード結果を記録
    pub fn upload(&self, local_path: &Path, remote_path: &str, size: u64, success: bool) {
        let message = upload_message(local_path, remote_path, size, success);
        if success {
            self.info(message);
        } else {
            self.error(message);
        }
    }

    /// 認証結果を記録
    pub fn auth(&self, action: &str, success: bool) {
        let message = format!("認証 {} {}", action, status_label(success));
        if success {
            self.info(message);
        } else {
            self.error(message);
        }
    }

    /// リトライを記録
    pub fn retry(&self, attempt: u32, total_attempts: u32, delay: Duration, error: &dyn Display) {
        self.warn(format!(
            "エラーが発生しました（{}/{}回目）: {}。{:.1}秒後にリトライします",
            attempt,
            total_attempts,
            error,
            delay.as_secs_f64()
        ));
    }

    /// HTTPリクエストを記録
    pub fn request(&self, method: &str, url: &str, status: u16) {
        self.debug(format!("{} {} -> {}", method, url, status));
    }
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET)
    }
}

fn status_label(success: bool) -> &'static str {
    if success {
        "成功"
    } else {
        "失敗"
    }
}

/// アップロード結果のメッセージ
pub fn upload_message(local_path: &Path, remote_path: &str, size: u64, success: bool) -> String {
    format!(
        "アップロード {}: {} -> {} (サイズ: {} bytes)",
        status_label(success),
        local_path.display(),
        remote_path,
        format_thousands(size)
    )
}

/// 3桁区切りの数値表記
pub fn format_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    out
}
