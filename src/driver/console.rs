//! Console Output
//!
//! 認証の案内・進捗・アイテム一覧の表示

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::adapter::auth::AuthPrompt;
use crate::application::use_cases::upload_file::ProgressObserver;
use crate::domain::entities::drive_item::DriveItem;
use crate::domain::entities::upload_session::progress_percent;
use crate::domain::services::activity_log::format_thousands;

/// 端末に認証の案内を表示する
pub struct ConsolePrompt;

impl AuthPrompt for ConsolePrompt {
    fn show_device_code(&self, verification_uri: &str, user_code: &str, expires_in: Duration) {
        println!("ブラウザで {} を開き、コード {} を入力してください", verification_uri, user_code);
        println!("  (有効期限: {} 分)", expires_in.as_secs() / 60);
    }

    fn show_authorization_url(&self, url: &str) {
        println!("ブラウザで次のURLを開いてサインインしてください:");
        println!("  {}", url);
    }
}

/// 進捗行（`\r` で同じ行を上書きする）
pub fn progress_line(bytes_sent: u64, total_size: u64) -> String {
    format!(
        "アップロード進捗: {:.1}% ({}/{} bytes)",
        progress_percent(bytes_sent, total_size),
        bytes_sent,
        total_size
    )
}

/// 標準出力に進捗を1行で表示する
#[derive(Default)]
pub struct ConsoleProgress {
    /// 改行されていない進捗行が残っているか
    line_open: AtomicBool,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// 進捗行を書き、行を閉じたかどうかを記録する
    fn render(&self, out: &mut impl Write, bytes_sent: u64, total_size: u64) {
        let _ = write!(out, "\r{}", progress_line(bytes_sent, total_size));
        let complete = bytes_sent >= total_size;
        if complete {
            let _ = writeln!(out);
        }
        self.line_open.store(!complete, Ordering::Relaxed);
        let _ = out.flush();
    }

    /// 途中の進捗行を改行で閉じる
    fn close_line(&self, out: &mut impl Write) {
        if self.line_open.swap(false, Ordering::Relaxed) {
            let _ = writeln!(out);
            let _ = out.flush();
        }
    }
}

impl ProgressObserver for ConsoleProgress {
    fn on_progress(&self, bytes_sent: u64, total_size: u64) {
        self.render(&mut io::stdout().lock(), bytes_sent, total_size);
    }

    fn on_interrupted(&self) {
        self.close_line(&mut io::stdout().lock());
    }
}

/// `ls` / `stat` の1行表示
pub fn item_line(item: &DriveItem) -> String {
    let modified = item
        .last_modified_date_time
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string());

    if item.is_folder() {
        let children = item.folder.as_ref().map(|f| f.child_count).unwrap_or(0);
        format!("{}  {:>15}  {}/ ({} items)", modified, "<DIR>", item.name, children)
    } else {
        format!(
            "{}  {:>15}  {}",
            modified,
            format_thousands(item.size.unwrap_or(0)),
            item.name
        )
    }
}
