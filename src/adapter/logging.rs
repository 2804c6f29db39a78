//! Logging
//!
//! env_logger の初期化（標準エラー出力とログファイルへの同時出力）

use chrono::Local;
use env_logger::{Builder, Target};
use log::{LevelFilter, Record};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use crate::domain::errors::UploaderError;

/// 標準エラー出力とファイルの両方に書き込むライター
pub struct TeeWriter<W: Write> {
    file: W,
}

impl<W: Write> TeeWriter<W> {
    pub fn new(file: W) -> Self {
        Self { file }
    }
}

impl<W: Write> Write for TeeWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        self.file.flush()
    }
}

/// `YYYY-MM-DD HH:MM:SS - target - LEVEL - message`
pub fn format_line(timestamp: &str, record: &Record) -> String {
    format!(
        "{} - {} - {} - {}",
        timestamp,
        record.target(),
        record.level(),
        record.args()
    )
}

/// ログファイルを追記モードで開く（親ディレクトリも作成する）
pub fn open_log_file(path: &Path) -> Result<File, UploaderError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    Ok(OpenOptions::new().create(true).append(true).open(path)?)
}

/// ロガーを初期化する
///
/// # Arguments
///
/// * `level` - 既定のログレベル（`RUST_LOG` が設定されていればそちらで上書き）
/// * `log_file` - ログファイルのパス
///
/// # Errors
///
/// ログファイルを開けない場合。ロガーが既に初期化されている場合は何もしない。
pub fn init(level: LevelFilter, log_file: &Path) -> Result<(), UploaderError> {
    let file = open_log_file(log_file)?;

    let mut builder = Builder::new();
    builder
        .filter_level(level)
        .parse_env("RUST_LOG")
        .format(|buf, record| {
            let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
            writeln!(buf, "{}", format_line(&timestamp, record))
        })
        .target(Target::Pipe(Box::new(TeeWriter::new(file))));

    // テストなどで二重に初期化された場合は既存のロガーを使う
    let _ = builder.try_init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Level;
    use tempfile::TempDir;

    #[test]
    fn test_format_line() {
        let line = format_line(
            "2024-12-25 10:00:00",
            &Record::builder()
                .args(format_args!("アップロード 成功: a -> b"))
                .level(Level::Info)
                .target("onedrive_uploader")
                .build(),
        );

        assert_eq!(
            line,
            "2024-12-25 10:00:00 - onedrive_uploader - INFO - アップロード 成功: a -> b"
        );
    }

    #[test]
    fn test_open_log_file_creates_parent_and_appends() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("logs").join("onedrive_uploader.log");

        {
            let mut file = open_log_file(&path).unwrap();
            writeln!(file, "first").unwrap();
        }
        {
            let mut file = open_log_file(&path).unwrap();
            writeln!(file, "second").unwrap();
        }

        assert_eq!(fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }

    #[test]
    fn test_tee_writer_writes_to_file() {
        let mut tee = TeeWriter::new(Vec::new());
        tee.write_all(b"line\n").unwrap();
        tee.flush().unwrap();

        assert_eq!(tee.file, b"line\n");
    }
}
