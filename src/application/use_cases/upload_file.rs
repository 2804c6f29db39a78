//! # Upload File Use Case
//!
//! ファイルアップロードユースケース（チャンク転送エンジン）
//!
//! 4 MiB 未満のファイルは単一PUT、それ以上はアップロードセッションを作成し、
//! 固定サイズのチャンクを `Content-Range` 付きで順番に送信する。

use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

use crate::application::dto::upload_config::UploadConfig;
use crate::domain::entities::drive_item::{normalize_remote_path, ChunkResponse, DriveItem};
use crate::domain::entities::upload_session::{UploadSession, UploadStrategy};
use crate::domain::errors::UploaderError;
use crate::domain::repositories::drive_repository::DriveRepository;
use crate::domain::services::activity_log::{format_thousands, ActivityLog};

/// 進捗の通知先
pub trait ProgressObserver: Send + Sync {
    /// チャンクの確認応答を受けるたびに呼ばれる
    fn on_progress(&self, bytes_sent: u64, total_size: u64);

    /// 転送が途中で失敗したときに呼ばれる
    fn on_interrupted(&self) {}
}

impl<F> ProgressObserver for F
where
    F: Fn(u64, u64) + Send + Sync,
{
    fn on_progress(&self, bytes_sent: u64, total_size: u64) {
        self(bytes_sent, total_size)
    }
}

/// ファイルアップロードユースケース
pub struct UploadFileUseCase<D: DriveRepository> {
    drive: Arc<D>,
    config: UploadConfig,
    log: ActivityLog,
}

impl<D: DriveRepository> UploadFileUseCase<D> {
    /// 新しいユースケースを作成
    ///
    /// # Arguments
    ///
    /// * `drive` - ドライブリポジトリ
    /// * `config` - チャンクサイズとしきい値
    /// * `log` - アクティビティログ
    pub fn new(drive: Arc<D>, config: UploadConfig, log: ActivityLog) -> Self {
        Self { drive, config, log }
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    /// ファイルをアップロードする
    ///
    /// # Arguments
    ///
    /// * `local_path` - ローカルファイルのパス
    /// * `remote_path` - アップロード先（`/` で終わる場合はそのフォルダー内）
    /// * `observer` - 進捗の通知先（チャンク転送時のみ呼ばれる）
    ///
    /// # Returns
    ///
    /// バックエンドが返した最終的なアイテム
    ///
    /// # Errors
    ///
    /// - ローカルファイルが存在しない場合は `NotFound`
    /// - いずれかのPUTが成功以外のステータスを返した場合は `Transfer`
    pub async fn execute(
        &self,
        local_path: &Path,
        remote_path: &str,
        observer: Option<&dyn ProgressObserver>,
    ) -> Result<DriveItem, UploaderError> {
        let remote_path = resolve_remote_path(local_path, remote_path)?;
        let total_size = local_file_size(local_path).await?;

        self.log.info(format!(
            "アップロード開始: {} ({} bytes)",
            local_path.display(),
            format_thousands(total_size)
        ));

        let strategy = UploadStrategy::choose(
            total_size,
            self.config.simple_upload_limit,
            self.config.chunk_size,
        );

        let result = match strategy {
            UploadStrategy::Simple => self.simple_upload(local_path, &remote_path).await,
            UploadStrategy::Chunked { chunk_count } => {
                self.log.debug(format!(
                    "チャンク転送: {} chunks x {} bytes",
                    chunk_count, self.config.chunk_size
                ));
                self.resumable_upload(local_path, &remote_path, total_size, observer)
                    .await
            }
        };

        match &result {
            Ok(item) => {
                self.log.upload(local_path, &remote_path, total_size, true);
                self.log.info(format!("アップロード完了: {}", item.name));
            }
            Err(e) => {
                if let Some(observer) = observer {
                    observer.on_interrupted();
                }
                self.log.error(format!("アップロードエラー: {}", e));
                self.log.upload(local_path, &remote_path, total_size, false);
            }
        }

        result
    }

    async fn simple_upload(
        &self,
        local_path: &Path,
        remote_path: &str,
    ) -> Result<DriveItem, UploaderError> {
        let content = tokio::fs::read(local_path).await?;
        self.drive.upload_small(remote_path, content).await
    }

    async fn resumable_upload(
        &self,
        local_path: &Path,
        remote_path: &str,
        total_size: u64,
        observer: Option<&dyn ProgressObserver>,
    ) -> Result<DriveItem, UploaderError> {
        let upload_url = self.drive.create_upload_session(remote_path).await?;
        let mut session = UploadSession::new(upload_url, total_size);

        // ファイルハンドルはこの関数を抜けるときに必ず閉じられる
        let mut file = File::open(local_path).await?;
        let mut last_response = None;

        while let Some(range) = session.next_range(self.config.chunk_size) {
            let mut chunk = vec![0u8; range.len() as usize];
            file.read_exact(&mut chunk).await?;

            self.log
                .debug(format!("チャンク送信: {}", range.content_range()));
            let response = self
                .drive
                .upload_chunk(session.session_url(), range, chunk)
                .await?;

            let bytes_sent = session.advance(range.len())?;
            if let Some(observer) = observer {
                observer.on_progress(bytes_sent, total_size);
            }
            last_response = Some(response);
        }

        match last_response {
            Some(ChunkResponse::Completed(item)) => Ok(item),
            Some(ChunkResponse::InProgress {
                next_expected_ranges,
            }) => Err(UploaderError::InvalidResponse(format!(
                "upload session was not finalized, server still expects {:?}",
                next_expected_ranges
            ))),
            None => Err(UploaderError::InvalidResponse(
                "no chunks were sent".to_string(),
            )),
        }
    }
}

/// アップロード先のパスを決める
///
/// `/` で終わるパスはフォルダーとみなし、ローカルのファイル名を付け足す。
pub fn resolve_remote_path(local_path: &Path, remote_path: &str) -> Result<String, UploaderError> {
    let trimmed = normalize_remote_path(remote_path);

    if remote_path.ends_with('/') {
        let file_name = local_path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| UploaderError::InvalidPath(remote_path.to_string()))?;

        return Ok(if trimmed.is_empty() {
            file_name.to_string()
        } else {
            format!("{}/{}", trimmed, file_name)
        });
    }

    if trimmed.is_empty() {
        return Err(UploaderError::InvalidPath(remote_path.to_string()));
    }

    Ok(trimmed)
}

async fn local_file_size(path: &Path) -> Result<u64, UploaderError> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) if metadata.is_file() => Ok(metadata.len()),
        Ok(_) => Err(UploaderError::NotFound(path.to_path_buf())),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(UploaderError::NotFound(path.to_path_buf())),
        Err(e) => Err(e.into()),
    }
}
