//! # Create Folder Use Case
//!
//! リモートフォルダー作成ユースケース

use std::sync::Arc;

use crate::domain::entities::drive_item::{normalize_remote_path, FolderOutcome};
use crate::domain::errors::UploaderError;
use crate::domain::repositories::drive_repository::DriveRepository;
use crate::domain::services::activity_log::ActivityLog;

/// フォルダー作成ユースケース
pub struct CreateFolderUseCase<D: DriveRepository> {
    drive: Arc<D>,
    log: ActivityLog,
}

impl<D: DriveRepository> CreateFolderUseCase<D> {
    pub fn new(drive: Arc<D>, log: ActivityLog) -> Self {
        Self { drive, log }
    }

    /// フォルダーを1つ作成する
    ///
    /// 親フォルダーは既に存在している必要がある。
    ///
    /// # Errors
    ///
    /// - パスが空（ルート）の場合は `InvalidPath`
    /// - 409以外の失敗ステータスは `Transfer`
    pub async fn execute(&self, folder_path: &str) -> Result<FolderOutcome, UploaderError> {
        let path = normalize_remote_path(folder_path);
        if path.is_empty() {
            return Err(UploaderError::InvalidPath(folder_path.to_string()));
        }

        let outcome = self.drive.create_folder(&path).await?;
        match &outcome {
            FolderOutcome::Created(_) => {
                self.log.info(format!("フォルダーを作成しました: {}", path))
            }
            FolderOutcome::AlreadyExists => {
                self.log.info(format!("フォルダーは既に存在します: {}", path))
            }
        }

        Ok(outcome)
    }

    /// パス上のフォルダーを先頭から順に作成する（mkdir -p）
    ///
    /// # Returns
    ///
    /// 新規に作成されたフォルダーのパス
    pub async fn ensure_path(&self, folder_path: &str) -> Result<Vec<String>, UploaderError> {
        let path = normalize_remote_path(folder_path);
        let mut created = Vec::new();
        let mut current = String::new();

        for segment in path.split('/').filter(|s| !s.is_empty()) {
            if !current.is_empty() {
                current.push('/');
            }
            current.push_str(segment);

            if let FolderOutcome::Created(_) = self.execute(&current).await? {
                created.push(current.clone());
            }
        }

        Ok(created)
    }
}
