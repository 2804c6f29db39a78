//! # Delete Item Use Case
//!
//! リモートアイテムの削除

use std::sync::Arc;

use crate::domain::entities::drive_item::normalize_remote_path;
use crate::domain::errors::UploaderError;
use crate::domain::repositories::drive_repository::DriveRepository;
use crate::domain::services::activity_log::ActivityLog;

/// 削除ユースケース
pub struct DeleteItemUseCase<D: DriveRepository> {
    drive: Arc<D>,
    log: ActivityLog,
}

impl<D: DriveRepository> DeleteItemUseCase<D> {
    pub fn new(drive: Arc<D>, log: ActivityLog) -> Self {
        Self { drive, log }
    }

    /// アイテムを削除する
    ///
    /// # Returns
    ///
    /// 削除した場合は `true`、元から存在しなかった場合は `false`。どちらも成功扱い。
    ///
    /// # Errors
    ///
    /// ルートを指定した場合は `InvalidPath`
    pub async fn execute(&self, item_path: &str) -> Result<bool, UploaderError> {
        let path = normalize_remote_path(item_path);
        if path.is_empty() {
            return Err(UploaderError::InvalidPath(item_path.to_string()));
        }

        let deleted = self.drive.delete_item(&path).await?;
        if deleted {
            self.log.info(format!("削除しました: /{}", path));
        } else {
            self.log.info(format!("削除対象が存在しません: /{}", path));
        }

        Ok(deleted)
    }
}
