//! # List Items Use Case
//!
//! フォルダー内のアイテム一覧

use std::sync::Arc;

use crate::domain::entities::drive_item::{normalize_remote_path, DriveItem};
use crate::domain::errors::UploaderError;
use crate::domain::repositories::drive_repository::DriveRepository;
use crate::domain::services::activity_log::ActivityLog;

/// 一覧取得ユースケース
pub struct ListItemsUseCase<D: DriveRepository> {
    drive: Arc<D>,
    log: ActivityLog,
}

impl<D: DriveRepository> ListItemsUseCase<D> {
    pub fn new(drive: Arc<D>, log: ActivityLog) -> Self {
        Self { drive, log }
    }

    /// フォルダー直下のアイテムを取得する（空文字列または `/` はルート）
    ///
    /// ページングはリポジトリ側ですべて辿る。
    pub async fn execute(&self, folder_path: &str) -> Result<Vec<DriveItem>, UploaderError> {
        let path = normalize_remote_path(folder_path);
        let items = self.drive.list_children(&path).await?;

        self.log.debug(format!(
            "{} 件のアイテムを取得しました: /{}",
            items.len(),
            path
        ));

        Ok(items)
    }
}
