//! # Get Item Use Case
//!
//! リモートアイテムのメタデータ取得

use std::sync::Arc;

use crate::domain::entities::drive_item::{normalize_remote_path, DriveItem};
use crate::domain::errors::UploaderError;
use crate::domain::repositories::drive_repository::DriveRepository;
use crate::domain::services::activity_log::ActivityLog;

/// アイテム取得ユースケース
pub struct GetItemUseCase<D: DriveRepository> {
    drive: Arc<D>,
    log: ActivityLog,
}

impl<D: DriveRepository> GetItemUseCase<D> {
    pub fn new(drive: Arc<D>, log: ActivityLog) -> Self {
        Self { drive, log }
    }

    /// アイテムを取得する
    ///
    /// # Returns
    ///
    /// 存在しない場合は `None`（エラーではない）
    pub async fn execute(&self, item_path: &str) -> Result<Option<DriveItem>, UploaderError> {
        let path = normalize_remote_path(item_path);
        let item = self.drive.get_item(&path).await?;

        if item.is_none() {
            self.log.info(format!("アイテムが見つかりません: /{}", path));
        }

        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::drive_repository::MockDriveRepository;
    use mockall::predicate::eq;

    #[tokio::test]
    async fn test_get_existing_item() {
        let mut mock = MockDriveRepository::new();
        mock.expect_get_item()
            .with(eq("docs/report.pdf"))
            .times(1)
            .returning(|_| {
                Ok(Some(DriveItem {
                    id: "01ABC".to_string(),
                    name: "report.pdf".to_string(),
                    size: Some(1024),
                    folder: None,
                    file: None,
                    web_url: None,
                    last_modified_date_time: None,
                }))
            });

        let use_case = GetItemUseCase::new(Arc::new(mock), ActivityLog::default());
        let item = use_case.execute("/docs/report.pdf").await.unwrap().unwrap();

        assert_eq!(item.id, "01ABC");
    }

    #[tokio::test]
    async fn test_get_missing_item_is_none() {
        let mut mock = MockDriveRepository::new();
        mock.expect_get_item().times(1).returning(|_| Ok(None));

        let use_case = GetItemUseCase::new(Arc::new(mock), ActivityLog::default());

        assert!(use_case.execute("nothing.txt").await.unwrap().is_none());
    }
}
